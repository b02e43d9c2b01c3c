//! UniProt accession client

use super::{fasta, get_text, http_client, non_empty, trim_base_url, LookupError};
use crate::identifier::UniProtAccession;
use protherm_common::Result;
use reqwest::Client;
use tracing::{debug, instrument};

/// Fetches canonical sequences from UniProt REST
pub struct UniProtClient {
    client: Client,
    base_url: String,
}

impl UniProtClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: trim_base_url(base_url),
        })
    }

    pub fn fasta_url(&self, accession: &UniProtAccession) -> String {
        fasta_url(&self.base_url, accession)
    }

    /// Sequence of the accession; the first response line is the header
    #[instrument(skip_all, fields(accession = accession.as_str()))]
    pub async fn fetch(&self, accession: &UniProtAccession) -> std::result::Result<String, LookupError> {
        let url = self.fasta_url(accession);
        let body = get_text(&self.client, &url).await?;
        let sequence = non_empty(fasta::sequence_after_first_line(&body), &url)?;

        debug!(length = sequence.len(), "Fetched UniProt sequence");
        Ok(sequence)
    }
}

/// `{base}/uniprotkb/{accession}.fasta`, with the accession percent-encoded
pub(crate) fn fasta_url(base_url: &str, accession: &UniProtAccession) -> String {
    format!(
        "{}/uniprotkb/{}.fasta",
        base_url,
        urlencoding::encode(accession.as_str())
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fasta_url() {
        let client = UniProtClient::new("https://rest.uniprot.org", 2).unwrap();
        let accession = UniProtAccession::parse("P00720").unwrap();
        assert_eq!(
            client.fasta_url(&accession),
            "https://rest.uniprot.org/uniprotkb/P00720.fasta"
        );
    }

    #[test]
    fn test_opaque_accession_is_encoded() {
        let accession = UniProtAccession::parse("P0 07/20").unwrap();
        assert_eq!(
            fasta_url("http://localhost", &accession),
            "http://localhost/uniprotkb/P0%2007%2F20.fasta"
        );
    }
}
