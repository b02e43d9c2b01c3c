//! RCSB PDB structural entry client

use super::{fasta, get_text, http_client, non_empty, trim_base_url, LookupError};
use crate::identifier::PdbCode;
use protherm_common::Result;
use reqwest::Client;
use tracing::{debug, instrument};

/// Fetches entry sequences from the RCSB FASTA export
pub struct RcsbClient {
    client: Client,
    base_url: String,
}

impl RcsbClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: trim_base_url(base_url),
        })
    }

    pub fn entry_url(&self, code: &PdbCode) -> String {
        format!("{}/fasta/entry/{}", self.base_url, code.as_str())
    }

    /// Sequence of every chain in the entry, headers removed
    #[instrument(skip_all, fields(pdb = code.as_str()))]
    pub async fn fetch(&self, code: &PdbCode) -> std::result::Result<String, LookupError> {
        let url = self.entry_url(code);
        let body = get_text(&self.client, &url).await?;
        let sequence = non_empty(fasta::sequence_without_headers(&body), &url)?;

        debug!(length = sequence.len(), "Fetched PDB entry sequence");
        Ok(sequence)
    }
}
