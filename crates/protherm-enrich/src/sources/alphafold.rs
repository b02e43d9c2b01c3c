//! AlphaFold predicted-model client
//!
//! AlphaFold models are keyed by a UniProt accession, so the sequence comes
//! from the UniProt FASTA endpoint. Unlike [`super::UniProtClient`], only
//! `>` lines are treated as headers here.

use super::{fasta, get_text, http_client, non_empty, trim_base_url, uniprot, LookupError};
use crate::identifier::AlphaFoldModel;
use protherm_common::Result;
use reqwest::Client;
use tracing::{debug, instrument};

pub struct AlphaFoldClient {
    client: Client,
    uniprot_base_url: String,
}

impl AlphaFoldClient {
    pub fn new(uniprot_base_url: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            uniprot_base_url: trim_base_url(uniprot_base_url),
        })
    }

    pub fn model_url(&self, model: &AlphaFoldModel) -> String {
        uniprot::fasta_url(&self.uniprot_base_url, model.accession())
    }

    #[instrument(skip_all, fields(model = model.as_str(), accession = model.accession().as_str()))]
    pub async fn fetch(&self, model: &AlphaFoldModel) -> std::result::Result<String, LookupError> {
        let url = self.model_url(model);
        let body = get_text(&self.client, &url).await?;
        let sequence = non_empty(fasta::sequence_without_headers(&body), &url)?;

        debug!(length = sequence.len(), "Fetched AlphaFold model sequence");
        Ok(sequence)
    }
}
