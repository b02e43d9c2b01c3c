//! Sequence lookup clients
//!
//! One client per identifier family, each accepting only its own
//! identifier type:
//!
//! - [`RcsbClient`]: PDB entry codes, RCSB FASTA export
//! - [`AlphaFoldClient`]: AlphaFold model ids, via the embedded UniProt accession
//! - [`UniProtClient`]: UniProt accessions, UniProt REST FASTA
//!
//! [`SourceClients`] bundles the three and dispatches on the
//! [`Identifier`] variant.

pub mod alphafold;
pub mod fasta;
pub mod rcsb;
pub mod uniprot;

pub use alphafold::AlphaFoldClient;
pub use rcsb::RcsbClient;
pub use uniprot::UniProtClient;

use crate::config::SourceConfig;
use crate::identifier::Identifier;
use async_trait::async_trait;
use protherm_common::{ProthermError, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

/// Why a single external lookup produced no sequence
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },

    #[error("{url} returned no sequence")]
    EmptySequence { url: String },
}

/// Resolve an identifier to its amino-acid sequence
///
/// Implementations make one external call per invocation; memoisation is
/// the caller's job.
#[async_trait]
pub trait SequenceLookup: Send + Sync {
    async fn lookup(&self, identifier: &Identifier) -> std::result::Result<String, LookupError>;
}

/// The three production clients behind one dispatch point
pub struct SourceClients {
    rcsb: RcsbClient,
    alphafold: AlphaFoldClient,
    uniprot: UniProtClient,
}

impl SourceClients {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            rcsb: RcsbClient::new(&config.rcsb_base_url, config.rcsb_timeout_secs)?,
            alphafold: AlphaFoldClient::new(&config.uniprot_base_url, config.alphafold_timeout_secs)?,
            uniprot: UniProtClient::new(&config.uniprot_base_url, config.uniprot_timeout_secs)?,
        })
    }
}

#[async_trait]
impl SequenceLookup for SourceClients {
    async fn lookup(&self, identifier: &Identifier) -> std::result::Result<String, LookupError> {
        match identifier {
            Identifier::Structure(code) => self.rcsb.fetch(code).await,
            Identifier::PredictedModel(model) => self.alphafold.fetch(model).await,
            Identifier::Accession(accession) => self.uniprot.fetch(accession).await,
        }
    }
}

/// Build an HTTP client with a per-call timeout
pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("protherm-enrich/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProthermError::network(format!("Failed to build HTTP client: {}", e)))
}

/// GET `url` and return the body of a successful response
pub(crate) async fn get_text(client: &Client, url: &str) -> std::result::Result<String, LookupError> {
    trace!(url, "GET");

    let response = client.get(url).send().await.map_err(|source| LookupError::Transport {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LookupError::Status {
            url: url.to_string(),
            status,
        });
    }

    response.text().await.map_err(|source| LookupError::Transport {
        url: url.to_string(),
        source,
    })
}

/// Reject an empty parse result
pub(crate) fn non_empty(sequence: String, url: &str) -> std::result::Result<String, LookupError> {
    if sequence.is_empty() {
        Err(LookupError::EmptySequence { url: url.to_string() })
    } else {
        Ok(sequence)
    }
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
