//! ProTherm Enrich Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Enriches ProThermDB thermodynamic-stability tables with wild-type and
//! mutant amino-acid sequences.
//!
//! # Pipeline
//!
//! - **Source decision**: one table-wide choice between structural (PDB)
//!   and accession (UniProt) data, see [`policy`]
//! - **Sequences**: identifiers are classified ([`identifier`]) and looked
//!   up through a run-scoped cache ([`cache`]) backed by the RCSB,
//!   AlphaFold and UniProt clients ([`sources`])
//! - **Mutations**: point-mutation descriptors are applied to each
//!   resolved sequence ([`mutation`])
//!
//! # Example
//!
//! ```no_run
//! use protherm_enrich::{EnrichConfig, Enricher, Table};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EnrichConfig::from_env()?;
//!     let mut table = Table::read_path("protherm.csv", &config.columns)?;
//!
//!     let output = config.output.clone();
//!     let summary = Enricher::from_config(config)?.run(&mut table).await?;
//!     table.write_path("protherm_enriched.csv", &output)?;
//!
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod enrich;
pub mod identifier;
pub mod mutation;
pub mod policy;
pub mod progress;
pub mod sources;
pub mod table;

pub use config::EnrichConfig;
pub use enrich::{apply_mutations, Enricher, RunContext, RunSummary};
pub use identifier::Identifier;
pub use policy::SourceDecision;
pub use sources::{SequenceLookup, SourceClients};
pub use table::Table;
