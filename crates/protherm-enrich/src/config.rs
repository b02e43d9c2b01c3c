//! Configuration for a ProTherm enrichment run
//!
//! Column names, output column names, lookup endpoints, timeouts, and the
//! pacing delay between external calls.

use protherm_common::{ProthermError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Enrichment Configuration Constants
// ============================================================================

/// Structural (PDB) identifier column in ProThermDB exports.
pub const DEFAULT_STRUCTURE_ID_COLUMN: &str = "PDB_wild";

/// Accession (UniProt) identifier column.
pub const DEFAULT_ACCESSION_ID_COLUMN: &str = "UniProt_ID";

/// Mutation descriptor numbered against the PDB chain.
pub const DEFAULT_STRUCTURE_MUTATION_COLUMN: &str = "PDB_Chain_Mutation";

/// Mutation descriptor numbered against the UniProt sequence.
pub const DEFAULT_ACCESSION_MUTATION_COLUMN: &str = "MUTATION";

/// Output column holding the wild-type sequence.
pub const DEFAULT_SEQUENCE_COLUMN: &str = "sequence";

/// Output column holding the mutant sequence.
pub const DEFAULT_MUTANT_SEQUENCE_COLUMN: &str = "mutation_seq";

/// Delay observed after every external call, in seconds.
pub const DEFAULT_PACING_DELAY_SECS: f64 = 0.5;

/// RCSB PDB base URL (FASTA export lives under `/fasta/entry/{code}`).
pub const DEFAULT_RCSB_BASE_URL: &str = "https://www.rcsb.org";

/// UniProt REST base URL (FASTA lives under `/uniprotkb/{accession}.fasta`).
pub const DEFAULT_UNIPROT_BASE_URL: &str = "https://rest.uniprot.org";

/// Per-call timeout for structural entry lookups.
pub const DEFAULT_RCSB_TIMEOUT_SECS: u64 = 7;

/// Per-call timeout for predicted-model lookups.
pub const DEFAULT_ALPHAFOLD_TIMEOUT_SECS: u64 = 5;

/// Per-call timeout for accession lookups.
pub const DEFAULT_UNIPROT_TIMEOUT_SECS: u64 = 2;

/// Input columns read from the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub structure_id: String,
    pub accession_id: String,
    pub structure_mutation: String,
    pub accession_mutation: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            structure_id: DEFAULT_STRUCTURE_ID_COLUMN.to_string(),
            accession_id: DEFAULT_ACCESSION_ID_COLUMN.to_string(),
            structure_mutation: DEFAULT_STRUCTURE_MUTATION_COLUMN.to_string(),
            accession_mutation: DEFAULT_ACCESSION_MUTATION_COLUMN.to_string(),
        }
    }
}

impl ColumnNames {
    fn all(&self) -> [&str; 4] {
        [
            &self.structure_id,
            &self.accession_id,
            &self.structure_mutation,
            &self.accession_mutation,
        ]
    }
}

/// Columns added to the output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputColumns {
    pub sequence: String,
    pub mutant_sequence: String,
}

impl Default for OutputColumns {
    fn default() -> Self {
        Self {
            sequence: DEFAULT_SEQUENCE_COLUMN.to_string(),
            mutant_sequence: DEFAULT_MUTANT_SEQUENCE_COLUMN.to_string(),
        }
    }
}

/// External lookup endpoints and pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub rcsb_base_url: String,
    pub uniprot_base_url: String,
    pub rcsb_timeout_secs: u64,
    pub alphafold_timeout_secs: u64,
    pub uniprot_timeout_secs: u64,
    /// Sleep after each real external call (never after a cache hit)
    pub pacing_delay_secs: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            rcsb_base_url: DEFAULT_RCSB_BASE_URL.to_string(),
            uniprot_base_url: DEFAULT_UNIPROT_BASE_URL.to_string(),
            rcsb_timeout_secs: DEFAULT_RCSB_TIMEOUT_SECS,
            alphafold_timeout_secs: DEFAULT_ALPHAFOLD_TIMEOUT_SECS,
            uniprot_timeout_secs: DEFAULT_UNIPROT_TIMEOUT_SECS,
            pacing_delay_secs: DEFAULT_PACING_DELAY_SECS,
        }
    }
}

impl SourceConfig {
    /// Pacing delay as a Duration
    ///
    /// Only meaningful on a validated config.
    pub fn pacing_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.pacing_delay_secs).unwrap_or(Duration::ZERO)
    }
}

/// Full configuration for an enrichment run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichConfig {
    pub columns: ColumnNames,
    pub output: OutputColumns,
    pub sources: SourceConfig,
}

impl EnrichConfig {
    /// Load configuration from `.env` and `PROTHERM_*` environment variables
    ///
    /// - `PROTHERM_STRUCTURE_ID_COLUMN`, `PROTHERM_ACCESSION_ID_COLUMN`
    /// - `PROTHERM_STRUCTURE_MUTATION_COLUMN`, `PROTHERM_ACCESSION_MUTATION_COLUMN`
    /// - `PROTHERM_SEQUENCE_COLUMN`, `PROTHERM_MUTANT_SEQUENCE_COLUMN`
    /// - `PROTHERM_RCSB_URL`, `PROTHERM_UNIPROT_URL`
    /// - `PROTHERM_RCSB_TIMEOUT_SECS`, `PROTHERM_ALPHAFOLD_TIMEOUT_SECS`,
    ///   `PROTHERM_UNIPROT_TIMEOUT_SECS`
    /// - `PROTHERM_PACING_SECS`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        let columns = &mut config.columns;
        override_string("PROTHERM_STRUCTURE_ID_COLUMN", &mut columns.structure_id);
        override_string("PROTHERM_ACCESSION_ID_COLUMN", &mut columns.accession_id);
        override_string("PROTHERM_STRUCTURE_MUTATION_COLUMN", &mut columns.structure_mutation);
        override_string("PROTHERM_ACCESSION_MUTATION_COLUMN", &mut columns.accession_mutation);

        override_string("PROTHERM_SEQUENCE_COLUMN", &mut config.output.sequence);
        override_string("PROTHERM_MUTANT_SEQUENCE_COLUMN", &mut config.output.mutant_sequence);

        let sources = &mut config.sources;
        override_string("PROTHERM_RCSB_URL", &mut sources.rcsb_base_url);
        override_string("PROTHERM_UNIPROT_URL", &mut sources.uniprot_base_url);
        override_parsed("PROTHERM_RCSB_TIMEOUT_SECS", &mut sources.rcsb_timeout_secs)?;
        override_parsed("PROTHERM_ALPHAFOLD_TIMEOUT_SECS", &mut sources.alphafold_timeout_secs)?;
        override_parsed("PROTHERM_UNIPROT_TIMEOUT_SECS", &mut sources.uniprot_timeout_secs)?;
        override_parsed("PROTHERM_PACING_SECS", &mut sources.pacing_delay_secs)?;

        config.validate()?;
        Ok(config)
    }

    /// Set the pacing delay in seconds
    pub fn with_pacing_secs(mut self, secs: f64) -> Self {
        self.sources.pacing_delay_secs = secs;
        self
    }

    /// Point structural lookups at another RCSB host
    pub fn with_rcsb_base_url(mut self, url: impl Into<String>) -> Self {
        self.sources.rcsb_base_url = url.into();
        self
    }

    /// Point accession and predicted-model lookups at another UniProt host
    pub fn with_uniprot_base_url(mut self, url: impl Into<String>) -> Self {
        self.sources.uniprot_base_url = url.into();
        self
    }

    /// Replace the input column names
    pub fn with_columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    /// Replace the output column names
    pub fn with_output_columns(mut self, output: OutputColumns) -> Self {
        self.output = output;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let pacing = self.sources.pacing_delay_secs;
        if !pacing.is_finite() || pacing < 0.0 {
            return Err(ProthermError::config(format!(
                "pacing delay must be a non-negative number of seconds, got {}",
                pacing
            )));
        }

        for (name, secs) in [
            ("RCSB", self.sources.rcsb_timeout_secs),
            ("AlphaFold", self.sources.alphafold_timeout_secs),
            ("UniProt", self.sources.uniprot_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ProthermError::config(format!("{} timeout must be greater than zero", name)));
            }
        }

        for url in [&self.sources.rcsb_base_url, &self.sources.uniprot_base_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ProthermError::config(format!("'{}' is not an http(s) URL", url)));
            }
        }

        let inputs = self.columns.all();
        for (i, name) in inputs.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ProthermError::config("input column names must not be empty"));
            }
            if inputs[..i].contains(name) {
                return Err(ProthermError::config(format!("input column '{}' is configured twice", name)));
            }
        }

        if self.output.sequence.trim().is_empty() || self.output.mutant_sequence.trim().is_empty() {
            return Err(ProthermError::config("output column names must not be empty"));
        }
        if self.output.sequence == self.output.mutant_sequence {
            return Err(ProthermError::config(
                "sequence and mutant sequence output columns must differ",
            ));
        }

        Ok(())
    }
}

fn override_string(key: &str, target: &mut String) {
    if let Ok(value) = std::env::var(key) {
        *target = value;
    }
}

fn override_parsed<T: std::str::FromStr>(key: &str, target: &mut T) -> Result<()> {
    if let Ok(value) = std::env::var(key) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ProthermError::config(format!("{} has an invalid value '{}'", key, value)))?;
    }
    Ok(())
}
