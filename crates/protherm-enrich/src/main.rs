//! ProTherm Enrich - sequence enrichment for ProThermDB tables

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use protherm_common::logging::{init_logging, LogConfig};
use protherm_enrich::cache::SequenceCache;
use protherm_enrich::{
    identifier, mutation, EnrichConfig, Enricher, SourceClients, SourceDecision, Table,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "protherm-enrich")]
#[command(author, version, about = "Add wild-type and mutant sequences to ProThermDB tables")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only warnings and errors, no progress bar
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch sequences for every row and apply its mutations
    Enrich {
        /// Input table (.csv, or .tsv/.tab/.txt for tab-separated)
        #[arg(short, long)]
        input: PathBuf,

        /// Output table
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the table after sequences are added
        #[arg(long)]
        sequences_output: Option<PathBuf>,

        /// Seconds to wait after each external call
        #[arg(long, env = "PROTHERM_PACING_SECS")]
        pacing_secs: Option<f64>,

        /// RCSB base URL
        #[arg(long, env = "PROTHERM_RCSB_URL")]
        rcsb_url: Option<String>,

        /// UniProt REST base URL
        #[arg(long, env = "PROTHERM_UNIPROT_URL")]
        uniprot_url: Option<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        summary_json: bool,
    },

    /// Apply a mutation descriptor to a sequence
    Mutate {
        /// Wild-type sequence
        #[arg(short, long)]
        sequence: String,

        /// Descriptor such as "M1A,K2S" or "wild-type"
        #[arg(short, long)]
        mutation: String,
    },

    /// Look up the sequence for one identifier
    Fetch {
        /// PDB code or AlphaFold model id (or UniProt accession with --accession)
        identifier: String,

        /// Treat the identifier as a UniProt accession
        #[arg(long)]
        accession: bool,

        /// RCSB base URL
        #[arg(long, env = "PROTHERM_RCSB_URL")]
        rcsb_url: Option<String>,

        /// UniProt REST base URL
        #[arg(long, env = "PROTHERM_UNIPROT_URL")]
        uniprot_url: Option<String>,
    },

    /// Report the source decision for a table without fetching anything
    CheckColumns {
        /// Input table
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    // Environment variables take precedence
    let log_config = LogConfig::new(log_level)
        .with_file_prefix("protherm-enrich")
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    match cli.command {
        Command::Enrich {
            input,
            output,
            sequences_output,
            pacing_secs,
            rcsb_url,
            uniprot_url,
            summary_json,
        } => {
            let config = with_overrides(EnrichConfig::from_env()?, pacing_secs, rcsb_url, uniprot_url);
            let output_columns = config.output.clone();

            let mut table = Table::read_path(&input, &config.columns)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            info!(input = %input.display(), rows = table.len(), "Table loaded");

            let mut enricher = Enricher::from_config(config)?.with_progress(!cli.quiet);
            if let Some(path) = sequences_output {
                enricher = enricher.with_sequences_output(path);
            }

            let summary = enricher.run(&mut table).await?;
            table
                .write_path(&output, &output_columns)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(output = %output.display(), "Enriched table written");

            if summary_json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", summary);
            }
        },
        Command::Mutate {
            sequence,
            mutation: descriptor,
        } => {
            match mutation::try_apply(&sequence, Some(descriptor.as_str())) {
                Ok(mutant) => println!("{}", mutant),
                Err(err) => bail!("Mutation {} not applied: {}", descriptor, err),
            }
        },
        Command::Fetch {
            identifier: raw,
            accession,
            rcsb_url,
            uniprot_url,
        } => {
            let decision = if accession {
                SourceDecision::Accession
            } else {
                SourceDecision::Structural
            };
            let Some(id) = identifier::resolve(Some(raw.as_str()), decision) else {
                bail!("'{}' is not a recognised {} identifier", raw, decision);
            };

            let config = with_overrides(EnrichConfig::from_env()?, None, rcsb_url, uniprot_url);
            config.validate()?;
            let clients = SourceClients::new(&config.sources)?;

            let mut cache = SequenceCache::new(Duration::ZERO);
            match cache.resolve(&id, &clients).await {
                Some(sequence) => println!("{}", sequence),
                None => bail!("No sequence found for {}", id),
            }
        },
        Command::CheckColumns { input } => {
            let config = EnrichConfig::from_env()?;
            let mut table = Table::read_path(&input, &config.columns)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let duplicates = table.dedup();
            let decision = SourceDecision::decide(&table);

            println!("Rows:             {} ({} duplicates)", table.len(), duplicates);
            println!("Sequence source:  {}", decision);
        },
    }

    Ok(())
}

fn with_overrides(
    mut config: EnrichConfig,
    pacing_secs: Option<f64>,
    rcsb_url: Option<String>,
    uniprot_url: Option<String>,
) -> EnrichConfig {
    if let Some(secs) = pacing_secs {
        config = config.with_pacing_secs(secs);
    }
    if let Some(url) = rcsb_url {
        config = config.with_rcsb_base_url(url);
    }
    if let Some(url) = uniprot_url {
        config = config.with_uniprot_base_url(url);
    }
    config
}
