//! Enrichment driver
//!
//! A run takes one table through two stages:
//!
//! 1. **Sequences**: decide the source for the whole table, classify each
//!    row's identifier, and resolve it through the run's cache.
//! 2. **Mutations**: apply each row's descriptor (from the column the same
//!    decision selects) to the resolved sequence.
//!
//! Each run owns a fresh [`RunContext`] (decision + cache). Nothing is
//! shared between runs.

use crate::cache::{CacheStats, SequenceCache};
use crate::config::EnrichConfig;
use crate::identifier;
use crate::mutation;
use crate::policy::SourceDecision;
use crate::progress::row_progress;
use crate::sources::{SequenceLookup, SourceClients};
use crate::table::Table;
use chrono::{DateTime, Utc};
use protherm_common::{ProthermError, Result};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

/// State owned by exactly one table-processing run
pub struct RunContext {
    decision: SourceDecision,
    cache: SequenceCache,
}

impl RunContext {
    /// Decide the source for `table` and start with an empty cache
    pub fn new(table: &Table, pacing: Duration) -> Self {
        let decision = SourceDecision::decide(table);
        info!(source = %decision, rows = table.len(), "Sequence source selected");

        Self {
            decision,
            cache: SequenceCache::new(pacing),
        }
    }

    pub fn decision(&self) -> SourceDecision {
        self.decision
    }

    pub fn cache(&self) -> &SequenceCache {
        &self.cache
    }
}

/// Counts from the sequence stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCounts {
    pub resolved: usize,
    pub missing: usize,
}

/// Counts from the mutation stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationCounts {
    /// Rows that ended with a mutant sequence
    pub produced: usize,
    /// Rows that had a sequence but whose descriptor could not be applied
    pub failed: usize,
}

/// What a run did
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub duplicates_removed: usize,
    pub decision: SourceDecision,
    pub sequences_resolved: usize,
    pub sequences_missing: usize,
    pub mutants_produced: usize,
    pub mutants_failed: usize,
    pub cache: CacheStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sequence source:     {}", self.decision)?;
        writeln!(f, "Rows:                {} ({} duplicates removed)", self.rows, self.duplicates_removed)?;
        writeln!(f, "Sequences resolved:  {}", self.sequences_resolved)?;
        writeln!(f, "Sequences missing:   {} of {}", self.sequences_missing, self.rows)?;
        writeln!(f, "Mutant sequences:    {}", self.mutants_produced)?;
        writeln!(f, "Mutations rejected:  {}", self.mutants_failed)?;
        write!(
            f,
            "External lookups:    {} ({} failed, {} cache hits)",
            self.cache.lookups, self.cache.failures, self.cache.hits
        )
    }
}

/// Runs the enrichment stages against a sequence lookup
pub struct Enricher<L> {
    lookup: L,
    config: EnrichConfig,
    sequences_output: Option<PathBuf>,
    show_progress: bool,
}

impl Enricher<SourceClients> {
    /// Enricher backed by the RCSB, AlphaFold and UniProt clients
    pub fn from_config(config: EnrichConfig) -> Result<Self> {
        config.validate()?;
        let clients = SourceClients::new(&config.sources)?;
        Ok(Self::new(clients, config))
    }
}

impl<L: SequenceLookup> Enricher<L> {
    pub fn new(lookup: L, config: EnrichConfig) -> Self {
        Self {
            lookup,
            config,
            sequences_output: None,
            show_progress: false,
        }
    }

    /// Also write the table after the sequence stage
    pub fn with_sequences_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.sequences_output = Some(path.into());
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Fresh per-run state for `table`
    pub fn start_run(&self, table: &Table) -> RunContext {
        RunContext::new(table, self.config.sources.pacing_delay())
    }

    /// Sequence stage: fill `sequence` on every record
    pub async fn add_sequences(&self, table: &mut Table, ctx: &mut RunContext) -> SequenceCounts {
        let decision = ctx.decision;
        let layout = table.layout();
        let pb = row_progress(table.len(), "Fetching sequences", self.show_progress);
        let mut counts = SequenceCounts::default();

        for record in table.records_mut() {
            let sequence = match identifier::resolve(decision.identifier(layout, record), decision) {
                Some(id) => ctx.cache.resolve(&id, &self.lookup).await,
                None => None,
            };

            if sequence.is_some() {
                counts.resolved += 1;
            } else {
                counts.missing += 1;
            }
            record.sequence = sequence;
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!(
            resolved = counts.resolved,
            missing = counts.missing,
            rows = table.len(),
            "Sequence stage complete"
        );
        counts
    }

    /// Run both stages on `table`, in place
    ///
    /// Fails with [`ProthermError::NoData`] when the table has no rows or
    /// when no row could be given a sequence.
    #[instrument(skip_all, fields(rows = table.len()))]
    pub async fn run(&self, table: &mut Table) -> Result<RunSummary> {
        let started_at = Utc::now();

        let duplicates_removed = table.dedup();
        if table.is_empty() {
            return Err(ProthermError::no_data("input table has no rows"));
        }

        let mut ctx = self.start_run(table);
        let sequences = self.add_sequences(table, &mut ctx).await;
        if sequences.resolved == 0 {
            return Err(ProthermError::no_data(format!(
                "no sequence could be retrieved for any of {} rows",
                table.len()
            )));
        }

        if let Some(path) = &self.sequences_output {
            table.write_path(path, &self.config.output)?;
        }

        let mutations = apply_mutations(table, ctx.decision);

        let summary = RunSummary {
            rows: table.len(),
            duplicates_removed,
            decision: ctx.decision,
            sequences_resolved: sequences.resolved,
            sequences_missing: sequences.missing,
            mutants_produced: mutations.produced,
            mutants_failed: mutations.failed,
            cache: ctx.cache.stats(),
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            source = %summary.decision,
            lookups = summary.cache.lookups,
            cache_hits = summary.cache.hits,
            mutants = summary.mutants_produced,
            "Enrichment complete"
        );
        Ok(summary)
    }
}

/// Mutation stage: fill `mutant_sequence` on every record
pub fn apply_mutations(table: &mut Table, decision: SourceDecision) -> MutationCounts {
    let layout = table.layout();
    let mut counts = MutationCounts::default();

    for record in table.records_mut() {
        record.mutant_sequence =
            mutation::apply(record.sequence.as_deref(), decision.descriptor(layout, record));

        if record.mutant_sequence.is_some() {
            counts.produced += 1;
        } else if record.sequence.is_some() {
            counts.failed += 1;
        }
    }

    let column = table.headers()[decision.descriptor_column(layout)].as_str();
    info!(
        column,
        produced = counts.produced,
        failed = counts.failed,
        "Mutation stage complete"
    );
    counts
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::ColumnNames;
    use crate::identifier::Identifier;
    use crate::sources::LookupError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Every PDB code maps to "MKV", every accession to "ACDE"
    #[derive(Default)]
    struct FixedLookup {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SequenceLookup for FixedLookup {
        async fn lookup(&self, identifier: &Identifier) -> std::result::Result<String, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match identifier {
                Identifier::Structure(_) => Ok("MKV".to_string()),
                Identifier::Accession(_) => Ok("ACDE".to_string()),
                Identifier::PredictedModel(_) => Err(LookupError::EmptySequence {
                    url: identifier.raw().to_string(),
                }),
            }
        }
    }

    fn table(rows: &str) -> Table {
        let input = format!("PDB_wild,UniProt_ID,PDB_Chain_Mutation,MUTATION\n{}", rows);
        Table::from_reader(input.as_bytes(), b',', &ColumnNames::default()).unwrap()
    }

    fn enricher() -> Enricher<FixedLookup> {
        Enricher::new(FixedLookup::default(), EnrichConfig::default().with_pacing_secs(0.0))
    }

    #[tokio::test]
    async fn test_structural_run() {
        let mut table = table("1ABC,P1,M1A,A1G\n1ABC,P1,K2S,A1G\n2XYZ,P2,wild-type,A1G\n");
        let enricher = enricher();
        let summary = enricher.run(&mut table).await.unwrap();

        assert_eq!(summary.decision, SourceDecision::Structural);
        assert_eq!(summary.cache.lookups, 2);
        assert_eq!(summary.cache.hits, 1);
        assert_eq!(enricher.lookup().calls.load(Ordering::SeqCst), 2);

        let mutants: Vec<_> = table.records().iter().map(|r| r.mutant_sequence.as_deref()).collect();
        assert_eq!(mutants, vec![Some("AKV"), Some("MSV"), Some("MKV")]);
    }

    #[tokio::test]
    async fn test_accession_run_uses_accession_mutations() {
        // ProThermDB annotates accession-side mutations
        let mut table = table("1ABC,P1,M1A,A1G\n1ABC,P1,-,C2K (Based on UniProt and PDB)\n");
        let summary = enricher().run(&mut table).await.unwrap();

        assert_eq!(summary.decision, SourceDecision::Accession);
        let records = table.records();
        assert_eq!(records[0].sequence.as_deref(), Some("ACDE"));
        assert_eq!(records[0].mutant_sequence.as_deref(), Some("GCDE"));
        assert_eq!(records[1].mutant_sequence.as_deref(), Some("AKDE"));
    }

    #[tokio::test]
    async fn test_row_failures_do_not_abort() {
        let mut table = table("1ABC,P1,M1A,x\nbogus,P2,M1A,x\nAF-P3-F1,P3,M1A,x\n1ABC,P1,Q1A,x\n");
        let summary = enricher().run(&mut table).await.unwrap();

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.sequences_resolved, 2);
        assert_eq!(summary.sequences_missing, 2);
        assert_eq!(summary.mutants_produced, 1);
        assert_eq!(summary.mutants_failed, 1);
        assert_eq!(summary.cache.failures, 1);

        let records = table.records();
        assert_eq!(records[1].sequence, None);
        assert_eq!(records[1].mutant_sequence, None);
        assert_eq!(records[3].sequence.as_deref(), Some("MKV"));
        assert_eq!(records[3].mutant_sequence, None);
    }

    #[tokio::test]
    async fn test_empty_table_is_no_data() {
        let mut table = table("");
        let err = enricher().run(&mut table).await.unwrap_err();
        assert!(err.is_no_data());
    }

    #[tokio::test]
    async fn test_no_sequences_is_no_data() {
        let mut table = table("bogus,P1,M1A,M1A\n,P2,M1A,M1A\n");
        let enricher = enricher();
        let err = enricher.run(&mut table).await.unwrap_err();

        assert!(err.is_no_data());
        assert_eq!(enricher.lookup().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_runs_do_not_share_state() {
        let enricher = enricher();

        let mut first = table("1ABC,P1,M1A,A1G\n");
        enricher.run(&mut first).await.unwrap();

        // Same identifier in a second table triggers a fresh lookup and a
        // fresh decision
        let mut second = table("1ABC,P1,-,A1G\n");
        let summary = enricher.run(&mut second).await.unwrap();

        assert_eq!(summary.decision, SourceDecision::Accession);
        assert_eq!(summary.cache.lookups, 1);
        assert_eq!(summary.cache.hits, 0);
    }

    #[tokio::test]
    async fn test_duplicates_are_dropped_before_lookup() {
        let mut table = table("1ABC,P1,M1A,A1G\n1ABC,P1,M1A,A1G\n");
        let summary = enricher().run(&mut table).await.unwrap();

        assert_eq!(summary.duplicates_removed, 1);
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.cache.hits, 0);
    }

    #[tokio::test]
    async fn test_stages_can_run_separately() {
        let mut table = table("1ABC,P1,M1A,A1G\n");
        let enricher = enricher();
        let mut ctx = enricher.start_run(&table);

        let counts = enricher.add_sequences(&mut table, &mut ctx).await;
        assert_eq!(counts, SequenceCounts { resolved: 1, missing: 0 });
        assert_eq!(table.records()[0].mutant_sequence, None);

        let counts = apply_mutations(&mut table, ctx.decision());
        assert_eq!(counts, MutationCounts { produced: 1, failed: 0 });
        assert_eq!(ctx.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_sequences_output_written_between_stages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("with_sequences.csv");
        let mut table = table("1ABC,P1,M1A,A1G\n");

        enricher().with_sequences_output(&path).run(&mut table).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[1], "1ABC,P1,M1A,A1G,MKV,");
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            rows: 3,
            duplicates_removed: 0,
            decision: SourceDecision::Accession,
            sequences_resolved: 2,
            sequences_missing: 1,
            mutants_produced: 2,
            mutants_failed: 0,
            cache: CacheStats { lookups: 1, hits: 1, failures: 0 },
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };
        let text = summary.to_string();
        assert!(text.contains("Sequence source:     UniProt"));
        assert!(text.contains("Sequences missing:   1 of 3"));
    }
}
