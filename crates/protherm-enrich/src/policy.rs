//! Table-wide source selection
//!
//! Decided once per table: whether structural (PDB) or accession (UniProt)
//! data is authoritative. The decision picks both the identifier column
//! used for sequence retrieval and the mutation column applied afterwards.

use crate::table::{ColumnLayout, Record, Table};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which identifier family a whole table trusts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDecision {
    Structural,
    Accession,
}

impl SourceDecision {
    /// Decide for a whole table
    ///
    /// A single missing value in the structural mutation column routes the
    /// entire table to the accession source. Note that only the mutation
    /// column is inspected: a table with complete structural mutations but
    /// sparse structural identifiers still goes to the structural source.
    pub fn decide(table: &Table) -> Self {
        let column = table.layout().structure_mutation;
        if table.records().iter().any(|r| r.cell(column).is_none()) {
            SourceDecision::Accession
        } else {
            SourceDecision::Structural
        }
    }

    /// Identifier cell this decision reads from `record`
    pub fn identifier<'r>(&self, layout: ColumnLayout, record: &'r Record) -> Option<&'r str> {
        match self {
            SourceDecision::Structural => record.cell(layout.structure_id),
            SourceDecision::Accession => record.cell(layout.accession_id),
        }
    }

    /// Index of the mutation descriptor column this decision reads
    pub fn descriptor_column(&self, layout: ColumnLayout) -> usize {
        match self {
            SourceDecision::Structural => layout.structure_mutation,
            SourceDecision::Accession => layout.accession_mutation,
        }
    }

    /// Mutation descriptor cell this decision reads from `record`
    pub fn descriptor<'r>(&self, layout: ColumnLayout, record: &'r Record) -> Option<&'r str> {
        record.cell(self.descriptor_column(layout))
    }
}

impl fmt::Display for SourceDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDecision::Structural => write!(f, "PDB"),
            SourceDecision::Accession => write!(f, "UniProt"),
        }
    }
}
