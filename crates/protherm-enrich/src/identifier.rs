//! Identifier classification
//!
//! Turns a raw table cell into a typed [`Identifier`]. Each variant carries
//! its own newtype so that a lookup client can only be handed the kind of
//! identifier it knows how to fetch.

use crate::policy::SourceDecision;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

#[allow(clippy::expect_used)]
static PDB_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9][A-Za-z0-9]{3}$").expect("PDB code pattern is valid"));

#[allow(clippy::expect_used)]
static ALPHAFOLD_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^AF-([A-Za-z0-9]+)-F[0-9]+").expect("AlphaFold model pattern is valid")
});

/// Identifier family, used as the tag half of a [`CacheKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    /// Experimentally determined structure (PDB entry)
    Structure,
    /// Computationally predicted structure (AlphaFold model)
    PredictedModel,
    /// Sequence record accession (UniProt)
    Accession,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Structure => write!(f, "PDB"),
            IdentifierKind::PredictedModel => write!(f, "AF"),
            IdentifierKind::Accession => write!(f, "UniProt"),
        }
    }
}

/// Four-character PDB entry code, e.g. `1ABC`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdbCode(String);

impl PdbCode {
    pub fn parse(raw: &str) -> Option<Self> {
        PDB_CODE.is_match(raw).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque UniProt accession, e.g. `P00698`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniProtAccession(String);

impl UniProtAccession {
    /// Any non-empty string is accepted; no shape is enforced.
    pub fn parse(raw: &str) -> Option<Self> {
        (!raw.is_empty()).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// AlphaFold model id, e.g. `AF-P00698-F1-model_v4`
///
/// The embedded accession is extracted once at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlphaFoldModel {
    raw: String,
    accession: UniProtAccession,
}

impl AlphaFoldModel {
    pub fn parse(raw: &str) -> Option<Self> {
        let captures = ALPHAFOLD_MODEL.captures(raw)?;
        let accession = UniProtAccession::parse(captures.get(1)?.as_str())?;
        Some(Self {
            raw: raw.to_string(),
            accession,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn accession(&self) -> &UniProtAccession {
        &self.accession
    }
}

/// A classified identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Structure(PdbCode),
    PredictedModel(AlphaFoldModel),
    Accession(UniProtAccession),
}

impl Identifier {
    pub fn kind(&self) -> IdentifierKind {
        match self {
            Identifier::Structure(_) => IdentifierKind::Structure,
            Identifier::PredictedModel(_) => IdentifierKind::PredictedModel,
            Identifier::Accession(_) => IdentifierKind::Accession,
        }
    }

    /// The identifier exactly as it appeared in the table (after trimming)
    pub fn raw(&self) -> &str {
        match self {
            Identifier::Structure(code) => code.as_str(),
            Identifier::PredictedModel(model) => model.as_str(),
            Identifier::Accession(accession) => accession.as_str(),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            kind: self.kind(),
            id: self.raw().to_string(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.raw())
    }
}

/// Composite (kind, raw id) key; equal keys share one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: IdentifierKind,
    id: String,
}

impl CacheKey {
    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Classify a raw identifier cell under the table's source decision
///
/// Returns `None` (unresolvable) for absent or blank input and, under the
/// structural source, for anything that is neither a PDB code nor an
/// AlphaFold model id. Unresolvable is a normal outcome, not an error.
pub fn resolve(raw: Option<&str>, decision: SourceDecision) -> Option<Identifier> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;

    let identifier = match decision {
        SourceDecision::Structural => PdbCode::parse(raw)
            .map(Identifier::Structure)
            .or_else(|| AlphaFoldModel::parse(raw).map(Identifier::PredictedModel)),
        SourceDecision::Accession => UniProtAccession::parse(raw).map(Identifier::Accession),
    };

    if identifier.is_none() {
        debug!(raw, decision = %decision, "Identifier does not match any known shape");
    }

    identifier
}
