//! Point-mutation descriptors
//!
//! A descriptor is either a wild-type marker or a comma-separated list of
//! single-residue substitutions such as `M1A,K2S`. Substitutions apply
//! left to right, each one checked against the sequence produced by the
//! ones before it. Any failure voids the whole descriptor.
//!
//! A token only has to start with the substitution; ProThermDB appends
//! notes such as `T26E (Based on UniProt and PDB)`, which are ignored.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

#[allow(clippy::expect_used)]
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z])([0-9]+)([A-Za-z])").expect("mutation token pattern is valid")
});

/// Descriptor values meaning "no mutation" (compared case-insensitively)
const WILD_TYPE_MARKERS: [&str; 4] = ["wild-type", "none", "", "nan"];

/// Why a descriptor could not be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("'{0}' is not a single-point substitution")]
    MalformedToken(String),

    #[error("position {position} is outside a sequence of length {length}")]
    PositionOutOfRange { position: usize, length: usize },

    #[error("expected {expected} at position {position}, found {found}")]
    ResidueMismatch {
        position: usize,
        expected: char,
        found: char,
    },
}

/// A single substitution, e.g. `K2S`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationToken {
    pub wild_type: char,
    /// 1-based residue position
    pub position: usize,
    pub mutant: char,
}

impl MutationToken {
    /// The substitution that undoes this one
    pub fn inverse(&self) -> Self {
        Self {
            wild_type: self.mutant,
            position: self.position,
            mutant: self.wild_type,
        }
    }

    /// Apply to `residues` in place after checking position and residue
    fn apply_to(&self, residues: &mut [char]) -> Result<(), MutationError> {
        let length = residues.len();
        if self.position == 0 || self.position > length {
            return Err(MutationError::PositionOutOfRange {
                position: self.position,
                length,
            });
        }

        let slot = &mut residues[self.position - 1];
        if *slot != self.wild_type {
            return Err(MutationError::ResidueMismatch {
                position: self.position,
                expected: self.wild_type,
                found: *slot,
            });
        }

        *slot = self.mutant;
        Ok(())
    }
}

impl FromStr for MutationToken {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MutationError::MalformedToken(s.to_string());
        let captures = TOKEN.captures(s).ok_or_else(malformed)?;

        let residue = |i: usize| captures.get(i).and_then(|m| m.as_str().chars().next());
        let wild_type = residue(1).ok_or_else(malformed)?;
        let mutant = residue(3).ok_or_else(malformed)?;

        // All-digit by construction; only overflow can fail, and such a
        // position is out of range for any real sequence.
        let position = captures
            .get(2)
            .map(|m| m.as_str().parse::<usize>().unwrap_or(usize::MAX))
            .ok_or_else(malformed)?;

        Ok(Self {
            wild_type,
            position,
            mutant,
        })
    }
}

impl fmt::Display for MutationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.wild_type, self.position, self.mutant)
    }
}

/// A parsed mutation descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// No mutation; the sequence passes through unchanged
    WildType,
    /// Ordered substitutions
    Substitutions(Vec<MutationToken>),
}

impl Descriptor {
    /// Parse a descriptor cell; an absent cell is treated as wild-type
    pub fn parse(raw: Option<&str>) -> Result<Self, MutationError> {
        let raw = raw.unwrap_or("").trim();
        if is_wild_type_marker(raw) {
            return Ok(Descriptor::WildType);
        }

        raw.split(',')
            .map(|token| token.trim().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Descriptor::Substitutions)
    }

    /// Apply to a wild-type sequence
    pub fn apply(&self, sequence: &str) -> Result<String, MutationError> {
        match self {
            Descriptor::WildType => Ok(sequence.to_string()),
            Descriptor::Substitutions(tokens) => {
                let mut residues: Vec<char> = sequence.chars().collect();
                for token in tokens {
                    token.apply_to(&mut residues)?;
                }
                Ok(residues.into_iter().collect())
            },
        }
    }
}

fn is_wild_type_marker(raw: &str) -> bool {
    WILD_TYPE_MARKERS.iter().any(|marker| raw.eq_ignore_ascii_case(marker))
}

/// Apply `descriptor` to `sequence`, checked
pub fn try_apply(sequence: &str, descriptor: Option<&str>) -> Result<String, MutationError> {
    Descriptor::parse(descriptor)?.apply(sequence)
}

/// Row-level mutation: `None` when there is no sequence or the descriptor
/// cannot be applied. Partial results are never returned.
pub fn apply(sequence: Option<&str>, descriptor: Option<&str>) -> Option<String> {
    let sequence = sequence?;
    match try_apply(sequence, descriptor) {
        Ok(mutated) => Some(mutated),
        Err(err) => {
            debug!(descriptor = descriptor.unwrap_or(""), error = %err, "Mutation not applied");
            None
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chained_substitutions() {
        assert_eq!(apply(Some("MKV"), Some("M1A,K2S")).as_deref(), Some("ASV"));
    }

    #[test]
    fn test_failure_is_absorbing() {
        // A1G applies, then position 5 is out of range for a 4-residue sequence
        assert_eq!(apply(Some("ACDE"), Some("A1G,C5K")), None);
        assert_eq!(
            try_apply("ACDE", Some("A1G,C5K")),
            Err(MutationError::PositionOutOfRange { position: 5, length: 4 })
        );
    }

    #[test]
    fn test_tokens_checked_against_intermediate_sequence() {
        // Second token sees the G written by the first
        assert_eq!(apply(Some("ACDE"), Some("A1G,G1W")).as_deref(), Some("WCDE"));
        assert_eq!(apply(Some("ACDE"), Some("A1G,A1W")), None);
    }

    #[test]
    fn test_residue_mismatch() {
        assert_eq!(apply(Some("MKV"), Some("K1A")), None);
        assert_eq!(
            try_apply("MKV", Some("K1A")),
            Err(MutationError::ResidueMismatch { position: 1, expected: 'K', found: 'M' })
        );
    }

    #[test]
    fn test_malformed_tokens() {
        for descriptor in ["M1", "1MA", "MA1", "M-1A", "M1A,", " (M1A)"] {
            assert_eq!(apply(Some("MKV"), Some(descriptor)), None, "{descriptor}");
        }
        assert!(matches!(
            try_apply("MKV", Some("M1")),
            Err(MutationError::MalformedToken(token)) if token == "M1"
        ));
    }

    #[test]
    fn test_trailing_text_after_token_is_ignored() {
        assert_eq!(apply(Some("MKV"), Some("M1AK")).as_deref(), Some("AKV"));
        assert_eq!(
            apply(Some("MKV"), Some("M1A (Based on UniProt and PDB)")).as_deref(),
            Some("AKV")
        );
        assert_eq!(apply(Some("MKV"), Some("M1A (note), K2S")).as_deref(), Some("ASV"));

        let token: MutationToken = "T26E (Based on UniProt)".parse().unwrap();
        assert_eq!(token.to_string(), "T26E");
    }

    #[test]
    fn test_out_of_range_positions() {
        assert_eq!(apply(Some("MKV"), Some("M0A")), None);
        assert_eq!(apply(Some("MKV"), Some("M4A")), None);
        assert_eq!(apply(Some("MKV"), Some("M99999999999999999999999A")), None);
    }

    #[test]
    fn test_wild_type_markers() {
        for marker in ["wild-type", "WILD-TYPE", "none", "None", "", "  ", "NaN", "nan"] {
            assert_eq!(apply(Some("MKV"), Some(marker)).as_deref(), Some("MKV"), "{marker:?}");
        }
        assert_eq!(apply(Some("MKV"), None).as_deref(), Some("MKV"));
    }

    #[test]
    fn test_absent_sequence_skips_descriptor() {
        assert_eq!(apply(None, Some("M1A")), None);
        assert_eq!(apply(None, Some("not a mutation")), None);
        assert_eq!(apply(None, Some("wild-type")), None);
    }

    #[test]
    fn test_whitespace_around_tokens() {
        assert_eq!(apply(Some("MKV"), Some(" M1A , K2S ")).as_deref(), Some("ASV"));
    }

    #[test]
    fn test_residues_are_case_sensitive() {
        assert_eq!(apply(Some("MKV"), Some("m1A")), None);
    }

    #[test]
    fn test_token_display_and_inverse() {
        let token: MutationToken = "T26E".parse().unwrap();
        assert_eq!(token.to_string(), "T26E");
        assert_eq!(token.inverse().to_string(), "E26T");
    }

    fn residue() -> impl Strategy<Value = char> {
        proptest::sample::select("ACDEFGHIKLMNPQRSTVWY".chars().collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn prop_substitution_round_trip(
            sequence in proptest::collection::vec(residue(), 1..200),
            index in any::<proptest::sample::Index>(),
            mutant in residue(),
        ) {
            let original: String = sequence.iter().collect();
            let i = index.index(sequence.len());
            let token = MutationToken { wild_type: sequence[i], position: i + 1, mutant };

            let mutated = apply(Some(original.as_str()), Some(token.to_string().as_str())).unwrap();
            prop_assert_eq!(mutated.chars().count(), sequence.len());
            for (j, (before, after)) in original.chars().zip(mutated.chars()).enumerate() {
                if j == i {
                    prop_assert_eq!(after, mutant);
                } else {
                    prop_assert_eq!(after, before);
                }
            }

            let restored = apply(Some(mutated.as_str()), Some(token.inverse().to_string().as_str())).unwrap();
            prop_assert_eq!(restored, original);
        }

        #[test]
        fn prop_wild_type_is_identity(sequence in "[A-Z]{0,50}") {
            prop_assert_eq!(apply(Some(sequence.as_str()), Some("wild-type")), Some(sequence.clone()));
        }
    }
}
