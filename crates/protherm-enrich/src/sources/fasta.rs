//! FASTA body extraction
//!
//! Two rules are in use. RCSB entry exports may hold several chains, each
//! with its own `>` header, so every non-header line is kept. UniProt
//! accession exports are a single record whose first line is always the
//! header.

const HEADER_SENTINEL: char = '>';

/// Concatenate every line that is not a `>` header
pub fn sequence_without_headers(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with(HEADER_SENTINEL))
        .collect()
}

/// Concatenate every line after the first, whatever the first line holds
pub fn sequence_after_first_line(text: &str) -> String {
    text.trim().lines().skip(1).map(str::trim).collect()
}
