//! Delimited table reading and writing
//!
//! ProThermDB exports are tab-separated with a header row. Cells are
//! normalised on the way in: surrounding whitespace is trimmed, and an
//! empty cell or the `-` placeholder becomes an absent value.

use crate::config::{ColumnNames, OutputColumns};
use protherm_common::{ProthermError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Placeholder ProThermDB uses for "no value"
const MISSING_PLACEHOLDER: &str = "-";

/// Indexes of the four input columns the engine reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub structure_id: usize,
    pub accession_id: usize,
    pub structure_mutation: usize,
    pub accession_mutation: usize,
}

impl ColumnLayout {
    fn resolve(headers: &[String], columns: &ColumnNames) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ProthermError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            structure_id: find(&columns.structure_id)?,
            accession_id: find(&columns.accession_id)?,
            structure_mutation: find(&columns.structure_mutation)?,
            accession_mutation: find(&columns.accession_mutation)?,
        })
    }
}

/// One row of the input table plus the values enrichment fills in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    cells: Vec<Option<String>>,
    /// Wild-type sequence, once resolved
    pub sequence: Option<String>,
    /// Sequence after applying the row's mutation descriptor
    pub mutant_sequence: Option<String>,
}

impl Record {
    fn new(cells: Vec<Option<String>>) -> Self {
        Self {
            cells,
            sequence: None,
            mutant_sequence: None,
        }
    }

    /// Value of the cell at `index`, `None` when absent or out of bounds
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }
}

/// An input table with its resolved column layout
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    layout: ColumnLayout,
    records: Vec<Record>,
}

impl Table {
    /// Build a table from already-split rows
    ///
    /// Every row must have as many cells as there are headers.
    pub fn new(
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
        columns: &ColumnNames,
    ) -> Result<Self> {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let layout = ColumnLayout::resolve(&headers, columns)?;

        let mut records = Vec::with_capacity(rows.len());
        for (line, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(ProthermError::parse(format!(
                    "row {} has {} cells, expected {}",
                    line + 1,
                    row.len(),
                    headers.len()
                )));
            }
            let cells = row
                .into_iter()
                .map(|cell| cell.as_deref().and_then(normalize_cell))
                .collect();
            records.push(Record::new(cells));
        }

        Ok(Self {
            headers,
            layout,
            records,
        })
    }

    /// Read a table from any reader
    pub fn from_reader<R: Read>(reader: R, delimiter: u8, columns: &ColumnNames) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| Some(cell.to_string())).collect());
        }

        Self::new(headers, rows, columns)
    }

    /// Read a table from disk, picking the delimiter from the extension
    pub fn read_path(path: impl AsRef<Path>, columns: &ColumnNames) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::from_reader(file, delimiter_for(path), columns)?;

        info!(path = %path.display(), rows = table.len(), "Loaded input table");
        Ok(table)
    }

    /// Write the table with the sequence and mutant-sequence columns
    ///
    /// An output column whose name already exists in the input replaces
    /// that column; otherwise it is appended.
    pub fn write<W: Write>(&self, writer: W, delimiter: u8, output: &OutputColumns) -> Result<()> {
        let mut headers = self.headers.clone();
        let sequence_index = column_slot(&mut headers, &output.sequence);
        let mutant_index = column_slot(&mut headers, &output.mutant_sequence);

        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        writer.write_record(&headers)?;

        for record in &self.records {
            let mut row: Vec<&str> = record.cells.iter().map(|c| c.as_deref().unwrap_or("")).collect();
            row.resize(headers.len(), "");
            row[sequence_index] = record.sequence.as_deref().unwrap_or("");
            row[mutant_index] = record.mutant_sequence.as_deref().unwrap_or("");
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write the table to disk, picking the delimiter from the extension
    pub fn write_path(&self, path: impl AsRef<Path>, output: &OutputColumns) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        self.write(file, delimiter_for(path), output)?;

        info!(path = %path.display(), rows = self.len(), "Wrote enriched table");
        Ok(())
    }

    /// Drop exact duplicate rows, keeping the first occurrence
    ///
    /// Returns the number of rows removed.
    pub fn dedup(&mut self) -> usize {
        let before = self.records.len();
        let mut seen = HashSet::with_capacity(before);
        self.records.retain(|record| seen.insert(record.cells.clone()));

        let removed = before - self.records.len();
        if removed > 0 {
            debug!(removed, "Removed duplicate rows");
        }
        removed
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// TAB for `.tsv`, `.tab` and `.txt`, comma for everything else
pub fn delimiter_for(path: &Path) -> u8 {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("tsv" | "tab" | "txt") => b'\t',
        _ => b',',
    }
}

fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == MISSING_PLACEHOLDER {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn column_slot(headers: &mut Vec<String>, name: &str) -> usize {
    match headers.iter().position(|h| h == name) {
        Some(index) => index,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
NO\tPDB_wild\tUniProt_ID\tPDB_Chain_Mutation\tMUTATION\tdTm
1\t2LZM\tP00720\tT26E\tT26E\t-1.2
2\t2LZM\tP00720\t-\tI3V\t0.4
3\t 1L63 \t\tA98V\tA98V\t
";

    fn sample() -> Table {
        Table::from_reader(SAMPLE.as_bytes(), b'\t', &ColumnNames::default()).unwrap()
    }

    #[test]
    fn test_reads_layout_and_normalizes_cells() {
        let table = sample();
        let layout = table.layout();
        assert_eq!(table.len(), 3);
        assert_eq!(layout.structure_id, 1);
        assert_eq!(layout.accession_mutation, 4);

        let records = table.records();
        assert_eq!(records[0].cell(layout.structure_mutation), Some("T26E"));
        assert_eq!(records[1].cell(layout.structure_mutation), None);
        assert_eq!(records[2].cell(layout.structure_id), Some("1L63"));
        assert_eq!(records[2].cell(layout.accession_id), None);
        assert_eq!(records[2].cell(5), None);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let columns = ColumnNames {
            accession_id: "Accession".to_string(),
            ..ColumnNames::default()
        };
        let err = Table::from_reader(SAMPLE.as_bytes(), b'\t', &columns).unwrap_err();
        assert!(matches!(err, ProthermError::MissingColumn(name) if name == "Accession"));
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let input = "PDB_wild,UniProt_ID,PDB_Chain_Mutation,MUTATION\n1ABC,P1,A1G\n";
        assert!(Table::from_reader(input.as_bytes(), b',', &ColumnNames::default()).is_err());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let input = "\
PDB_wild,UniProt_ID,PDB_Chain_Mutation,MUTATION
1ABC,P1,A1G,A1G
2XYZ,P2,K2R,K2R
1ABC,P1,A1G,A1G
1ABC,P1,-,A1G
1ABC,P1,,A1G
";
        let mut table = Table::from_reader(input.as_bytes(), b',', &ColumnNames::default()).unwrap();
        // "-" and "" normalise to the same absent value
        assert_eq!(table.dedup(), 2);
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[1].cell(0), Some("2XYZ"));
    }

    #[test]
    fn test_write_appends_output_columns() {
        let mut table = sample();
        table.records_mut()[0].sequence = Some("MNIFE".to_string());
        table.records_mut()[0].mutant_sequence = Some("MNIFQ".to_string());

        let mut out = Vec::new();
        table.write(&mut out, b',', &OutputColumns::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "NO,PDB_wild,UniProt_ID,PDB_Chain_Mutation,MUTATION,dTm,sequence,mutation_seq");
        assert_eq!(lines[1], "1,2LZM,P00720,T26E,T26E,-1.2,MNIFE,MNIFQ");
        assert_eq!(lines[2], "2,2LZM,P00720,,I3V,0.4,,");
    }

    #[test]
    fn test_write_overwrites_existing_output_column() {
        let input = "PDB_wild,UniProt_ID,PDB_Chain_Mutation,MUTATION,sequence\n1ABC,P1,A1G,A1G,STALE\n";
        let mut table = Table::from_reader(input.as_bytes(), b',', &ColumnNames::default()).unwrap();
        table.records_mut()[0].sequence = Some("ACDE".to_string());

        let mut out = Vec::new();
        table.write(&mut out, b',', &OutputColumns::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "PDB_wild,UniProt_ID,PDB_Chain_Mutation,MUTATION,sequence,mutation_seq");
        assert_eq!(lines[1], "1ABC,P1,A1G,A1G,ACDE,");
    }

    #[test]
    fn test_delimiter_from_extension() {
        assert_eq!(delimiter_for(Path::new("ProTherm_lysozyme.tsv")), b'\t');
        assert_eq!(delimiter_for(Path::new("export.TXT")), b'\t');
        assert_eq!(delimiter_for(Path::new("out/protherm_with_mutation.csv")), b',');
        assert_eq!(delimiter_for(Path::new("no_extension")), b',');
    }

    #[test]
    fn test_read_and_write_paths() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.tsv");
        std::fs::write(&input, SAMPLE).unwrap();

        let table = Table::read_path(&input, &ColumnNames::default()).unwrap();
        let output = dir.path().join("nested").join("enriched.csv");
        table.write_path(&output, &OutputColumns::default()).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("NO,PDB_wild,"));
        assert_eq!(written.lines().count(), 4);
    }
}
