use std::io::{self, Write};

use camino::Utf8Path;

use crate::app::TableReport;
use crate::domain::{AnnotationColumn, OutputFormat, table_headers};
use crate::error::AnnotatorError;
use crate::fs_util::write_atomic;
use crate::tabulate::AnnotationTable;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct TsvOutput;

impl TsvOutput {
    pub fn write<W: Write>(table: &AnnotationTable, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", table_headers().join("\t"))?;
        for row in &table.rows {
            let mut fields = Vec::with_capacity(2 + AnnotationColumn::ALL.len());
            fields.push(row.position.to_string());
            fields.push(row.residue.to_string());
            for column in AnnotationColumn::ALL {
                fields.push(sanitize(row.cell(column)));
            }
            writeln!(out, "{}", fields.join("\t"))?;
        }
        Ok(())
    }

    pub fn render(table: &AnnotationTable) -> io::Result<String> {
        let mut buffer = Vec::new();
        Self::write(table, &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn write<W: Write>(report: &TableReport, out: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, report).map_err(io::Error::other)?;
        out.write_all(b"\n")
    }
}

pub fn render(report: &TableReport, format: OutputFormat) -> Result<Vec<u8>, AnnotatorError> {
    let mut buffer = Vec::new();
    let written = match format {
        OutputFormat::Tsv => TsvOutput::write(&report.table, &mut buffer),
        OutputFormat::Json => JsonOutput::write(report, &mut buffer),
    };
    written.map_err(|err| AnnotatorError::Output(err.to_string()))?;
    Ok(buffer)
}

pub fn print(report: &TableReport, format: OutputFormat) -> Result<(), AnnotatorError> {
    let bytes = render(report, format)?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&bytes)
        .and_then(|_| stdout.flush())
        .map_err(|err| AnnotatorError::Output(err.to_string()))
}

pub fn save(report: &TableReport, format: OutputFormat, dest: &Utf8Path) -> Result<(), AnnotatorError> {
    let bytes = render(report, format)?;
    write_atomic(dest, &bytes)?;
    tracing::info!(path = %dest, bytes = bytes.len(), "table written");
    Ok(())
}

fn sanitize(cell: &str) -> String {
    cell.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EntryInfo;
    use crate::tabulate::ResidueRow;

    fn table() -> AnnotationTable {
        let mut first = ResidueRow::new(1, 'M');
        first.secondary_structure = "helix".to_string();
        let mut second = ResidueRow::new(2, 'A');
        second.pfam_domain = "tab\there\nnewline".to_string();
        AnnotationTable {
            entry: EntryInfo::default(),
            skipped_features: 0,
            rows: vec![first, second],
        }
    }

    #[test]
    fn tsv_has_header_and_fixed_width_rows() {
        let text = TsvOutput::render(&table()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Position\tResidue\tSecondary Structure\tPfam Domain"));
        for line in &lines {
            assert_eq!(line.split('\t').count(), 14);
        }
        assert!(lines[1].starts_with("1\tM\thelix\t"));
    }

    #[test]
    fn tsv_cells_never_break_rows() {
        let text = TsvOutput::render(&table()).unwrap();
        let second = text.lines().nth(2).unwrap();
        assert_eq!(second.split('\t').nth(3), Some("tab here newline"));
    }
}
