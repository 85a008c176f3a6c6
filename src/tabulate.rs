use serde::Serialize;

use crate::categories::{ModificationPolicy, classify, label};
use crate::domain::AnnotationColumn;
use crate::error::AnnotatorError;
use crate::record::{EntryInfo, Feature, ParsedRecord, parse_record};
use crate::uniprot::RawRecord;

pub const CELL_DELIMITER: &str = "; ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResidueRow {
    pub position: usize,
    pub residue: char,
    pub secondary_structure: String,
    pub pfam_domain: String,
    pub disorder: String,
    pub disulfide_bridge: String,
    pub glycosylation: String,
    pub phosphorylation: String,
    pub active_site: String,
    pub metal_binding: String,
    pub dna_binding: String,
    pub rna_binding: String,
    pub ligand_binding: String,
    pub other_modification: String,
}

impl ResidueRow {
    pub fn new(position: usize, residue: char) -> Self {
        Self {
            position,
            residue,
            ..Self::default()
        }
    }

    pub fn cell(&self, column: AnnotationColumn) -> &str {
        match column {
            AnnotationColumn::SecondaryStructure => &self.secondary_structure,
            AnnotationColumn::PfamDomain => &self.pfam_domain,
            AnnotationColumn::Disorder => &self.disorder,
            AnnotationColumn::DisulfideBridge => &self.disulfide_bridge,
            AnnotationColumn::Glycosylation => &self.glycosylation,
            AnnotationColumn::Phosphorylation => &self.phosphorylation,
            AnnotationColumn::ActiveSite => &self.active_site,
            AnnotationColumn::MetalBinding => &self.metal_binding,
            AnnotationColumn::DnaBinding => &self.dna_binding,
            AnnotationColumn::RnaBinding => &self.rna_binding,
            AnnotationColumn::LigandBinding => &self.ligand_binding,
            AnnotationColumn::OtherModification => &self.other_modification,
        }
    }

    fn cell_mut(&mut self, column: AnnotationColumn) -> &mut String {
        match column {
            AnnotationColumn::SecondaryStructure => &mut self.secondary_structure,
            AnnotationColumn::PfamDomain => &mut self.pfam_domain,
            AnnotationColumn::Disorder => &mut self.disorder,
            AnnotationColumn::DisulfideBridge => &mut self.disulfide_bridge,
            AnnotationColumn::Glycosylation => &mut self.glycosylation,
            AnnotationColumn::Phosphorylation => &mut self.phosphorylation,
            AnnotationColumn::ActiveSite => &mut self.active_site,
            AnnotationColumn::MetalBinding => &mut self.metal_binding,
            AnnotationColumn::DnaBinding => &mut self.dna_binding,
            AnnotationColumn::RnaBinding => &mut self.rna_binding,
            AnnotationColumn::LigandBinding => &mut self.ligand_binding,
            AnnotationColumn::OtherModification => &mut self.other_modification,
        }
    }

    fn append(&mut self, column: AnnotationColumn, text: &str) {
        let cell = self.cell_mut(column);
        if !cell.is_empty() {
            cell.push_str(CELL_DELIMITER);
        }
        cell.push_str(text);
    }

    pub fn is_annotated(&self) -> bool {
        AnnotationColumn::ALL
            .iter()
            .any(|column| !self.cell(*column).is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationTable {
    pub entry: EntryInfo,
    pub skipped_features: usize,
    pub rows: Vec<ResidueRow>,
}

impl AnnotationTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, position: usize) -> Option<&ResidueRow> {
        position.checked_sub(1).and_then(|idx| self.rows.get(idx))
    }
}

pub fn tabulate_raw(
    raw: &RawRecord,
    policy: &ModificationPolicy,
) -> Result<AnnotationTable, AnnotatorError> {
    let record = parse_record(&raw.body)?;
    Ok(tabulate(&record, policy))
}

pub fn tabulate(record: &ParsedRecord, policy: &ModificationPolicy) -> AnnotationTable {
    let mut rows: Vec<ResidueRow> = record
        .sequence
        .residues()
        .map(|(position, residue)| ResidueRow::new(position, residue))
        .collect();

    for feature in &record.features {
        let Some(column) = classify(feature, policy) else {
            continue;
        };
        let text = label(feature);
        for position in covered_positions(feature, column) {
            if let Some(row) = position.checked_sub(1).and_then(|idx| rows.get_mut(idx)) {
                row.append(column, &text);
            }
        }
    }

    AnnotationTable {
        entry: record.entry.clone(),
        skipped_features: record.skipped.len(),
        rows,
    }
}

fn covered_positions(feature: &Feature, column: AnnotationColumn) -> Vec<usize> {
    if column == AnnotationColumn::DisulfideBridge && !feature.is_point() {
        vec![feature.begin, feature.end]
    } else {
        (feature.begin..=feature.end).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Sequence;

    fn feature(kind: &str, begin: usize, end: usize, description: Option<&str>) -> Feature {
        Feature {
            kind: kind.to_string(),
            begin,
            end,
            description: description.map(str::to_string),
            ligand: None,
        }
    }

    fn record(sequence: &str, features: Vec<Feature>) -> ParsedRecord {
        ParsedRecord {
            entry: EntryInfo::default(),
            sequence: Sequence::new(sequence).unwrap(),
            features,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn one_row_per_residue_in_order() {
        let table = tabulate(&record("MAEGKL", Vec::new()), &ModificationPolicy::default());
        assert_eq!(table.len(), 6);
        let positions: Vec<usize> = table.rows.iter().map(|row| row.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(table.rows[3].residue, 'G');
        assert!(table.rows.iter().all(|row| !row.is_annotated()));
    }

    #[test]
    fn range_covers_exactly_its_positions() {
        let table = tabulate(
            &record("MAEGKLVT", vec![feature("domain", 3, 5, Some("Kinase"))]),
            &ModificationPolicy::default(),
        );
        for row in &table.rows {
            let expected = if (3..=5).contains(&row.position) {
                "Kinase"
            } else {
                ""
            };
            assert_eq!(row.pfam_domain, expected, "position {}", row.position);
        }
    }

    #[test]
    fn same_column_features_join_in_extraction_order() {
        let table = tabulate(
            &record(
                "MAEG",
                vec![
                    feature("modified residue", 2, 2, Some("N-acetylalanine")),
                    feature("cross-link", 1, 3, Some("Glycyl lysine isopeptide")),
                ],
            ),
            &ModificationPolicy::default(),
        );
        assert_eq!(
            table.rows[1].other_modification,
            "N-acetylalanine; Glycyl lysine isopeptide"
        );
        assert_eq!(table.rows[0].other_modification, "Glycyl lysine isopeptide");
        assert_eq!(table.rows[3].other_modification, "");
    }

    #[test]
    fn categories_stay_in_their_columns() {
        let table = tabulate(
            &record(
                "MAEG",
                vec![
                    feature("helix", 1, 4, None),
                    feature("modified residue", 2, 2, Some("Phosphoserine")),
                ],
            ),
            &ModificationPolicy::default(),
        );
        assert_eq!(table.rows[1].secondary_structure, "helix");
        assert_eq!(table.rows[1].phosphorylation, "Phosphoserine");
        assert_eq!(table.rows[1].other_modification, "");
    }

    #[test]
    fn disulfide_marks_both_cysteines_only() {
        let table = tabulate(
            &record("CAAAC", vec![feature("disulfide bond", 1, 5, None)]),
            &ModificationPolicy::default(),
        );
        assert_eq!(table.rows[0].disulfide_bridge, "bridge 1-5");
        assert_eq!(table.rows[4].disulfide_bridge, "bridge 1-5");
        for row in &table.rows[1..4] {
            assert!(row.disulfide_bridge.is_empty());
        }
    }

    #[test]
    fn unrouted_features_leave_rows_empty() {
        let table = tabulate(
            &record("MAEG", vec![feature("chain", 1, 4, Some("Protein X"))]),
            &ModificationPolicy::default(),
        );
        assert!(table.rows.iter().all(|row| !row.is_annotated()));
    }

    #[test]
    fn row_lookup_is_one_based() {
        let table = tabulate(&record("MAEG", Vec::new()), &ModificationPolicy::default());
        assert_eq!(table.row(1).map(|row| row.residue), Some('M'));
        assert!(table.row(0).is_none());
        assert!(table.row(5).is_none());
    }
}
