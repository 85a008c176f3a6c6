use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AnnotatorError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Accession(String);

impl Accession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Accession {
    type Err = AnnotatorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AnnotatorError::InvalidAccession(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Tsv,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Tsv => write!(f, "tsv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationColumn {
    SecondaryStructure,
    PfamDomain,
    Disorder,
    DisulfideBridge,
    Glycosylation,
    Phosphorylation,
    ActiveSite,
    MetalBinding,
    DnaBinding,
    RnaBinding,
    LigandBinding,
    OtherModification,
}

impl AnnotationColumn {
    pub const ALL: [AnnotationColumn; 12] = [
        AnnotationColumn::SecondaryStructure,
        AnnotationColumn::PfamDomain,
        AnnotationColumn::Disorder,
        AnnotationColumn::DisulfideBridge,
        AnnotationColumn::Glycosylation,
        AnnotationColumn::Phosphorylation,
        AnnotationColumn::ActiveSite,
        AnnotationColumn::MetalBinding,
        AnnotationColumn::DnaBinding,
        AnnotationColumn::RnaBinding,
        AnnotationColumn::LigandBinding,
        AnnotationColumn::OtherModification,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnnotationColumn::SecondaryStructure => "Secondary Structure",
            AnnotationColumn::PfamDomain => "Pfam Domain",
            AnnotationColumn::Disorder => "Disorder",
            AnnotationColumn::DisulfideBridge => "Disulfide Bridge",
            AnnotationColumn::Glycosylation => "Glycosylation",
            AnnotationColumn::Phosphorylation => "Phosphorylation",
            AnnotationColumn::ActiveSite => "Active Site",
            AnnotationColumn::MetalBinding => "Metal Binding",
            AnnotationColumn::DnaBinding => "DNA Binding",
            AnnotationColumn::RnaBinding => "RNA Binding",
            AnnotationColumn::LigandBinding => "Ligand Binding",
            AnnotationColumn::OtherModification => "Other Modification",
        }
    }

    pub fn index(self) -> usize {
        match self {
            AnnotationColumn::SecondaryStructure => 0,
            AnnotationColumn::PfamDomain => 1,
            AnnotationColumn::Disorder => 2,
            AnnotationColumn::DisulfideBridge => 3,
            AnnotationColumn::Glycosylation => 4,
            AnnotationColumn::Phosphorylation => 5,
            AnnotationColumn::ActiveSite => 6,
            AnnotationColumn::MetalBinding => 7,
            AnnotationColumn::DnaBinding => 8,
            AnnotationColumn::RnaBinding => 9,
            AnnotationColumn::LigandBinding => 10,
            AnnotationColumn::OtherModification => 11,
        }
    }
}

impl fmt::Display for AnnotationColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn table_headers() -> Vec<&'static str> {
    let mut headers = vec!["Position", "Residue"];
    headers.extend(AnnotationColumn::ALL.iter().map(|column| column.label()));
    headers
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_accession_trims() {
        let acc: Accession = "  P01308 \n".parse().unwrap();
        assert_eq!(acc.as_str(), "P01308");
    }

    #[test]
    fn parse_accession_keeps_entry_names() {
        let acc: Accession = "P53_HUMAN".parse().unwrap();
        assert_eq!(acc.to_string(), "P53_HUMAN");
    }

    #[test]
    fn parse_accession_empty() {
        let err = "   ".parse::<Accession>().unwrap_err();
        assert_matches!(err, AnnotatorError::InvalidAccession(_));
    }

    #[test]
    fn column_index_matches_order() {
        for (idx, column) in AnnotationColumn::ALL.iter().enumerate() {
            assert_eq!(column.index(), idx);
        }
    }

    #[test]
    fn headers_are_fixed() {
        assert_eq!(
            table_headers(),
            vec![
                "Position",
                "Residue",
                "Secondary Structure",
                "Pfam Domain",
                "Disorder",
                "Disulfide Bridge",
                "Glycosylation",
                "Phosphorylation",
                "Active Site",
                "Metal Binding",
                "DNA Binding",
                "RNA Binding",
                "Ligand Binding",
                "Other Modification",
            ]
        );
    }
}
