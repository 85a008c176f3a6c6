use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnnotatorError;

#[derive(Debug, Deserialize)]
struct UniprotXml {
    #[serde(rename = "entry", default)]
    entries: Vec<EntryXml>,
}

#[derive(Debug, Deserialize)]
struct EntryXml {
    #[serde(rename = "accession", default)]
    accessions: Vec<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    protein: Option<ProteinXml>,
    #[serde(default)]
    organism: Option<OrganismXml>,
    #[serde(rename = "feature", default)]
    features: Vec<FeatureXml>,
    #[serde(default)]
    sequence: Option<SequenceXml>,
}

#[derive(Debug, Deserialize)]
struct ProteinXml {
    #[serde(rename = "recommendedName", default)]
    recommended_name: Option<NameGroupXml>,
    #[serde(rename = "submittedName", default)]
    submitted_names: Vec<NameGroupXml>,
}

#[derive(Debug, Deserialize)]
struct NameGroupXml {
    #[serde(rename = "fullName", default)]
    full_name: Option<TextXml>,
}

#[derive(Debug, Deserialize)]
struct TextXml {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct OrganismXml {
    #[serde(rename = "name", default)]
    names: Vec<OrganismNameXml>,
}

#[derive(Debug, Deserialize)]
struct OrganismNameXml {
    #[serde(rename = "@type", default)]
    kind: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct FeatureXml {
    #[serde(rename = "@type", default)]
    kind: Option<String>,
    #[serde(rename = "@description", default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<LocationXml>,
    #[serde(default)]
    ligand: Option<LigandXml>,
}

#[derive(Debug, Deserialize)]
struct LocationXml {
    #[serde(rename = "@sequence", default)]
    sequence: Option<String>,
    #[serde(default)]
    begin: Option<PositionXml>,
    #[serde(default)]
    end: Option<PositionXml>,
    #[serde(default)]
    position: Option<PositionXml>,
}

#[derive(Debug, Deserialize)]
struct PositionXml {
    #[serde(rename = "@position", default)]
    position: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LigandXml {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SequenceXml {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence(Vec<char>);

impl Sequence {
    pub fn new(text: &str) -> Result<Self, AnnotatorError> {
        let residues: Vec<char> = text.chars().filter(|ch| !ch.is_whitespace()).collect();
        if residues.is_empty() {
            return Err(AnnotatorError::malformed("sequence element is empty"));
        }
        Ok(Self(residues))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn residue_at(&self, position: usize) -> Option<char> {
        position
            .checked_sub(1)
            .and_then(|idx| self.0.get(idx))
            .copied()
    }

    pub fn residues(&self) -> impl Iterator<Item = (usize, char)> + '_ {
        self.0.iter().enumerate().map(|(idx, ch)| (idx + 1, *ch))
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in &self.0 {
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub kind: String,
    pub begin: usize,
    pub end: usize,
    pub description: Option<String>,
    pub ligand: Option<String>,
}

impl Feature {
    pub fn is_point(&self) -> bool {
        self.begin == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingType,
    MissingLocation,
    UnparsablePosition,
    InvertedRange,
    OutOfRange,
    OtherIsoform,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::MissingType => "missing type attribute",
            SkipReason::MissingLocation => "missing location",
            SkipReason::UnparsablePosition => "absent or unparsable position",
            SkipReason::InvertedRange => "begin after end",
            SkipReason::OutOfRange => "outside the sequence",
            SkipReason::OtherIsoform => "located on another isoform",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFeature {
    pub kind: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub accession: Option<String>,
    pub entry_name: Option<String>,
    pub protein_name: Option<String>,
    pub organism: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedRecord {
    pub entry: EntryInfo,
    pub sequence: Sequence,
    pub features: Vec<Feature>,
    pub skipped: Vec<SkippedFeature>,
}

pub fn parse_record(body: &str) -> Result<ParsedRecord, AnnotatorError> {
    let document: UniprotXml = quick_xml::de::from_str(body)
        .map_err(|err| AnnotatorError::malformed(format!("invalid UniProt XML: {err}")))?;
    let entry = document
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| AnnotatorError::malformed("document has no entry element"))?;

    let sequence = entry
        .sequence
        .as_ref()
        .ok_or_else(|| AnnotatorError::malformed("entry has no sequence element"))
        .and_then(|seq| Sequence::new(&seq.value))?;

    let info = EntryInfo {
        accession: entry.accessions.first().cloned(),
        entry_name: entry.name.clone(),
        protein_name: entry.protein.as_ref().and_then(protein_name),
        organism: entry.organism.as_ref().and_then(scientific_name),
    };

    let mut features = Vec::new();
    let mut skipped = Vec::new();
    for item in entry.features {
        match lower_feature(item, sequence.len()) {
            Ok(feature) => features.push(feature),
            Err(skip) => {
                tracing::debug!(kind = %skip.kind, reason = %skip.reason, "feature skipped");
                skipped.push(skip);
            }
        }
    }

    Ok(ParsedRecord {
        entry: info,
        sequence,
        features,
        skipped,
    })
}

fn lower_feature(item: FeatureXml, length: usize) -> Result<Feature, SkippedFeature> {
    let Some(kind) = item.kind.filter(|kind| !kind.trim().is_empty()) else {
        return Err(SkippedFeature {
            kind: String::new(),
            reason: SkipReason::MissingType,
        });
    };
    let skip = |reason| SkippedFeature {
        kind: kind.clone(),
        reason,
    };

    let location = item.location.ok_or_else(|| skip(SkipReason::MissingLocation))?;
    if location.sequence.is_some() {
        return Err(skip(SkipReason::OtherIsoform));
    }

    let (begin, end) = match &location.position {
        Some(point) => {
            let at = parse_position(point).ok_or_else(|| skip(SkipReason::UnparsablePosition))?;
            (at, at)
        }
        None => {
            let begin = location
                .begin
                .as_ref()
                .and_then(parse_position)
                .ok_or_else(|| skip(SkipReason::UnparsablePosition))?;
            let end = location
                .end
                .as_ref()
                .and_then(parse_position)
                .ok_or_else(|| skip(SkipReason::UnparsablePosition))?;
            (begin, end)
        }
    };

    if begin > end {
        return Err(skip(SkipReason::InvertedRange));
    }
    if begin < 1 || end > length {
        return Err(skip(SkipReason::OutOfRange));
    }

    Ok(Feature {
        kind,
        begin,
        end,
        description: non_empty(item.description),
        ligand: non_empty(item.ligand.and_then(|ligand| ligand.name)),
    })
}

fn parse_position(position: &PositionXml) -> Option<usize> {
    position
        .position
        .as_deref()
        .and_then(|value| value.trim().parse::<usize>().ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn protein_name(protein: &ProteinXml) -> Option<String> {
    protein
        .recommended_name
        .iter()
        .chain(protein.submitted_names.iter())
        .filter_map(|group| group.full_name.as_ref())
        .map(|name| name.value.trim().to_string())
        .find(|name| !name.is_empty())
}

fn scientific_name(organism: &OrganismXml) -> Option<String> {
    organism
        .names
        .iter()
        .find(|name| name.kind.as_deref() == Some("scientific"))
        .or_else(|| organism.names.first())
        .map(|name| name.value.trim().to_string())
}
