use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::AnnotationColumn;
use crate::record::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Column(AnnotationColumn),
    DisorderRegion,
    ModifiedResidue,
    BindingSite,
}

pub const FEATURE_ROUTES: &[(&str, Route)] = &[
    ("helix", Route::Column(AnnotationColumn::SecondaryStructure)),
    ("strand", Route::Column(AnnotationColumn::SecondaryStructure)),
    ("turn", Route::Column(AnnotationColumn::SecondaryStructure)),
    ("domain", Route::Column(AnnotationColumn::PfamDomain)),
    ("region of interest", Route::DisorderRegion),
    ("disulfide bond", Route::Column(AnnotationColumn::DisulfideBridge)),
    ("glycosylation site", Route::Column(AnnotationColumn::Glycosylation)),
    ("modified residue", Route::ModifiedResidue),
    ("active site", Route::Column(AnnotationColumn::ActiveSite)),
    ("metal ion-binding site", Route::Column(AnnotationColumn::MetalBinding)),
    ("binding site", Route::BindingSite),
    ("dna-binding region", Route::Column(AnnotationColumn::DnaBinding)),
    ("nucleotide phosphate-binding region", Route::Column(AnnotationColumn::LigandBinding)),
    ("lipid moiety-binding region", Route::Column(AnnotationColumn::OtherModification)),
    ("cross-link", Route::Column(AnnotationColumn::OtherModification)),
];

// Zn(2+), Cu cation, "a divalent metal cation", [4Fe-4S] cluster. Not Cl(-) or H(+).
static METAL_LIGAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:Li|Na|K|Mg|Ca|Mn|Fe|Co|Ni|Cu|Zn|Cd|Hg|Mo|W|Sr|Ba)(?:\(\d*\+\)| cation)$|(?i:\bmetal cation\b)|\[\d*Fe-\d*S\]",
    )
    .expect("valid metal ligand regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationPolicy {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for ModificationPolicy {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            keywords: default_keywords(),
        }
    }
}

impl ModificationPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            keywords: Vec::new(),
        }
    }

    pub fn is_modification(&self, kind: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let kind = kind.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && kind.contains(&keyword.to_lowercase()))
    }
}

fn default_enabled() -> bool {
    true
}

pub fn default_keywords() -> Vec<String> {
    vec![
        "modif".to_string(),
        "lipid".to_string(),
        "cross-link".to_string(),
        "residue".to_string(),
    ]
}

pub fn route_for(kind: &str) -> Option<Route> {
    let kind = kind.trim().to_lowercase();
    FEATURE_ROUTES
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, route)| *route)
}

pub fn classify(feature: &Feature, policy: &ModificationPolicy) -> Option<AnnotationColumn> {
    let Some(route) = route_for(&feature.kind) else {
        if policy.is_modification(&feature.kind) {
            return Some(AnnotationColumn::OtherModification);
        }
        tracing::trace!(kind = %feature.kind, "feature type has no column");
        return None;
    };
    match route {
        Route::Column(column) => Some(column),
        Route::DisorderRegion => mentions(feature.description.as_deref(), "disorder")
            .then_some(AnnotationColumn::Disorder),
        Route::ModifiedResidue => {
            if mentions(feature.description.as_deref(), "phospho") {
                Some(AnnotationColumn::Phosphorylation)
            } else {
                Some(AnnotationColumn::OtherModification)
            }
        }
        Route::BindingSite => Some(binding_column(
            feature
                .ligand
                .as_deref()
                .or(feature.description.as_deref()),
        )),
    }
}

fn binding_column(ligand: Option<&str>) -> AnnotationColumn {
    let Some(ligand) = ligand else {
        return AnnotationColumn::LigandBinding;
    };
    if METAL_LIGAND.is_match(ligand.trim()) {
        AnnotationColumn::MetalBinding
    } else if ligand.contains("DNA") {
        AnnotationColumn::DnaBinding
    } else if ligand.contains("RNA") {
        AnnotationColumn::RnaBinding
    } else {
        AnnotationColumn::LigandBinding
    }
}

fn mentions(text: Option<&str>, needle: &str) -> bool {
    text.map(|text| text.to_lowercase().contains(needle))
        .unwrap_or(false)
}

pub fn label(feature: &Feature) -> String {
    let text = feature
        .description
        .as_deref()
        .or(feature.ligand.as_deref())
        .unwrap_or(feature.kind.as_str());
    if route_for(&feature.kind) == Some(Route::Column(AnnotationColumn::DisulfideBridge)) {
        let span = format!("bridge {}-{}", feature.begin, feature.end);
        return match feature.description.as_deref() {
            Some(description) => format!("{span} ({description})"),
            None => span,
        };
    }
    text.to_string()
}
