pub mod app;
pub mod categories;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod output;
pub mod record;
pub mod tabulate;
pub mod tui;
pub mod uniprot;

use crate::app::{App, TableReport};
use crate::categories::ModificationPolicy;
use crate::error::AnnotatorError;
use crate::uniprot::{ClientSettings, UniprotHttpClient};

pub fn build_annotation_table(accession: &str) -> Result<TableReport, AnnotatorError> {
    let client = UniprotHttpClient::new(ClientSettings::default())?;
    App::new(client, ModificationPolicy::default()).build_annotation_table(accession)
}
