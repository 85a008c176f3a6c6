use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::categories::ModificationPolicy;
use crate::domain::Accession;
use crate::error::AnnotatorError;
use crate::tabulate::{AnnotationTable, tabulate_raw};
use crate::uniprot::RecordClient;

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub accession: String,
    pub source_url: String,
    pub retrieved_at: DateTime<Utc>,
    pub table: AnnotationTable,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn event(&self, _event: ProgressEvent) {}
}

#[derive(Clone)]
pub struct App<C: RecordClient> {
    client: C,
    policy: ModificationPolicy,
}

impl<C: RecordClient> App<C> {
    pub fn new(client: C, policy: ModificationPolicy) -> Self {
        Self { client, policy }
    }

    pub fn build_annotation_table(&self, accession: &str) -> Result<TableReport, AnnotatorError> {
        self.build_annotation_table_with_progress(accession, &SilentProgress)
    }

    pub fn build_annotation_table_with_progress(
        &self,
        accession: &str,
        sink: &dyn ProgressSink,
    ) -> Result<TableReport, AnnotatorError> {
        let accession: Accession = accession.parse()?;

        sink.event(ProgressEvent {
            message: format!("phase=Fetch; requesting {accession}"),
            elapsed: None,
        });
        let started = Instant::now();
        let raw = self.client.fetch(&accession)?;
        sink.event(ProgressEvent {
            message: format!("phase=Parse; {} bytes received", raw.body.len()),
            elapsed: Some(started.elapsed()),
        });

        let table = tabulate_raw(&raw, &self.policy)?;
        tracing::info!(
            %accession,
            rows = table.len(),
            skipped = table.skipped_features,
            "table built"
        );
        sink.event(ProgressEvent {
            message: format!("phase=Done; {} residues", table.len()),
            elapsed: Some(started.elapsed()),
        });

        Ok(TableReport {
            accession: accession.to_string(),
            source_url: raw.source_url,
            retrieved_at: raw.retrieved_at,
            table,
        })
    }
}
