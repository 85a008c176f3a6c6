use std::fs;
use std::sync::Mutex;

use assert_matches::assert_matches;

use residue_annotator::app::{App, ProgressEvent, ProgressSink};
use residue_annotator::categories::ModificationPolicy;
use residue_annotator::domain::Accession;
use residue_annotator::error::AnnotatorError;
use residue_annotator::uniprot::{RawRecord, RecordClient};

enum Reply {
    Body(String),
    NotFound,
    Timeout,
}

struct MockUniprot {
    reply: Reply,
    calls: Mutex<Vec<String>>,
}

impl MockUniprot {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RecordClient for &MockUniprot {
    fn fetch(&self, accession: &Accession) -> Result<RawRecord, AnnotatorError> {
        self.calls.lock().unwrap().push(accession.to_string());
        match &self.reply {
            Reply::Body(body) => Ok(RawRecord::new(
                accession.clone(),
                format!("mock://{accession}"),
                body.clone(),
            )),
            Reply::NotFound => Err(AnnotatorError::NotFound {
                accession: accession.to_string(),
            }),
            Reply::Timeout => Err(AnnotatorError::Retrieval {
                accession: accession.to_string(),
                status: None,
                message: "request timed out".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}

fn insulin() -> String {
    fs::read_to_string("tests/fixtures/uniprot_P01308.xml").unwrap()
}

#[test]
fn builds_table_through_client() {
    let client = MockUniprot::new(Reply::Body(insulin()));
    let app = App::new(&client, ModificationPolicy::default());

    let report = app.build_annotation_table(" P01308 ").unwrap();

    assert_eq!(report.accession, "P01308");
    assert_eq!(report.source_url, "mock://P01308");
    assert_eq!(report.table.len(), 110);
    assert_eq!(client.calls(), vec!["P01308".to_string()]);
}

#[test]
fn unknown_accession_is_not_found() {
    let client = MockUniprot::new(Reply::NotFound);
    let app = App::new(&client, ModificationPolicy::default());

    let err = app.build_annotation_table("NOPE42").unwrap_err();
    assert_matches!(err, AnnotatorError::NotFound { ref accession } if accession == "NOPE42");
}

#[test]
fn retrieval_failure_is_surfaced_once() {
    let client = MockUniprot::new(Reply::Timeout);
    let app = App::new(&client, ModificationPolicy::default());

    let err = app.build_annotation_table("P01308").unwrap_err();
    assert_matches!(err, AnnotatorError::Retrieval { status: None, .. });
    assert_eq!(client.calls().len(), 1);
}

#[test]
fn record_without_sequence_is_malformed() {
    let body = r#"<uniprot xmlns="http://uniprot.org/uniprot"><entry><accession>P01308</accession></entry></uniprot>"#;
    let client = MockUniprot::new(Reply::Body(body.to_string()));
    let app = App::new(&client, ModificationPolicy::default());

    let err = app.build_annotation_table("P01308").unwrap_err();
    assert_matches!(err, AnnotatorError::MalformedRecord { .. });
}

#[test]
fn empty_accession_never_reaches_client() {
    let client = MockUniprot::new(Reply::NotFound);
    let app = App::new(&client, ModificationPolicy::default());

    let err = app.build_annotation_table("   ").unwrap_err();
    assert_matches!(err, AnnotatorError::InvalidAccession(_));
    assert!(client.calls().is_empty());
}

#[test]
fn progress_reports_each_phase() {
    let client = MockUniprot::new(Reply::Body(insulin()));
    let app = App::new(&client, ModificationPolicy::default());
    let sink = RecordingSink::default();

    app.build_annotation_table_with_progress("P01308", &sink)
        .unwrap();

    let messages = sink.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 3);
    assert!(messages[0].starts_with("phase=Fetch"));
    assert!(messages[1].starts_with("phase=Parse"));
    assert_eq!(messages[2], "phase=Done; 110 residues");
}
