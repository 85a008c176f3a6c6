use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AnnotatorError {
    #[error("invalid accession: {0:?}")]
    #[diagnostic(help("enter a UniProtKB accession such as P01308"))]
    InvalidAccession(String),

    #[error("accession not found upstream: {accession}")]
    #[diagnostic(help("check the accession; UniProtKB has no entry for it"))]
    NotFound { accession: String },

    #[error("{}", retrieval_message(.accession, .status, .message))]
    #[diagnostic(help("the data source did not answer properly, try again in a moment"))]
    Retrieval {
        accession: String,
        status: Option<u16>,
        message: String,
    },

    #[error("malformed record: {reason}")]
    #[diagnostic(help("the record could not be parsed"))]
    MalformedRecord { reason: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to write output: {0}")]
    Output(String),
}

impl AnnotatorError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        AnnotatorError::MalformedRecord {
            reason: reason.into(),
        }
    }
}

fn retrieval_message(accession: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => {
            format!("retrieval of {accession} failed: UniProt returned status {status}: {message}")
        }
        None => format!("retrieval of {accession} failed: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_display_carries_status() {
        let err = AnnotatorError::Retrieval {
            accession: "P01308".to_string(),
            status: Some(503),
            message: "Service Unavailable".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("P01308"));
        assert!(text.contains("503"));
    }

    #[test]
    fn retrieval_display_without_status() {
        let err = AnnotatorError::Retrieval {
            accession: "P01308".to_string(),
            status: None,
            message: "request timed out".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "retrieval of P01308 failed: request timed out"
        );
    }

    #[test]
    fn not_found_names_accession() {
        let err = AnnotatorError::NotFound {
            accession: "XXXXXX".to_string(),
        };
        assert!(err.to_string().contains("XXXXXX"));
    }
}
