use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::Accession;
use crate::error::AnnotatorError;

pub const DEFAULT_BASE_URL: &str = "https://rest.uniprot.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RawRecord {
    pub accession: Accession,
    pub source_url: String,
    pub body: String,
    pub retrieved_at: DateTime<Utc>,
}

impl RawRecord {
    pub fn new(accession: Accession, source_url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            accession,
            source_url: source_url.into(),
            body: body.into(),
            retrieved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub trait RecordClient: Send + Sync {
    fn fetch(&self, accession: &Accession) -> Result<RawRecord, AnnotatorError>;
}

#[derive(Clone)]
pub struct UniprotHttpClient {
    client: Client,
    base_url: String,
}

impl UniprotHttpClient {
    pub fn new(settings: ClientSettings) -> Result<Self, AnnotatorError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("residue-annotator/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| AnnotatorError::ConfigParse(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| AnnotatorError::ConfigParse(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn record_url(&self, accession: &Accession) -> String {
        format!("{}/uniprotkb/{}.xml", self.base_url, accession.as_str())
    }

    fn handle_status(
        accession: &Accession,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, AnnotatorError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        if is_not_found_status(status) {
            return Err(AnnotatorError::NotFound {
                accession: accession.to_string(),
            });
        }
        let message = response
            .status()
            .canonical_reason()
            .unwrap_or("UniProt request failed")
            .to_string();
        Err(AnnotatorError::Retrieval {
            accession: accession.to_string(),
            status: Some(status),
            message,
        })
    }
}

impl RecordClient for UniprotHttpClient {
    fn fetch(&self, accession: &Accession) -> Result<RawRecord, AnnotatorError> {
        let url = self.record_url(accession);
        tracing::info!(%url, "uniprot.request");
        let started = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| transport_error(accession, &err))?;
        let response = Self::handle_status(accession, response).inspect_err(|err| {
            tracing::warn!(%accession, error = %err, "uniprot.request failed");
        })?;
        let body = response
            .text()
            .map_err(|err| transport_error(accession, &err))?;

        tracing::info!(
            %accession,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "uniprot.response"
        );
        Ok(RawRecord::new(accession.clone(), url, body))
    }
}

fn is_not_found_status(status: u16) -> bool {
    matches!(status, 400 | 404 | 410)
}

fn transport_error(accession: &Accession, err: &reqwest::Error) -> AnnotatorError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("could not connect: {err}")
    } else {
        err.to_string()
    };
    tracing::warn!(%accession, %message, "uniprot.request failed");
    AnnotatorError::Retrieval {
        accession: accession.to_string(),
        status: err.status().map(|status| status.as_u16()),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_url_trims_trailing_slash() {
        let client = UniprotHttpClient::new(ClientSettings {
            base_url: "http://localhost:9999/".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let acc: Accession = "P01308".parse().unwrap();
        assert_eq!(
            client.record_url(&acc),
            "http://localhost:9999/uniprotkb/P01308.xml"
        );
    }

    #[test]
    fn not_found_statuses() {
        assert!(is_not_found_status(404));
        assert!(is_not_found_status(400));
        assert!(is_not_found_status(410));
        assert!(!is_not_found_status(500));
        assert!(!is_not_found_status(429));
    }
}
