// API client module: a small blocking HTTP client for the extraction
// service. One call, `POST /extract-data`, with the picked file as a
// multipart part named `file`. Upload progress is reported by counting the
// bytes reqwest pulls out of the part while streaming the body.

use std::io::{Cursor, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::UploadError;
use crate::media::SelectedFile;

/// Fields returned by the service for a readable passport. Keys beyond the
/// three rendered ones are kept in `extra` and serialise back unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub name: String,
    pub passport_number: String,
    pub expiration_date: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Cumulative bytes handed to the transport out of a known total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub sent: u64,
    pub total: u64,
}

impl Progress {
    /// `round(100 * sent / total)`, capped at 100. `None` when the total is
    /// unknown (zero).
    pub fn percent(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let pct = (self.sent as f64 * 100.0 / self.total as f64).round();
        Some(pct.clamp(0.0, 100.0) as u8)
    }
}

/// Progress callback; called from whichever thread drives the upload.
pub type ProgressFn = Box<dyn FnMut(Progress) + Send>;

/// Anything that can turn a file into extracted fields. The HTTP client is
/// the real one; the seam lets the upload loop run against a stand-in.
pub trait Extractor: Send + Sync {
    fn extract(&self, file: &SelectedFile, on_progress: ProgressFn) -> Result<ExtractedFields, UploadError>;
}

/// Blocking client for the extraction service.
#[derive(Clone)]
pub struct ExtractionClient {
    client: Client,
    url: String,
}

impl ExtractionClient {
    /// Build a client for `config.extract_url()`. No request timeout is set;
    /// failures are whatever the transport reports.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(None)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ExtractionClient {
            client,
            url: config.extract_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_form(file: &SelectedFile, on_progress: ProgressFn) -> Result<multipart::Form, UploadError> {
        let total = file.len();
        let reader = ProgressReader {
            inner: Cursor::new(Arc::clone(file.bytes())),
            sent: 0,
            total,
            on_progress,
        };
        let part = multipart::Part::reader_with_length(reader, total)
            .file_name(file.name().to_string())
            .mime_str(file.media_type())
            .map_err(|e| {
                warn!(error = %e, media_type = file.media_type(), "invalid media type for upload");
                UploadError::ClientSideFailure
            })?;
        Ok(multipart::Form::new().part("file", part))
    }
}

impl Extractor for ExtractionClient {
    fn extract(&self, file: &SelectedFile, on_progress: ProgressFn) -> Result<ExtractedFields, UploadError> {
        let form = Self::build_form(file, on_progress)?;
        info!(url = %self.url, file = file.name(), bytes = file.len(), "uploading file");

        let res = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .map_err(classify_send_error)?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "extraction service rejected upload");
            return Err(UploadError::ServerRejected {
                status: status.as_u16(),
            });
        }

        let body = res.bytes().map_err(|e| {
            warn!(error = %e, "failed reading extraction response");
            UploadError::TransportFailure
        })?;
        let fields: ExtractedFields = serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "extraction response is not the expected JSON");
            UploadError::ClientSideFailure
        })?;
        info!(extra_fields = fields.extra.len(), "extraction succeeded");
        Ok(fields)
    }
}

/// Connectivity problems are transport failures; everything else reqwest can
/// raise before a response exists is a local failure.
fn classify_send_error(err: reqwest::Error) -> UploadError {
    if err.is_builder() {
        warn!(error = %err, "could not build upload request");
        UploadError::ClientSideFailure
    } else if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
        warn!(error = %err, "upload transport failure");
        UploadError::TransportFailure
    } else {
        warn!(error = %err, "unexpected error while uploading");
        UploadError::ClientSideFailure
    }
}

/// Reader over the file bytes that reports cumulative progress as the
/// multipart body is streamed.
struct ProgressReader<R> {
    inner: R,
    sent: u64,
    total: u64,
    on_progress: ProgressFn,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sent += n as u64;
            debug!(sent = self.sent, total = self.total, "upload progress");
            (self.on_progress)(Progress {
                sent: self.sent,
                total: self.total,
            });
        }
        Ok(n)
    }
}
