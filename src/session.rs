// Upload state machine.
//
// One [`UploadSession`] lives for as long as the uploader is on screen. It
// changes only through two inputs: [`UploadSession::select_file`] when the
// picker produces a result, and [`UploadSession::apply`] for callbacks of the
// request that selection started. Every selection bumps a generation
// number; callbacks tagged with an older generation are dropped, so a slow
// superseded request can never overwrite newer state.

use tracing::{debug, info, warn};

use crate::api::{ExtractedFields, Progress};
use crate::error::UploadError;
use crate::media::SelectedFile;
use crate::preview::Preview;

pub type Generation = u64;

/// Where the current attempt stands. Terminal variants keep the last
/// progress value reported before they were reached.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Uploading { progress: u8 },
    Succeeded { fields: ExtractedFields, progress: u8 },
    Failed { error: UploadError, progress: u8 },
}

/// Work the caller must perform after a selection: upload `file` and feed
/// the outcome back tagged with `generation`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub generation: Generation,
    pub file: SelectedFile,
}

impl UploadRequest {
    pub fn progress(&self, progress: Progress) -> SessionEvent {
        SessionEvent {
            generation: self.generation,
            kind: EventKind::Progress(progress),
        }
    }

    pub fn finished(&self, outcome: Result<ExtractedFields, UploadError>) -> SessionEvent {
        SessionEvent {
            generation: self.generation,
            kind: EventKind::Finished(outcome),
        }
    }
}

/// A callback from an in-flight request.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub generation: Generation,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub enum EventKind {
    Progress(Progress),
    Finished(Result<ExtractedFields, UploadError>),
}

#[derive(Debug)]
pub struct UploadSession {
    status: Status,
    preview: Option<Preview>,
    generation: Generation,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            status: Status::Idle,
            preview: None,
            generation: 0,
        }
    }

    /// Handle the picker's result. Clears the previous outcome and releases
    /// the previous preview before anything else. Returns the request to
    /// issue, or `None` when there is no file (the session is then `Failed`
    /// with [`UploadError::NoFileSelected`]).
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Option<UploadRequest> {
        self.generation += 1;
        self.status = Status::Idle;
        self.preview = None;

        let Some(file) = file else {
            info!(generation = self.generation, "no file selected");
            self.status = Status::Failed {
                error: UploadError::NoFileSelected,
                progress: 0,
            };
            return None;
        };

        match Preview::for_file(&file) {
            Ok(preview) => self.preview = preview,
            // The preview is display-only; the upload goes ahead without it.
            Err(e) => warn!(error = %e, file = file.name(), "could not create preview"),
        }

        info!(
            generation = self.generation,
            file = file.name(),
            media_type = file.media_type(),
            "starting upload"
        );
        self.status = Status::Uploading { progress: 0 };
        Some(UploadRequest {
            generation: self.generation,
            file,
        })
    }

    /// Apply a callback. Returns `false` when the event was ignored because
    /// it belongs to a superseded request or the attempt already finished.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        if event.generation != self.generation {
            debug!(
                event_generation = event.generation,
                current = self.generation,
                "ignoring stale upload event"
            );
            return false;
        }
        let Status::Uploading { progress } = self.status else {
            debug!(generation = event.generation, "ignoring event after upload finished");
            return false;
        };

        match event.kind {
            EventKind::Progress(p) => {
                if let Some(pct) = p.percent() {
                    self.status = Status::Uploading {
                        progress: progress.max(pct),
                    };
                }
            }
            EventKind::Finished(Ok(fields)) => {
                info!(generation = event.generation, "upload succeeded");
                self.status = Status::Succeeded { fields, progress };
            }
            EventKind::Finished(Err(error)) => {
                warn!(generation = event.generation, error = ?error, "upload failed");
                self.status = Status::Failed { error, progress };
            }
        }
        true
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.status, Status::Uploading { .. })
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn progress_percent(&self) -> u8 {
        match self.status {
            Status::Idle => 0,
            Status::Uploading { progress }
            | Status::Succeeded { progress, .. }
            | Status::Failed { progress, .. } => progress,
        }
    }

    pub fn extracted_fields(&self) -> Option<&ExtractedFields> {
        match &self.status {
            Status::Succeeded { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match &self.status {
            Status::Failed { error, .. } => Some(error.user_message()),
            _ => None,
        }
    }
}
