// Event loop glue between the session and the extractor. Each upload runs on
// its own worker thread; the worker never touches the session, it only sends
// tagged events back over a channel. The UI thread drains that channel and
// applies events one at a time, so the session has a single writer.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error};

use crate::api::{Extractor, ProgressFn};
use crate::error::UploadError;
use crate::session::{EventKind, SessionEvent, UploadRequest, UploadSession};

/// How often `wait` wakes up to check that the current worker is still alive.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct UploadRunner {
    extractor: Arc<dyn Extractor>,
    tx: Sender<SessionEvent>,
    rx: Receiver<SessionEvent>,
    current: Option<JoinHandle<()>>,
}

impl UploadRunner {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            extractor,
            tx,
            rx,
            current: None,
        }
    }

    /// Issue the request on a worker thread. An earlier in-flight request is
    /// left to finish on its own; its events will be stale.
    pub fn start(&mut self, request: UploadRequest) {
        let extractor = Arc::clone(&self.extractor);
        let tx = self.tx.clone();
        debug!(generation = request.generation, "spawning upload worker");

        let handle = thread::spawn(move || {
            let progress_tx = tx.clone();
            let progress_req = request.clone();
            let on_progress: ProgressFn = Box::new(move |p| {
                // Receiver gone means the UI is shutting down.
                let _ = progress_tx.send(progress_req.progress(p));
            });

            let outcome = catch_unwind(AssertUnwindSafe(|| extractor.extract(&request.file, on_progress)))
                .unwrap_or_else(|_| {
                    error!(generation = request.generation, "upload worker panicked");
                    Err(UploadError::ClientSideFailure)
                });
            let _ = tx.send(request.finished(outcome));
        });
        self.current = Some(handle);
    }

    /// Apply events until the session leaves `Uploading`, calling `on_change`
    /// after each event that changed it.
    pub fn wait(&mut self, session: &mut UploadSession, mut on_change: impl FnMut(&UploadSession)) {
        while session.is_uploading() {
            match self.rx.recv_timeout(POLL_INTERVAL) {
                Ok(event) => {
                    if session.apply(event) {
                        on_change(session);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !self.worker_gone() {
                        continue;
                    }
                    // Everything the finished worker sent is already queued.
                    match self.rx.try_recv() {
                        Ok(event) => {
                            if session.apply(event) {
                                on_change(session);
                            }
                        }
                        Err(_) => {
                            error!(generation = session.generation(), "upload worker exited without a result");
                            session.apply(SessionEvent {
                                generation: session.generation(),
                                kind: EventKind::Finished(Err(UploadError::ClientSideFailure)),
                            });
                            on_change(session);
                        }
                    }
                }
                // We hold a sender ourselves, so the channel cannot disconnect.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Apply whatever is already queued without blocking. Returns how many
    /// events changed the session.
    pub fn drain(&mut self, session: &mut UploadSession) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            if session.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    fn worker_gone(&self) -> bool {
        self.current.as_ref().map_or(true, |h| h.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ExtractedFields, Progress};
    use crate::media::SelectedFile;
    use crate::session::Status;

    struct Scripted {
        steps: Vec<u64>,
        delay: Duration,
        outcome: Result<ExtractedFields, UploadError>,
    }

    impl Extractor for Scripted {
        fn extract(&self, _file: &SelectedFile, mut on_progress: ProgressFn) -> Result<ExtractedFields, UploadError> {
            for sent in &self.steps {
                thread::sleep(self.delay);
                on_progress(Progress { sent: *sent, total: 100 });
            }
            self.outcome.clone()
        }
    }

    struct Panics;

    impl Extractor for Panics {
        fn extract(&self, _file: &SelectedFile, _on_progress: ProgressFn) -> Result<ExtractedFields, UploadError> {
            panic!("decoder blew up");
        }
    }

    fn fields() -> ExtractedFields {
        serde_json::from_str(r#"{"name":"JANE DOE","passport_number":"X1234567","expiration_date":"2030-01-01"}"#)
            .unwrap()
    }

    fn image() -> SelectedFile {
        SelectedFile::new("passport.jpg", "image/jpeg", b"jpeg".to_vec())
    }

    #[test]
    fn reports_progress_in_order_then_result() {
        let mut runner = UploadRunner::new(Arc::new(Scripted {
            steps: vec![25, 60, 100],
            delay: Duration::from_millis(5),
            outcome: Ok(fields()),
        }));
        let mut session = UploadSession::new();
        let req = session.select_file(Some(image())).unwrap();
        runner.start(req);

        let mut seen = Vec::new();
        runner.wait(&mut session, |s| seen.push(s.status().clone()));

        assert_eq!(
            seen,
            vec![
                Status::Uploading { progress: 25 },
                Status::Uploading { progress: 60 },
                Status::Uploading { progress: 100 },
                Status::Succeeded { fields: fields(), progress: 100 },
            ]
        );
    }

    #[test]
    fn panicking_extractor_becomes_client_side_failure() {
        let mut runner = UploadRunner::new(Arc::new(Panics));
        let mut session = UploadSession::new();
        let req = session.select_file(Some(image())).unwrap();
        runner.start(req);
        runner.wait(&mut session, |_| {});
        assert_eq!(
            session.error_message().as_deref(),
            Some("An error occurred while uploading. Please try again.")
        );
    }

    #[test]
    fn slow_superseded_request_cannot_overwrite_newer_result() {
        let slow = Arc::new(Scripted {
            steps: vec![50],
            delay: Duration::from_millis(150),
            outcome: Err(UploadError::ServerRejected { status: 500 }),
        });
        let fast = Arc::new(Scripted {
            steps: vec![100],
            delay: Duration::from_millis(1),
            outcome: Ok(fields()),
        });

        let mut session = UploadSession::new();
        let mut slow_runner = UploadRunner::new(slow);
        let first = session.select_file(Some(image())).unwrap();
        slow_runner.start(first);

        let mut fast_runner = UploadRunner::new(fast);
        let second = session.select_file(Some(image())).unwrap();
        fast_runner.start(second);
        fast_runner.wait(&mut session, |_| {});
        assert!(session.extracted_fields().is_some());

        // Let the slow worker finish, then feed its events in.
        if let Some(handle) = slow_runner.current.take() {
            handle.join().unwrap();
        }
        assert_eq!(slow_runner.drain(&mut session), 0);
        assert_eq!(session.extracted_fields().unwrap().name, "JANE DOE");
        assert_eq!(session.progress_percent(), 100);
    }
}
