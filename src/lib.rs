// Library root
// -----------
// Terminal front end for the passport extraction service. The binary
// (`main.rs`) wires configuration, logging and the HTTP client into the
// interactive loop in `ui`.
//
// Module responsibilities:
// - `config`: environment-driven settings (service URL, log filter).
// - `error`: the ways an upload attempt can fail, with their user messages.
// - `media`: picked files and media-type detection.
// - `preview`: temporary preview files for picked images.
// - `api`: the blocking HTTP client for `POST /extract-data`.
// - `session`: the upload state machine.
// - `runner`: runs uploads on worker threads and feeds events back.
// - `view`: the session rendered as a list of elements.
// - `ui`: header, picker, progress bar and terminal output.
pub mod api;
pub mod config;
pub mod error;
pub mod media;
pub mod preview;
pub mod runner;
pub mod session;
pub mod ui;
pub mod view;
