// What the uploader shows for a given session. Pure: the terminal code in
// `ui` only draws these elements.

use std::path::PathBuf;

use crate::session::{Status, UploadSession};

pub const PROCESSING_MESSAGE: &str = "Processing your file...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    FilePicker,
    Preview { path: PathBuf, media_type: String },
    /// Progress bar, percentage label and the processing message.
    Processing { percent: u8 },
    Error(String),
    /// Label/value rows of the extracted data table.
    DataTable(Vec<(&'static str, String)>),
}

pub fn render(session: &UploadSession) -> Vec<Element> {
    let mut elements = vec![Element::FilePicker];

    if let Some(preview) = session.preview() {
        elements.push(Element::Preview {
            path: preview.path().to_path_buf(),
            media_type: preview.media_type().to_string(),
        });
    }

    match session.status() {
        Status::Idle => {}
        Status::Uploading { progress } => elements.push(Element::Processing { percent: *progress }),
        Status::Failed { error, .. } => elements.push(Element::Error(error.user_message())),
        Status::Succeeded { fields, .. } => elements.push(Element::DataTable(vec![
            ("Name:", fields.name.clone()),
            ("Passport Number:", fields.passport_number.clone()),
            ("Expiration Date:", fields.expiration_date.clone()),
        ])),
    }
    elements
}
