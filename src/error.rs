// Error taxonomy for one upload attempt. Every variant is recovered by the
// session and shown to the user as a fixed sentence; the underlying cause is
// logged where the error is created, not carried here.

use thiserror::Error;

/// Why an upload attempt ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The picker produced no file, so no request was sent.
    #[error("Please select a file first.")]
    NoFileSelected,

    /// The service answered with something other than 200.
    #[error("Failed to upload file. Please try again.")]
    ServerRejected { status: u16 },

    /// The request never got a complete response (connection refused, reset...).
    #[error("An error occurred during the upload. Please try again.")]
    TransportFailure,

    /// Anything that went wrong locally: building the request, decoding the body.
    #[error("An error occurred while uploading. Please try again.")]
    ClientSideFailure,
}

impl UploadError {
    /// The sentence rendered in the error area of the view.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_the_fixed_sentences() {
        assert_eq!(UploadError::NoFileSelected.user_message(), "Please select a file first.");
        assert_eq!(
            UploadError::ServerRejected { status: 500 }.user_message(),
            "Failed to upload file. Please try again."
        );
        assert_eq!(
            UploadError::TransportFailure.user_message(),
            "An error occurred during the upload. Please try again."
        );
        assert_eq!(
            UploadError::ClientSideFailure.user_message(),
            "An error occurred while uploading. Please try again."
        );
    }

    #[test]
    fn status_code_does_not_leak_into_message() {
        let msg = UploadError::ServerRejected { status: 418 }.user_message();
        assert!(!msg.contains("418"));
    }
}
