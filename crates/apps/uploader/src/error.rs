use std::fmt;

use crate::format::UploadFormat;

/// Why an upload was turned away.
///
/// Every variant ends up as a `{"status": "failed"}` body; none of them
/// changes the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    TooLarge { limit: usize },
    UnknownMimeType(String),
    MissingField,
    Multipart(String),
    Parse { format: UploadFormat, message: String },
}

impl UploadError {
    pub fn parse(format: UploadFormat, message: impl fmt::Display) -> Self {
        UploadError::Parse {
            format,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::TooLarge { limit } => {
                // f64 `Display` drops a trailing `.0`: 20MB, 0.5MB.
                write!(f, "Uploads are capped at {}MB.", *limit as f64 / 1e6)
            }
            UploadError::UnknownMimeType(mime) => write!(f, "Unsupported file type: {mime}"),
            UploadError::MissingField => write!(f, "No file was provided in the \"data\" field."),
            UploadError::Multipart(e) => write!(f, "Malformed upload: {e}"),
            UploadError::Parse { format, message } => {
                write!(f, "Could not read {} file: {message}", format.name())
            }
        }
    }
}

impl std::error::Error for UploadError {}
