use query::QueryError;
use serde::Serialize;

pub const RETRY_MESSAGE: &str = "Something went wrong loading results. Please try again.";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    Network,
    Decode,
    Validation,
}

/// Dismissible error shown above the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBanner {
    pub kind: BannerKind,
    pub message: String,
}

impl From<&QueryError> for ErrorBanner {
    fn from(err: &QueryError) -> Self {
        match err {
            QueryError::Network(_) => ErrorBanner {
                kind: BannerKind::Network,
                message: RETRY_MESSAGE.to_string(),
            },
            QueryError::Decode(_) => ErrorBanner {
                kind: BannerKind::Decode,
                message: RETRY_MESSAGE.to_string(),
            },
            QueryError::Validation(msg) => ErrorBanner {
                kind: BannerKind::Validation,
                message: msg.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BannerKind, ErrorBanner, RETRY_MESSAGE};
    use query::{QueryError, UNSUPPORTED_QUESTION};

    #[test]
    fn transport_and_decode_errors_get_generic_retry() {
        let b = ErrorBanner::from(&QueryError::network("connection reset"));
        assert_eq!(b.kind, BannerKind::Network);
        assert_eq!(b.message, RETRY_MESSAGE);
        let b = ErrorBanner::from(&QueryError::decode("bad magic"));
        assert_eq!(b.kind, BannerKind::Decode);
        assert_eq!(b.message, RETRY_MESSAGE);
    }

    #[test]
    fn validation_errors_keep_domain_message() {
        let b = ErrorBanner::from(&QueryError::validation(UNSUPPORTED_QUESTION));
        assert_eq!(b.kind, BannerKind::Validation);
        assert_eq!(b.message, UNSUPPORTED_QUESTION);
    }
}
