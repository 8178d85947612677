use reqwest::StatusCode;

/// The only message a failed lookup ever shows to the user.
pub const LOCATION_NOT_FOUND: &str = "Location Not Found";

/// Outcome of a failed geocoding or forecast call.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The request pair was cancelled. Not a failure.
    #[error("request cancelled")]
    Cancelled,

    #[error("no geocoding results for '{0}'")]
    NotFound(String),

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

impl LookupError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LookupError::Cancelled)
    }

    /// Collapse every failure into the single user-visible message.
    ///
    /// Returns `None` for [`LookupError::Cancelled`], which must stay silent.
    pub fn user_message(&self) -> Option<&'static str> {
        if self.is_cancelled() {
            None
        } else {
            Some(LOCATION_NOT_FOUND)
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_has_no_user_message() {
        assert!(LookupError::Cancelled.is_cancelled());
        assert_eq!(LookupError::Cancelled.user_message(), None);
    }

    #[test]
    fn failures_collapse_to_location_not_found() {
        let errors = [
            LookupError::NotFound("zzzzz".into()),
            LookupError::Parse("bad json".into()),
            LookupError::Status {
                endpoint: "forecast",
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "oops".into(),
            },
        ];

        for err in &errors {
            assert_eq!(err.user_message(), Some(LOCATION_NOT_FOUND));
        }
    }

    #[test]
    fn status_error_mentions_endpoint_and_status() {
        let err = LookupError::Status {
            endpoint: "geocoding",
            status: StatusCode::BAD_GATEWAY,
            body: "upstream".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("geocoding"));
        assert!(msg.contains("502"));
    }
}
