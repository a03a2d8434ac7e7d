// Error types for the Ada client.
//
// Every call against the service either succeeds with the status code it
// expects or produces an `AdaError`. The library never exits the process;
// the binary decides what to do with the error (it logs and exits 255).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The remote call that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Login,
    Upload,
    Trigger,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Call::Login => "login",
            Call::Upload => "upload",
            Call::Trigger => "trigger",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AdaError {
    /// The server answered with a status code other than the one the call expects.
    #[error("{call} failed with unexpected status code {status}: {body}")]
    UnexpectedStatus { call: Call, status: u16, body: String },

    /// The file to upload could not be opened.
    #[error("failed to open upload file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Connection refused, timeout, or any other failure below HTTP.
    #[error("{call} request could not be sent: {source}")]
    Transport {
        call: Call,
        #[source]
        source: reqwest::Error,
    },

    /// A success response whose body is not the JSON we expect.
    #[error("{call} response could not be decoded: {source}")]
    Decode {
        call: Call,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AdaError {
    /// Which remote call failed, if the error came from one.
    pub fn call(&self) -> Option<Call> {
        match self {
            AdaError::UnexpectedStatus { call, .. }
            | AdaError::Transport { call, .. }
            | AdaError::Decode { call, .. } => Some(*call),
            AdaError::File { .. } => Some(Call::Upload),
            AdaError::Client(_) | AdaError::Config(_) => None,
        }
    }
}

/// Returned when a string is neither `load` nor `difference`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("trigger action may only take the value \"load\" or \"difference\", got {0:?}")]
pub struct ParseTriggerActionError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_message_carries_call_status_and_body() {
        let err = AdaError::UnexpectedStatus {
            call: Call::Login,
            status: 401,
            body: "bad credentials".into(),
        };
        assert_eq!(
            err.to_string(),
            "login failed with unexpected status code 401: bad credentials"
        );
        assert_eq!(err.call(), Some(Call::Login));
    }

    #[test]
    fn file_error_is_attributed_to_upload() {
        let err = AdaError::File {
            path: PathBuf::from("missing.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("missing.csv"));
        assert_eq!(err.call(), Some(Call::Upload));
        assert_eq!(AdaError::Config("x".into()).call(), None);
    }
}
