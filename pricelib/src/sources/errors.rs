#[derive(Debug)]
pub enum SourceError {
    Timeout(std::time::Duration),
    Request(reqwest::Error),
    Status(reqwest::StatusCode),
    Malformed(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SourceError::Timeout(duration) => {
                write!(f, "SourceError: request timed out after {:?}", duration)
            }
            SourceError::Request(err) => write!(f, "SourceError: request failed: {}", err),
            SourceError::Status(status) => {
                write!(f, "SourceError: received non-success status code: {}", status)
            }
            SourceError::Malformed(message) => {
                write!(f, "SourceError: malformed response body: {}", message)
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Request(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Request(err)
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}
