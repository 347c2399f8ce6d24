#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Csv(csv::Error),
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "StoreError: I/O failure: {}", err),
            StoreError::Csv(err) => write!(f, "StoreError: CSV failure: {}", err),
            StoreError::SchemaMismatch { expected, found } => write!(
                f,
                "StoreError: schema mismatch, expected [{}] but found [{}]",
                expected.join(", "),
                found.join(", ")
            ),
            StoreError::Corrupt(message) => write!(f, "StoreError: corrupt store: {}", message),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::Csv(err)
    }
}
