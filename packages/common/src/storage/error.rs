use std::fmt;

/// Failure reading or writing a blob in the public directory.
#[derive(Debug)]
pub enum StorageError {
    /// Name would escape the public directory or is otherwise unusable.
    InvalidName(String),
    /// Upload larger than the configured per-file limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    Io(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(reason) => write!(f, "unusable blob name: {reason}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "upload of {actual} bytes is over the {limit} byte limit")
            }
            Self::Io(err) => write!(f, "public directory I/O failed: {err}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Io(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
