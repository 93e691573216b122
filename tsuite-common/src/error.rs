use thiserror::Error;

/// Main error type for TSuite
#[derive(Error, Debug)]
pub enum TsuiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure or non-2xx answer while fetching a document
    #[error("Fetch error for {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    /// The document parsed but does not have the expected shape
    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TsuiteError {
    pub fn fetch(source_name: impl Into<String>, reason: impl ToString) -> Self {
        TsuiteError::Fetch {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable code used in API error bodies and placeholders.
    pub fn code(&self) -> &'static str {
        match self {
            TsuiteError::Io(_) => "io",
            TsuiteError::Fetch { .. } => "fetch",
            TsuiteError::MalformedData(_) => "malformed_data",
            TsuiteError::InvalidColor(_) => "invalid_color",
            TsuiteError::NotFound(_) => "not_found",
            TsuiteError::Config(_) => "config",
            TsuiteError::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for TsuiteError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_io() {
            TsuiteError::Io(error.into())
        } else {
            TsuiteError::MalformedData(error.to_string())
        }
    }
}

impl From<toml::de::Error> for TsuiteError {
    fn from(error: toml::de::Error) -> Self {
        TsuiteError::Config(error.to_string())
    }
}

impl From<toml::ser::Error> for TsuiteError {
    fn from(error: toml::ser::Error) -> Self {
        TsuiteError::Serialization(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TsuiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_malformed_data() {
        let err: TsuiteError = serde_json::from_str::<Vec<u32>>("{not json").unwrap_err().into();
        assert!(matches!(err, TsuiteError::MalformedData(_)));
        assert_eq!(err.code(), "malformed_data");
    }

    #[test]
    fn test_fetch_error_display() {
        let err = TsuiteError::fetch("http://localhost/data", "status 503");
        assert_eq!(err.to_string(), "Fetch error for http://localhost/data: status 503");
    }
}
