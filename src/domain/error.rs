//! Domain error types.

/// Top-level error type for fundscore.
#[derive(Debug, thiserror::Error)]
pub enum FundScoreError {
    #[error("data store error: {reason}")]
    Store { reason: String },

    #[error("parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("no data for {key}")]
    NoData { key: String },

    #[error("missing column {column} for fund {code}")]
    MissingColumn { code: String, column: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("http error: {reason}")]
    Http { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FundScoreError {
    /// Shorthand for a missing `{code}_{suffix}` column.
    pub fn missing_column(code: &str, column: impl Into<String>) -> Self {
        FundScoreError::MissingColumn {
            code: code.to_string(),
            column: column.into(),
        }
    }
}

impl From<&FundScoreError> for std::process::ExitCode {
    fn from(err: &FundScoreError) -> Self {
        let code: u8 = match err {
            FundScoreError::Io(_) => 1,
            FundScoreError::ConfigParse { .. } | FundScoreError::ConfigInvalid { .. } => 2,
            FundScoreError::Store { .. } | FundScoreError::Parse { .. } => 3,
            FundScoreError::NoData { .. } | FundScoreError::MissingColumn { .. } => 5,
            FundScoreError::Http { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
