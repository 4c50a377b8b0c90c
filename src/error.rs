use thiserror::Error;

/// Convenience result type used across ingestion, processing and output.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Error type returned by every stage of the pipeline.
///
/// Each variant maps onto one coarse [`ErrorKind`] via [`ProcessingError::kind`], which is what
/// callers at the boundary usually branch on.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook could not be read (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    #[cfg(feature = "excel")]
    /// Workbook could not be written (feature-gated behind `excel`).
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Zip archive could not be assembled.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required column is missing, or a table has an unusable shape.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The input has no data rows.
    #[error("empty input: {message}")]
    EmptyInput { message: String },

    /// Two outputs resolved to the same name and the collision policy forbids overwriting.
    #[error("name collision: output '{name}' would be produced more than once")]
    NameCollision { name: String },

    /// Configuration values are invalid.
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
}

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required column missing or table shape unusable.
    Schema,
    /// Zero usable rows.
    EmptyInput,
    /// Read/write/serialize failure at the boundary.
    Io,
    /// Two outputs share a name.
    NameCollision,
    /// Invalid configuration.
    Config,
}

impl ProcessingError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Csv(_) | Self::Archive(_) => ErrorKind::Io,
            #[cfg(feature = "excel")]
            Self::Excel(_) | Self::Xlsx(_) => ErrorKind::Io,
            Self::Json(_) | Self::InvalidConfig { .. } => ErrorKind::Config,
            Self::SchemaMismatch { .. } => ErrorKind::Schema,
            Self::EmptyInput { .. } => ErrorKind::EmptyInput,
            Self::NameCollision { .. } => ErrorKind::NameCollision,
        }
    }

    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }
}
