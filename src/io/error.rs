use crate::model::error::Error as ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("malformed {format} input at line {line}{}: {details}", field_suffix(.field))]
    Malformed {
        format: String,
        line: usize,
        /// 1-based field (column) number, when the defect is in one field.
        field: Option<usize>,
        details: String,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("frame {index} is out of range for a trajectory of {n_frames} frames")]
    OutOfRange { index: usize, n_frames: usize },

    #[error("the '{format}' source is forward-only and cannot seek")]
    SeekNotSupported { format: String },

    #[error("no topology parser is registered for format '{0}'")]
    UnsupportedTopologyFormat(String),

    #[error("no frame source is registered for format '{0}'")]
    UnsupportedFrameFormat(String),

    #[error("invalid column layout: {0}")]
    InvalidLayout(String),

    #[error("cannot infer a format from '{0}'")]
    UnknownFormat(String),

    #[error("format '{0}' is already registered")]
    DuplicateFormat(String),
}

fn field_suffix(field: &Option<usize>) -> String {
    field.map(|f| format!(", field {f}")).unwrap_or_default()
}

impl Error {
    pub fn malformed(format: &str, line: usize, details: impl Into<String>) -> Self {
        Self::Malformed {
            format: format.to_string(),
            line,
            field: None,
            details: details.into(),
        }
    }

    pub fn malformed_field(
        format: &str,
        line: usize,
        field: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Malformed {
            format: format.to_string(),
            line,
            field: Some(field),
            details: details.into(),
        }
    }

    /// Returns the wrapped model error, if this is one.
    pub fn as_model(&self) -> Option<&ModelError> {
        match self {
            Error::Model(e) => Some(e),
            _ => None,
        }
    }
}
