use std::path::PathBuf;
use thiserror::Error;

use crate::model::ChartKind;

/// Errors surfaced by the chart pipeline.
///
/// Every variant is caught at the tool boundary and turned into a failure
/// response; none of them crosses [`crate::tools::ToolRegistry::call`].
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("malformed chart input: {reason}")]
    MalformedInput { reason: String },

    #[error("unsupported chart input shape: {found}")]
    UnsupportedInputShape { found: String },

    #[error("invalid {kind} chart: field '{field}' {reason}")]
    SchemaValidation {
        kind: ChartKind,
        field: String,
        reason: String,
    },

    #[error("failed to write artifact '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Raster(#[from] anyhow::Error),
}

impl ChartError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        ChartError::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn schema(kind: ChartKind, field: impl Into<String>, reason: impl Into<String>) -> Self {
        ChartError::SchemaValidation {
            kind,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Missing or empty required field.
    pub fn missing(kind: ChartKind, field: impl Into<String>) -> Self {
        Self::schema(kind, field, "is required and must not be empty")
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
