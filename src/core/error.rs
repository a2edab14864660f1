use thiserror::Error;

use crate::core::types::ProbeId;

/// Errors raised by the embedding, ordering and placement layers.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("{strategy} does not support {layout} probe layouts")]
    UnsupportedProbeLayout {
        strategy: &'static str,
        layout: &'static str,
    },

    #[error("Region must be a non-empty rectangle")]
    UnsupportedRegionShape,

    #[error("Index {index} is out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Optimizer is busy with another pass")]
    EngineBusy,

    #[error("Solver output is not a permutation of {dim} slots")]
    InvalidPermutation { dim: usize },

    #[error("Unable to embed probe {probe}: {reason}")]
    Unembeddable { probe: ProbeId, reason: String },

    #[error("Invalid chip: {0}")]
    InvalidChip(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read or write chip: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse chip: {0}")]
    Json(#[from] serde_json::Error),
}

impl LayoutError {
    /// Shorthand for a bounds failure.
    #[must_use]
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    pub(crate) fn unembeddable(probe: ProbeId, reason: impl Into<String>) -> Self {
        Self::Unembeddable {
            probe,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LayoutError::out_of_range(40, 32);
        assert_eq!(err.to_string(), "Index 40 is out of range (length 32)");

        let err = LayoutError::UnsupportedProbeLayout {
            strategy: "PivotEmbedding",
            layout: "paired",
        };
        assert!(err.to_string().contains("paired"));
    }
}
