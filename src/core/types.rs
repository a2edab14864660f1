use serde::{Deserialize, Serialize};

/// Index of a probe in the chip's probe list
pub type ProbeId = usize;

/// Scan direction over the synthesis steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From step 0 towards the last step
    Forward,
    /// From the last step towards step 0
    Backward,
}

/// How the layout layer arranges probes on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// One probe per spot
    Single,
    /// Perfect-match/mismatch pairs occupying two rows
    Paired,
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Paired => write!(f, "paired"),
        }
    }
}

/// Quality measure that placement tries to minimize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ConflictMode {
    /// Count of differing synthesis steps between orthogonal neighbours
    #[default]
    BorderLength,
    /// Distance- and position-weighted conflicts within a 7x7 neighbourhood
    ConflictIndex,
}

impl std::fmt::Display for ConflictMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BorderLength => write!(f, "border length"),
            Self::ConflictIndex => write!(f, "conflict index"),
        }
    }
}

/// Weight tables used by the conflict index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDefinition {
    /// Inverse squared distance, exponential position weight
    #[default]
    Default,
    /// Hand-tuned sparse distance table
    Simplified,
    /// Orthogonal neighbours only, constant position weight
    BorderLengthEquivalent,
}

/// Embedding strategy selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingKind {
    #[default]
    LeftMost,
    RightMost,
    Centered,
    Pivot,
    SnpLeftMost,
    SnpRightMost,
}

/// Probe ordering selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OrderingKind {
    /// Keep the probe list as given
    None,
    /// Lexicographic order over embedding bitmaps
    #[default]
    Embeddings,
    /// Numeric rank of the raw sequences
    Sequences,
}

/// Initial placement algorithm selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    /// Quadratic assignment over the whole chip
    #[default]
    Qap,
    /// Probes in list order, down each column
    Sequential,
    /// Probes on shuffled spots
    Random,
}

/// QAP solver selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Seeded GRASP over spot and probe distances
    #[default]
    Grasp,
    /// GRASP with the two matrices exchanged, its permutation inverted
    SwappedGrasp,
    /// Keeps the probe order, slot by slot
    Identity,
}
