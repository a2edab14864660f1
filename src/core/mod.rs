//! Core data types for microarray layout.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`DepositionSequence`]: The cyclic series of nucleotide additions
//! - [`BitEmbedding`]: Which synthesis steps produce a probe's bases
//! - [`Chip`]: Grid geometry, probe sequences, embeddings and occupancy
//! - [`ProbeLayout`]: Single-probe vs perfect-match/mismatch pair layouts
//! - [`RectangularRegion`], [`Region`]: Windows of the grid
//! - [`LayoutError`]: Error taxonomy shared by all layers
//!
//! ## Embeddings
//!
//! With deposition sequence `ACGTACGT` the probe `ACG` can be embedded as
//!
//! | Step        | A | C | G | T | A | C | G | T |
//! |-------------|---|---|---|---|---|---|---|---|
//! | left-most   | 1 | 1 | 1 | 0 | 0 | 0 | 0 | 0 |
//! | right-most  | 0 | 0 | 0 | 0 | 1 | 1 | 1 | 0 |
//!
//! Every valid embedding reproduces the probe when reading the deposition
//! symbols at its set steps.

pub mod chip;
pub mod deposition;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod generator;
pub mod layout;
pub mod region;
pub mod types;

pub use chip::Chip;
pub use deposition::DepositionSequence;
pub use embedding::BitEmbedding;
pub use error::{LayoutError, Result};
pub use layout::ProbeLayout;
pub use region::{RectangularRegion, Region};
