//! # microarray-layout
//!
//! A library for designing the physical layout of oligonucleotide microarrays
//! built by light-directed synthesis.
//!
//! Every probe is synthesized by a shared deposition sequence: each step adds
//! one nucleotide to the unmasked spots of the chip. A layout has to decide
//! *when* each probe base is added (the embedding) and *where* each probe sits
//! on the grid (the placement). Neighbouring spots whose embeddings disagree
//! at a step are separated by a mask border there, which lets stray light
//! reach the wrong spot.
//!
//! `microarray-layout` computes embeddings that line up with their neighbours
//! and places probes so that similar embeddings end up close together.
//!
//! ## Features
//!
//! - **Bit-level embeddings**: left-most, right-most, centered and
//!   pivot-relative strategies over arbitrary deposition sequences
//! - **SNP pair synchronization**: mates share every step outside their mismatch
//! - **Paired layouts**: perfect-match/mismatch probes on stacked rows
//! - **QAP placement**: regions solved as quadratic assignment problems with a
//!   seeded GRASP solver, or any external [`QapSolver`]
//! - **Sliding-window refinement**: re-solves small windows of a finished layout
//! - **Quality measures**: border length and conflict index
//!
//! ## Example
//!
//! ```rust,no_run
//! use microarray_layout::{generate_chip, run_pipeline, GeneratorConfig, PipelineConfig};
//!
//! // A synthetic 32x32 chip of 25-mers
//! let mut chip = generate_chip(&GeneratorConfig {
//!     rows: 32,
//!     cols: 32,
//!     ..GeneratorConfig::default()
//! })
//! .unwrap();
//!
//! let report = run_pipeline(&mut chip, &PipelineConfig::default()).unwrap();
//! println!(
//!     "border length {:.0}, average conflict index {:.2}",
//!     report.quality.border_length, report.quality.average_conflict_index
//! );
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Deposition sequences, embeddings, chips, regions and quality measures
//! - [`embed`]: Embedding strategies
//! - [`ordering`]: Probe orderings applied before placement
//! - [`placement`]: QAP formulation, solvers, fillers and the sliding-window optimizer
//! - [`pipeline`]: End-to-end layout runs
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod embed;
pub mod ordering;
pub mod pipeline;
pub mod placement;

// Re-export commonly used types for convenience
pub use core::chip::Chip;
pub use core::deposition::DepositionSequence;
pub use core::embedding::BitEmbedding;
pub use core::error::{LayoutError, Result};
pub use core::generator::{generate_chip, GeneratorConfig};
pub use core::region::{RectangularRegion, Region};
pub use core::types::*;
pub use embed::ProbeEmbedder;
pub use ordering::ProbeOrdering;
pub use pipeline::{run_pipeline, PipelineConfig, PipelineReport, QualityReport};
pub use placement::{QapPlacer, QapSolver, RegionFiller, SlidingWindowOptimizer};
