//! Command-line interface for microarray-layout.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **layout**: Embed, order and place the probes of a chip, then report its quality
//! - **evaluate**: Report border length and conflict index of a saved chip
//!
//! ## Usage
//!
//! ```text
//! # Lay out a synthetic 32x32 chip of 25-mers
//! microarray-layout layout --rows 32 --cols 32
//!
//! # Paired probes, centered embeddings, sliding-window refinement
//! microarray-layout layout --layout paired --embedding centered --optimize
//!
//! # Lay out a saved chip and keep the result
//! microarray-layout layout --input chip.json --output placed.json
//!
//! # JSON output for scripting
//! microarray-layout evaluate placed.json --format json
//! ```

use clap::{Parser, Subcommand};

pub mod evaluate;
pub mod layout;

#[derive(Parser)]
#[command(name = "microarray-layout")]
#[command(version)]
#[command(about = "Embed and place probes on in-situ synthesized microarrays")]
#[command(
    long_about = "microarray-layout arranges oligonucleotide probes on a microarray chip.\n\nIt chooses when each probe base is synthesized (the embedding) and where each probe sits on the grid (the placement) so that neighbouring spots differ in as few masked steps as possible. Layout quality is reported as border length and average conflict index."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Embed, order and place the probes of a chip
    Layout(layout::LayoutArgs),

    /// Report the quality of a saved chip layout
    Evaluate(evaluate::EvaluateArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
