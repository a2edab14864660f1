use std::path::PathBuf;

use clap::Args;

use crate::cli::layout::print_text_quality;
use crate::cli::OutputFormat;
use crate::core::chip::Chip;
use crate::core::types::ConflictDefinition;
use crate::pipeline::QualityReport;

#[derive(Args)]
pub struct EvaluateArgs {
    /// Chip JSON written by `layout --output`
    #[arg(required = true)]
    pub input: PathBuf,

    /// Conflict index weight tables
    #[arg(long, value_enum, default_value = "default")]
    pub definition: ConflictDefinition,
}

#[allow(clippy::needless_pass_by_value)]
pub fn run(args: EvaluateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let chip = Chip::load(&args.input)?;
    chip.validate_layout()?;

    if verbose {
        eprintln!(
            "Loaded {}: {} probes, {} fixed spots",
            args.input.display(),
            chip.num_probes(),
            chip.num_fixed()
        );
    }

    let quality = QualityReport::measure(&chip, args.definition)?;

    match format {
        OutputFormat::Text => {
            println!("Evaluation: {}", args.input.display());
            println!("{}", "=".repeat(60));
            print_text_quality(&quality);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "input": args.input.display().to_string(),
                "definition": args.definition,
                "quality": quality,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("rows\tcols\tprobes\tplaced_spots\tborder_length\tnormalized_border_length\taverage_conflict_index");
            println!(
                "{}\t{}\t{}\t{}\t{:.0}\t{:.4}\t{:.4}",
                quality.rows,
                quality.cols,
                quality.probes,
                quality.placed_spots,
                quality.border_length,
                quality.normalized_border_length,
                quality.average_conflict_index,
            );
        }
    }

    Ok(())
}
