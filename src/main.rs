use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod embed;
mod ordering;
mod pipeline;
mod placement;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("microarray_layout=debug,info")
    } else {
        EnvFilter::new("microarray_layout=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Layout(args) => {
            cli::layout::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Evaluate(args) => {
            cli::evaluate::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
