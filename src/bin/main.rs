use ancestry_predict::cli::{self, Args};
use ancestry_predict::error::Result;
use clap::Parser;
use miette::IntoDiagnostic;

fn try_main() -> Result<()> {
    let args = Args::parse();
    cli::init_logger(args.verbose);
    cli::run(&args)
}

fn main() -> miette::Result<()> {
    try_main().into_diagnostic()
}
