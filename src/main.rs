// edgefx headless runner: feeds image files through one filter instance as
// consecutive frames and writes the filtered frames back to disk.
#![allow(clippy::too_many_arguments)]

mod cli;
pub mod logger;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();

    // Initialize session log (overwrites previous session log)
    logger::init(args.verbose);
    if args.verbose
        && let Some(path) = logger::log_path()
    {
        eprintln!("session log: {}", path.display());
    }
    log::debug!("arguments: {:?}", args);

    let code = cli::run(args);
    log::logger().flush();
    code
}
