use clap::Parser;

use paintr::cli;
use paintr::logger;

fn main() -> std::process::ExitCode {
    // Session log overwrites the previous session's file
    logger::init();

    let args = cli::CliArgs::parse();
    if args.verbose {
        if let Some(path) = logger::log_path() {
            println!("session log: {}", path.display());
        }
    }
    cli::run(args)
}
