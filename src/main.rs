#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::env;

use afc_dl::cli::{Command, parse_args, print_usage, run};

#[tokio::main]
async fn main() -> afc_dl::Result<()> {
    // Respects RUST_LOG (default: info)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    match parse_args(env::args().skip(1)) {
        Ok(Command::Run(args)) => run(args).await,
        Ok(Command::Help) => {
            print_usage();
            Ok(())
        }
        Err(message) => {
            eprintln!("Error: {message}");
            print_usage();
            std::process::exit(2);
        }
    }
}
