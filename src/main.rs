use clap::Parser;
use levelup::cli::commands::Cli;
use levelup::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays clean for command output and --json.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "levelup=info",
        _ => "levelup=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
