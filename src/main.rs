use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use credsift::app::App;
use credsift::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::from_args();
    init_tracing(&cli);

    match App::run(&cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(code.clamp(1, 255) as u8),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the `--verbose` level.
fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("credsift={}", cli.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.is_trace())
        .init();
}
