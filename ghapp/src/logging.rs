use tracing_subscriber::EnvFilter;

pub const DEBUG_ENV_VAR: &str = "GITHUB_APP_AUTH_DEBUG";

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Installs the process-wide subscriber. Logs go to stderr, stdout is
/// reserved for command output. `RUST_LOG` takes precedence over `-v`.
///
/// Fails when a subscriber is already installed.
pub fn init(verbose: u8) -> Result<(), InitError> {
    let from_env = std::env::var(DEBUG_ENV_VAR)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose.max(from_env))));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
