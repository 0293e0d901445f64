use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "murmur_core=info,murmur_cli=info";

/// Install a global subscriber writing to stderr, filtered by `RUST_LOG`
/// when set. Output on stdout stays clean for `--json` consumers.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
