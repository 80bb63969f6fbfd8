//! find-link -- link phrases in Wikipedia articles, served over stdio.
//!
//! Usage: find-link [--lang <code>]

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = find_link::server::ServerConfig::default();
    if let Some(language) = std::env::args().skip_while(|a| a != "--lang").nth(1) {
        config.language = language;
    }

    find_link::run_server(&config)
}
