use clap::Parser;

use perpustakaan_console::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level, config.json_logs);

    tracing::info!(
        api_url = %config.api_url,
        "starting perpustakaan-console v{}",
        env!("CARGO_PKG_VERSION")
    );

    perpustakaan_console::interface::mcp::run(config).await
}

/// stdoutはMCPトランスポートなので、ログはstderrへ出す。
fn init_logging(level: &str, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = if json {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
