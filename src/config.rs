use clap::Parser;

/// 起動設定。引数が無ければ環境変数、次に既定値を使う。
#[derive(Debug, Clone, Parser)]
#[command(name = "perpustakaan-console")]
#[command(about = "Library admin console (books & categories) as an MCP server", long_about = None)]
pub struct Config {
    /// Base URL of the library REST API (resources live under /buku and /kategori)
    #[arg(long, default_value = "http://localhost:8000/api", env = "PERPUSTAKAAN_API_URL")]
    pub api_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}
