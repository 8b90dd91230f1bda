//! NSL-KDD Dataset Server binary

use clap::Parser;
use kdd_server::{ServerConfig, run_server};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "HTTP service that splits uploaded NSL-KDD ARFF files into stratified train/validation/test sets"
)]
struct Cli {
    #[command(flatten)]
    server: ServerConfig,

    /// Log filter used when RUST_LOG is not set
    #[arg(
        long,
        env = "LOG_LEVEL",
        default_value = "kdd_server=info,kdd_processing=info,tower_http=info"
    )]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

fn init_logging(level: &str, json_output: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_output {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    run_server(cli.server).await
}
