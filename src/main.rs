use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::{debug, info};

use cfx_natives_language_server::config::ServerConfig;
use cfx_natives_language_server::logging::init_logger;
use cfx_natives_language_server::lsp::backend::CfxBackend;
use cfx_natives_language_server::natives::catalog::is_valid_game_id;

#[derive(Parser, Debug)]
#[command(name = "cfx-natives-language-server", version)]
#[command(about = "Native completion, hover and signature help for FiveM/RedM resources")]
struct Args {
    /// Stderr log level or filter directive (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr logs
    #[arg(long)]
    no_color: bool,

    /// Do not write a session log file under the user cache directory
    #[arg(long)]
    no_file_logging: bool,

    /// Extra directory containing natives.<game>.json files (repeatable)
    #[arg(long = "natives-dir", value_name = "DIR")]
    natives_dirs: Vec<PathBuf>,

    /// Game assumed when a resource declares none
    #[arg(long, default_value = "gta5")]
    default_game: String,

    /// Communicate over stdin/stdout (the only transport)
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_logging)
        .context("Failed to initialize logging")?;

    if !is_valid_game_id(&args.default_game) {
        anyhow::bail!("Invalid default game {:?}: expected [a-z0-9_]+", args.default_game);
    }

    if !args.stdio {
        debug!("--stdio not given; using stdio anyway");
    }

    let config = ServerConfig {
        default_game: args.default_game,
        natives_dirs: args.natives_dirs,
        ..ServerConfig::default()
    };
    info!(
        "Starting {} {} over stdio",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = LspService::new(|client| CfxBackend::new(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Language server stopped");
    Ok(())
}
