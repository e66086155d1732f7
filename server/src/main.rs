use clap::Parser;
use server::engine::EngineConfig;
use server::network::{Server, ServerConfig, ServerError};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "9999")]
    port: u16,

    /// Receive wait per loop iteration, in milliseconds
    #[arg(long, default_value = "1000")]
    recv_timeout_ms: u64,

    /// Receive buffer size in bytes
    #[arg(long, default_value = "64")]
    recv_buffer: usize,

    /// Seconds of silence before an idle session is evicted
    #[arg(long, default_value = "300")]
    idle_timeout: u64,

    /// Seconds of silence before an in-game session is evicted
    #[arg(long, default_value = "30")]
    game_timeout: u64,

    /// Seconds between a game ending and its board being reset
    #[arg(long, default_value = "2")]
    grace_period: u64,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        recv_timeout: Duration::from_millis(args.recv_timeout_ms),
        recv_buffer: args.recv_buffer,
        engine: EngineConfig {
            idle_timeout_secs: args.idle_timeout,
            game_timeout_secs: args.game_timeout,
            grace_period_secs: args.grace_period,
        },
    };

    let mut server = Server::new(config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(true);
    });

    server.run(shutdown_rx).await?;
    Ok(())
}
