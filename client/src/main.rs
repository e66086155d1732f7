use clap::Parser;
use client::network::Client;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:9999")]
    server: String,

    /// Join with this name immediately instead of typing "join"
    #[arg(short, long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    info!("connecting to {}", args.server);

    let mut client = Client::new(&args.server).await?;
    client.run(args.name).await?;

    Ok(())
}
