use clap::Parser;
use counsel_gateway::cli::{ Args, Command };
use counsel_gateway::client::terminal;
use dotenv::dotenv;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    let args = Args::parse();
    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match args.command {
        None | Some(Command::Serve) => {
            let code = counsel_gateway::run(args.gateway).await?;
            std::process::exit(code);
        }
        Some(Command::Chat(chat)) => terminal::run(chat).await,
    }
}
