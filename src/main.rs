mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tg_redis_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let options = cli::load_options(&cli)?;
    let mut session = cli::open_session(&cli, &options)?;

    match cli.command {
        Commands::Show => {
            cli::show(&mut session).await?;
        }
        Commands::Peer { id, username, phone } => {
            cli::peer(&session, id, username, phone).await?;
        }
        Commands::SecretChat { id } => {
            cli::secret_chat(&session, id).await?;
        }
        Commands::Delete => {
            cli::delete(&session).await?;
        }
    }

    Ok(())
}
