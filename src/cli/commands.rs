use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tg_redis_session::{RedisSession, Result, Session, SessionOptions};

#[derive(Parser)]
#[command(name = "tg-session")]
#[command(about = "Inspect MTProto sessions stored in Redis")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Show the login state of session "main"
    tg-session --session main show

    # Resolve a cached peer
    tg-session --session main peer --username durov

    # Use a non-default server and options file
    tg-session --url redis://cache:6380/1 --config session.toml --session main show

    # Remove every key of a session
    tg-session --session main delete
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Session name (key namespace)
    #[arg(long, default_value = "main")]
    pub session: String,

    /// Redis URL, overrides the options file
    #[arg(long)]
    pub url: Option<String>,

    /// TOML options file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the stored login state
    Show,

    /// Resolve one cached peer
    Peer {
        /// Peer id
        #[arg(long, conflicts_with_all = ["username", "phone"])]
        id: Option<i64>,

        /// Username, case-insensitive
        #[arg(long, conflicts_with = "phone")]
        username: Option<String>,

        /// Phone number, exact match
        #[arg(long)]
        phone: Option<String>,
    },

    /// Print a stored secret chat
    SecretChat {
        /// Chat id
        id: i32,
    },

    /// Remove every key of the session
    Delete,
}

/// Resolve options from the file, then apply command-line overrides.
pub fn load_options(cli: &Cli) -> anyhow::Result<SessionOptions> {
    let mut options = match &cli.config {
        Some(path) => SessionOptions::from_toml_file(path)?,
        None => SessionOptions::default(),
    };
    if let Some(url) = &cli.url {
        options = options.redis_url(url.clone());
    }
    Ok(options)
}

pub fn open_session(cli: &Cli, options: &SessionOptions) -> Result<RedisSession> {
    RedisSession::open(&cli.session, options, None)
}

pub async fn show(session: &mut RedisSession) -> Result<()> {
    session.load().await?;
    let state = session.state();

    println!("Session {}:", session.name());
    println!("  DC: {}", state.dc_id);
    println!("  Address: {}", display_opt(&state.ip));
    println!("  Port: {}", display_opt(&state.port));
    println!("  Test mode: {}", state.test_mode);
    match &state.auth_key {
        Some(key) => println!("  Auth key: <{} bytes>", key.len()),
        None => println!("  Auth key: -"),
    }
    println!("  API id: {}", display_opt(&state.api_id));
    println!("  User id: {}", display_opt(&state.user_id));
    println!("  Bot: {}", display_opt(&state.is_bot));
    Ok(())
}

pub async fn peer(
    session: &RedisSession,
    id: Option<i64>,
    username: Option<String>,
    phone: Option<String>,
) -> anyhow::Result<()> {
    let found = match (id, username, phone) {
        (Some(id), _, _) => session.get_peer_by_id(id).await?,
        (None, Some(username), _) => session.get_peer_by_username(&username).await?,
        (None, None, Some(phone)) => session.get_peer_by_phone_number(&phone).await?,
        (None, None, None) => anyhow::bail!("one of --id, --username or --phone is required"),
    };

    match found {
        Some(peer) => {
            println!("Peer {}:", peer.id);
            println!("  Kind: {}", peer.kind);
            println!("  Access hash: {}", peer.access_hash);
            if let Some(usernames) = &peer.usernames {
                println!("  Usernames: {}", usernames.join(", "));
            }
            if let Some(phone) = &peer.phone_number {
                println!("  Phone: {}", phone);
            }
        }
        None => println!("Peer not found"),
    }
    Ok(())
}

pub async fn secret_chat(session: &RedisSession, id: i32) -> Result<()> {
    match session.get_secret_chat_by_id(id).await? {
        Some(chat) => {
            println!("Secret chat {}:", chat.id);
            println!("  Admin: {}", chat.is_admin);
            println!("  Layer: {} (MTProto {})", chat.layer, chat.mtproto);
            println!("  Seq in/out: {}/{}", chat.in_seq_no, chat.out_seq_no);
            println!("  Auth key: <{} bytes>", chat.auth_key.len());
            if let Some(ttl) = chat.ttl {
                println!("  TTL: {}s", ttl);
            }
        }
        None => println!("Secret chat not found"),
    }
    Ok(())
}

pub async fn delete(session: &RedisSession) -> Result<()> {
    let removed = session.delete().await?;
    println!("Removed {} keys from session {}", removed, session.name());
    Ok(())
}

fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}
