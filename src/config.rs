use clap::Parser;
use std::path::PathBuf;

/// Ten years.
pub const MAX_SESSION_LIFETIME: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Parser, Clone, Debug)]
#[command(
    name = "catalog-auth",
    rename_all = "kebab-case",
    rename_all_env = "screaming-snake"
)]
pub struct Settings {
    #[arg(short = 'M', long, env, default_value = "mongodb://localhost:27017")]
    pub mongo_url: String,
    #[arg(long, env, default_value = "simple")]
    pub mongo_database: String,
    #[arg(short = 'R', long, env, default_value = "redis://localhost:6379")]
    pub redis_url: String,

    #[arg(long, env)]
    pub argon_secret: String,
    #[arg(long, env)]
    pub argon_iterations: Option<u32>,
    #[arg(long, env)]
    pub argon_memory_size: Option<u32>,

    /// Seconds a session stays alive without activity.
    #[arg(
        short,
        long,
        env,
        value_parser = clap::value_parser!(i64).range(1..=MAX_SESSION_LIFETIME)
    )]
    pub session_lifetime: Option<i64>,
    #[arg(long, env)]
    pub cookie_secure: bool,

    /// Directory holding the rolling `.hash` and `.key` files.
    #[arg(long, env, default_value = ".")]
    pub key_dir: PathBuf,
    #[arg(
        long,
        env,
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub key_rotation_secs: u64,
}

impl Settings {
    /// Reads `.env` when there is one, then the arguments and environment.
    pub fn load() -> anyhow::Result<Self> {
        if dotenv::dotenv().is_err() {
            tracing::warn!("did not find .env file in current working directory");
        }
        Ok(Self::try_parse()?)
    }
}
