//! Operator tool. The admin flag can only be changed here, by someone with
//! direct access to the database file.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use bedtime_db::Database;
use bedtime_server::config::Config;

#[derive(Parser)]
#[command(name = "bedtime-admin")]
#[command(about = "Operator commands for the bedtime story server")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, env = "BEDTIME_DB_PATH", default_value = "bedtime.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Give a user admin rights (they must have saved parent settings)")]
    GrantAdmin { user_id: String },

    #[command(about = "Remove a user's admin rights")]
    RevokeAdmin { user_id: String },

    #[command(about = "Mint a bearer token for local development")]
    Token {
        user_id: String,

        #[arg(long, default_value_t = 24, help = "Lifetime in hours")]
        hours: i64,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bedtime=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::GrantAdmin { user_id } => set_admin(&cli.db, &user_id, true),
        Commands::RevokeAdmin { user_id } => set_admin(&cli.db, &user_id, false),
        Commands::Token { user_id, hours } => {
            let token = Config::from_env()?
                .jwt()
                .issue(&user_id, chrono::Duration::hours(hours))?;
            println!("{token}");
            Ok(())
        }
    }
}

fn set_admin(db_path: &Path, user_id: &str, is_admin: bool) -> Result<()> {
    let db = Database::open(db_path)?;
    if !db.set_admin(user_id, is_admin)? {
        bail!("no parent settings for user '{}'; they must save settings first", user_id);
    }

    println!(
        "{} is {} an admin",
        user_id,
        if is_admin { "now" } else { "no longer" }
    );
    Ok(())
}
