// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI surface: `versory <command>`. Every command prints JSON on stdout.

pub mod account;
pub mod books;
pub mod watch;

use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::model::{BookStatus, SortOption};

/// Reading-tracker client.
#[derive(Debug, clap::Parser)]
#[command(name = "versory", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub client: ClientConfig,

    /// Log format (json or text). Logs go to stderr.
    #[arg(long, env = "VERSORY_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Log level or filter directive (trace, debug, info, warn, error).
    #[arg(long, env = "VERSORY_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// Sign in with email and password.
    Login(LoginArgs),
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Clear the stored session.
    Logout,
    /// Show the signed-in user and token expiry.
    Whoami,
    /// List the library, filtered and sorted.
    Library(LibraryArgs),
    /// Show one library entry.
    Book { id: u64 },
    /// Add a book by ISBN (or move it to another shelf).
    Add {
        isbn: String,
        #[arg(long, value_enum, default_value_t = BookStatus::ToRead)]
        status: BookStatus,
    },
    /// Record pages read.
    Progress { id: u64, pages: u32 },
    /// Rate a book 1-5 and mark it finished today.
    Rate { id: u64, rating: u8 },
    /// Remove a book from the library.
    Remove { id: u64 },
    /// Search the catalogue.
    Search { query: String },
    /// Streak, weekly activity and yearly goal.
    Stats,
    /// Keep the session fresh in the background until interrupted.
    Watch,
}

#[derive(Debug, Clone, clap::Args)]
pub struct LoginArgs {
    #[arg(long, env = "VERSORY_EMAIL")]
    pub email: String,
    #[arg(long, env = "VERSORY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long, env = "VERSORY_EMAIL")]
    pub email: String,
    #[arg(long, env = "VERSORY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct LibraryArgs {
    /// Only this shelf.
    #[arg(long, value_enum)]
    pub status: Option<BookStatus>,
    #[arg(long, value_enum, default_value_t = SortOption::DateAddedDesc)]
    pub sort: SortOption,
    /// Case-insensitive title search.
    #[arg(long)]
    pub query: Option<String>,
    /// Genre name (repeatable, any match).
    #[arg(long = "genre")]
    pub genres: Vec<String>,
    /// Author name (repeatable, any match).
    #[arg(long = "author")]
    pub authors: Vec<String>,
    #[arg(long)]
    pub year: Option<i32>,
    /// Minimum rating.
    #[arg(long)]
    pub min_rating: Option<u8>,
    /// Include available filter values in the output.
    #[arg(long)]
    pub facets: bool,
}

/// Run `command` and return its JSON output.
pub async fn dispatch(
    api: &ApiClient,
    config: &ClientConfig,
    command: &Command,
) -> anyhow::Result<Value> {
    match command {
        Command::Login(args) => account::login(api, args).await,
        Command::Register(args) => account::register(api, args).await,
        Command::Logout => account::logout(api).await,
        Command::Whoami => account::whoami(api).await,
        Command::Library(args) => books::library(api, args).await,
        Command::Book { id } => to_json(&api.user_book(*id).await?),
        Command::Add { isbn, status } => books::add(api, isbn, *status).await,
        Command::Progress { id, pages } => to_json(&api.update_progress(*id, *pages).await?),
        Command::Rate { id, rating } => {
            let today = chrono::Local::now().date_naive();
            to_json(&api.rate_book(*id, *rating, today).await?)
        }
        Command::Remove { id } => {
            api.delete_user_book(*id).await?;
            Ok(serde_json::json!({ "removed": id }))
        }
        Command::Search { query } => books::search(api, query).await,
        Command::Stats => books::stats(api, chrono::Local::now().date_naive()).await,
        Command::Watch => watch::run(api, config.refresh_interval()).await,
    }
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
