// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use versory::command::{self, Cli};
use versory::error::ApiError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.client.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&cli);

    match run(&cli).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            if let Some(api_err) = e.downcast_ref::<ApiError>() {
                let body = serde_json::to_string(&api_err.to_error_body()).unwrap_or_default();
                eprintln!("{body}");
            } else {
                error!("fatal: {e:#}");
            }
            std::process::exit(1);
        }
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    match cli.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<serde_json::Value> {
    let api = versory::connect(&cli.client).await?;
    command::dispatch(&api, &cli.client, &cli.command).await
}
