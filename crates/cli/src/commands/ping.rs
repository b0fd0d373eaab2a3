//! Ping Command

use anyhow::Result;
use bookcheck_e2e::{BookerClient, BookerConfig, BookingApi};
use clap::Args;
use tracing::debug;

use crate::output::{print_error, print_success};

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Booking API base URL (defaults to BASE_URL or the public instance)
    #[arg(long)]
    pub base_url: Option<String>,
}

/// Returns whether the API answered `GET /ping` with 201
pub async fn execute(args: PingArgs) -> Result<bool> {
    let mut config = BookerConfig::from_env()?;
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    let client = BookerClient::new(config)?;
    let base_url = client.config().base_url.clone();

    match client.ping().await {
        Ok(response) if response.status == 201 => {
            print_success(&format!("Booking API is up at {}", base_url));
            Ok(true)
        }
        Ok(response) => {
            debug!(body = %response.body, "unexpected ping body");
            print_error(&format!(
                "Booking API at {} answered HTTP {} (expected 201)",
                base_url, response.status
            ));
            Ok(false)
        }
        Err(e) => {
            print_error(&format!("Cannot reach booking API at {}: {}", base_url, e));
            Ok(false)
        }
    }
}
