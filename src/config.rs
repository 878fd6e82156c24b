use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::error::{DeskError, Result};
use crate::money::AmountMatcher;

pub const DEFAULT_FT_API_URL: &str = "https://ftassetmanagement.com/api";

#[derive(Parser, Debug)]
#[command(name = "ft-desk", version, about = "Operator desk for the FT settlement API")]
pub struct AppConfig {
    /// Base URL of the FT settlement API
    #[clap(long, env, default_value = DEFAULT_FT_API_URL)]
    pub ft_api_url: String,

    #[clap(long, env, hide_env_values = true)]
    pub ft_api_key: Option<String>,

    /// Token sent as `authToken` in confirmations
    #[clap(long, env, hide_env_values = true)]
    pub ft_auth_token: Option<String>,

    /// Account whose reservations are watched and confirmed
    #[clap(long, env)]
    pub account_number: Option<String>,

    #[clap(long, env, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Remember issued confirmations across runs
    #[clap(long, env)]
    pub redis_url: Option<String>,

    //Bot Token
    #[clap(long, env, hide_env_values = true)]
    pub teloxide_token: Option<String>,

    #[clap(long, env)]
    pub telegram_chat_id: Option<i64>,

    #[command(subcommand)]
    pub task: Task,
}

#[derive(Subcommand, Debug)]
pub enum Task {
    /// Show pending reservations for the account
    Reservations,
    /// Dump the receiving feed
    Receiving,
    /// Look for a target amount in reservations and the receiving feed
    Scan(MatchArgs),
    /// Confirm a pending reservation
    Confirm(ConfirmArgs),
    /// Poll reservations on an interval
    Monitor(MonitorArgs),
    /// Format an amount the way the desk prints it
    Format(FormatArgs),
    /// Run the mock banking REST API
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MatchArgs {
    #[arg(long, default_value = "1000000")]
    pub target: Decimal,

    #[arg(long, default_value = "10000")]
    pub tolerance: Decimal,
}

impl MatchArgs {
    pub fn matcher(&self) -> AmountMatcher {
        AmountMatcher::new(self.target, self.tolerance)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConfirmArgs {
    /// Confirm this reservation code instead of matching by amount
    #[arg(long)]
    pub res_code: Option<String>,

    #[command(flatten)]
    pub matching: MatchArgs,

    /// Build and print the confirmation without sending it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    #[arg(long, env = "MONITOR_INTERVAL_SECS", default_value_t = 60)]
    pub interval_secs: u64,

    #[command(flatten)]
    pub matching: MatchArgs,

    /// Confirm matching reservations as soon as they appear
    #[arg(long, default_value_t = false)]
    pub auto_confirm: bool,

    /// Stop after this many ticks
    #[arg(long)]
    pub max_ticks: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    pub amount: String,

    #[arg(default_value = "USD")]
    pub currency: String,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env, default_value_t = 5000)]
    pub server_port: u16,

    #[arg(long, env, hide_env_values = true)]
    pub client_token: String,

    #[arg(long, env, hide_env_values = true)]
    pub admin_token: String,

    /// Password shared by the seeded demo users
    #[arg(long, env, hide_env_values = true)]
    pub demo_password: String,
}

/// Settings every FT API subcommand needs.
#[derive(Debug, Clone)]
pub struct FtSettings {
    pub url: String,
    pub api_key: String,
    pub auth_token: String,
    pub account_number: String,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn ft_settings(&self) -> Result<FtSettings> {
        let api_key = required(&self.ft_api_key, "FT_API_KEY")?;
        let account_number = required(&self.account_number, "ACCOUNT_NUMBER")?;
        // Only confirmations use the token; read-only commands may go without it.
        let auth_token = self.ft_auth_token.clone().unwrap_or_default();
        Ok(FtSettings {
            url: self.ft_api_url.clone(),
            api_key,
            auth_token,
            account_number,
            timeout: Duration::from_secs(self.http_timeout_secs),
        })
    }
}

impl FtSettings {
    pub fn require_auth_token(&self) -> Result<()> {
        if self.auth_token.trim().is_empty() {
            return Err(DeskError::MissingSetting("FT_AUTH_TOKEN"));
        }
        Ok(())
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DeskError::MissingSetting(name)),
    }
}
