use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use futures_util::future::try_join;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ft_desk::config::{AppConfig, ConfirmArgs, FormatArgs, MatchArgs, MonitorArgs, Task};
use ft_desk::controllers;
use ft_desk::money::{format_currency, parse_amount};
use ft_desk::report::{describe_mentions, describe_outcome, describe_status, reservation_line};
use ft_desk::repositories::ft_repository::FtRepository;
use ft_desk::repositories::ledger::ConfirmationLedger;
use ft_desk::services::monitor_service::{MonitorService, MonitorSettings};
use ft_desk::services::reservation_service::{ConfirmationOutcome, ReservationService, Selector};
use ft_desk::services::telegram_service::TelegramService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let app_config = AppConfig::parse();

    match &app_config.task {
        Task::Format(args) => format_amount(args),
        Task::Serve(args) => controllers::server::serve(args.clone()).await,
        Task::Reservations => {
            let service = reservation_service(&app_config).await?;
            let status = service.status().await.context("Reservation lookup failed")?;
            println!("{}", describe_status(service.account_number(), &status));
            Ok(())
        }
        Task::Receiving => {
            let service = reservation_service(&app_config).await?;
            let feed = service.receiving().await.context("Receiving lookup failed")?;
            println!("{}", serde_json::to_string_pretty(&feed)?);
            Ok(())
        }
        Task::Scan(args) => scan(&app_config, args).await,
        Task::Confirm(args) => confirm(&app_config, args).await,
        Task::Monitor(args) => monitor(&app_config, args).await,
    }
}

async fn reservation_service(app_config: &AppConfig) -> anyhow::Result<ReservationService> {
    let settings = app_config.ft_settings()?;
    let ft_repository = FtRepository::new(&settings.url, &settings.api_key, settings.timeout)?;
    let ledger = ConfirmationLedger::connect(app_config.redis_url.as_deref())
        .await
        .context("Could not connect to redis")?;
    Ok(ReservationService::new(
        ft_repository,
        ledger,
        &settings.account_number,
        &settings.auth_token,
    ))
}

fn format_amount(args: &FormatArgs) -> anyhow::Result<()> {
    let amount = parse_amount(&args.amount)?;
    println!("{}", format_currency(amount, &args.currency));
    Ok(())
}

async fn scan(app_config: &AppConfig, args: &MatchArgs) -> anyhow::Result<()> {
    let service = reservation_service(app_config).await?;
    let matcher = args.matcher();
    let (pending, mentions) = try_join(service.pending(), service.scan_receiving(&matcher))
        .await
        .context("Scan failed")?;

    let matching: Vec<_> = pending
        .iter()
        .filter(|r| matcher.matches_text(&r.amount))
        .collect();
    if matching.is_empty() {
        println!(
            "No pending reservation near {}",
            format_currency(matcher.target, "")
        );
    }
    for reservation in matching {
        println!("Pending: {}", reservation_line(reservation));
    }
    println!("{}", describe_mentions(&mentions));
    Ok(())
}

async fn confirm(app_config: &AppConfig, args: &ConfirmArgs) -> anyhow::Result<()> {
    if !args.dry_run {
        app_config.ft_settings()?.require_auth_token()?;
    }
    let service = reservation_service(app_config).await?;
    let selector = match &args.res_code {
        Some(code) => Selector::ResCode(code.clone()),
        None => Selector::Amount(args.matching.matcher()),
    };

    let outcome = service
        .confirm(&selector, args.dry_run)
        .await
        .context("Confirmation failed")?;
    println!("{}", describe_outcome(&outcome));
    if let ConfirmationOutcome::NotFound { .. } = outcome {
        bail!("No pending reservation matched");
    }
    Ok(())
}

async fn monitor(app_config: &AppConfig, args: &MonitorArgs) -> anyhow::Result<()> {
    if args.auto_confirm {
        app_config.ft_settings()?.require_auth_token()?;
    }
    let service = reservation_service(app_config).await?;
    let matcher = args.matching.matcher();

    let telegram_service = app_config.teloxide_token.as_deref().map(|token| {
        TelegramService::new(token, app_config.telegram_chat_id, service.clone(), matcher)
    });
    if let Some(telegram) = telegram_service.clone() {
        tokio::spawn(async move {
            telegram.listen_and_reply().await;
        });
    } else {
        info!("TELOXIDE_TOKEN not set, alerts go to the log only");
    }

    let settings = MonitorSettings {
        interval: Duration::from_secs(args.interval_secs.max(1)),
        matcher,
        auto_confirm: args.auto_confirm,
        max_ticks: args.max_ticks,
    };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Could not listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let report = MonitorService::new(service, telegram_service, settings)
        .run(shutdown)
        .await;
    info!(
        "Monitor finished after {} tick(s), {} failed, confirmed {:?}",
        report.ticks, report.failed_ticks, report.confirmed
    );
    Ok(())
}
