use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::error::Result;
use crate::money::AmountMatcher;
use crate::report::{describe_outcome, reservation_line};
use crate::services::reservation_service::{ConfirmationOutcome, ReservationService, Selector};
use crate::services::telegram_service::TelegramService;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub matcher: AmountMatcher,
    pub auto_confirm: bool,
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub pending: usize,
    pub new_codes: Vec<String>,
    pub matched: Vec<String>,
    pub confirmed: Vec<String>,
    /// Auto-confirm failures, one line per reservation.
    pub errors: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MonitorReport {
    pub ticks: u64,
    pub failed_ticks: u64,
    pub confirmed: Vec<String>,
}

/// Polls the reservation endpoint on a fixed interval. A tick runs to
/// completion before the next one starts.
pub struct MonitorService {
    reservation_service: ReservationService,
    telegram_service: Option<TelegramService>,
    settings: MonitorSettings,
    seen: HashSet<String>,
    alerted: HashSet<String>,
}

impl MonitorService {
    pub fn new(
        reservation_service: ReservationService,
        telegram_service: Option<TelegramService>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            reservation_service,
            telegram_service,
            settings,
            seen: HashSet::new(),
            alerted: HashSet::new(),
        }
    }

    pub async fn run<F>(mut self, shutdown: F) -> MonitorReport
    where
        F: Future<Output = ()>,
    {
        let mut report = MonitorReport::default();
        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            "Monitoring account {} every {:?}",
            self.reservation_service.account_number(),
            self.settings.interval
        );
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping monitor");
                    break;
                }
                _ = interval.tick() => {}
            }

            report.ticks += 1;
            match self.tick().await {
                Ok(tick) => {
                    if !tick.errors.is_empty() {
                        report.failed_ticks += 1;
                    }
                    report.confirmed.extend(tick.confirmed);
                }
                Err(e) => {
                    report.failed_ticks += 1;
                    warn!("Monitor tick failed: {}", e);
                }
            }

            if matches!(self.settings.max_ticks, Some(max) if report.ticks >= max) {
                break;
            }
        }
        report
    }

    pub async fn tick(&mut self) -> Result<TickReport> {
        let pending = self.reservation_service.pending().await?;
        let mut tick = TickReport {
            pending: pending.len(),
            ..TickReport::default()
        };

        for reservation in &pending {
            if self.seen.insert(reservation.res_code.clone()) {
                info!("New reservation {}", reservation_line(reservation));
                tick.new_codes.push(reservation.res_code.clone());
            }
            if !self.settings.matcher.matches_text(&reservation.amount) {
                continue;
            }
            tick.matched.push(reservation.res_code.clone());
            if !self.alerted.insert(reservation.res_code.clone()) {
                continue;
            }

            self.notify(&format!("Target amount pending: {}", reservation_line(reservation)))
                .await;
            if self.settings.auto_confirm {
                let selector = Selector::ResCode(reservation.res_code.clone());
                let outcome = match self.reservation_service.confirm(&selector, false).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Auto-confirm of {} failed: {}", reservation.res_code, e);
                        // alert and retry next tick
                        self.alerted.remove(&reservation.res_code);
                        tick.errors.push(format!("{}: {}", reservation.res_code, e));
                        continue;
                    }
                };
                if let ConfirmationOutcome::Confirmed { request, .. } = &outcome {
                    tick.confirmed.push(request.res_code.clone());
                }
                self.notify(&describe_outcome(&outcome)).await;
            }
        }
        Ok(tick)
    }

    async fn notify(&self, text: &str) {
        info!("{}", text);
        if let Some(telegram) = &self.telegram_service {
            if let Err(e) = telegram.notify(text).await {
                warn!("Could not forward alert to Telegram: {}", e);
            }
        }
    }
}
