use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::ft::{AmountMention, ConfirmationRequest, Reservation, ReservationsResponse};
use crate::money::{parse_amount, wire_amount, AmountMatcher};
use crate::repositories::ft_repository::FtRepository;
use crate::repositories::ledger::ConfirmationLedger;

/// Which pending reservation a confirmation is aimed at.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    ResCode(String),
    Amount(AmountMatcher),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationOutcome {
    Confirmed {
        request: ConfirmationRequest,
        response: Value,
    },
    DryRun(ConfirmationRequest),
    AlreadyConfirmed(String),
    NotFound {
        info: Option<String>,
    },
}

/// The discover / match / confirm workflow for one account.
#[derive(Clone)]
pub struct ReservationService {
    ft_repository: FtRepository,
    ledger: ConfirmationLedger,
    // codes POSTed by this process, kept even when the ledger write fails
    issued: Arc<Mutex<HashSet<String>>>,
    account_number: String,
    auth_token: String,
}

impl ReservationService {
    pub fn new(
        ft_repository: FtRepository,
        ledger: ConfirmationLedger,
        account_number: &str,
        auth_token: &str,
    ) -> Self {
        Self {
            ft_repository,
            ledger,
            issued: Arc::new(Mutex::new(HashSet::new())),
            account_number: account_number.to_string(),
            auth_token: auth_token.to_string(),
        }
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub async fn status(&self) -> Result<ReservationsResponse> {
        self.ft_repository.get_reservations(&self.account_number).await
    }

    pub async fn pending(&self) -> Result<Vec<Reservation>> {
        Ok(self.status().await?.reservations().to_vec())
    }

    pub async fn find_match(&self, selector: &Selector) -> Result<Option<Reservation>> {
        let status = self.status().await?;
        Ok(select(status.reservations(), selector).cloned())
    }

    pub fn build_confirmation(
        &self,
        reservation: &Reservation,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationRequest> {
        let amount = wire_amount(reservation.amount_value()?);
        Ok(ConfirmationRequest::new(
            &self.auth_token,
            reservation,
            &self.account_number,
            amount,
            now,
        ))
    }

    pub async fn confirm(&self, selector: &Selector, dry_run: bool) -> Result<ConfirmationOutcome> {
        let status = self.status().await?;
        let reservation = match select(status.reservations(), selector) {
            Some(reservation) => reservation,
            None => {
                info!("No pending reservation matches {:?}", selector);
                return Ok(ConfirmationOutcome::NotFound {
                    info: status.info().map(str::to_string),
                });
            }
        };

        let issued_here = self.issued.lock().await.contains(&reservation.res_code);
        if issued_here || self.ledger.is_confirmed(&reservation.res_code).await? {
            warn!(
                "Reservation {} was already confirmed by this desk, skipping",
                reservation.res_code
            );
            return Ok(ConfirmationOutcome::AlreadyConfirmed(
                reservation.res_code.clone(),
            ));
        }

        let request = self.build_confirmation(reservation, Utc::now())?;
        if dry_run {
            info!("Dry run, not confirming {}", request.res_code);
            return Ok(ConfirmationOutcome::DryRun(request));
        }

        let response = self.ft_repository.confirm_reservation(&request).await?;
        self.issued.lock().await.insert(request.res_code.clone());
        if let Err(e) = self.ledger.record(&request).await {
            warn!(
                "Reservation {} is confirmed but could not be recorded: {}",
                request.res_code, e
            );
        }
        info!(
            "Confirmed reservation {} for {} on account {}",
            request.res_code, request.amount, request.account_number
        );
        Ok(ConfirmationOutcome::Confirmed { request, response })
    }

    pub async fn receiving(&self) -> Result<Value> {
        self.ft_repository.get_receiving().await
    }

    pub async fn scan_receiving(&self, matcher: &AmountMatcher) -> Result<Vec<AmountMention>> {
        let feed = self.receiving().await?;
        Ok(find_amount_mentions(&feed, matcher))
    }
}

/// Res_code wins outright; for amounts the closest to target, first listed on ties.
pub fn select<'a>(reservations: &'a [Reservation], selector: &Selector) -> Option<&'a Reservation> {
    match selector {
        Selector::ResCode(code) => reservations.iter().find(|r| &r.res_code == code),
        Selector::Amount(matcher) => reservations
            .iter()
            .filter_map(|r| {
                let amount = r.amount_value().ok()?;
                matcher.matches(amount).then(|| (matcher.distance(amount), r))
            })
            .fold(None, |best: Option<(_, &Reservation)>, (distance, r)| match best {
                Some((best_distance, _)) if best_distance <= distance => best,
                _ => Some((distance, r)),
            })
            .map(|(_, r)| r),
    }
}

/// Walks a JSON document and reports every leaf that reads as a matching amount.
pub fn find_amount_mentions(value: &Value, matcher: &AmountMatcher) -> Vec<AmountMention> {
    let mut found = Vec::new();
    walk(value, String::new(), matcher, &mut found);
    found
}

fn walk(value: &Value, pointer: String, matcher: &AmountMatcher, found: &mut Vec<AmountMention>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let escaped = key.replace('~', "~0").replace('/', "~1");
                walk(child, format!("{}/{}", pointer, escaped), matcher, found);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                walk(child, format!("{}/{}", pointer, idx), matcher, found);
            }
        }
        Value::String(text) => push_if_match(text, pointer, matcher, found),
        Value::Number(number) => push_if_match(&number.to_string(), pointer, matcher, found),
        Value::Bool(_) | Value::Null => {}
    }
}

fn push_if_match(raw: &str, pointer: String, matcher: &AmountMatcher, found: &mut Vec<AmountMention>) {
    if let Ok(amount) = parse_amount(raw) {
        if matcher.matches(amount) {
            found.push(AmountMention {
                pointer,
                raw: raw.to_string(),
                amount,
            });
        }
    }
}
