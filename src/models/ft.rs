use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DeskError, Result};
use crate::json_repair::excerpt;
use crate::models::{string_or_number, Details, OneOrMany};
use crate::money::parse_amount;

pub const OVERVIEW_KEY: &str = "ReservationsOverview 0.9";
pub const INFORMATION_KEY: &str = "Information";
pub const CONFIRMATION_KEY: &str = "Reservation_confirmation v0.9";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A pending incoming transfer awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(rename = "RecordNumber", deserialize_with = "string_or_number", default)]
    pub record_number: String,
    #[serde(rename = "Res_code")]
    pub res_code: String,
    #[serde(rename = "Amount", deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(rename = "Currency", default)]
    pub currency: String,
    #[serde(rename = "AccountName", default)]
    pub account_name: String,
    #[serde(rename = "AccountSignatory", default)]
    pub account_signatory: String,
}

impl Reservation {
    pub fn amount_value(&self) -> Result<Decimal> {
        parse_amount(&self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Information {
    #[serde(rename = "Info")]
    pub info: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReservationsResponse {
    Information(String),
    Overview(Vec<Reservation>),
}

impl ReservationsResponse {
    pub fn from_value(value: Value) -> Result<Self> {
        if let Some(overview) = value.get(OVERVIEW_KEY) {
            let parsed: Details<OneOrMany<Reservation>> =
                serde_json::from_value(overview.clone()).map_err(|e| {
                    DeskError::MalformedPayload(format!("reservation overview: {}", e))
                })?;
            return Ok(ReservationsResponse::Overview(parsed.details.into_vec()));
        }
        if let Some(information) = value.get(INFORMATION_KEY) {
            let info = match information {
                Value::Object(_) => serde_json::from_value::<Information>(information.clone())
                    .map(|i| i.info)
                    .unwrap_or_else(|_| information.to_string()),
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return Ok(ReservationsResponse::Information(info));
        }
        Err(DeskError::MalformedPayload(format!(
            "unexpected reservation payload `{}`",
            excerpt(&value.to_string())
        )))
    }

    pub fn reservations(&self) -> &[Reservation] {
        match self {
            ReservationsResponse::Overview(list) => list,
            ReservationsResponse::Information(_) => &[],
        }
    }

    pub fn info(&self) -> Option<&str> {
        match self {
            ReservationsResponse::Information(info) => Some(info),
            ReservationsResponse::Overview(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    #[serde(rename = "authToken")]
    pub auth_token: String,
    #[serde(rename = "Res_code")]
    pub res_code: String,
    #[serde(rename = "DateTime")]
    pub date_time: String,
    #[serde(rename = "AccountNumber")]
    pub account_number: String,
    #[serde(rename = "Amount")]
    pub amount: String,
}

impl ConfirmationRequest {
    pub fn new(
        auth_token: &str,
        reservation: &Reservation,
        account_number: &str,
        amount: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            auth_token: auth_token.to_string(),
            res_code: reservation.res_code.clone(),
            date_time: now.format(DATE_TIME_FORMAT).to_string(),
            account_number: account_number.to_string(),
            amount,
        }
    }

    pub fn envelope(&self) -> ConfirmationEnvelope<'_> {
        ConfirmationEnvelope {
            confirmation: Details { details: self },
        }
    }
}

/// Body of `POST /reservation_confirmation.asp`.
#[derive(Debug, Serialize)]
pub struct ConfirmationEnvelope<'a> {
    #[serde(rename = "Reservation_confirmation v0.9")]
    pub confirmation: Details<&'a ConfirmationRequest>,
}

/// A leaf in a JSON document whose value looks like a watched amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountMention {
    pub pointer: String,
    pub raw: String,
    pub amount: Decimal,
}
