//! Human readable renderings shared by the CLI and the Telegram bot.

use crate::models::ft::{AmountMention, Reservation, ReservationsResponse};
use crate::money::{format_currency, is_million_dollar_transfer};
use crate::services::reservation_service::ConfirmationOutcome;

pub fn reservation_line(reservation: &Reservation) -> String {
    let amount = match reservation.amount_value() {
        Ok(value) => format_currency(value, &reservation.currency),
        Err(_) => format!("{} {}", reservation.amount, reservation.currency),
    };
    let flag = if is_million_dollar_transfer(&reservation.amount) {
        "  [1M]"
    } else {
        ""
    };
    let mut line = format!("#{} {}  {}", reservation.record_number, reservation.res_code, amount);
    if !reservation.account_name.is_empty() {
        line.push_str(&format!("  {}", reservation.account_name));
    }
    if !reservation.account_signatory.is_empty() {
        line.push_str(&format!(" ({})", reservation.account_signatory));
    }
    line.push_str(flag);
    line
}

pub fn describe_status(account: &str, status: &ReservationsResponse) -> String {
    match status {
        ReservationsResponse::Information(info) => {
            format!("Account {}: {}", account, info)
        }
        ReservationsResponse::Overview(list) if list.is_empty() => {
            format!("Account {}: no pending reservations", account)
        }
        ReservationsResponse::Overview(list) => {
            let mut text = format!("Account {}: {} pending reservation(s)", account, list.len());
            for reservation in list {
                text.push('\n');
                text.push_str(&reservation_line(reservation));
            }
            text
        }
    }
}

pub fn describe_mentions(mentions: &[AmountMention]) -> String {
    if mentions.is_empty() {
        return "No matching amount in the receiving feed".to_string();
    }
    let mut text = format!("{} matching amount(s) in the receiving feed", mentions.len());
    for mention in mentions {
        text.push_str(&format!(
            "\n{} = {}",
            mention.pointer,
            format_currency(mention.amount, "")
        ));
    }
    text
}

pub fn describe_outcome(outcome: &ConfirmationOutcome) -> String {
    match outcome {
        ConfirmationOutcome::Confirmed { request, response } => format!(
            "Confirmed {} for {} on account {}\nFT response: {}",
            request.res_code, request.amount, request.account_number, response
        ),
        ConfirmationOutcome::DryRun(request) => format!(
            "Dry run: would confirm {} for {} on account {} at {}",
            request.res_code, request.amount, request.account_number, request.date_time
        ),
        ConfirmationOutcome::AlreadyConfirmed(code) => {
            format!("{} was already confirmed, nothing sent", code)
        }
        ConfirmationOutcome::NotFound { info: Some(info) } => {
            format!("No matching reservation: {}", info)
        }
        ConfirmationOutcome::NotFound { info: None } => "No matching reservation".to_string(),
    }
}
