use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};

/// Accepts `1000000`, `1000000.00`, `1,000,000.00` and `1 000 000`.
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Err(DeskError::InvalidAmount(text.to_string()));
    }
    Decimal::from_str(&cleaned).map_err(|_| DeskError::InvalidAmount(text.to_string()))
}

/// Half-cents round away from zero (`12.345` -> `12.35`).
fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `format_currency(1000000, "USD")` gives `1,000,000.00 USD`.
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let rounded = to_cents(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    let currency = currency.trim();
    if currency.is_empty() {
        format!("{}{}.{}", sign, grouped, frac_part)
    } else {
        format!("{}{}.{} {}", sign, grouped, frac_part, currency)
    }
}

/// Two-decimal rendering the FT API expects in `Amount` fields.
pub fn wire_amount(amount: Decimal) -> String {
    format!("{:.2}", to_cents(amount))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountMatcher {
    pub target: Decimal,
    pub tolerance: Decimal,
}

impl AmountMatcher {
    pub fn new(target: Decimal, tolerance: Decimal) -> Self {
        Self {
            target,
            tolerance: tolerance.abs(),
        }
    }

    pub fn million() -> Self {
        Self::new(Decimal::from(1_000_000), Decimal::from(10_000))
    }

    pub fn matches(&self, amount: Decimal) -> bool {
        amount >= self.target - self.tolerance && amount <= self.target + self.tolerance
    }

    pub fn matches_text(&self, text: &str) -> bool {
        parse_amount(text).map(|a| self.matches(a)).unwrap_or(false)
    }

    pub fn distance(&self, amount: Decimal) -> Decimal {
        (amount - self.target).abs()
    }
}

impl Default for AmountMatcher {
    fn default() -> Self {
        Self::million()
    }
}

pub fn is_million_dollar_transfer(amount: &str) -> bool {
    AmountMatcher::million().matches_text(amount)
}
