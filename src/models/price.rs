use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Fixed-point amount with two decimal places, stored as whole cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "PriceInput")]
pub struct Price(i64);

impl Price {
    /// Eight digits in total, two of them decimals.
    pub const MAX_CENTS: i64 = 99_999_999;

    pub fn from_cents(cents: i64) -> Result<Self, AppError> {
        if cents < 0 {
            return Err(AppError::Validation(
                "El precio no puede ser negativo.".to_string(),
            ));
        }
        if cents > Self::MAX_CENTS {
            return Err(AppError::Validation(
                "El precio no puede tener más de 8 dígitos.".to_string(),
            ));
        }
        Ok(Price(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl FromStr for Price {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("'{}' no es un precio válido.", s));
        let s = s.trim();

        let s = match s.strip_prefix('-') {
            Some(rest) if rest.chars().any(|c| c.is_ascii_digit() && c != '0') => {
                return Err(AppError::Validation(
                    "El precio no puede ser negativo.".to_string(),
                ));
            }
            Some(rest) => rest,
            None => s.strip_prefix('+').unwrap_or(s),
        };

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        // "1.50" and "1.500" are the same amount, "1.505" is not representable
        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > 2 {
            return Err(AppError::Validation(
                "El precio no puede tener más de 2 decimales.".to_string(),
            ));
        }

        let whole = whole.trim_start_matches('0');
        if whole.len() > 6 {
            return Err(AppError::Validation(
                "El precio no puede tener más de 8 dígitos.".to_string(),
            ));
        }
        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
        let fraction: i64 = format!("{:0<2}", fraction).parse().map_err(|_| invalid())?;

        Price::from_cents(whole * 100 + fraction)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A price as it arrives in a request body: a decimal string or a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<PriceInput> for Price {
    type Error = AppError;

    fn try_from(input: PriceInput) -> Result<Self, Self::Error> {
        match input {
            PriceInput::Integer(units) => units
                .checked_mul(100)
                .ok_or_else(|| AppError::Validation("El precio no puede tener más de 8 dígitos.".to_string()))
                .and_then(Price::from_cents),
            PriceInput::Float(value) if value.is_finite() => value.to_string().parse(),
            PriceInput::Float(_) => Err(AppError::Validation("El precio no es un número válido.".to_string())),
            PriceInput::Text(text) => text.parse(),
        }
    }
}
