//! Currency formatting and parsing.
//!
//! Amounts are rendered as `"<symbol> <value>"` with exactly two decimal
//! places and grouped thousands. Unsigned rendering shows the absolute value;
//! signed rendering prefixes `+` or `-` to the symbol.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Errors that can occur when parsing a formatted amount.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount is empty")]
    Empty,
    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// Result type for money parsing.
pub type Result<T> = std::result::Result<T, MoneyError>;

/// Locale rules for rendering amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::brl()
    }
}

impl CurrencyFormat {
    /// Brazilian real: `R$ 1.234,50`.
    pub fn brl() -> Self {
        Self {
            symbol: "R$".to_string(),
            thousands_separator: '.',
            decimal_separator: ',',
        }
    }

    /// Sets the currency symbol, keeping the separators.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Renders the absolute value of `amount`.
    ///
    /// ```
    /// use ledgersync_core::money::CurrencyFormat;
    /// use rust_decimal::Decimal;
    ///
    /// let amount: Decimal = "1234.5".parse().unwrap();
    /// assert_eq!(CurrencyFormat::brl().format(amount), "R$ 1.234,50");
    /// ```
    pub fn format(&self, amount: Decimal) -> String {
        format!("{} {}", self.symbol, self.format_number(amount.abs()))
    }

    /// Renders `amount` with an explicit sign in front of the symbol.
    pub fn format_signed(&self, amount: Decimal) -> String {
        let sign = if amount.is_sign_negative() && !amount.is_zero() {
            '-'
        } else {
            '+'
        };
        format!("{}{}", sign, self.format(amount))
    }

    /// Parses a string produced by [`format`](Self::format) or
    /// [`format_signed`](Self::format_signed) back into an amount.
    pub fn parse(&self, input: &str) -> Result<Decimal> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }

        let (negative, rest) = match trimmed.chars().next() {
            Some('-') => (true, &trimmed[1..]),
            Some('+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let rest = rest.strip_prefix(self.symbol.as_str()).unwrap_or(rest).trim();
        if rest.is_empty() {
            return Err(MoneyError::Invalid(input.to_string()));
        }

        let normalized: String = rest
            .chars()
            .filter(|c| *c != self.thousands_separator)
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect();
        if !normalized.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(MoneyError::Invalid(input.to_string()));
        }

        let value: Decimal = normalized
            .parse()
            .map_err(|_| MoneyError::Invalid(input.to_string()))?;
        Ok(if negative { -value } else { value })
    }

    fn format_number(&self, amount: Decimal) -> String {
        let mut rounded =
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        let cents = rounded.mantissa().unsigned_abs();
        let integer = (cents / 100).to_string();
        let fraction = cents % 100;

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        for (i, digit) in integer.chars().enumerate() {
            if i > 0 && (integer.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(digit);
        }

        format!("{}{}{:02}", grouped, self.decimal_separator, fraction)
    }
}
