use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardParseError {
    #[error("Reward amount is empty")]
    Empty,

    #[error("Reward amount '{0}' has more than one decimal point")]
    ExtraDecimalPoint(String),

    #[error("Reward amount '{0}' contains non-digit characters")]
    NonDigit(String),

    #[error("Reward amount '{0}' is too large to represent")]
    Overflow(String),

    #[error("Reward is missing a currency symbol")]
    MissingSymbol,
}

/// Fixed-point monetary value: the exact integer magnitude of a decimal
/// amount plus the number of fractional digits it was entered with.
///
/// `"12.5"` is stored as `units = 125, scale = 1`. No binary floating-point
/// representation is ever involved, so the original decimal is reproduced
/// exactly for any precision the actor typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAmount {
    units: u64,
    scale: u32,
    symbol: String,
}

impl RewardAmount {
    /// Parse a decimal string into its fixed-point representation.
    ///
    /// The decimal point is removed, not rounded: `scale` records how many
    /// digits followed it and `units` is every digit interpreted base-10.
    pub fn parse(input: &str, symbol: &str) -> Result<Self, RewardParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RewardParseError::Empty);
        }
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(RewardParseError::MissingSymbol);
        }

        let mut parts = input.split('.');
        let whole = parts.next().unwrap_or("");
        let fraction = parts.next().unwrap_or("");
        if parts.next().is_some() {
            return Err(RewardParseError::ExtraDecimalPoint(input.to_string()));
        }

        let digits: String = format!("{}{}", whole, fraction);
        if digits.is_empty() {
            return Err(RewardParseError::Empty);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RewardParseError::NonDigit(input.to_string()));
        }

        let units = digits
            .parse::<u64>()
            .map_err(|_| RewardParseError::Overflow(input.to_string()))?;

        Ok(Self {
            units,
            scale: fraction.len() as u32,
            symbol: symbol.to_string(),
        })
    }

    /// Parse the combined form actors type, e.g. `"100 BANK"` or `"12.5 ETH"`.
    pub fn parse_with_symbol(input: &str) -> Result<Self, RewardParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RewardParseError::Empty);
        }
        let (amount, symbol) = input
            .split_once(' ')
            .ok_or(RewardParseError::MissingSymbol)?;
        Self::parse(amount, symbol)
    }

    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    /// Reconstruct the decimal string the amount was parsed from,
    /// normalized to strip redundant leading zeros in the whole part.
    pub fn to_decimal_string(&self) -> String {
        if self.scale == 0 {
            return self.units.to_string();
        }
        let digits = format!("{:0width$}", self.units, width = self.scale as usize + 1);
        let split = digits.len() - self.scale as usize;
        format!("{}.{}", &digits[..split], &digits[split..])
    }
}

impl fmt::Display for RewardAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal_string(), self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_amount() {
        let reward = RewardAmount::parse("12.5", "BANK").unwrap();
        assert_eq!(reward.units(), 125);
        assert_eq!(reward.scale(), 1);
        assert_eq!(reward.symbol(), "BANK");
    }

    #[test]
    fn parses_whole_amount() {
        let reward = RewardAmount::parse("100", "BANK").unwrap();
        assert_eq!(reward.units(), 100);
        assert_eq!(reward.scale(), 0);
    }

    #[test]
    fn parses_sub_unit_amount() {
        let reward = RewardAmount::parse("0.001", "ETH").unwrap();
        assert_eq!(reward.units(), 1);
        assert_eq!(reward.scale(), 3);
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(RewardAmount::parse("", "BANK"), Err(RewardParseError::Empty));
        assert_eq!(RewardAmount::parse(".", "BANK"), Err(RewardParseError::Empty));
    }

    #[test]
    fn rejects_multiple_points() {
        assert!(matches!(
            RewardAmount::parse("12.5.3", "BANK"),
            Err(RewardParseError::ExtraDecimalPoint(_))
        ));
    }

    #[test]
    fn rejects_non_digits() {
        assert!(matches!(
            RewardAmount::parse("12a.5", "BANK"),
            Err(RewardParseError::NonDigit(_))
        ));
        assert!(matches!(
            RewardAmount::parse("-5", "BANK"),
            Err(RewardParseError::NonDigit(_))
        ));
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            RewardAmount::parse("99999999999999999999999", "BANK"),
            Err(RewardParseError::Overflow(_))
        ));
    }

    #[test]
    fn rejects_missing_symbol() {
        assert_eq!(
            RewardAmount::parse("100", "  "),
            Err(RewardParseError::MissingSymbol)
        );
        assert_eq!(
            RewardAmount::parse_with_symbol("100"),
            Err(RewardParseError::MissingSymbol)
        );
    }

    #[test]
    fn parses_combined_form() {
        let reward = RewardAmount::parse_with_symbol("100 BANK").unwrap();
        assert_eq!(reward.units(), 100);
        assert_eq!(reward.symbol(), "BANK");
    }

    #[test]
    fn display_reconstructs_decimal_exactly() {
        for (input, expected) in [
            ("12.5", "12.5 BANK"),
            ("100", "100 BANK"),
            ("0.001", "0.001 BANK"),
            ("1.000", "1.000 BANK"),
        ] {
            let reward = RewardAmount::parse(input, "BANK").unwrap();
            assert_eq!(reward.to_string(), expected);
        }
    }

    #[test]
    fn serde_round_trip() {
        let reward = RewardAmount::parse("42.42", "BANK").unwrap();
        let json = serde_json::to_string(&reward).unwrap();
        let back: RewardAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(reward, back);
    }
}
