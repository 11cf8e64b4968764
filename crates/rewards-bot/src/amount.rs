// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Exact decimal amounts as they appear in rewards documents and reports.

use std::{fmt, str::FromStr};

use bigdecimal::{num_bigint::BigInt, BigDecimal, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount {0:?}")]
    Invalid(String),
    #[error("negative amount {0}")]
    Negative(String),
    #[error("amount {0} is not a whole number of base units")]
    Fractional(String),
    #[error("expected a number or a numeric string, got {0}")]
    UnexpectedType(String),
}

/// A non-negative whole amount in a token's smallest unit.
///
/// Documents written by different tree generators encode totals as JSON integers, as numbers in
/// exponent form (`1.5e+21`) or as decimal strings, so all three are accepted. The value is held
/// exactly: `serde_json` is built with `arbitrary_precision` so numbers keep their source text.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawAmount(BigDecimal);

impl RawAmount {
    pub fn value(&self) -> &BigDecimal {
        &self.0
    }
}

impl From<u128> for RawAmount {
    fn from(value: u128) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl FromStr for RawAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            BigDecimal::from_str(s.trim()).map_err(|_| AmountError::Invalid(s.to_string()))?;
        if value < BigDecimal::zero() {
            return Err(AmountError::Negative(s.to_string()));
        }
        if !value.is_integer() {
            return Err(AmountError::Fractional(s.to_string()));
        }
        Ok(Self(value))
    }
}

impl TryFrom<serde_json::Value> for RawAmount {
    type Error = AmountError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Number(n) => n.to_string().parse(),
            serde_json::Value::String(s) => s.parse(),
            other => Err(AmountError::UnexpectedType(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        RawAmount::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for RawAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&plain_string(&self.0))
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&plain_string(&self.0))
    }
}

/// Parses a block number written either as a JSON integer or as a string.
pub fn parse_block_number(value: &serde_json::Value) -> Result<u64, AmountError> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => return Err(AmountError::UnexpectedType(other.to_string())),
    };
    if let Some(hex) = text.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16).map_err(|_| AmountError::Invalid(text.clone()));
    }
    text.parse::<u64>().map_err(|_| AmountError::Invalid(text.clone()))
}

pub(crate) fn deserialize_block_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    parse_block_number(&value).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_opt_block_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => parse_block_number(&value).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Renders a decimal without exponent notation and without trailing fractional zeros.
///
/// `BigDecimal`'s own `Display` switches to scientific notation for large exponents, which is
/// unreadable in chat messages.
pub fn plain_string(value: &BigDecimal) -> String {
    let (digits, scale) = value.normalized().as_bigint_and_exponent();
    let negative = digits < BigInt::zero();
    let mut magnitude = digits.magnitude().to_string();

    let body = if scale <= 0 {
        if magnitude != "0" {
            magnitude.extend(std::iter::repeat('0').take(scale.unsigned_abs() as usize));
        }
        magnitude
    } else {
        let scale = scale as usize;
        if magnitude.len() <= scale {
            let padding = "0".repeat(scale - magnitude.len());
            format!("0.{padding}{magnitude}")
        } else {
            let (int_part, frac_part) = magnitude.split_at(magnitude.len() - scale);
            format!("{int_part}.{frac_part}")
        }
    };

    if negative {
        format!("-{body}")
    } else {
        body
    }
}

/// Serializes a [`BigDecimal`] field with [`plain_string`].
pub(crate) fn serialize_plain<S: Serializer>(
    value: &BigDecimal,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&plain_string(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_integers_strings_and_exponents() {
        let from_int: RawAmount = serde_json::from_str("3000000000000000000000000").unwrap();
        let from_str: RawAmount =
            serde_json::from_value(json!("3000000000000000000000000")).unwrap();
        let from_exp: RawAmount = serde_json::from_str("3e+24").unwrap();

        assert_eq!(from_int, from_str);
        assert_eq!(from_int.value(), from_exp.value());
        assert_eq!(from_int.to_string(), "3000000000000000000000000");
    }

    #[test]
    fn rejects_negative_and_non_numeric() {
        assert_eq!(
            "-1".parse::<RawAmount>().unwrap_err(),
            AmountError::Negative("-1".to_string())
        );
        assert!(serde_json::from_value::<RawAmount>(json!(true)).is_err());
        assert_eq!(
            "1.5".parse::<RawAmount>().unwrap_err(),
            AmountError::Fractional("1.5".to_string())
        );
        assert!(serde_json::from_str::<RawAmount>("1.5e0").is_err());
        assert_eq!(serde_json::from_str::<RawAmount>("1.5e1").unwrap(), RawAmount::from(15));
        assert!(serde_json::from_value::<RawAmount>(json!("ten")).is_err());
    }

    #[test]
    fn block_numbers_from_any_encoding() {
        assert_eq!(parse_block_number(&json!(12_345_678)).unwrap(), 12_345_678);
        assert_eq!(parse_block_number(&json!("12345678")).unwrap(), 12_345_678);
        assert_eq!(parse_block_number(&json!("0xbc614e")).unwrap(), 12_345_678);
        assert!(parse_block_number(&json!(-1)).is_err());
    }

    #[test]
    fn plain_string_never_uses_exponents() {
        let cases = [
            ("4000000", "4000000"),
            ("4E+6", "4000000"),
            ("1.000000000000000000", "1"),
            ("0.000000000000000001", "0.000000000000000001"),
            ("12.3400", "12.34"),
            ("0", "0"),
            ("-2.50", "-2.5"),
        ];
        for (input, expected) in cases {
            let value = BigDecimal::from_str(input).unwrap();
            assert_eq!(plain_string(&value), expected, "input {input}");
        }
    }
}
