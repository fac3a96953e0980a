use std::{fmt::Display, iter::Sum, ops::Add, str::FromStr};

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::op;

/// The number of decimals used when amounts are rendered in human-readable reports.
pub const REPORT_DECIMALS: u32 = 6;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A non-negative quantity of minor units (e.g. micro-units for a six-decimal token).
///
/// Amounts are arbitrary precision, so ledger totals never overflow, and unsigned, so a negative transfer cannot be
/// constructed in the first place. All fee arithmetic on `Amount` is exact integer arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigUint);

op!(binary Amount, Add, add);
op!(inplace Amount, AddAssign, add_assign);

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, a| &acc + a)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Amount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl TryFrom<i64> for Amount {
    type Error = AmountConversionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self::from)
            .map_err(|_| AmountConversionError(format!("{value} is negative")))
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    /// Parses a base-10 integer quantity of minor units. Signs, whitespace and fractions are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountConversionError(format!("'{s}' is not a non-negative integer")));
        }
        BigUint::from_str(s).map(Self).map_err(|e| AmountConversionError(format!("'{s}': {e}")))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Amount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    pub fn checked_sub(&self, rhs: &Amount) -> Option<Amount> {
        if self.0 >= rhs.0 {
            Some(Self(&self.0 - &rhs.0))
        } else {
            None
        }
    }

    /// Subtracts `rhs`, flooring the result at zero.
    pub fn saturating_sub(&self, rhs: &Amount) -> Amount {
        self.checked_sub(rhs).unwrap_or_default()
    }

    pub fn mul_u64(&self, rhs: u64) -> Amount {
        Self(&self.0 * rhs)
    }

    /// Integer division, rounding towards zero. Returns `None` when dividing by zero.
    pub fn div_u64(&self, rhs: u64) -> Option<Amount> {
        if rhs == 0 {
            None
        } else {
            Some(Self(&self.0 / rhs))
        }
    }

    /// Parses a decimal ledger quantity (e.g. `"12.5"`) into minor units, given the number of decimals the ledger
    /// uses. The conversion is exact: if the value has more fractional digits than `decimals`, it is rejected rather
    /// than rounded.
    pub fn from_decimal_str(s: &str, decimals: u32) -> Result<Self, AmountConversionError> {
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountConversionError(format!("'{s}' is not a decimal number")));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountConversionError(format!("'{s}' is not a non-negative decimal number")));
        }
        let frac = frac.trim_end_matches('0');
        if frac.len() > decimals as usize {
            return Err(AmountConversionError(format!("'{s}' has more than {decimals} decimal places")));
        }
        let padding = decimals as usize - frac.len();
        let digits = format!("{whole}{frac}{}", "0".repeat(padding));
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Self::zero());
        }
        digits.parse()
    }

    /// Renders the amount as a decimal number with exactly `decimals` fractional digits, e.g. `1234567` with 6
    /// decimals is `"1.234567"`.
    pub fn to_decimal_string(&self, decimals: u32) -> String {
        let digits = self.0.to_string();
        let decimals = decimals as usize;
        if decimals == 0 {
            return digits;
        }
        let padded = if digits.len() <= decimals { format!("{digits:0>width$}", width = decimals + 1) } else { digits };
        let (whole, frac) = padded.split_at(padded.len() - decimals);
        format!("{whole}.{frac}")
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> de::Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a non-negative integer, or a string containing one")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Amount::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Amount::try_from(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}
