//! Fixed-precision decimal value types for price and quantity.
//!
//! Venue values are exact decimals, never binary floats (spec mandates this
//! to keep book arithmetic exact across `add`/`match`/`change`). `Price` and
//! `Quantity` both wrap `rust_decimal::Decimal`, non-negative, rounded to at
//! most 16 significant digits on construction — mirroring the original's
//! `decimal.Context(prec=16)` (`common/price.py`).

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_SIGNIFICANT_DIGITS: u32 = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecimalError {
    #[error("invalid decimal literal: {0}")]
    Invalid(String),
    #[error("value must be non-negative: {0}")]
    Negative(Decimal),
    #[error("value has more than {MAX_SIGNIFICANT_DIGITS} significant digits: {0}")]
    TooPrecise(Decimal),
}

fn significant_digits(d: Decimal) -> u32 {
    let mantissa = d.mantissa().unsigned_abs();
    if mantissa == 0 {
        1
    } else {
        mantissa.to_string().len() as u32
    }
}

fn validate(d: Decimal) -> Result<Decimal, DecimalError> {
    if d.is_sign_negative() && !d.is_zero() {
        return Err(DecimalError::Negative(d));
    }
    if significant_digits(d) > MAX_SIGNIFICANT_DIGITS {
        return Err(DecimalError::TooPrecise(d));
    }
    Ok(d.normalize())
}

macro_rules! decimal_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "Decimal", into = "Decimal")]
        pub struct $name(Decimal);

        impl $name {
            pub const ZERO: $name = $name(Decimal::ZERO);

            /// Validate and construct from a `Decimal`. Rejects negative
            /// values and values with more than 16 significant digits.
            pub fn new(value: Decimal) -> Result<Self, DecimalError> {
                validate(value).map($name)
            }

            /// Parse from the venue's string wire format, e.g. `"100.00"`.
            pub fn parse(s: &str) -> Result<Self, DecimalError> {
                let d = Decimal::from_str(s.trim())
                    .map_err(|_| DecimalError::Invalid(s.to_string()))?;
                Self::new(d)
            }

            pub fn is_zero(self) -> bool {
                self.0.is_zero()
            }

            pub fn inner(self) -> Decimal {
                self.0
            }
        }

        impl TryFrom<Decimal> for $name {
            type Error = DecimalError;
            fn try_from(value: Decimal) -> Result<Self, Self::Error> {
                $name::new(value)
            }
        }

        impl From<$name> for Decimal {
            fn from(value: $name) -> Decimal {
                value.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ZERO
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Add for $name {
            type Output = $name;
            fn add(self, rhs: Self) -> Self::Output {
                $name(self.0 + rhs.0)
            }
        }

        /// Saturating at zero: a match/clamp can never drive a resting
        /// quantity negative (spec §4.1, `match_order` clamp-to-zero rule).
        impl Sub for $name {
            type Output = $name;
            fn sub(self, rhs: Self) -> Self::Output {
                $name((self.0 - rhs.0).max(Decimal::ZERO))
            }
        }
    };
}

decimal_newtype!(Price);
decimal_newtype!(Quantity);
