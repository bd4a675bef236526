//! HBAR amounts
use std::fmt;
use std::ops::Neg;

use parity_scale_codec::Encode;
use serde::{Deserialize, Serialize};

use crate::{Error, ErrorKind, Result};

/// Number of tinybars in one HBAR
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// Signed amount of HBAR, stored in tinybars
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Encode, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Hbar(i64);

impl Hbar {
    /// Zero HBAR
    pub const ZERO: Hbar = Hbar(0);

    /// Creates an amount from whole HBAR
    #[inline]
    pub const fn from_hbars(hbars: i64) -> Hbar {
        Hbar(hbars * TINYBARS_PER_HBAR)
    }

    /// Creates an amount from tinybars
    #[inline]
    pub const fn from_tinybars(tinybars: i64) -> Hbar {
        Hbar(tinybars)
    }

    /// Returns the amount in tinybars
    #[inline]
    pub const fn to_tinybars(self) -> i64 {
        self.0
    }

    /// Returns the amount in HBAR
    #[inline]
    pub fn to_hbars(self) -> f64 {
        self.0 as f64 / TINYBARS_PER_HBAR as f64
    }

    /// Returns `true` if the amount is below zero
    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, failing on overflow
    pub fn checked_add(self, other: Hbar) -> Result<Hbar> {
        self.0.checked_add(other.0).map(Hbar).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("HBAR overflow while adding {} and {}", self, other),
            )
        })
    }

    /// Subtracts `other` from current amount, failing on overflow
    pub fn checked_sub(self, other: Hbar) -> Result<Hbar> {
        self.0.checked_sub(other.0).map(Hbar).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("HBAR overflow while subtracting {} from {}", other, self),
            )
        })
    }
}

impl Neg for Hbar {
    type Output = Hbar;

    fn neg(self) -> Hbar {
        Hbar(-self.0)
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_hbar = TINYBARS_PER_HBAR as u64;
        let whole = abs / per_hbar;
        let fraction = abs % per_hbar;

        if fraction == 0 {
            write!(f, "{}{} ℏ", sign, whole)
        } else {
            let fraction = format!("{:08}", fraction);
            write!(f, "{}{}.{} ℏ", sign, whole, fraction.trim_end_matches('0'))
        }
    }
}
