// Fixed-point player prices and budgets.
//
// Prices are stored in tenths of a million (the unit the game API reports),
// so budget arithmetic is exact.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// A non-negative price in tenths of a million.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u32);

impl Price {
    pub const ZERO: Price = Price(0);

    pub const fn from_tenths(tenths: u32) -> Self {
        Price(tenths)
    }

    /// Convert from millions, rounding to the nearest tenth. Negative and
    /// non-finite inputs become zero.
    pub fn from_millions(millions: f64) -> Self {
        if !millions.is_finite() || millions <= 0.0 {
            return Price(0);
        }
        Price((millions * 10.0).round() as u32)
    }

    pub const fn tenths(self) -> u32 {
        self.0
    }

    pub fn millions(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// Signed difference `self - other` in millions.
    pub fn diff_millions(self, other: Price) -> f64 {
        (i64::from(self.0) - i64::from(other.0)) as f64 / 10.0
    }

    pub fn checked_sub(self, other: Price) -> Option<Price> {
        self.0.checked_sub(other.0).map(Price)
    }

    pub fn saturating_sub(self, other: Price) -> Price {
        Price(self.0.saturating_sub(other.0))
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Price) {
        *self = *self + rhs;
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Price> for Price {
    fn sum<I: Iterator<Item = &'a Price>>(iter: I) -> Price {
        iter.copied().sum()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "£{}.{}m", self.0 / 10, self.0 % 10)
    }
}
