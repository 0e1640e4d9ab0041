/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Exact rational weights for diagram coefficients.
//!
//! Every merge in the diagram algebra adds weights; every product multiplies
//! them. Floating point would accumulate drift across thousands of merges and
//! could leave a cancelled diagram at `1e-17` instead of removing it, so the
//! coefficient is held as a reduced fraction until the final lowering into
//! [`crate::sum::ClusterSum`].

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Neg, Sub};

use num_rational::Ratio;
use num_traits::{One, Zero};

use crate::error::{ClusterError, ClusterResult};

/// Reduced fraction `numer / denom` with `denom > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RationalWeight(Ratio<i64>);

impl RationalWeight {
    /// Build `numer / denom`, reduced to lowest terms.
    pub fn new(numer: i64, denom: i64) -> ClusterResult<Self> {
        if denom == 0 {
            return Err(ClusterError::ZeroDenominator);
        }
        Ok(Self(Ratio::new(numer, denom)))
    }

    /// Whole-number weight.
    pub fn from_integer(value: i64) -> Self {
        Self(Ratio::from_integer(value))
    }

    /// The weight 0, which marks a diagram for removal.
    pub fn zero() -> Self {
        Self(Ratio::zero())
    }

    /// The weight 1.
    pub fn one() -> Self {
        Self(Ratio::one())
    }

    /// Numerator in lowest terms (carries the sign).
    pub fn numer(&self) -> i64 {
        *self.0.numer()
    }

    /// Denominator in lowest terms (always positive).
    pub fn denom(&self) -> i64 {
        *self.0.denom()
    }

    /// `true` when the weight is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `true` when the weight is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.numer() < 0
    }

    /// Multiplicative inverse.
    pub fn recip(&self) -> ClusterResult<Self> {
        if self.is_zero() {
            return Err(ClusterError::ZeroDenominator);
        }
        Ok(Self(self.0.recip()))
    }

    /// Floating-point read-out. The only place a weight leaves exact arithmetic.
    pub fn to_f64(&self) -> f64 {
        self.numer() as f64 / self.denom() as f64
    }
}

impl Default for RationalWeight {
    fn default() -> Self {
        Self::one()
    }
}

impl From<i64> for RationalWeight {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl Add for RationalWeight {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for RationalWeight {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for RationalWeight {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for RationalWeight {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Neg for RationalWeight {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for RationalWeight {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, w| acc + w)
    }
}

impl<'a> Sum<&'a RationalWeight> for RationalWeight {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, w| acc + *w)
    }
}

impl fmt::Display for RationalWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom() == 1 {
            write!(f, "{}", self.numer())
        } else {
            write!(f, "{}/{}", self.numer(), self.denom())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reduces_to_lowest_terms() {
        let w = RationalWeight::new(6, -8).unwrap();
        assert_eq!(w.numer(), -3);
        assert_eq!(w.denom(), 4);
    }

    #[test]
    fn test_zero_denominator_rejected() {
        assert_eq!(RationalWeight::new(1, 0), Err(ClusterError::ZeroDenominator));
    }

    #[test]
    fn test_sixths_sum_exactly_to_half() {
        let sixth = RationalWeight::new(1, 6).unwrap();
        let total: RationalWeight = [sixth, sixth, sixth].iter().sum();
        assert_eq!(total, RationalWeight::new(1, 2).unwrap());
    }

    #[test]
    fn test_cancellation_is_exact_zero() {
        let third = RationalWeight::new(1, 3).unwrap();
        let w = third + third + third - RationalWeight::one();
        assert!(w.is_zero());
    }

    #[test]
    fn test_mul_and_neg() {
        let a = RationalWeight::new(2, 3).unwrap();
        let b = RationalWeight::new(-3, 4).unwrap();
        assert_eq!(a * b, RationalWeight::new(-1, 2).unwrap());
        assert_eq!(-(a * b), RationalWeight::new(1, 2).unwrap());
    }

    #[test]
    fn test_recip_of_zero_is_error() {
        assert!(RationalWeight::zero().recip().is_err());
        assert_eq!(
            RationalWeight::new(-2, 5).unwrap().recip().unwrap(),
            RationalWeight::new(-5, 2).unwrap()
        );
    }

    #[test]
    fn test_sign_checks() {
        assert!(RationalWeight::new(1, -3).unwrap().is_negative());
        assert!(!RationalWeight::new(-1, -3).unwrap().is_negative());
        assert!(!RationalWeight::zero().is_negative());
    }

    #[test]
    fn test_to_f64_readout() {
        let w = RationalWeight::new(-3, 8).unwrap();
        assert!((w.to_f64() + 0.375).abs() < 1e-15);
    }

    #[test]
    fn test_display() {
        assert_eq!(RationalWeight::new(4, 2).unwrap().to_string(), "2");
        assert_eq!(RationalWeight::new(-1, 6).unwrap().to_string(), "-1/6");
    }
}
