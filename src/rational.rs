//! Exact rational arithmetic for time.
//!
//! Every time quantity in the engine is a [`Rational`]: floats would break
//! the `fast∘slow` round-trip and the exact-endpoint equality that cycle
//! splitting relies on (see `spec.md` §9, "Exact rationals are mandatory").

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// An exact fraction over arbitrary-precision integers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational(BigRational);

impl Rational {
    pub fn new(numerator: i64, denominator: i64) -> Self {
        if denominator == 0 {
            panic!("Rational denominator cannot be zero");
        }
        Rational(BigRational::new(numerator.into(), denominator.into()))
    }

    pub fn from_big(numerator: BigInt, denominator: BigInt) -> Self {
        Rational(BigRational::new(numerator, denominator))
    }

    pub fn from_int(n: i64) -> Self {
        Rational(BigRational::from_integer(n.into()))
    }

    /// Approximate a float as a rational. Used only at the boundary where a
    /// host hands us a floating-point time or ratio; internal arithmetic
    /// never goes through this path.
    pub fn from_float(f: f64) -> Self {
        if !f.is_finite() {
            return Rational::from_int(0);
        }
        // 1/2^32 resolution is enough headroom for any musically sane input
        // while staying exact once captured.
        let denom: i64 = 1 << 32;
        let numer = (f * denom as f64).round() as i64;
        Rational::new(numer, denom)
    }

    pub fn to_float(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn numerator(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denominator(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn abs(&self) -> Self {
        Rational(self.0.clone().abs())
    }

    /// Floor to the nearest integer.
    pub fn floor(&self) -> Self {
        Rational(BigRational::from_integer(floor_div(
            self.0.numer(),
            self.0.denom(),
        )))
    }

    /// Ceiling to the nearest integer.
    pub fn ceil(&self) -> Self {
        let f = self.floor();
        if &f == self {
            f
        } else {
            f + Rational::from_int(1)
        }
    }

    /// The start of the cycle containing this time ("sam", Strudel's term).
    pub fn sam(&self) -> Self {
        self.floor()
    }

    /// The start of the next cycle.
    pub fn next_sam(&self) -> Self {
        self.sam() + Rational::from_int(1)
    }

    /// The fractional position within the current cycle, in `[0, 1)`.
    pub fn cycle_pos(&self) -> Self {
        self.clone() - self.sam()
    }

    pub fn min(&self, other: &Self) -> Self {
        if self <= other {
            self.clone()
        } else {
            other.clone()
        }
    }

    pub fn max(&self, other: &Self) -> Self {
        if self >= other {
            self.clone()
        } else {
            other.clone()
        }
    }

    /// Rational gcd, extended from the integer definition:
    /// `gcd(a/b, c/d) = gcd(a, c) / lcm(b, d)` (both sides already reduced).
    pub fn gcd(&self, other: &Self) -> Self {
        let n = self.0.numer().gcd(other.0.numer());
        let d = self.0.denom().lcm(other.0.denom());
        Rational::from_big(n, d)
    }

    /// Rational lcm: `lcm(a/b, c/d) = lcm(a, c) / gcd(b, d)`.
    pub fn lcm(&self, other: &Self) -> Self {
        let n = self.0.numer().lcm(other.0.numer());
        let d = self.0.denom().gcd(other.0.denom());
        Rational::from_big(n, d)
    }

    /// `a.mulmaybe(b)`: multiplication lifted over `Option`, short-circuiting
    /// to `None` per `spec.md` §3 ("mulmaybe(r) returns None if either side
    /// is None"). Used when combining step counts, one of which may be
    /// undefined.
    pub fn mulmaybe(a: Option<&Self>, b: Option<&Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.clone() * b.clone()),
            _ => None,
        }
    }

    pub fn lcm_maybe(a: Option<&Self>, b: Option<&Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.lcm(b)),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        }
    }

    pub fn recip(&self) -> Self {
        Rational(self.0.recip())
    }

    pub fn to_i64(&self) -> Option<i64> {
        if self.0.is_integer() {
            self.0.numer().to_i64()
        } else {
            None
        }
    }
}

fn floor_div(n: &BigInt, d: &BigInt) -> BigInt {
    let (q, r) = n.div_mod_floor(d);
    let _ = r;
    q
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Rational::from_int(n)
    }
}

impl From<f64> for Rational {
    fn from(f: f64) -> Self {
        Rational::from_float(f)
    }
}

impl From<(i64, i64)> for Rational {
    fn from((n, d): (i64, i64)) -> Self {
        Rational::new(n, d)
    }
}

impl Add for Rational {
    type Output = Rational;
    fn add(self, rhs: Self) -> Self::Output {
        Rational(self.0 + rhs.0)
    }
}

impl Sub for Rational {
    type Output = Rational;
    fn sub(self, rhs: Self) -> Self::Output {
        Rational(self.0 - rhs.0)
    }
}

impl Mul for Rational {
    type Output = Rational;
    fn mul(self, rhs: Self) -> Self::Output {
        Rational(self.0 * rhs.0)
    }
}

impl Div for Rational {
    type Output = Rational;
    fn div(self, rhs: Self) -> Self::Output {
        Rational(self.0 / rhs.0)
    }
}

impl Rem for Rational {
    type Output = Rational;
    fn rem(self, rhs: Self) -> Self::Output {
        // Cycle-style positive modulo, matching `cyclePos` for non-unit moduli.
        let q = (self.clone() / rhs.clone()).floor();
        self - q * rhs
    }
}

impl Neg for Rational {
    type Output = Rational;
    fn neg(self) -> Self::Output {
        Rational(-self.0)
    }
}

impl<'a> Add for &'a Rational {
    type Output = Rational;
    fn add(self, rhs: Self) -> Self::Output {
        Rational(self.0.clone() + rhs.0.clone())
    }
}

impl<'a> Sub for &'a Rational {
    type Output = Rational;
    fn sub(self, rhs: Self) -> Self::Output {
        Rational(self.0.clone() - rhs.0.clone())
    }
}

impl<'a> Mul for &'a Rational {
    type Output = Rational;
    fn mul(self, rhs: Self) -> Self::Output {
        Rational(self.0.clone() * rhs.0.clone())
    }
}

impl<'a> Div for &'a Rational {
    type Output = Rational;
    fn div(self, rhs: Self) -> Self::Output {
        Rational(self.0.clone() / rhs.0.clone())
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl One for Rational {
    fn one() -> Self {
        Rational::from_int(1)
    }
}

impl Zero for Rational {
    fn zero() -> Self {
        Rational::from_int(0)
    }
    fn is_zero(&self) -> bool {
        Rational::is_zero(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplifies() {
        let r = Rational::new(4, 8);
        assert_eq!(r, Rational::new(1, 2));
    }

    #[test]
    fn floor_and_ceil_negative() {
        let r = Rational::new(-1, 2);
        assert_eq!(r.floor(), Rational::from_int(-1));
        assert_eq!(r.ceil(), Rational::from_int(0));
    }

    #[test]
    fn sam_and_cycle_pos() {
        let r = Rational::new(5, 2); // 2.5
        assert_eq!(r.sam(), Rational::from_int(2));
        assert_eq!(r.next_sam(), Rational::from_int(3));
        assert_eq!(r.cycle_pos(), Rational::new(1, 2));
    }

    #[test]
    fn lcm_of_integers() {
        let a = Rational::from_int(2);
        let b = Rational::from_int(3);
        assert_eq!(a.lcm(&b), Rational::from_int(6));
    }

    #[test]
    fn mulmaybe_none_propagates() {
        let a = Rational::from_int(2);
        assert_eq!(Rational::mulmaybe(Some(&a), None), None);
        assert_eq!(
            Rational::mulmaybe(Some(&a), Some(&Rational::from_int(3))),
            Some(Rational::from_int(6))
        );
    }

    #[test]
    fn ordering_and_arithmetic() {
        let a = Rational::new(1, 2);
        let b = Rational::new(1, 3);
        assert!(a > b);
        assert_eq!(a.clone() + b.clone(), Rational::new(5, 6));
        assert_eq!(a * b, Rational::new(1, 6));
    }
}
