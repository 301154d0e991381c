// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Exact Fractions

//! Exact fraction value type.
//!
//! Every arithmetic result is reduced by the greatest common divisor and
//! carries a positive denominator. A zero denominator is accepted at
//! construction and only rejected by the operations that need the quotient
//! (`divide`, `greater_than`, ordering).
//!
//! Arithmetic is checked: a result that leaves i128 is an
//! `ArithmeticOverflow` error, never a wrapped value.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use num_traits::{One, Zero};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy)]
pub struct Rational {
    num: i128,
    den: i128,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

impl Rational {
    /// Store the pair as given. No validation, no reduction.
    pub const fn new(num: i128, den: i128) -> Self {
        Self { num, den }
    }

    /// `n/1`
    pub const fn integer(n: i128) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn numerator(&self) -> i128 {
        self.num
    }

    pub fn denominator(&self) -> i128 {
        self.den
    }

    pub fn is_valid(&self) -> bool {
        self.den != 0
    }

    /// Reduced form. `0/x` becomes `0/1`; a zero denominator is left as is.
    pub fn simplify(&self) -> Self {
        if self.num == 0 {
            return Self::new(0, 1);
        }
        if self.den == 0 {
            return *self;
        }
        let g = gcd(self.num, self.den);
        let sign = if self.den < 0 { -1 } else { 1 };
        Self::new(sign * self.num / g, sign * self.den / g)
    }

    pub fn add(self, other: Self) -> EngineResult<Self> {
        self.combine(other, 1)
    }

    pub fn subtract(self, other: Self) -> EngineResult<Self> {
        self.combine(other, -1)
    }

    // a/b ± c/d over lcm(b, d); with a zero denominator the plain b*d is used.
    fn combine(self, other: Self, sign: i128) -> EngineResult<Self> {
        let op = if sign < 0 { "-" } else { "+" };
        let overflow = || EngineError::ArithmeticOverflow { op, lhs: self, rhs: other };
        let g = if self.is_valid() && other.is_valid() { gcd(self.den, other.den) } else { 1 };
        let (scale_self, scale_other) = (other.den / g, self.den / g);
        let left = self.num.checked_mul(scale_self).ok_or_else(overflow)?;
        let right = other
            .num
            .checked_mul(sign)
            .and_then(|n| n.checked_mul(scale_other))
            .ok_or_else(overflow)?;
        let num = left.checked_add(right).ok_or_else(overflow)?;
        let den = self.den.checked_mul(scale_self).ok_or_else(overflow)?;
        Ok(Self::new(num, den).simplify())
    }

    pub fn multiply(self, other: Self) -> EngineResult<Self> {
        self.product(other, "*")
    }

    // Cross-reduces before multiplying so intermediates stay small.
    fn product(self, other: Self, op: &'static str) -> EngineResult<Self> {
        let overflow = || EngineError::ArithmeticOverflow { op, lhs: self, rhs: other };
        let (g1, g2) = if self.is_valid() && other.is_valid() {
            (gcd(self.num, other.den), gcd(other.num, self.den))
        } else {
            (1, 1)
        };
        let num = (self.num / g1).checked_mul(other.num / g2).ok_or_else(overflow)?;
        let den = (self.den / g2).checked_mul(other.den / g1).ok_or_else(overflow)?;
        Ok(Self::new(num, den).simplify())
    }

    /// Fails when either operand has a zero denominator or the divisor is zero.
    pub fn divide(self, other: Self) -> EngineResult<Self> {
        if !self.is_valid() {
            return Err(EngineError::InvalidFraction(self));
        }
        if !other.is_valid() {
            return Err(EngineError::InvalidFraction(other));
        }
        let reciprocal = Self::new(other.den, other.num);
        if !reciprocal.is_valid() {
            return Err(EngineError::InvalidFraction(reciprocal));
        }
        self.product(reciprocal, "/")
            .map_err(|_| EngineError::ArithmeticOverflow { op: "/", lhs: self, rhs: other })
    }

    /// Exact comparison. Fails if either side has a zero denominator or the
    /// cross products leave i128.
    pub fn try_cmp(self, other: Self) -> EngineResult<Ordering> {
        if !self.is_valid() {
            return Err(EngineError::InvalidFraction(self));
        }
        if !other.is_valid() {
            return Err(EngineError::InvalidFraction(other));
        }
        let a = self.simplify();
        let b = other.simplify();
        let overflow = || EngineError::ArithmeticOverflow { op: "cmp", lhs: self, rhs: other };
        let left = a.num.checked_mul(b.den).ok_or_else(overflow)?;
        let right = b.num.checked_mul(a.den).ok_or_else(overflow)?;
        Ok(left.cmp(&right))
    }

    pub fn greater_than(self, other: Self) -> EngineResult<bool> {
        Ok(self.try_cmp(other)? == Ordering::Greater)
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Decimal approximation for reporting; `None` for a zero denominator or
    /// values outside the decimal range.
    pub fn to_decimal(&self) -> Option<Decimal> {
        if !self.is_valid() {
            return None;
        }
        let r = self.simplify();
        let num = Decimal::try_from_i128_with_scale(r.num, 0).ok()?;
        let den = Decimal::try_from_i128_with_scale(r.den, 0).ok()?;
        num.checked_div(den)
    }

    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Self) -> bool {
        let a = self.simplify();
        let b = other.simplify();
        a.num == b.num && a.den == b.den
    }
}

impl Eq for Rational {}

impl Hash for Rational {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let r = self.simplify();
        r.num.hash(state);
        r.den.hash(state);
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(*other).ok()
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Rational {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            Some((n, d)) => {
                let num = n.trim().parse::<i128>().map_err(|e| format!("numerator {n:?}: {e}"))?;
                let den = d.trim().parse::<i128>().map_err(|e| format!("denominator {d:?}: {e}"))?;
                Ok(Self::new(num, den))
            }
            None => s
                .parse::<i128>()
                .map(Self::integer)
                .map_err(|e| format!("fraction {s:?}: {e}")),
        }
    }
}

// Serialized as "num/den" so 128-bit parts survive JSON and JS round trips.
impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rational {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// The operators panic on overflow, as `rust_decimal::Decimal`'s do. Engine
// code uses the named methods and propagates `ArithmeticOverflow` instead.

fn or_panic(result: EngineResult<Rational>) -> Rational {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}

impl Add for Rational {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        or_panic(Rational::add(self, rhs))
    }
}

impl Sub for Rational {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        or_panic(Rational::subtract(self, rhs))
    }
}

impl Mul for Rational {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        or_panic(Rational::multiply(self, rhs))
    }
}

impl Neg for Rational {
    type Output = Self;
    fn neg(self) -> Self::Output {
        match self.num.checked_neg() {
            Some(num) => Self::new(num, self.den).simplify(),
            None => panic!("negating {self} overflows i128"),
        }
    }
}

impl Zero for Rational {
    fn zero() -> Self {
        Self::new(0, 1)
    }

    fn is_zero(&self) -> bool {
        self.num == 0 && self.den != 0
    }
}

impl One for Rational {
    fn one() -> Self {
        Self::new(1, 1)
    }
}
