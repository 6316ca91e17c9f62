//! # Unimodular matrices
//!
//! [`SL2Z`] is a 2×2 integer matrix of determinant one, acting on the upper
//! half-plane by fractional-linear transformations. The two standard
//! generators are [`SL2Z::S`] (the inversion `z ↦ -1/z`) and [`SL2Z::T`]
//! (the translation `z ↦ z + 1`); every element is a word in these two, see
//! [`crate::cfrac::factor_sl2z`].
//!
//! Everything downstream works projectively: a matrix and its negative act
//! identically, so comparisons that matter use [`SL2Z::eq_projective`].

use std::fmt;
use std::ops::{Mul, Neg};

use thiserror::Error;

/// A 2×2 integer matrix `[[a, b], [c, d]]` with `a·d − b·c = 1`.
///
/// # Examples
///
/// ```
/// use psl2z::matrix::SL2Z;
///
/// let m = SL2Z::new(1, 2, 1, 3).unwrap();
/// assert_eq!(m * m.inverse(), SL2Z::ONE);
/// assert_eq!(SL2Z::S * SL2Z::T, SL2Z::R);
/// assert!(SL2Z::new(2, 0, 0, 2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SL2Z {
    a: i64,
    b: i64,
    c: i64,
    d: i64,
}

impl SL2Z {
    /// The identity.
    pub const ONE: SL2Z = SL2Z {
        a: 1,
        b: 0,
        c: 0,
        d: 1,
    };

    /// The inversion `S = [[0, -1], [1, 0]]`, `z ↦ -1/z`; `S² = -1`.
    pub const S: SL2Z = SL2Z {
        a: 0,
        b: -1,
        c: 1,
        d: 0,
    };

    /// The translation `T = [[1, 1], [0, 1]]`, `z ↦ z + 1`.
    pub const T: SL2Z = SL2Z {
        a: 1,
        b: 1,
        c: 0,
        d: 1,
    };

    /// The order-3 generator `R = S·T = [[0, -1], [1, 1]]`.
    pub const R: SL2Z = SL2Z {
        a: 0,
        b: -1,
        c: 1,
        d: 1,
    };

    /// Builds a matrix, checking the determinant.
    pub fn new(a: i64, b: i64, c: i64, d: i64) -> Result<Self, MatrixError> {
        let det = a * d - b * c;
        if det != 1 {
            return Err(MatrixError::NotUnimodular { a, b, c, d, det });
        }
        Ok(SL2Z { a, b, c, d })
    }

    /// The translation `T^k = [[1, k], [0, 1]]`.
    pub fn translation(k: i64) -> Self {
        SL2Z {
            a: 1,
            b: k,
            c: 0,
            d: 1,
        }
    }

    pub fn a(&self) -> i64 {
        self.a
    }

    pub fn b(&self) -> i64 {
        self.b
    }

    pub fn c(&self) -> i64 {
        self.c
    }

    pub fn d(&self) -> i64 {
        self.d
    }

    /// The entries as `(a, b, c, d)`.
    pub fn entries(&self) -> (i64, i64, i64, i64) {
        (self.a, self.b, self.c, self.d)
    }

    /// The inverse `[[d, -b], [-c, a]]`.
    pub fn inverse(&self) -> Self {
        SL2Z {
            a: self.d,
            b: -self.b,
            c: -self.c,
            d: self.a,
        }
    }

    /// The `k`-th power; negative exponents invert first.
    pub fn pow(&self, k: i64) -> Self {
        let (base, exp) = if k < 0 {
            (self.inverse(), -k)
        } else {
            (*self, k)
        };
        let mut result = SL2Z::ONE;
        for _ in 0..exp {
            result = result * base;
        }
        result
    }

    pub fn is_one(&self) -> bool {
        *self == SL2Z::ONE
    }

    /// Whether the matrix is `±1`, i.e. trivial in the projective group.
    pub fn is_one_projective(&self) -> bool {
        self.b == 0 && self.c == 0 && self.a == self.d && (self.a == 1 || self.a == -1)
    }

    /// Projective equality: `m == other` or `m == -other`.
    pub fn eq_projective(&self, other: &Self) -> bool {
        *self == *other || *self == -*other
    }

    /// Applies `z ↦ (a·z + b)/(c·z + d)` to `z = x + iy`, `y > 0`.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let (a, b, c, d) = (self.a as f64, self.b as f64, self.c as f64, self.d as f64);
        let den = (c * x + d) * (c * x + d) + c * c * y * y;
        (((a * x + b) * (c * x + d) + a * c * y * y) / den, y / den)
    }
}

impl Mul for SL2Z {
    type Output = SL2Z;

    fn mul(self, rhs: SL2Z) -> SL2Z {
        SL2Z {
            a: self.a * rhs.a + self.b * rhs.c,
            b: self.a * rhs.b + self.b * rhs.d,
            c: self.c * rhs.a + self.d * rhs.c,
            d: self.c * rhs.b + self.d * rhs.d,
        }
    }
}

impl Neg for SL2Z {
    type Output = SL2Z;

    fn neg(self) -> SL2Z {
        SL2Z {
            a: -self.a,
            b: -self.b,
            c: -self.c,
            d: -self.d,
        }
    }
}

impl fmt::Display for SL2Z {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}; {} {}]", self.a, self.b, self.c, self.d)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("matrix [{a} {b}; {c} {d}] has determinant {det}, expected 1")]
    NotUnimodular {
        a: i64,
        b: i64,
        c: i64,
        d: i64,
        det: i64,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generators() {
        assert_eq!(SL2Z::S * SL2Z::S, -SL2Z::ONE);
        assert_eq!(SL2Z::R.pow(3), -SL2Z::ONE);
        assert!(SL2Z::R.pow(3).is_one_projective());
        assert_eq!(SL2Z::T.pow(5), SL2Z::translation(5));
        assert_eq!(SL2Z::T.pow(-3), SL2Z::translation(-3));
        // P = T·S·T is the lower-triangular parabolic
        assert_eq!(SL2Z::T * SL2Z::S * SL2Z::T, SL2Z::new(1, 0, 1, 1).unwrap());
    }

    #[test]
    fn inverse_and_projective() {
        let m = SL2Z::new(2, 5, 1, 3).unwrap();
        assert!((m * m.inverse()).is_one());
        assert!(m.eq_projective(&-m));
        assert!(!m.eq_projective(&SL2Z::ONE));
    }

    #[test]
    fn action_on_points() {
        // S maps i to i
        let (x, y) = SL2Z::S.apply(0.0, 1.0);
        assert!(x.abs() < 1e-15 && (y - 1.0).abs() < 1e-15);
        // T translates
        let (x, y) = SL2Z::T.apply(0.25, 2.0);
        assert!((x - 1.25).abs() < 1e-15 && (y - 2.0).abs() < 1e-15);
    }
}
