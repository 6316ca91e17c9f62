//! # Nearest-integer continued fractions
//!
//! The nearest-integer continued fraction of `x` is generated by repeatedly
//! splitting off the closest integer and inverting the (negated) remainder:
//! `n_k = [x_k]`, `x_{k+1} = -1/(x_k - n_k)`, so that
//! `x = n_0 - 1/(n_1 - 1/(n_2 - …))`. For a rational input the expansion
//! terminates exactly; for floating input a fixed term cap is the
//! termination rule.
//!
//! Matching each step with the generator word `T^{n}·S` factors any
//! unimodular matrix into the standard generators, which is how the
//! coset-action homomorphism and the pullback algorithm are realized
//! ([`factor_sl2z`]).

use num_rational::Rational64;
use num_traits::Zero;
use rug::Float;
use thiserror::Error;

use crate::matrix::SL2Z;

/// Term cap for rational expansions; hitting it means the input was not the
/// rational it claimed to be.
pub const RATIONAL_TERM_CAP: usize = 10_000;

/// Default term cap for floating-point expansions, which in general do not
/// terminate.
pub const FLOAT_TERM_CAP: usize = 100;

/// The nearest integer `[x] = ⌊x + 1/2⌋`, so `[1/2] = 1` and `[-1/2] = 0`.
///
/// # Examples
///
/// ```
/// use num_rational::Rational64;
/// use psl2z::cfrac::nearest_integer;
///
/// assert_eq!(nearest_integer(Rational64::new(1, 2)), 1);
/// assert_eq!(nearest_integer(Rational64::new(-1, 2)), 0);
/// assert_eq!(nearest_integer(Rational64::new(-7, 3)), -2);
/// ```
pub fn nearest_integer(x: Rational64) -> i64 {
    (x + Rational64::new(1, 2)).floor().to_integer()
}

/// The nearest integer of a floating-point value, or `None` if it does not
/// fit an `i64`.
pub fn nearest_integer_float(x: &Float) -> Option<i64> {
    let mut t = x.clone();
    t += 0.5;
    t.floor_mut();
    t.to_integer().and_then(|z| z.to_i64())
}

/// The exact nearest-integer continued fraction of a rational.
///
/// # Examples
///
/// ```
/// use num_rational::Rational64;
/// use psl2z::cfrac::nicf;
///
/// assert_eq!(nicf(Rational64::new(5, 2)).unwrap(), vec![3, 2]);
/// assert_eq!(nicf(Rational64::new(5, 3)).unwrap(), vec![2, 3]);
/// ```
pub fn nicf(x: Rational64) -> Result<Vec<i64>, FactorizationError> {
    let mut cf = Vec::new();
    let n = nearest_integer(x);
    cf.push(n);
    let mut rem = x - Rational64::from_integer(n);
    while !rem.is_zero() {
        if cf.len() > RATIONAL_TERM_CAP {
            return Err(FactorizationError::IterationCap(RATIONAL_TERM_CAP));
        }
        let y = -rem.recip();
        let n = nearest_integer(y);
        rem = y - Rational64::from_integer(n);
        cf.push(n);
    }
    Ok(cf)
}

/// The nearest-integer continued fraction of a floating value, truncated at
/// `nmax` terms (or earlier if the remainder vanishes exactly).
pub fn nicf_float(x: &Float, nmax: usize) -> Result<Vec<i64>, FactorizationError> {
    let prec = x.prec();
    let mut cf = Vec::new();
    let n = nearest_integer_float(x).ok_or(FactorizationError::UnrepresentableTerm)?;
    cf.push(n);
    let mut rem = Float::with_val(prec, x - n);
    while !rem.is_zero() && cf.len() < nmax {
        let y = -(Float::with_val(prec, 1) / &rem);
        let n = nearest_integer_float(&y).ok_or(FactorizationError::UnrepresentableTerm)?;
        rem = Float::with_val(prec, &y - n);
        cf.push(n);
    }
    Ok(cf)
}

/// A word `±T^{a0}·S·T^{a1}·S·…·S·T^{an}` in the standard generators.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Factorization {
    /// `+1` or `-1`.
    pub sign: i64,
    /// The exponent `a0` of the leading translation.
    pub leading: i64,
    /// The exponents `a1, …, an`, each preceded by one `S`.
    pub exponents: Vec<i64>,
}

impl Factorization {
    /// Multiplies the word back out.
    pub fn reconstruct(&self) -> SL2Z {
        let mut m = SL2Z::translation(self.leading);
        for &e in &self.exponents {
            m = m * SL2Z::S * SL2Z::translation(e);
        }
        if self.sign < 0 {
            -m
        } else {
            m
        }
    }
}

/// Factors a unimodular matrix into the standard generators via the
/// nearest-integer continued fraction of the ratio of its first column.
///
/// The partial quotients of `a/c` give the word up to a trailing
/// translation, which is recovered by multiplying the partial product out
/// and comparing against the input; the result is verified term by term
/// before being returned.
///
/// # Examples
///
/// ```
/// use psl2z::cfrac::factor_sl2z;
/// use psl2z::matrix::SL2Z;
///
/// let m = SL2Z::new(5, 3, 3, 2).unwrap();
/// let f = factor_sl2z(&m).unwrap();
/// assert_eq!(f.reconstruct(), m);
///
/// let t = SL2Z::translation(-4);
/// assert_eq!(factor_sl2z(&t).unwrap().leading, -4);
/// ```
pub fn factor_sl2z(m: &SL2Z) -> Result<Factorization, FactorizationError> {
    if m.c() == 0 {
        // a = d = ±1, so the word is a single translation
        let f = if m.a() == 1 {
            Factorization {
                sign: 1,
                leading: m.b(),
                exponents: Vec::new(),
            }
        } else {
            Factorization {
                sign: -1,
                leading: -m.b(),
                exponents: Vec::new(),
            }
        };
        return verify(f, m);
    }
    let cf = nicf(Rational64::new(m.a(), m.c()))?;
    let mut partial = SL2Z::translation(cf[0]);
    for &e in &cf[1..] {
        partial = partial * SL2Z::S * SL2Z::translation(e);
    }
    partial = partial * SL2Z::S;
    // partial maps oo to a/c, so it differs from m by ±T^k
    let tail = partial.inverse() * *m;
    if tail.c() != 0 || tail.a() != tail.d() || tail.a().abs() != 1 {
        return Err(FactorizationError::SelfCheck {
            got: partial,
            expected: *m,
        });
    }
    let sign = tail.a();
    let mut exponents = cf[1..].to_vec();
    exponents.push(sign * tail.b());
    verify(
        Factorization {
            sign,
            leading: cf[0],
            exponents,
        },
        m,
    )
}

fn verify(f: Factorization, m: &SL2Z) -> Result<Factorization, FactorizationError> {
    let got = f.reconstruct();
    if got == *m {
        Ok(f)
    } else {
        Err(FactorizationError::SelfCheck {
            got,
            expected: *m,
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactorizationError {
    #[error("continued fraction did not terminate within {0} terms")]
    IterationCap(usize),

    #[error("continued-fraction term does not fit a machine integer")]
    UnrepresentableTerm,

    #[error("reconstructed word {got} does not match the input matrix {expected}")]
    SelfCheck { got: SL2Z, expected: SL2Z },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nicf_small_rationals() {
        assert_eq!(nicf(Rational64::new(0, 1)).unwrap(), vec![0]);
        assert_eq!(nicf(Rational64::new(7, 1)).unwrap(), vec![7]);
        // 17/12 = 1 - 1/(-2 - 1/(3 - 1/2))
        let cf = nicf(Rational64::new(17, 12)).unwrap();
        assert_eq!(cf, vec![1, -2, 3, 2]);
        let mut x = Rational64::from_integer(*cf.last().unwrap());
        for &n in cf.iter().rev().skip(1) {
            x = Rational64::from_integer(n) - x.recip();
        }
        assert_eq!(x, Rational64::new(17, 12));
    }

    #[test]
    fn factor_generators() {
        for m in [
            SL2Z::ONE,
            SL2Z::S,
            SL2Z::T,
            SL2Z::R,
            -SL2Z::S,
            SL2Z::translation(11),
            SL2Z::new(5, 3, 3, 2).unwrap(),
            SL2Z::new(-1, 0, 4, -1).unwrap(),
            SL2Z::new(9, 4, -16, -7).unwrap(),
            SL2Z::new(71, 73, 35, 36).unwrap(),
        ] {
            let f = factor_sl2z(&m).unwrap();
            assert_eq!(f.reconstruct(), m, "round trip failed for {m}");
        }
    }

    #[test]
    fn factor_tracks_sign() {
        let f = factor_sl2z(&-SL2Z::ONE).unwrap();
        assert_eq!(f.sign, -1);
        assert!(f.reconstruct().is_one_projective());
    }

    #[test]
    fn float_expansion_caps() {
        let x = Float::with_val(100, 3.14159265358979);
        let cf = nicf_float(&x, 10).unwrap();
        assert_eq!(cf.len(), 10);
        assert_eq!(cf[0], 3);
        assert_eq!(cf[1], -7);
    }
}
