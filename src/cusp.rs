//! # Cusps
//!
//! A [`Cusp`] is a point of the rational boundary of the upper half-plane:
//! a reduced fraction `p/q` or the point at infinity, stored as a primitive
//! integer pair with non-negative denominator. Cusps are the boundary values
//! `V(∞)` of the coset representatives, and group them into equivalence
//! classes under the subgroup action (see [`crate::domain`]).

use std::fmt;

use num_integer::{ExtendedGcd, Integer};
use num_rational::Rational64;
use thiserror::Error;

use crate::matrix::SL2Z;

/// A rational boundary point `p/q` in lowest terms (`q ≥ 0`), with `q = 0`
/// encoding the point at infinity as `(1, 0)`.
///
/// # Examples
///
/// ```
/// use psl2z::cusp::Cusp;
///
/// assert_eq!(Cusp::new(4, -6), Cusp::new(-2, 3));
/// assert_eq!(Cusp::new(7, 0), Cusp::INFINITY);
/// assert_eq!(Cusp::new(-1, 2).to_string(), "-1/2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cusp {
    p: i64,
    q: i64,
}

impl Cusp {
    /// The cusp at infinity, `(1, 0)`.
    pub const INFINITY: Cusp = Cusp { p: 1, q: 0 };

    /// The cusp `0 = (0, 1)`.
    pub const ZERO: Cusp = Cusp { p: 0, q: 1 };

    /// Builds the cusp `p/q`, reducing to lowest terms and normalizing the
    /// sign of the denominator. `(p, 0)` is the point at infinity.
    pub fn new(p: i64, q: i64) -> Self {
        debug_assert!(p != 0 || q != 0, "cusp (0, 0) is not a boundary point");
        if q == 0 {
            return Cusp::INFINITY;
        }
        if p == 0 {
            return Cusp::ZERO;
        }
        let g = p.gcd(&q);
        let (mut p, mut q) = (p / g, q / g);
        if q < 0 {
            p = -p;
            q = -q;
        }
        Cusp { p, q }
    }

    pub fn from_rational(r: Rational64) -> Self {
        Cusp::new(*r.numer(), *r.denom())
    }

    pub fn numerator(&self) -> i64 {
        self.p
    }

    pub fn denominator(&self) -> i64 {
        self.q
    }

    pub fn is_infinite(&self) -> bool {
        self.q == 0
    }

    /// The cusp as an exact rational, or `None` at infinity.
    pub fn as_rational(&self) -> Option<Rational64> {
        (self.q != 0).then(|| Rational64::new(self.p, self.q))
    }

    /// A unimodular matrix mapping `∞` to this cusp; the identity at `∞`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use psl2z::cusp::Cusp;
    /// let n = Cusp::new(3, 7).lift();
    /// assert_eq!((n.a(), n.c()), (3, 7));
    /// assert_eq!(Cusp::INFINITY.transformed_by(&n), Cusp::new(3, 7));
    /// ```
    pub fn lift(&self) -> SL2Z {
        if self.q == 0 {
            return SL2Z::ONE;
        }
        let ExtendedGcd { x, y, .. } = self.p.extended_gcd(&self.q);
        // p·x + q·y = 1, so [[p, -y], [q, x]] has determinant one
        SL2Z::new(self.p, -y, self.q, x)
            .expect("extended gcd of a primitive pair yields a unimodular lift")
    }

    /// The image under a fractional-linear transformation.
    pub fn transformed_by(&self, m: &SL2Z) -> Cusp {
        let (a, b, c, d) = m.entries();
        Cusp::new(a * self.p + b * self.q, c * self.p + d * self.q)
    }

    /// The width of this cusp in `Γ0(n)`: `n / gcd(n, q²)`.
    pub fn gamma0_width(&self, n: i64) -> i64 {
        let qq = ((self.q % n) as i128 * (self.q % n) as i128 % n as i128) as i64;
        n / n.gcd(&qq)
    }

    /// `Γ0(n)`-equivalence by the congruence criterion of Cremona
    /// (Prop. 2.2.3): `p1/q1 ~ p2/q2` iff `s1·q2 ≡ s2·q1` modulo
    /// `gcd(q1·q2, n)`, where `s_i` inverts `p_i` modulo `q_i`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use psl2z::cusp::Cusp;
    /// assert!(Cusp::new(1, 2).is_gamma0_equiv(&Cusp::new(-1, 2), 4));
    /// assert!(!Cusp::new(0, 1).is_gamma0_equiv(&Cusp::INFINITY, 4));
    /// ```
    pub fn is_gamma0_equiv(&self, other: &Cusp, n: i64) -> bool {
        if self == other {
            return true;
        }
        let g = (self.q * other.q).gcd(&n);
        let s1 = invert_mod(self.p, self.q);
        let s2 = invert_mod(other.p, other.q);
        (s1 * other.q - s2 * self.q).rem_euclid(g) == 0
    }
}

/// A solution of `p·s ≡ 1 (mod q)` for a primitive pair; for `q = 0` this is
/// `p` itself (`p = ±1`).
fn invert_mod(p: i64, q: i64) -> i64 {
    if q == 0 {
        return p;
    }
    let ExtendedGcd { x, .. } = p.extended_gcd(&q);
    x.rem_euclid(q.abs())
}

impl fmt::Display for Cusp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.q == 0 {
            write!(f, "oo")
        } else if self.q == 1 {
            write!(f, "{}", self.p)
        } else {
            write!(f, "{}/{}", self.p, self.q)
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CuspError {
    #[error("{0} is not a cusp of this group")]
    UnknownCusp(Cusp),

    #[error("no cusp equivalent to {0} was found")]
    NotEquivalent(Cusp),

    #[error("the group is not a congruence subgroup; use the generalised level")]
    NotCongruence,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reduction() {
        assert_eq!(Cusp::new(6, 4), Cusp::new(3, 2));
        assert_eq!(Cusp::new(-6, -4), Cusp::new(3, 2));
        assert_eq!(Cusp::new(6, -4), Cusp::new(-3, 2));
        assert_eq!(Cusp::new(0, -5), Cusp::ZERO);
        assert_eq!(Cusp::new(-3, 0), Cusp::INFINITY);
    }

    #[test]
    fn lifts_map_infinity() {
        for (p, q) in [(1, 0), (0, 1), (-1, 2), (3, 7), (22, 15)] {
            let c = Cusp::new(p, q);
            assert_eq!(Cusp::INFINITY.transformed_by(&c.lift()), c);
        }
    }

    #[test]
    fn transformation() {
        // S swaps 0 and oo
        assert_eq!(Cusp::ZERO.transformed_by(&SL2Z::S), Cusp::INFINITY);
        assert_eq!(Cusp::INFINITY.transformed_by(&SL2Z::S), Cusp::ZERO);
        // T translates
        assert_eq!(Cusp::new(1, 3).transformed_by(&SL2Z::T), Cusp::new(4, 3));
        assert_eq!(Cusp::INFINITY.transformed_by(&SL2Z::T), Cusp::INFINITY);
    }

    #[test]
    fn gamma0_widths() {
        assert_eq!(Cusp::INFINITY.gamma0_width(12), 1);
        assert_eq!(Cusp::ZERO.gamma0_width(12), 12);
        assert_eq!(Cusp::new(1, 2).gamma0_width(12), 3);
        assert_eq!(Cusp::new(1, 3).gamma0_width(12), 4);
        assert_eq!(Cusp::new(1, 6).gamma0_width(12), 1);
    }

    #[test]
    fn gamma0_equivalence() {
        // the three cusp classes of Gamma0(4)
        let classes = [Cusp::INFINITY, Cusp::ZERO, Cusp::new(1, 2)];
        for (i, a) in classes.iter().enumerate() {
            for (j, b) in classes.iter().enumerate() {
                assert_eq!(a.is_gamma0_equiv(b, 4), i == j);
            }
        }
        // 1/3 falls in with 0 for Gamma0(4), and -1/2 with 1/2
        assert!(Cusp::new(1, 3).is_gamma0_equiv(&Cusp::ZERO, 4));
        assert!(Cusp::new(-1, 2).is_gamma0_equiv(&Cusp::new(1, 2), 4));
    }
}
