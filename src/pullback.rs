//! # Pullback to the fundamental domain
//!
//! Reduces a point of the upper half-plane into the fundamental domain of a
//! subgroup. The reduction first maps the point into the standard
//! fundamental strip of the full modular group by translating with the
//! nearest integer of the real part and inverting while the point lies
//! inside the unit circle (the nearest-integer continued fraction of the
//! real part, in matrix form), and then moves the reduced point into the
//! subgroup's domain through the unique fitting coset representative.
//!
//! Both a double-precision and an arbitrary-precision variant are provided;
//! for the `Γ0(N)` origin the representative search degenerates to a single
//! congruence on the lower-left entry.

use rug::Float;
use thiserror::Error;

use crate::cfrac::{nearest_integer_float, FactorizationError};
use crate::group::Subgroup;
use crate::matrix::SL2Z;

/// Iteration cap for the strip reduction; a safeguard against cycling on
/// boundary points, not a cancellation mechanism.
const REDUCTION_CAP: usize = 10_000;

/// Slack below the unit circle for the double-precision inversion test.
const UNIT_CIRCLE_EPS: f64 = 1e-12;

/// Reduces `x + iy` into the strip `|x| ≤ 1/2`, `x² + y² ≥ 1`, returning
/// the reduced coordinates and the accumulated word `A` with
/// `A(x + iy) = x' + iy'`.
pub fn reduce_to_psl2z(mut x: f64, mut y: f64) -> Result<(f64, f64, SL2Z), PullbackError> {
    let (mut a, mut b, mut c, mut d) = (1i64, 0i64, 0i64, 1i64);
    for _ in 0..REDUCTION_CAP {
        let dx = (x + 0.5).floor();
        if dx != 0.0 {
            if dx.abs() >= 9.0e18 {
                return Err(PullbackError::Overflow);
            }
            let n = dx as i64;
            x -= dx;
            a = step(a, n, c)?;
            b = step(b, n, d)?;
        }
        let r2 = x * x + y * y;
        if r2 < 1.0 - UNIT_CIRCLE_EPS {
            x = -x / r2;
            y /= r2;
            (a, b, c, d) = (-c, -d, a, b);
        } else {
            let m = SL2Z::new(a, b, c, d).expect("the reduction word is unimodular");
            return Ok((x, y, m));
        }
    }
    Err(PullbackError::IterationCap(REDUCTION_CAP))
}

/// `lhs - n·rhs` with overflow detection.
fn step(lhs: i64, n: i64, rhs: i64) -> Result<i64, PullbackError> {
    n.checked_mul(rhs)
        .and_then(|p| lhs.checked_sub(p))
        .ok_or(PullbackError::Overflow)
}

/// The arbitrary-precision strip reduction, performed at working precision
/// `wprec`.
pub fn reduce_to_psl2z_float(
    x0: &Float,
    y0: &Float,
    wprec: u32,
) -> Result<(Float, Float, SL2Z), PullbackError> {
    let mut x = Float::with_val(wprec, x0);
    let mut y = Float::with_val(wprec, y0);
    let (mut a, mut b, mut c, mut d) = (1i64, 0i64, 0i64, 1i64);
    // stop just inside the circle, as in the double-precision variant
    let threshold = Float::with_val(wprec, 1) - (Float::with_val(wprec, 1) >> wprec.saturating_sub(8));
    for _ in 0..REDUCTION_CAP {
        let n = nearest_integer_float(&x).ok_or(PullbackError::Overflow)?;
        if n != 0 {
            x -= n;
            a = step(a, n, c)?;
            b = step(b, n, d)?;
        }
        let r2 = Float::with_val(wprec, &x * &x) + Float::with_val(wprec, &y * &y);
        if r2 < threshold {
            let xn = -Float::with_val(wprec, &x / &r2);
            y /= &r2;
            x = xn;
            (a, b, c, d) = (-c, -d, a, b);
        } else {
            let m = SL2Z::new(a, b, c, d).expect("the reduction word is unimodular");
            return Ok((x, y, m));
        }
    }
    Err(PullbackError::IterationCap(REDUCTION_CAP))
}

/// Applies `z ↦ (a·z + b)/(c·z + d)` at precision `prec`.
pub fn apply_map_float(m: &SL2Z, x: &Float, y: &Float, prec: u32) -> (Float, Float) {
    let (a, b, c, d) = m.entries();
    let cxd = Float::with_val(prec, x * c) + d;
    let axb = Float::with_val(prec, x * a) + b;
    let cy = Float::with_val(prec, y * c);
    let ay = Float::with_val(prec, y * a);
    let den = Float::with_val(prec, &cxd * &cxd) + Float::with_val(prec, &cy * &cy);
    let num = Float::with_val(prec, &axb * &cxd) + Float::with_val(prec, &ay * &cy);
    let xp = num / &den;
    let yp = Float::with_val(prec, y / &den);
    (xp, yp)
}

impl Subgroup {
    /// Pulls `x + iy` back into the fundamental domain, returning the
    /// reduced point and the group element `B` with `B(x + iy)` equal to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use psl2z::group::Subgroup;
    /// use psl2z::permutation::Permutation;
    ///
    /// // the full modular group
    /// let g = Subgroup::from_permutations(
    ///     &Permutation::identity(1),
    ///     &Permutation::identity(1),
    /// )
    /// .unwrap();
    /// let (x, y, _) = g.pullback(2.3, 0.1).unwrap();
    /// assert!(x.abs() <= 0.5 + 1e-9);
    /// assert!(x * x + y * y >= 1.0 - 1e-9);
    /// ```
    pub fn pullback(&self, x: f64, y: f64) -> Result<(f64, f64, SL2Z), PullbackError> {
        if !x.is_finite() || !y.is_finite() || y <= 0.0 {
            return Err(PullbackError::NotInUpperHalfPlane { x, y });
        }
        let (_, _, word) = reduce_to_psl2z(x, y)?;
        let map = self.reduction_into_group(&word)?;
        let (xp, yp) = map.apply(x, y);
        Ok((xp, yp, map))
    }

    /// The arbitrary-precision pullback. The reducing word is found at a
    /// working precision above `prec` for the `Γ0(N)` origin (in double
    /// precision otherwise), and the resulting exact matrix is applied to
    /// the input at a precision enlarged by the coefficient magnitude.
    pub fn pullback_float(
        &self,
        x: &Float,
        y: &Float,
        prec: u32,
    ) -> Result<(Float, Float, SL2Z), PullbackError> {
        if !y.is_finite() || y.is_sign_negative() || y.is_zero() {
            return Err(PullbackError::NotInUpperHalfPlane {
                x: x.to_f64(),
                y: y.to_f64(),
            });
        }
        let word = if self.gamma0_level().is_some() && prec > 53 {
            let (_, _, w) = reduce_to_psl2z_float(x, y, prec + 64)?;
            w
        } else {
            let (_, _, w) = reduce_to_psl2z(x.to_f64(), y.to_f64())?;
            w
        };
        let map = self.reduction_into_group(&word)?;
        let (a, b, c, d) = map.entries();
        let magnitude = [a, b, c, d]
            .iter()
            .map(|e| 64 - e.unsigned_abs().leading_zeros())
            .max()
            .unwrap_or(0);
        let (xp, yp) = apply_map_float(&map, x, y, prec + 64 + magnitude);
        Ok((
            Float::with_val(prec, xp),
            Float::with_val(prec, yp),
            map,
        ))
    }

    /// Completes a strip-reduction word to a subgroup element: finds the
    /// unique representative `V` with `V·A` in the subgroup. For the
    /// `Γ0(N)` origin the search is the lower-left congruence; otherwise
    /// the representative is read off the inverse coset action.
    fn reduction_into_group(&self, word: &SL2Z) -> Result<SL2Z, PullbackError> {
        if let Some(level) = self.gamma0_level() {
            for v in &self.reps {
                let b = *v * *word;
                if b.c() % level == 0 {
                    return Ok(b);
                }
            }
            return Err(PullbackError::NoCosetRep);
        }
        let action = self.permutation_action(word)?;
        let j = action.apply_inverse(0);
        let b = self.reps[j] * *word;
        debug_assert!(self.contains(&b));
        Ok(b)
    }

    /// The vertex whose scaled normalizing map gives the point the largest
    /// imaginary part; ties keep the lowest vertex index.
    pub fn closest_vertex(&self, x: f64, y: f64) -> usize {
        let mut best = 0usize;
        let mut ymax = f64::NEG_INFINITY;
        for (j, m) in self.vertex_maps.iter().enumerate() {
            let (_, yy) = m.apply(x, y);
            let val = yy / self.vertex_widths[j] as f64;
            if val > ymax {
                ymax = val;
                best = j;
            }
        }
        best
    }

    /// The cusp class of the closest vertex.
    pub fn closest_cusp(&self, x: f64, y: f64) -> usize {
        self.vertex_data[self.closest_vertex(x, y)].cusp
    }

    /// Both the closest cusp and the vertex that realized it.
    pub fn closest_cusp_and_vertex(&self, x: f64, y: f64) -> (usize, usize) {
        let v = self.closest_vertex(x, y);
        (self.vertex_data[v].cusp, v)
    }

    /// Applies the normalizer of cusp `j` (scaled by the width) to the
    /// point, or its inverse when `inverse` is set.
    pub fn normalize_to_cusp(&self, x: f64, y: f64, j: usize, inverse: bool) -> (f64, f64) {
        let n = self.cusp_data[j].normalizer;
        let w = self.cusp_data[j].width as f64;
        if inverse {
            let (xx, yy) = n.inverse().apply(x, y);
            (xx / w, yy / w)
        } else {
            n.apply(x * w, y * w)
        }
    }

    /// The minimal invariant height of the fundamental domain:
    /// `√3/(2·level)` for `Γ0(N)`, `√3/(2·max width)` otherwise.
    pub fn minimal_height(&self) -> f64 {
        let scale = match self.gamma0_level() {
            Some(level) => level,
            None => self
                .cusp_data
                .iter()
                .map(|c| c.width)
                .max()
                .unwrap_or(1),
        };
        3f64.sqrt() / (2.0 * scale as f64)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PullbackError {
    #[error("({x}, {y}) is not a point of the upper half-plane")]
    NotInUpperHalfPlane { x: f64, y: f64 },

    #[error("matrix coefficients overflowed during the strip reduction")]
    Overflow,

    #[error("strip reduction did not stabilize within {0} iterations")]
    IterationCap(usize),

    #[error("no coset representative carries the reduced point into the subgroup")]
    NoCosetRep,

    #[error(transparent)]
    Factorization(#[from] FactorizationError),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::permutation::Permutation;

    fn index6_gamma0_5_shape() -> Subgroup {
        let s = Permutation::from_cycles(6, &[vec![0, 1], vec![2, 3]]).unwrap();
        let r = Permutation::from_cycles(6, &[vec![0, 2, 1], vec![3, 4, 5]]).unwrap();
        Subgroup::from_permutations(&s, &r).unwrap()
    }

    #[test]
    fn strip_reduction_lands_in_the_domain() {
        for (x, y) in [(2.3, 0.1), (-4.7, 0.01), (0.49, 0.8), (100.25, 3.0)] {
            let (xr, yr, m) = reduce_to_psl2z(x, y).unwrap();
            assert!(xr.abs() <= 0.5 + 1e-9);
            assert!(xr * xr + yr * yr >= 1.0 - 1e-9);
            let (xa, ya) = m.apply(x, y);
            assert!((xa - xr).abs() < 1e-9 && (ya - yr).abs() < 1e-9);
        }
    }

    #[test]
    fn interior_points_are_fixed() {
        let (x, y, m) = reduce_to_psl2z(0.1, 2.0).unwrap();
        assert!(m.is_one());
        assert_eq!((x, y), (0.1, 2.0));
    }

    fn invariant_height(g: &Subgroup, x: f64, y: f64) -> f64 {
        g.vertex_maps
            .iter()
            .zip(&g.vertex_widths)
            .map(|(m, w)| m.apply(x, y).1 / *w as f64)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    #[test]
    fn pullback_is_a_group_element() {
        let g = index6_gamma0_5_shape();
        let (xp, yp, b) = g.pullback(2.3, 0.1).unwrap();
        assert!(g.contains(&b));
        let (xa, ya) = b.apply(2.3, 0.1);
        assert!((xa - xp).abs() < 1e-9 && (ya - yp).abs() < 1e-9);
        // every orbit reaches at least the minimal invariant height
        assert!(invariant_height(&g, xp, yp) >= g.minimal_height() - 1e-9);
    }

    #[test]
    fn pullback_fixes_interior_points() {
        let g = index6_gamma0_5_shape();
        // 0.2 + 0.5i already lies in the assembled fundamental domain
        let (xp, yp, b) = g.pullback(0.2, 0.5).unwrap();
        assert!(b.is_one_projective());
        assert!((xp - 0.2).abs() < 1e-12 && (yp - 0.5).abs() < 1e-12);
        assert!(yp >= g.minimal_height());
    }

    #[test]
    fn gamma0_fast_path_agrees_with_the_generic_one() {
        let fast = Subgroup::gamma0(5).unwrap();
        let generic = index6_gamma0_5_shape();
        for (x, y) in [(0.2, 0.5), (2.3, 0.1), (-0.7, 0.3)] {
            let (xf, yf, bf) = fast.pullback(x, y).unwrap();
            assert!(bf.c() % 5 == 0);
            let (xg, yg, _) = generic.pullback(x, y).unwrap();
            // both groups are the same subgroup, so the orbits agree; the
            // reduced points coincide because the representative is unique
            assert!((xf - xg).abs() < 1e-9, "{xf} vs {xg}");
            assert!((yf - yg).abs() < 1e-9);
        }
    }

    #[test]
    fn float_pullback_matches_double() {
        let g = Subgroup::gamma0(5).unwrap();
        let x = Float::with_val(200, 0.23);
        let y = Float::with_val(200, 0.11);
        let (xp, yp, b) = g.pullback_float(&x, &y, 200).unwrap();
        let (xd, yd, bd) = g.pullback(0.23, 0.11).unwrap();
        assert!(b.eq_projective(&bd) || b == bd);
        assert!((xp.to_f64() - xd).abs() < 1e-9);
        assert!((yp.to_f64() - yd).abs() < 1e-9);
    }

    #[test]
    fn closest_vertex_prefers_the_scaled_height() {
        let g = Subgroup::gamma0(5).unwrap();
        // high in the strip: the cusp at infinity
        assert_eq!(g.closest_vertex(-0.4, 0.2), 0);
        // low near the origin: the zero cusp
        let v = g.closest_vertex(-0.1, 0.1);
        assert_eq!(g.vertices()[v], crate::cusp::Cusp::ZERO);
        assert_eq!(g.closest_cusp(-0.1, 0.1), v);
    }

    #[test]
    fn rejects_lower_half_plane() {
        let g = Subgroup::gamma0(5).unwrap();
        assert!(matches!(
            g.pullback(0.0, -1.0),
            Err(PullbackError::NotInUpperHalfPlane { .. })
        ));
        assert!(g.pullback(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn minimal_heights() {
        let g = Subgroup::gamma0(6).unwrap();
        assert!((g.minimal_height() - 0.144337567297406).abs() < 1e-12);
        let h = index6_gamma0_5_shape();
        assert!((h.minimal_height() - 3f64.sqrt() / 10.0).abs() < 1e-12);
    }
}
