//! # Fundamental domain
//!
//! From a system of coset representatives this module derives the geometry
//! of the fundamental polygon: the distinct vertices `V_j(∞)`, their
//! grouping into cusp equivalence classes, and for each cusp a normalizer
//! (mapping `∞` to the cusp), a width (the length of the corresponding
//! translation cycle) and a stabilizer `N·T^w·N⁻¹` that must lie in the
//! subgroup.
//!
//! Vertices and cusps are listed in discovery order of the representatives;
//! since `V_0` is the identity, `∞` always comes first, and `0` follows
//! immediately whenever it occurs.

use num_integer::Integer;
use thiserror::Error;
use tracing::debug;

use crate::cusp::Cusp;
use crate::matrix::SL2Z;
use crate::permutation::Permutation;

/// Data attached to one vertex of the fundamental polygon.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexData {
    /// Index of the cusp class the vertex belongs to.
    pub cusp: usize,
    /// A subgroup element mapping the vertex to its canonical cusp.
    pub cusp_map: SL2Z,
    /// The coset indices whose representatives map `∞` to this vertex.
    pub cosets: Vec<usize>,
    /// Length of the translation cycle through those cosets.
    pub width: i64,
}

/// Data attached to one cusp equivalence class.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CuspData {
    /// Maps `∞` to the cusp.
    pub normalizer: SL2Z,
    pub width: i64,
    /// `normalizer · T^width · normalizer⁻¹`; lies in the subgroup.
    pub stabilizer: SL2Z,
    /// The vertices belonging to this class.
    pub vertices: Vec<usize>,
}

/// The topological signature `(index, cusps, ν₂, ν₃, genus)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    pub index: usize,
    pub ncusps: usize,
    pub nu2: usize,
    pub nu3: usize,
    pub genus: usize,
}

/// The assembled geometric model.
#[derive(Debug, Clone)]
pub struct Domain {
    pub vertices: Vec<Cusp>,
    pub vertex_data: Vec<VertexData>,
    pub cusps: Vec<Cusp>,
    pub cusp_data: Vec<CuspData>,
}

/// A canonical cusp candidate produced by the `Γ0(N)` divisor search.
struct CuspCandidate {
    canonical: Cusp,
    /// Subgroup element mapping the vertex to the canonical cusp.
    map: SL2Z,
    /// Maps `∞` to the canonical cusp.
    normalizer: SL2Z,
    width: i64,
}

/// Builds vertices, cusp classes and their normalizer/stabilizer/width
/// tables. May left-multiply representatives of a vertex once by the
/// connecting subgroup element when the vertex is replaced by a canonical
/// cusp value; this keeps the coset labelling intact since the factor lies
/// in the subgroup.
pub(crate) fn build_domain<F: Fn(&SL2Z) -> bool>(
    reps: &mut [SL2Z],
    perm_t: &Permutation,
    generalised_level: i64,
    gamma0_level: Option<i64>,
    contains: F,
) -> Result<Domain, ConsistencyError> {
    // distinct boundary values of the representatives, in discovery order
    let mut vertices: Vec<Cusp> = Vec::new();
    let mut vertex_data: Vec<VertexData> = Vec::new();
    for j in 0..reps.len() {
        let v = if reps[j].c() == 0 {
            Cusp::INFINITY
        } else {
            Cusp::new(reps[j].a(), reps[j].c())
        };
        match vertices.iter().position(|&x| x == v) {
            Some(vi) => vertex_data[vi].cosets.push(j),
            None => {
                vertices.push(v);
                vertex_data.push(VertexData {
                    cusp: usize::MAX,
                    cusp_map: SL2Z::ONE,
                    cosets: vec![j],
                    width: perm_t.cycle_len(j) as i64,
                });
            }
        }
    }

    let mut cusps: Vec<Cusp> = Vec::new();
    let mut cusp_data: Vec<CuspData> = Vec::new();
    // V_0 is the identity, so the first vertex is always ∞
    if vertices[0] == Cusp::INFINITY {
        let w = vertex_data[0].width;
        cusps.push(Cusp::INFINITY);
        cusp_data.push(CuspData {
            normalizer: SL2Z::ONE,
            width: w,
            stabilizer: SL2Z::translation(w),
            vertices: Vec::new(),
        });
    }

    for j in 0..vertices.len() {
        let v = vertices[j];
        if let Some(ci) = cusps.iter().position(|&c| c == v) {
            vertex_data[j].cusp = ci;
            cusp_data[ci].vertices.push(j);
            continue;
        }
        let cand = gamma0_level.and_then(|n| gamma0_equivalent_cusp(v, n, &contains));
        if let Some(c) = &cand {
            if let Some(ci) = cusps.iter().position(|&x| x == c.canonical) {
                vertex_data[j].cusp = ci;
                vertex_data[j].cusp_map = c.map;
                cusp_data[ci].vertices.push(j);
                continue;
            }
        }
        if cand.is_none() {
            let mut assigned = false;
            for ci in 0..cusps.len() {
                if let Some(g) = equivalent_map(&contains, generalised_level, cusps[ci], v) {
                    // g maps the canonical cusp to the vertex
                    vertex_data[j].cusp = ci;
                    vertex_data[j].cusp_map = g.inverse();
                    cusp_data[ci].vertices.push(j);
                    assigned = true;
                    break;
                }
            }
            if assigned {
                continue;
            }
        }
        // a new cusp class opens at this vertex
        let ci = cusps.len();
        vertex_data[j].cusp = ci;
        match cand {
            Some(c) => {
                debug!(vertex = %v, canonical = %c.canonical, "canonicalizing cusp");
                let width = vertex_data[j].width;
                if c.width != width {
                    return Err(ConsistencyError::WidthMismatch {
                        cusp: c.canonical,
                        computed: c.width,
                        cycle: width,
                    });
                }
                cusps.push(c.canonical);
                vertex_data[j].cusp_map = c.map;
                if c.canonical != v && !vertices.contains(&c.canonical) {
                    // replace the vertex by its canonical value and re-anchor
                    // the representatives with the connecting group element
                    for &cj in &vertex_data[j].cosets {
                        reps[cj] = c.map * reps[cj];
                    }
                    vertices[j] = c.canonical;
                    vertex_data[j].cusp_map = SL2Z::ONE;
                }
                let stabilizer = c.normalizer * SL2Z::translation(width) * c.normalizer.inverse();
                cusp_data.push(CuspData {
                    normalizer: c.normalizer,
                    width,
                    stabilizer,
                    vertices: vec![j],
                });
            }
            None => {
                let width = vertex_data[j].width;
                let normalizer = reps[vertex_data[j].cosets[0]];
                let stabilizer = normalizer * SL2Z::translation(width) * normalizer.inverse();
                cusps.push(v);
                cusp_data.push(CuspData {
                    normalizer,
                    width,
                    stabilizer,
                    vertices: vec![j],
                });
            }
        }
    }

    // the cusp classes are in bijection with the translation cycles
    let expected = perm_t.cycles().len();
    if cusps.len() != expected {
        return Err(ConsistencyError::CuspCount {
            expected,
            got: cusps.len(),
        });
    }
    for (ci, data) in cusp_data.iter().enumerate() {
        if Cusp::INFINITY.transformed_by(&data.normalizer) != cusps[ci] {
            return Err(ConsistencyError::BadNormalizer { cusp: cusps[ci] });
        }
        if !contains(&data.stabilizer) {
            return Err(ConsistencyError::StabilizerNotInGroup { cusp: cusps[ci] });
        }
    }
    for (vi, data) in vertex_data.iter().enumerate() {
        if vertices[vi].transformed_by(&data.cusp_map) != cusps[data.cusp] {
            return Err(ConsistencyError::BadCuspMap {
                vertex: vertices[vi],
                cusp: cusps[data.cusp],
            });
        }
    }

    Ok(Domain {
        vertices,
        vertex_data,
        cusps,
        cusp_data,
    })
}

/// Searches for a subgroup element mapping `from` to `to`, sweeping the
/// translation exponent up to the generalised level in both directions.
pub(crate) fn equivalent_map<F: Fn(&SL2Z) -> bool>(
    contains: &F,
    sweep: i64,
    from: Cusp,
    to: Cusp,
) -> Option<SL2Z> {
    let nf_inv = from.lift().inverse();
    let nt = to.lift();
    for i in 0..sweep.max(1) {
        for e in [i, -i] {
            let cand = nt * SL2Z::translation(e) * nf_inv;
            if contains(&cand) {
                return Some(cand);
            }
            if i == 0 {
                break;
            }
        }
    }
    None
}

/// The divisor-driven canonical-cusp search for `Γ0(N)`: tries to rewrite a
/// vertex as an equivalent cusp of the shape `-d/N` for a divisor `d` of the
/// level, returning the connecting subgroup element and a canonical
/// normalizer. Divisors with `gcd(d, N/d) = 1` belong to Atkin–Lehner
/// classes whose canonical form is handled downstream by the normalizer
/// tables, and are skipped here as in the original search.
fn gamma0_equivalent_cusp<F: Fn(&SL2Z) -> bool>(
    v: Cusp,
    level: i64,
    contains: &F,
) -> Option<CuspCandidate> {
    if v.is_infinite() {
        return Some(CuspCandidate {
            canonical: Cusp::INFINITY,
            map: SL2Z::ONE,
            normalizer: SL2Z::ONE,
            width: 1,
        });
    }
    if v == Cusp::ZERO {
        return Some(CuspCandidate {
            canonical: Cusp::ZERO,
            map: SL2Z::ONE,
            normalizer: SL2Z::S,
            width: level,
        });
    }
    for d in 1..=level {
        if level % d != 0 {
            continue;
        }
        let canonical = Cusp::new(-d, level);
        if !v.is_gamma0_equiv(&canonical, level) {
            continue;
        }
        if d.gcd(&(level / d)) == 1 {
            continue;
        }
        let map = equivalent_map(contains, level, v, canonical)?;
        let normalizer = if canonical == Cusp::new(-1, 2) {
            // canonical normalizer of the half-integer cusp
            SL2Z::new(1, 0, -2, 1).expect("unimodular by inspection")
        } else {
            map * v.lift()
        };
        return Some(CuspCandidate {
            canonical,
            map,
            normalizer,
            width: canonical.gamma0_width(level),
        });
    }
    None
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("permutation {which} has order {order}, which does not divide {requirement}")]
    WrongOrder {
        which: &'static str,
        order: u64,
        requirement: u64,
    },

    #[error("the generating permutations do not act transitively")]
    NotTransitive,

    #[error("permutations have different lengths: {0} and {1}")]
    LengthMismatch(usize, usize),

    #[error("supplied index {expected} does not match the permutation degree {got}")]
    IndexMismatch { expected: usize, got: usize },

    #[error("level {0} is not a positive integer")]
    InvalidLevel(i64),

    #[error("the derived coset action does not match the supplied generating permutations")]
    ActionMismatch,

    #[error("cusp classification found {got} classes, expected {expected} translation cycles")]
    CuspCount { expected: usize, got: usize },

    #[error("stabilizer of cusp {cusp} does not lie in the subgroup")]
    StabilizerNotInGroup { cusp: Cusp },

    #[error("cusp {cusp} has cycle width {cycle} but closed-form width {computed}")]
    WidthMismatch {
        cusp: Cusp,
        computed: i64,
        cycle: i64,
    },

    #[error("normalizer does not map ∞ to cusp {cusp}")]
    BadNormalizer { cusp: Cusp },

    #[error("cusp map does not send vertex {vertex} to cusp {cusp}")]
    BadCuspMap { vertex: Cusp, cusp: Cusp },

    #[error(
        "signature (index {index}, cusps {ncusps}, ν₂ {nu2}, ν₃ {nu3}) violates the \
         Riemann–Hurwitz integrality constraint"
    )]
    SignatureNotIntegral {
        index: usize,
        ncusps: usize,
        nu2: usize,
        nu3: usize,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coset::{reps_from_congruence, CosetEquivalence};

    fn gamma0_contains(n: i64) -> impl Fn(&SL2Z) -> bool {
        move |m: &SL2Z| m.c() % n == 0
    }

    #[test]
    fn gamma0_4_has_three_cusps() {
        let eq = CosetEquivalence::Gamma0(4);
        let mut reps = reps_from_congruence(6, 4, &eq).unwrap();
        let (ps, pr) = crate::coset::perms_from_reps(&reps, &eq).unwrap();
        let pt = ps.then(&pr);
        let domain = build_domain(&mut reps, &pt, 4, Some(4), gamma0_contains(4)).unwrap();
        assert_eq!(domain.cusps.len(), 3);
        assert_eq!(domain.cusps[0], Cusp::INFINITY);
        assert!(domain.cusps.contains(&Cusp::ZERO));
        assert!(domain.cusps.contains(&Cusp::new(-1, 2)));
        let mut widths: Vec<i64> = domain.cusp_data.iter().map(|c| c.width).collect();
        widths.sort_unstable();
        assert_eq!(widths, vec![1, 1, 4]);
        // the half-integer cusp carries its canonical normalizer
        let half = domain
            .cusps
            .iter()
            .position(|&c| c == Cusp::new(-1, 2))
            .unwrap();
        assert_eq!(
            domain.cusp_data[half].normalizer,
            SL2Z::new(1, 0, -2, 1).unwrap()
        );
    }

    #[test]
    fn equivalent_map_moves_cusps() {
        let contains = gamma0_contains(4);
        let g = equivalent_map(&contains, 4, Cusp::new(1, 2), Cusp::new(-1, 2)).unwrap();
        assert!(contains(&g));
        assert_eq!(Cusp::new(1, 2).transformed_by(&g), Cusp::new(-1, 2));
        assert!(equivalent_map(&contains, 4, Cusp::ZERO, Cusp::INFINITY).is_none());
    }
}
