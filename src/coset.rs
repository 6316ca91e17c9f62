//! # Coset enumeration
//!
//! Builds a full system of right coset representatives `V_0 = 1, …, V_{n-1}`
//! for a finite-index subgroup `G`, so that the modular group is the
//! disjoint union of the `G·V_j` and the coset action sends `V_j` to `j`
//! when evaluated at the base coset `0`.
//!
//! Two strategies:
//! - [`reps_from_permutations`] works for an arbitrary transitive generating
//!   pair, walking the translation cycles and connecting them through the
//!   order-2 generator;
//! - [`reps_from_congruence`] starts from the canonical translates around
//!   `0` and saturates with right multiplications, admitting only
//!   representatives that are right-inequivalent modulo a membership
//!   predicate. For the classical `Γ0(N)` shape the equivalence test is the
//!   single congruence `c ≡ 0 (mod N)` on the lower-left entry.

use ahash::AHashSet;
use thiserror::Error;
use tracing::debug;

use crate::matrix::SL2Z;
use crate::permutation::{Permutation, PermutationError};

/// How two elements are compared modulo the subgroup: either the classical
/// lower-left congruence of `Γ0(N)`, or an arbitrary membership predicate.
pub enum CosetEquivalence<'a> {
    Gamma0(i64),
    Predicate(&'a dyn Fn(&SL2Z) -> bool),
}

impl CosetEquivalence<'_> {
    /// Membership of a single element.
    pub fn contains(&self, m: &SL2Z) -> bool {
        match self {
            CosetEquivalence::Gamma0(n) => m.c() % n == 0,
            CosetEquivalence::Predicate(f) => f(m),
        }
    }

    /// Right equivalence: `G·a == G·b`, i.e. `a·b⁻¹ ∈ G`.
    pub fn right_equivalent(&self, a: &SL2Z, b: &SL2Z) -> bool {
        self.contains(&(*a * b.inverse()))
    }
}

/// Enumerates coset representatives from a transitive pair of generating
/// permutations (`perm_s` of order 2, `perm_t` the derived translation
/// permutation).
///
/// Representatives inside one `perm_t`-cycle are successive translates
/// `V·T^k` of the cycle's anchor (balanced so `|k|` stays near the cycle
/// midpoint at most); cycles are connected to already-placed ones through
/// the order-2 generator, which transitivity guarantees is possible.
pub fn reps_from_permutations(
    perm_s: &Permutation,
    perm_t: &Permutation,
) -> Result<Vec<SL2Z>, EnumerationError> {
    let n = perm_t.len();
    let cycles = perm_t.cycles();
    let mut reps: Vec<Option<SL2Z>> = vec![None; n];
    reps[0] = Some(SL2Z::ONE);
    let mut done = vec![false; cycles.len()];
    // cycles are ordered by smallest element, so cycles[0] holds the base
    let mut current = 0usize;
    let mut anchor = 0usize;
    let mut anchor_map = SL2Z::ONE;
    for placed in 0..cycles.len() {
        let cy = &cycles[current];
        let r = cy.len() as i64;
        for (j, &point) in cy.iter().enumerate() {
            if j == anchor {
                continue;
            }
            let k = j as i64 - anchor as i64;
            let e = if k <= r / 2 { k } else { k - r };
            reps[point] = Some(anchor_map * SL2Z::translation(e));
        }
        done[current] = true;
        if placed == cycles.len() - 1 {
            break;
        }
        // connect some unplaced cycle to a placed point via the order-2
        // generator; failure means the pair was not transitive
        let mut connected = None;
        'search: for (ci, next_cycle) in cycles.iter().enumerate() {
            if done[ci] {
                continue;
            }
            for (di, placed_cycle) in cycles.iter().enumerate() {
                if !done[di] {
                    continue;
                }
                for &i in placed_cycle {
                    let j = perm_s.apply(i);
                    if let Some(pos) = next_cycle.iter().position(|&x| x == j) {
                        let map = reps[i].expect("placed cycles have representatives") * SL2Z::S;
                        debug!(source = i, target = j, cycle = ci, "connecting translation cycle");
                        connected = Some((ci, pos, j, map));
                        break 'search;
                    }
                }
            }
        }
        let Some((ci, pos, j, map)) = connected else {
            return Err(EnumerationError::Disconnected);
        };
        reps[j] = Some(map);
        current = ci;
        anchor = pos;
        anchor_map = map;
    }
    let mut out = Vec::with_capacity(n);
    for rep in reps.into_iter().flatten() {
        out.push(rep);
    }
    if out.len() != n {
        return Err(EnumerationError::WrongCount {
            expected: n,
            got: out.len(),
            partial: out,
        });
    }
    Ok(out)
}

/// Enumerates coset representatives from a congruence membership predicate.
///
/// Seeds the identity, `S` (unless `S` is a member) and the canonical
/// translates `S·T^j` over the symmetric residue range modulo the level,
/// then repeatedly right-multiplies by `S`, `T`, `T⁻¹`, keeping only
/// elements not right-equivalent to one already present, until a full sweep
/// adds nothing or the target count is reached.
pub fn reps_from_congruence(
    index: usize,
    level: i64,
    eq: &CosetEquivalence,
) -> Result<Vec<SL2Z>, EnumerationError> {
    let mut cl = vec![SL2Z::ONE];
    if index == 1 {
        return Ok(cl);
    }
    if !eq.contains(&SL2Z::S) {
        cl.push(SL2Z::S);
    }
    let range = if level % 2 == 0 {
        (-level / 2 + 1)..=(level / 2)
    } else {
        (-(level - 1) / 2)..=((level - 1) / 2)
    };
    for j in range {
        if j == 0 {
            continue;
        }
        let cand = SL2Z::S * SL2Z::translation(j);
        if cl.iter().all(|w| !eq.right_equivalent(&cand, w)) {
            cl.push(cand);
        }
    }
    debug!(seeds = cl.len(), index, "saturating coset representatives");
    let mut seen: AHashSet<SL2Z> = cl.iter().copied().collect();
    loop {
        let len_before = cl.len();
        let mut i = 0;
        while i < cl.len() && cl.len() < index {
            for g in [SL2Z::S, SL2Z::T, SL2Z::T.inverse()] {
                let cand = cl[i] * g;
                if seen.contains(&cand) {
                    continue;
                }
                if cl.iter().all(|w| !eq.right_equivalent(&cand, w)) {
                    seen.insert(cand);
                    cl.push(cand);
                }
            }
            i += 1;
        }
        if cl.len() >= index || cl.len() == len_before {
            break;
        }
    }
    if cl.len() != index {
        return Err(EnumerationError::WrongCount {
            expected: index,
            got: cl.len(),
            partial: cl,
        });
    }
    verify_right_inequivalent(&cl, eq)?;
    Ok(cl)
}

/// Checks pairwise right-inequivalence of a representative system.
pub fn verify_right_inequivalent(
    reps: &[SL2Z],
    eq: &CosetEquivalence,
) -> Result<(), EnumerationError> {
    for i in 0..reps.len() {
        for j in (i + 1)..reps.len() {
            if eq.right_equivalent(&reps[i], &reps[j]) {
                return Err(EnumerationError::Duplicate(i, j));
            }
        }
    }
    Ok(())
}

/// Recovers the order-2 and order-3 generating permutations from a
/// representative system: `perm_s` sends `i` to the unique `j` with
/// `V_i·S ∈ G·V_j`, and `perm_r` likewise with `R = S·T`.
pub fn perms_from_reps(
    reps: &[SL2Z],
    eq: &CosetEquivalence,
) -> Result<(Permutation, Permutation), EnumerationError> {
    let n = reps.len();
    let mut ps = vec![usize::MAX; n];
    let mut pr = vec![usize::MAX; n];
    let mut free_s = vec![true; n];
    let mut free_r = vec![true; n];
    for i in 0..n {
        let vs = reps[i] * SL2Z::S;
        let vr = reps[i] * SL2Z::R;
        for j in 0..n {
            if free_s[j] && eq.right_equivalent(&vs, &reps[j]) {
                ps[i] = j;
                free_s[j] = false;
                break;
            }
        }
        for j in 0..n {
            if free_r[j] && eq.right_equivalent(&vr, &reps[j]) {
                pr[i] = j;
                free_r[j] = false;
                break;
            }
        }
        if ps[i] == usize::MAX || pr[i] == usize::MAX {
            return Err(EnumerationError::ActionIncomplete);
        }
    }
    Ok((Permutation::from_map(ps)?, Permutation::from_map(pr)?))
}

#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error(
        "could not connect the translation cycles using the order-2 permutation; \
         the generating pair is not transitive"
    )]
    Disconnected,

    #[error("coset enumeration produced {got} representatives, expected {expected}")]
    WrongCount {
        expected: usize,
        got: usize,
        /// The partial system, for diagnostics.
        partial: Vec<SL2Z>,
    },

    #[error("representatives {0} and {1} are right-equivalent modulo the subgroup")]
    Duplicate(usize, usize),

    #[error("could not realize the coset action as a permutation of the representatives")]
    ActionIncomplete,

    #[error(transparent)]
    Permutation(#[from] PermutationError),
}

#[cfg(test)]
mod test {
    use super::*;

    fn gamma0_5_perms() -> (Permutation, Permutation) {
        let s = Permutation::from_cycles(6, &[vec![0, 1], vec![2, 3]]).unwrap();
        let r = Permutation::from_cycles(6, &[vec![0, 2, 1], vec![3, 4, 5]]).unwrap();
        (s, r)
    }

    #[test]
    fn cycle_connect_enumeration() {
        let (s, r) = gamma0_5_perms();
        let t = s.then(&r);
        assert_eq!(
            t.cycles().iter().map(Vec::len).collect::<Vec<_>>(),
            vec![1, 5]
        );
        let reps = reps_from_permutations(&s, &t).unwrap();
        assert_eq!(reps.len(), 6);
        assert_eq!(reps[0], SL2Z::ONE);
        // all non-identity representatives sit over the vertex 0
        for rep in &reps[1..] {
            assert_eq!(rep.a(), 0);
        }
    }

    #[test]
    fn congruence_enumeration_matches_index() {
        let eq = CosetEquivalence::Gamma0(5);
        let reps = reps_from_congruence(6, 5, &eq).unwrap();
        assert_eq!(reps.len(), 6);
        verify_right_inequivalent(&reps, &eq).unwrap();
        let (ps, pr) = perms_from_reps(&reps, &eq).unwrap();
        assert_eq!(ps.order(), 2);
        assert_eq!(pr.order(), 3);
        assert!(Permutation::are_transitive(&ps, &pr));
        // the translation permutation has the cusp widths as cycle lengths
        let pt = ps.then(&pr);
        let mut widths: Vec<usize> = pt.cycles().iter().map(Vec::len).collect();
        widths.sort_unstable();
        assert_eq!(widths, vec![1, 5]);
    }

    #[test]
    fn non_transitive_pair_is_rejected() {
        // two disjoint S-orbits that perm_t never mixes
        let s = Permutation::from_cycles(4, &[vec![0, 1], vec![2, 3]]).unwrap();
        let t = Permutation::identity(4);
        assert!(matches!(
            reps_from_permutations(&s, &t),
            Err(EnumerationError::Disconnected)
        ));
    }

    #[test]
    fn full_group_is_trivial() {
        let s = Permutation::identity(1);
        let reps = reps_from_permutations(&s, &Permutation::identity(1)).unwrap();
        assert_eq!(reps, vec![SL2Z::ONE]);
    }
}
