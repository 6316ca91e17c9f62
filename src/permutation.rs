//! # Permutations
//!
//! Immutable bijections of `0..n`, used as the combinatorial description of a
//! finite-index subgroup of the modular group: a pair of permutations of
//! order 2 and 3 acting transitively on the cosets determines the subgroup
//! completely.
//!
//! A [`Permutation`] is stored as its forward map (`map[i]` is the image of
//! `i`) together with the inverse map. Composition is written left-to-right
//! via [`Permutation::then`], matching the way words in the group act on
//! right cosets: `act(A·B) = act(A).then(act(B))`.

use std::fmt;

use num_integer::Integer;
use thiserror::Error;

/// A permutation of `0..n`.
///
/// # Examples
///
/// ```
/// use psl2z::permutation::Permutation;
///
/// // 0 -> 2, 1 -> 0, 2 -> 1, 3 -> 3
/// let p = Permutation::from_map(vec![2, 0, 1, 3]).unwrap();
/// assert_eq!(p.apply(0), 2);
/// assert_eq!(p.inverse().apply(2), 0);
/// assert_eq!(p.order(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permutation {
    map: Vec<usize>,
    inv: Vec<usize>,
}

impl Permutation {
    // --------------------------------------------------------------------------------------------
    // Constructors and accessors
    // --------------------------------------------------------------------------------------------

    /// Creates the identity permutation of length `n`.
    pub fn identity(n: usize) -> Self {
        Permutation {
            map: (0..n).collect(),
            inv: (0..n).collect(),
        }
    }

    /// Creates a permutation from a mapping vector: `map[i]` is the image of `i`.
    ///
    /// Fails with a [`PermutationError`] if the data is not a bijection of
    /// `0..map.len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use psl2z::permutation::Permutation;
    /// let p = Permutation::from_map(vec![2, 0, 1]).unwrap();
    /// assert_eq!(p.apply(2), 1);
    /// assert!(Permutation::from_map(vec![0, 0, 1]).is_err());
    /// ```
    pub fn from_map(map: Vec<usize>) -> Result<Self, PermutationError> {
        let n = map.len();
        let mut inv = vec![usize::MAX; n];
        for (i, &j) in map.iter().enumerate() {
            if j >= n {
                return Err(PermutationError::OutOfRange {
                    value: j,
                    index: i,
                    len: n,
                });
            }
            if inv[j] != usize::MAX {
                return Err(PermutationError::Duplicate(j));
            }
            inv[j] = i;
        }
        Ok(Permutation { map, inv })
    }

    /// Creates a permutation of `0..n` from a list of disjoint cycles.
    /// Points not mentioned in any cycle are fixed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use psl2z::permutation::Permutation;
    /// let p = Permutation::from_cycles(6, &[vec![0, 1], vec![2, 3]]).unwrap();
    /// assert_eq!(p.map(), &[1, 0, 3, 2, 4, 5]);
    /// assert!(Permutation::from_cycles(4, &[vec![0, 1], vec![1, 2]]).is_err());
    /// ```
    pub fn from_cycles(n: usize, cycles: &[Vec<usize>]) -> Result<Self, PermutationError> {
        let mut map: Vec<usize> = (0..n).collect();
        let mut seen = vec![false; n];
        for cycle in cycles {
            for (i, &from) in cycle.iter().enumerate() {
                if from >= n {
                    return Err(PermutationError::OutOfRange {
                        value: from,
                        index: i,
                        len: n,
                    });
                }
                if seen[from] {
                    return Err(PermutationError::OverlappingCycles(from));
                }
                seen[from] = true;
                map[from] = cycle[(i + 1) % cycle.len()];
            }
        }
        Self::from_map(map)
    }

    /// Length `n` of the underlying set.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The forward mapping as a slice.
    pub fn map(&self) -> &[usize] {
        &self.map
    }

    /// The image of a single point.
    pub fn apply(&self, i: usize) -> usize {
        self.map[i]
    }

    /// The preimage of a single point.
    pub fn apply_inverse(&self, i: usize) -> usize {
        self.inv[i]
    }

    // --------------------------------------------------------------------------------------------
    // Group operations
    // --------------------------------------------------------------------------------------------

    /// The inverse permutation.
    pub fn inverse(&self) -> Self {
        Permutation {
            map: self.inv.clone(),
            inv: self.map.clone(),
        }
    }

    /// Left-to-right composition: `a.then(&b)` applies `a` first, then `b`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use psl2z::permutation::Permutation;
    /// let a = Permutation::from_cycles(3, &[vec![0, 1]]).unwrap();
    /// let b = Permutation::from_cycles(3, &[vec![1, 2]]).unwrap();
    /// assert_eq!(a.then(&b).apply(0), 2);
    /// ```
    pub fn then(&self, other: &Self) -> Self {
        debug_assert_eq!(self.len(), other.len());
        let map: Vec<usize> = self.map.iter().map(|&i| other.map[i]).collect();
        let inv: Vec<usize> = other.inv.iter().map(|&i| self.inv[i]).collect();
        Permutation { map, inv }
    }

    /// The `k`-th power; negative exponents invert first.
    pub fn pow(&self, k: i64) -> Self {
        let (mut base, mut exp) = if k < 0 {
            (self.inverse(), (-k) as u64)
        } else {
            (self.clone(), k as u64)
        };
        let mut result = Permutation::identity(self.len());
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.then(&base);
            }
            base = base.then(&base);
            exp >>= 1;
        }
        result
    }

    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(i, &m)| i == m)
    }

    // --------------------------------------------------------------------------------------------
    // Cycle structure
    // --------------------------------------------------------------------------------------------

    /// The cycle decomposition, including singleton cycles for fixed points.
    /// Cycles are ordered by their smallest element, which comes first in
    /// each cycle.
    ///
    /// # Examples
    ///
    /// ```
    /// # use psl2z::permutation::Permutation;
    /// let p = Permutation::from_map(vec![2, 0, 1, 3]).unwrap();
    /// assert_eq!(p.cycles(), vec![vec![0, 2, 1], vec![3]]);
    /// ```
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.map.len()];
        let mut cycles = Vec::new();
        for i in 0..self.map.len() {
            if visited[i] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut j = i;
            while !visited[j] {
                visited[j] = true;
                cycle.push(j);
                j = self.map[j];
            }
            cycles.push(cycle);
        }
        cycles
    }

    /// Length of the cycle through `i`.
    pub fn cycle_len(&self, i: usize) -> usize {
        let mut len = 1;
        let mut j = self.map[i];
        while j != i {
            j = self.map[j];
            len += 1;
        }
        len
    }

    /// The order of the permutation: the lcm of its cycle lengths.
    pub fn order(&self) -> u64 {
        self.cycles()
            .iter()
            .fold(1u64, |acc, c| acc.lcm(&(c.len() as u64)))
    }

    /// Number of fixed points.
    pub fn fixed_points(&self) -> usize {
        self.map.iter().enumerate().filter(|&(i, &m)| i == m).count()
    }

    // --------------------------------------------------------------------------------------------
    // Orbit closures
    // --------------------------------------------------------------------------------------------

    /// Whether the group generated by `p` and `q` acts transitively on
    /// `0..n`, i.e. has a single orbit. Computed by a breadth-first closure
    /// over the generator images starting from `0`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use psl2z::permutation::Permutation;
    /// let s = Permutation::from_cycles(4, &[vec![0, 1], vec![2, 3]]).unwrap();
    /// let r = Permutation::from_cycles(4, &[vec![1, 2]]).unwrap();
    /// assert!(Permutation::are_transitive(&s, &r));
    /// let fixes = Permutation::from_cycles(4, &[vec![2, 3]]).unwrap();
    /// assert!(!Permutation::are_transitive(&s.pow(2), &fixes));
    /// ```
    pub fn are_transitive(p: &Self, q: &Self) -> bool {
        let n = p.len();
        if n != q.len() {
            return false;
        }
        if n == 0 {
            return true;
        }
        let mut visited = vec![false; n];
        let mut stack = vec![0usize];
        visited[0] = true;
        let mut count = 1;
        while let Some(i) = stack.pop() {
            for j in [p.map[i], q.map[i]] {
                if !visited[j] {
                    visited[j] = true;
                    count += 1;
                    stack.push(j);
                }
            }
        }
        count == n
    }

    /// Searches for a relabelling `phi` fixing the base point `0` that
    /// conjugates the pair `(s1, r1)` into `(s2, r2)`, i.e.
    /// `phi ∘ s1 = s2 ∘ phi` and `phi ∘ r1 = r2 ∘ phi`.
    ///
    /// Since `phi(0)` is pinned and `(s1, r1)` is expected to be transitive,
    /// the candidate is unique; it is propagated along the orbit of `0` and
    /// `None` is returned on any inconsistency (or if the orbit does not
    /// exhaust `0..n`).
    pub fn conjugating_map_fixing_base(
        s1: &Self,
        r1: &Self,
        s2: &Self,
        r2: &Self,
    ) -> Option<Self> {
        let n = s1.len();
        if r1.len() != n || s2.len() != n || r2.len() != n {
            return None;
        }
        if n == 0 {
            return Some(Permutation::identity(0));
        }
        let mut phi = vec![usize::MAX; n];
        phi[0] = 0;
        let mut stack = vec![0usize];
        while let Some(x) = stack.pop() {
            let fx = phi[x];
            for (g1, g2) in [(s1, s2), (r1, r2)] {
                let y = g1.map[x];
                let fy = g2.map[fx];
                if phi[y] == usize::MAX {
                    phi[y] = fy;
                    stack.push(y);
                } else if phi[y] != fy {
                    return None;
                }
            }
        }
        if phi.contains(&usize::MAX) {
            return None;
        }
        Self::from_map(phi).ok()
    }
}

impl fmt::Display for Permutation {
    /// Cycle notation, omitting fixed points; the identity prints as `()`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for cycle in self.cycles() {
            if cycle.len() <= 1 {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            write!(f, "(")?;
            for (i, &x) in cycle.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{x}")?;
            }
            write!(f, ")")?;
            first = false;
        }
        if first {
            write!(f, "()")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermutationError {
    #[error("image {value} at position {index} is out of range for a permutation of 0..{len}")]
    OutOfRange {
        value: usize,
        index: usize,
        len: usize,
    },

    #[error("value {0} appears more than once in the image list")]
    Duplicate(usize),

    #[error("cycles are not disjoint: point {0} appears twice")]
    OverlappingCycles(usize),

    #[error("permutations have mismatched lengths: {0} and {1}")]
    LengthMismatch(usize, usize),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compose_and_power() {
        let p = Permutation::from_map(vec![1, 2, 0]).unwrap();
        assert_eq!(p.then(&p).map(), &[2, 0, 1]);
        assert_eq!(p.pow(3), Permutation::identity(3));
        assert_eq!(p.pow(-1), p.inverse());
        assert_eq!(p.pow(-2), p.then(&p).inverse());
    }

    #[test]
    fn cycle_structure() {
        let p = Permutation::from_cycles(7, &[vec![0, 1], vec![2, 3, 4]]).unwrap();
        assert_eq!(p.order(), 6);
        assert_eq!(p.fixed_points(), 2);
        assert_eq!(p.cycle_len(3), 3);
        assert_eq!(p.cycle_len(6), 1);
        assert_eq!(p.cycles().len(), 4);
    }

    #[test]
    fn transitivity() {
        // the Gamma0(5)-shaped pair
        let s = Permutation::from_cycles(6, &[vec![0, 1], vec![2, 3]]).unwrap();
        let r = Permutation::from_cycles(6, &[vec![0, 2, 1], vec![3, 4, 5]]).unwrap();
        assert!(Permutation::are_transitive(&s, &r));
        let id = Permutation::identity(6);
        assert!(!Permutation::are_transitive(&id, &r));
    }

    #[test]
    fn conjugation_search() {
        let s = Permutation::from_cycles(6, &[vec![0, 1], vec![2, 3]]).unwrap();
        let r = Permutation::from_cycles(6, &[vec![0, 2, 1], vec![3, 4, 5]]).unwrap();
        // every pair is conjugate to itself by the identity
        let phi = Permutation::conjugating_map_fixing_base(&s, &r, &s, &r).unwrap();
        assert!(phi.is_identity());
        // conjugating into a genuinely different pair fails
        let r2 = r.inverse();
        assert!(Permutation::conjugating_map_fixing_base(&s, &r, &s, &r2).is_none());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Permutation::from_map(vec![1, 1, 0]).is_err());
        assert!(Permutation::from_map(vec![0, 3]).is_err());
        assert!(Permutation::from_cycles(3, &[vec![0, 1], vec![1, 2]]).is_err());
    }
}
