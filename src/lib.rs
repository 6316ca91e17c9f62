//! # psl2z
//!
//! Finite-index subgroups of the (projective) modular group, represented
//! purely combinatorially: a pair of permutations of order 2 and 3 acting
//! transitively on `{0, …, n-1}` determines a subgroup of index `n`, and
//! everything about its action on the upper half-plane is derived from that
//! pair: a system of coset representatives, the fundamental-domain polygon
//! with its vertices and cusp classes, normalizers, widths and stabilizers,
//! and a pullback algorithm reducing arbitrary points into the fundamental
//! domain in both double and arbitrary precision.
//!
//! ```
//! use psl2z::{Permutation, Subgroup};
//!
//! // an index-6 subgroup: the shape of Gamma0(5)
//! let s = Permutation::from_cycles(6, &[vec![0, 1], vec![2, 3]]).unwrap();
//! let r = Permutation::from_cycles(6, &[vec![0, 2, 1], vec![3, 4, 5]]).unwrap();
//! let g = Subgroup::from_permutations(&s, &r).unwrap();
//! assert_eq!(g.ncusps(), 2);
//! assert_eq!(g.signature().genus, 0);
//! ```

use thiserror::Error;

pub mod cfrac;
pub mod coset;
pub mod cusp;
pub mod domain;
pub mod group;
pub mod matrix;
pub mod permutation;
pub mod pullback;


pub use cusp::Cusp;
pub use domain::Signature;
pub use group::{CongruenceGroup, Subgroup};
pub use matrix::SL2Z;
pub use permutation::Permutation;

/// Umbrella error for the construction and query surface.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Permutation(#[from] permutation::PermutationError),

    #[error(transparent)]
    Matrix(#[from] matrix::MatrixError),

    #[error(transparent)]
    Factorization(#[from] cfrac::FactorizationError),

    #[error(transparent)]
    Enumeration(#[from] coset::EnumerationError),

    #[error(transparent)]
    Consistency(#[from] domain::ConsistencyError),

    #[error(transparent)]
    Cusp(#[from] cusp::CuspError),

    #[error(transparent)]
    Pullback(#[from] pullback::PullbackError),
}
