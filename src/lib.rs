//! Factors a binary sparsity pattern into a forest of suffix tries, then
//! flattens the forest into a two-level compressed-sparse-row
//! representation: one level for each row's residual columns, one level
//! for the suffix patterns two or more rows share.
//!
//! The entry point is [`compress`], which wraps [`SuffixForest::build`] and
//! [`SuffixForest::into_csr`] into a single call for the common case of
//! "I have a CSC matrix, give me a `BinaryCsr`".

mod config;
mod csr;
mod error;
mod forest;
mod node;
mod trie;

pub use config::StafConfig;
pub use csr::BinaryCsr;
pub use error::StafError;
pub use forest::SuffixForest;

/// Builds the suffix forest for `(col_ptr, row_ind, values)` and flattens it
/// into a [`BinaryCsr`] in one call.
///
/// `values` is accepted for interface symmetry with callers that already
/// hold a CSC triple with a data array; the values themselves are never
/// read, since only the sparsity pattern drives trie construction.
pub fn compress(
    col_ptr: &[i32],
    row_ind: &[i32],
    values: &[f32],
    n_rows: i32,
    n_cols: i32,
    config: StafConfig,
) -> Result<BinaryCsr, StafError> {
    let forest = SuffixForest::build(col_ptr, row_ind, values, n_rows, n_cols, config)?;
    forest.into_csr(n_rows)
}
