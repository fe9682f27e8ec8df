use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::config::{StafConfig, PARALLEL_TRIE_THRESHOLD};
use crate::csr::BinaryCsr;
use crate::error::StafError;
use crate::trie::SuffixTrie;

/// An ordered collection of [`SuffixTrie`]s built by streaming a CSC
/// matrix's columns from right to left. Each original row ends up living
/// in exactly one trie: the trie whose column stream first won the
/// trial/commit contest for that row.
pub struct SuffixForest {
    tries: Vec<SuffixTrie>,
    config: StafConfig,
}

impl SuffixForest {
    /// Builds the forest from a CSC-shaped matrix. `values` is accepted for
    /// interface symmetry with the host's tensor boundary but is never
    /// read — the matrix is treated as structural.
    pub fn build(
        col_ptr: &[i32],
        row_ind: &[i32],
        values: &[f32],
        n_rows: i32,
        n_cols: i32,
        config: StafConfig,
    ) -> Result<Self, StafError> {
        validate_csc(col_ptr, row_ind, values, n_rows, n_cols)?;

        let mut forest = SuffixForest {
            tries: Vec::new(),
            config,
        };

        let mut row_buf: Vec<u32> = Vec::new();
        for col in (0..n_cols).rev() {
            let start = col_ptr[col as usize] as usize;
            let end = col_ptr[(col + 1) as usize] as usize;
            row_buf.clear();
            row_buf.extend(row_ind[start..end].iter().map(|&r| r as u32));
            forest.process_column(col, &row_buf);
        }

        Ok(forest)
    }

    /// Number of tries currently in the forest. Never exceeds
    /// `config.max_tries()`.
    pub fn trie_count(&self) -> usize {
        self.tries.len()
    }

    fn process_column(&mut self, col: i32, rows: &[u32]) {
        if rows.is_empty() {
            return;
        }

        if self.tries.len() < self.config.max_tries()
            && self.tries.last().is_none_or(|t| !t.is_empty())
        {
            self.tries.push(SuffixTrie::new());
        }

        let lambda = self.config.score_lambda();
        let scores: Vec<u64> = if self.tries.len() >= PARALLEL_TRIE_THRESHOLD {
            self.tries
                .par_iter_mut()
                .map(|trie| trie.false_insert(col, rows, lambda))
                .collect()
        } else {
            self.tries
                .iter_mut()
                .map(|trie| trie.false_insert(col, rows, lambda))
                .collect()
        };

        // `min_by_key` returns the first of equal minima, which gives the
        // deterministic lowest-index tie-break this needs.
        let winner = scores
            .iter()
            .enumerate()
            .min_by_key(|&(_, &score)| score)
            .map(|(idx, _)| idx)
            .expect("a trie was just pushed if the forest was empty");

        tracing::debug!(
            col,
            trie_count = self.tries.len(),
            winner,
            score = scores[winner],
            "forest: column committed"
        );

        if self.tries.len() >= PARALLEL_TRIE_THRESHOLD {
            self.tries.par_iter_mut().enumerate().for_each(|(idx, trie)| {
                if idx == winner {
                    trie.commit();
                } else {
                    trie.rollback();
                }
            });
        } else {
            for (idx, trie) in self.tries.iter_mut().enumerate() {
                if idx == winner {
                    trie.commit();
                } else {
                    trie.rollback();
                }
            }
        }
    }

    /// Merges every trie's extracted patterns into the final two-level CSR.
    /// Consumes the forest: there is nothing left to do with the tries once
    /// their patterns have been read out.
    pub fn into_csr(self, n_rows: i32) -> Result<BinaryCsr, StafError> {
        let mut combined_unique: FxHashMap<u32, Vec<i32>> = FxHashMap::default();
        let mut combined_shared: BTreeMap<Vec<u32>, Vec<i32>> = BTreeMap::new();

        for trie in &self.tries {
            for (row, mut columns) in trie.unique_patterns() {
                combined_unique.entry(row).or_default().append(&mut columns);
            }
            for (key, mut columns) in trie.shared_patterns() {
                combined_shared.entry(key).or_default().append(&mut columns);
            }
        }

        tracing::debug!(
            trie_count = self.tries.len(),
            unique_rows = combined_unique.len(),
            shared_suffixes = combined_shared.len(),
            "forest: merging patterns into CSR"
        );

        BinaryCsr::assemble(combined_unique, combined_shared, n_rows)
    }
}

fn validate_csc(
    col_ptr: &[i32],
    row_ind: &[i32],
    values: &[f32],
    n_rows: i32,
    n_cols: i32,
) -> Result<(), StafError> {
    if n_rows <= 0 {
        return Err(StafError::InvalidInput(format!(
            "n_rows must be positive, got {n_rows}"
        )));
    }
    if n_cols <= 0 {
        return Err(StafError::InvalidInput(format!(
            "n_cols must be positive, got {n_cols}"
        )));
    }
    if col_ptr.len() != n_cols as usize + 1 {
        return Err(StafError::InvalidInput(format!(
            "col_ptr length {} does not match n_cols + 1 ({})",
            col_ptr.len(),
            n_cols + 1
        )));
    }
    if col_ptr[0] != 0 {
        return Err(StafError::InvalidInput("col_ptr[0] must be 0".to_string()));
    }
    if col_ptr.windows(2).any(|w| w[1] < w[0]) {
        return Err(StafError::InvalidInput(
            "col_ptr must be non-decreasing".to_string(),
        ));
    }
    let nnz = *col_ptr.last().expect("col_ptr is non-empty");
    if nnz as usize != row_ind.len() {
        return Err(StafError::InvalidInput(format!(
            "col_ptr[n_cols] ({nnz}) does not match row_ind length ({})",
            row_ind.len()
        )));
    }
    if values.len() != row_ind.len() {
        return Err(StafError::InvalidInput(format!(
            "values length ({}) does not match row_ind length ({})",
            values.len(),
            row_ind.len()
        )));
    }
    if row_ind.iter().any(|&r| r < 0 || r >= n_rows) {
        return Err(StafError::InvalidInput(format!(
            "row_ind entries must be in [0, {n_rows})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(
        col_ptr: &[i32],
        row_ind: &[i32],
        n_rows: i32,
        n_cols: i32,
        lambda: u32,
        max_tries: usize,
    ) -> BinaryCsr {
        let values = vec![1.0f32; row_ind.len()];
        let config = StafConfig::new(lambda, max_tries).unwrap();
        let forest = SuffixForest::build(col_ptr, row_ind, &values, n_rows, n_cols, config).unwrap();
        forest.into_csr(n_rows).unwrap()
    }

    #[test]
    fn rejects_bad_col_ptr_start() {
        let config = StafConfig::new(2, 1).unwrap();
        let values = [1.0f32];
        let err = SuffixForest::build(&[1, 1], &[0], &values, 1, 1, config);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_out_of_range_row() {
        let config = StafConfig::new(2, 1).unwrap();
        let values = [1.0f32];
        let err = SuffixForest::build(&[0, 1], &[5], &values, 1, 1, config);
        assert!(err.is_err());
    }

    #[test]
    fn empty_matrix_yields_empty_csr() {
        let csr = build(&[0, 0, 0], &[], 3, 2, 2, 1);
        assert_eq!(csr.row_ptr(), &[0, 0, 0, 0]);
        assert!(csr.col_indices().is_empty());
        assert_eq!(csr.suffix_row_ptr(), &[0]);
    }

    #[test]
    fn identical_rows_share_one_suffix() {
        // rows 0 and 1 both non-zero in columns {0,1,2}
        let col_ptr = [0, 2, 4, 6];
        let row_ind = [0, 1, 0, 1, 0, 1];
        let csr = build(&col_ptr, &row_ind, 2, 3, 2, 1);
        assert_eq!(csr.row_ptr(), &[0, 0, 0]);
        assert_eq!(csr.suffix_row_ptr(), &[0, 3]);
        assert_eq!(csr.suffix_col_indices(), &[0, 1, 2]);
        assert_eq!(csr.map_suffix_ptr(), &[0, 2]);
        assert_eq!(csr.map_row_index(), &[0, 1]);
    }

    #[test]
    fn disjoint_rows_have_no_suffix() {
        // row 0 = {0,1}, row 1 = {2,3}: column c holds whichever single
        // row is non-zero there.
        let col_ptr = [0, 1, 2, 3, 4];
        let row_ind = [0, 0, 1, 1];
        let csr = build(&col_ptr, &row_ind, 2, 4, 2, 1);
        assert_eq!(csr.suffix_row_ptr(), &[0]);
        assert_eq!(csr.row_ptr(), &[0, 2, 4]);
        assert_eq!(csr.col_indices(), &[0, 1, 2, 3]);
    }

    #[test]
    fn forest_cap_is_respected() {
        // feed 5 totally disjoint single-row columns; without a cap each
        // column could open its own trie.
        let col_ptr = [0, 1, 2, 3, 4, 5];
        let row_ind = [0, 1, 2, 3, 4];
        let values = vec![1.0f32; 5];
        let config = StafConfig::new(2, 2).unwrap();
        let forest = SuffixForest::build(&col_ptr, &row_ind, &values, 5, 5, config).unwrap();
        assert!(forest.trie_count() <= 2);
    }
}
