use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::error::StafError;

/// Two-level compressed sparse row output of a [`crate::SuffixForest`].
///
/// The primary section holds each row's residual (non-shared) columns; the
/// suffix section holds
/// one row per shared suffix pattern; `map_*` records which original rows
/// reference each suffix row. Every array is fully materialized in host
/// memory and handed to the caller by value — there is no further mutation
/// once a `BinaryCsr` exists.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryCsr {
    row_ptr: Vec<i32>,
    col_indices: Vec<i32>,
    data: Vec<f32>,
    suffix_row_ptr: Vec<i32>,
    suffix_col_indices: Vec<i32>,
    suffix_data: Vec<f32>,
    map_suffix_ptr: Vec<i32>,
    map_row_index: Vec<i32>,
}

impl BinaryCsr {
    pub(crate) fn assemble(
        unique: FxHashMap<u32, Vec<i32>>,
        shared: BTreeMap<Vec<u32>, Vec<i32>>,
        n_rows: i32,
    ) -> Result<Self, StafError> {
        let mut row_ptr = Vec::with_capacity(n_rows as usize + 1);
        row_ptr.push(0i32);
        let mut col_indices = Vec::new();

        for row in 0..n_rows {
            match unique.get(&(row as u32)) {
                Some(columns) => {
                    col_indices.extend_from_slice(columns);
                    row_ptr.push(checked_advance(&row_ptr, columns.len())?);
                }
                None => {
                    let last = *row_ptr.last().expect("row_ptr always has a last entry");
                    row_ptr.push(last);
                }
            }
        }
        let data = vec![1.0f32; col_indices.len()];

        let mut suffix_row_ptr = vec![0i32];
        let mut suffix_col_indices = Vec::new();
        let mut map_suffix_ptr = vec![0i32];
        let mut map_row_index = Vec::new();

        // `shared` is a BTreeMap keyed on the sorted row tuple, so this
        // iteration order is a deterministic suffix-row ordering.
        for (rows, columns) in &shared {
            suffix_col_indices.extend_from_slice(columns);
            suffix_row_ptr.push(checked_advance(&suffix_row_ptr, columns.len())?);

            map_row_index.extend(rows.iter().map(|&r| r as i32));
            map_suffix_ptr.push(checked_advance(&map_suffix_ptr, rows.len())?);
        }
        let suffix_data = vec![1.0f32; suffix_col_indices.len()];

        Ok(BinaryCsr {
            row_ptr,
            col_indices,
            data,
            suffix_row_ptr,
            suffix_col_indices,
            suffix_data,
            map_suffix_ptr,
            map_row_index,
        })
    }

    pub fn row_ptr(&self) -> &[i32] {
        &self.row_ptr
    }

    pub fn col_indices(&self) -> &[i32] {
        &self.col_indices
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn suffix_row_ptr(&self) -> &[i32] {
        &self.suffix_row_ptr
    }

    pub fn suffix_col_indices(&self) -> &[i32] {
        &self.suffix_col_indices
    }

    pub fn suffix_data(&self) -> &[f32] {
        &self.suffix_data
    }

    pub fn map_suffix_ptr(&self) -> &[i32] {
        &self.map_suffix_ptr
    }

    pub fn map_row_index(&self) -> &[i32] {
        &self.map_row_index
    }

    /// Number of shared suffix rows.
    pub fn suffix_count(&self) -> usize {
        self.suffix_row_ptr.len().saturating_sub(1)
    }

    /// Consumes `self`, handing the eight arrays to the caller by value —
    /// for a host binding this to a tensor runtime at the language boundary
    /// without an extra copy.
    #[allow(clippy::type_complexity)]
    pub fn into_raw_parts(
        self,
    ) -> (
        Vec<i32>,
        Vec<i32>,
        Vec<f32>,
        Vec<i32>,
        Vec<i32>,
        Vec<f32>,
        Vec<i32>,
        Vec<i32>,
    ) {
        (
            self.row_ptr,
            self.col_indices,
            self.data,
            self.suffix_row_ptr,
            self.suffix_col_indices,
            self.suffix_data,
            self.map_suffix_ptr,
            self.map_row_index,
        )
    }
}

fn checked_advance(ptr: &[i32], delta: usize) -> Result<i32, StafError> {
    let last = *ptr.last().expect("offset array always has a last entry");
    let delta = i32::try_from(delta)
        .map_err(|_| StafError::CapacityExceeded("offset delta exceeds i32::MAX".to_string()))?;
    last.checked_add(delta)
        .ok_or_else(|| StafError::CapacityExceeded("offset array accumulator overflowed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_yield_zeroed_csr() {
        let csr = BinaryCsr::assemble(FxHashMap::default(), BTreeMap::new(), 3).unwrap();
        assert_eq!(csr.row_ptr(), &[0, 0, 0, 0]);
        assert!(csr.col_indices().is_empty());
        assert_eq!(csr.suffix_row_ptr(), &[0]);
        assert_eq!(csr.map_suffix_ptr(), &[0]);
    }

    #[test]
    fn unique_and_shared_merge_into_distinct_sections() {
        let mut unique = FxHashMap::default();
        unique.insert(0u32, vec![2, 0]);
        let mut shared = BTreeMap::new();
        shared.insert(vec![1u32, 2u32], vec![5, 4]);

        let csr = BinaryCsr::assemble(unique, shared, 3).unwrap();
        assert_eq!(csr.row_ptr(), &[0, 2, 2, 2]);
        assert_eq!(csr.col_indices(), &[2, 0]);
        assert_eq!(csr.data(), &[1.0, 1.0]);

        assert_eq!(csr.suffix_row_ptr(), &[0, 2]);
        assert_eq!(csr.suffix_col_indices(), &[5, 4]);
        assert_eq!(csr.map_suffix_ptr(), &[0, 2]);
        assert_eq!(csr.map_row_index(), &[1, 2]);
        assert_eq!(csr.suffix_count(), 1);
    }
}
