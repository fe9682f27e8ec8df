use crate::error::StafError;

/// Below this trie count, per-column scoring and commit/rollback run on the
/// calling thread instead of being dispatched through rayon — spinning up
/// the thread pool costs more than a handful of `false_insert` calls.
pub(crate) const PARALLEL_TRIE_THRESHOLD: usize = 4;

/// Validated tuning parameters for a [`crate::SuffixForest`].
///
/// Bundling `score_lambda` and `max_tries` into one validated struct means
/// `SuffixForest::build` never has to re-check them once construction
/// succeeds.
#[derive(Debug, Clone, Copy)]
pub struct StafConfig {
    score_lambda: u32,
    max_tries: usize,
}

impl StafConfig {
    /// Builds a config, rejecting `score_lambda == 0` or `max_tries == 0`.
    pub fn new(score_lambda: u32, max_tries: usize) -> Result<Self, StafError> {
        if score_lambda == 0 {
            return Err(StafError::InvalidInput(
                "score_lambda must be >= 1".to_string(),
            ));
        }
        if max_tries == 0 {
            return Err(StafError::InvalidInput("max_tries must be >= 1".to_string()));
        }
        Ok(Self {
            score_lambda,
            max_tries,
        })
    }

    #[inline]
    pub fn score_lambda(&self) -> u32 {
        self.score_lambda
    }

    #[inline]
    pub fn max_tries(&self) -> usize {
        self.max_tries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_lambda() {
        assert!(StafConfig::new(0, 4).is_err());
    }

    #[test]
    fn rejects_zero_max_tries() {
        assert!(StafConfig::new(2, 0).is_err());
    }

    #[test]
    fn accepts_valid_params() {
        let cfg = StafConfig::new(2, 4).unwrap();
        assert_eq!(cfg.score_lambda(), 2);
        assert_eq!(cfg.max_tries(), 4);
    }
}
