//! Scoring module - points per causal match
//!
//! Only the cell that caused a match is paid, using the origin-inclusive size
//! of that match. Cascaded bomb hits are free.

use crate::types::{MATCH_SCORES, MAX_SCORED_MATCH};

/// Points for one causal match of `cells` cells (origin included).
///
/// Sizes without a table entry (below three, or past [`MAX_SCORED_MATCH`])
/// score nothing.
pub fn score_for_match(cells: usize) -> u32 {
    if cells > MAX_SCORED_MATCH {
        return 0;
    }
    MATCH_SCORES[cells]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_score_table() {
        assert_eq!(score_for_match(0), 0);
        assert_eq!(score_for_match(2), 0);
        assert_eq!(score_for_match(3), 25);
        assert_eq!(score_for_match(4), 50);
        assert_eq!(score_for_match(5), 100);
        assert_eq!(score_for_match(6), 250);
        assert_eq!(score_for_match(7), 500);
        assert_eq!(score_for_match(8), 1000);
    }

    #[test]
    fn test_sizes_past_table_score_nothing() {
        assert_eq!(score_for_match(9), 0);
        assert_eq!(score_for_match(40), 0);
    }
}
