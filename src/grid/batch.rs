use std::ops::Range;

use super::GridError;

/// Partition `0..len` into contiguous index ranges of at most `batch_size`.
///
/// Ranges come back in order and cover every index exactly once; only the
/// last range may be shorter than `batch_size`. Routing services cap the
/// number of coordinates per table request, so the sweep sends one request
/// per range.
pub fn plan_batches(len: usize, batch_size: usize) -> Result<Vec<Range<usize>>, GridError> {
    if batch_size == 0 {
        return Err(GridError::InvalidBatchSize(batch_size));
    }

    let mut batches = Vec::with_capacity(len.div_ceil(batch_size));
    let mut start = 0;
    while start < len {
        let end = (start + batch_size).min(len);
        batches.push(start..end);
        start = end;
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_nine_points_batch_four() {
        let batches = plan_batches(9, 4).unwrap();

        assert_eq!(batches, vec![0..4, 4..8, 8..9]);
    }

    #[test]
    fn test_plan_round_trip() {
        for len in [0, 1, 5, 99, 100, 101] {
            for batch_size in [1, 3, 99] {
                let batches = plan_batches(len, batch_size).unwrap();
                let covered: Vec<usize> = batches.iter().cloned().flatten().collect();
                assert_eq!(covered, (0..len).collect::<Vec<_>>());
                assert!(batches.iter().all(|b| b.len() <= batch_size));
            }
        }
    }

    #[test]
    fn test_plan_batch_larger_than_input() {
        let batches = plan_batches(3, 99).unwrap();

        assert_eq!(batches, vec![0..3]);
    }

    #[test]
    fn test_plan_zero_batch_size() {
        assert_eq!(plan_batches(9, 0), Err(GridError::InvalidBatchSize(0)));
    }
}
