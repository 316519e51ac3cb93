use std::ops::Range;

use super::GridError;

/// Scatter per-batch duration results back into a grid-aligned column.
///
/// Each batch's values land at the offsets its range occupied in the grid,
/// so the output at index `i` is the duration for grid point `i` regardless
/// of batch boundaries. `None` marks an unreachable destination.
///
/// Every index must be written exactly once: a gap or a double write means
/// the batch plan was wrong, and either is reported as an error rather than
/// papered over.
pub fn assemble(
    len: usize,
    batches: &[(Range<usize>, Vec<Option<f64>>)],
) -> Result<Vec<Option<f64>>, GridError> {
    let mut column = vec![None; len];
    let mut written = vec![false; len];

    for (range, durations) in batches {
        if range.end > len {
            return Err(GridError::BatchOutOfRange {
                end: range.end,
                len,
            });
        }
        if durations.len() != range.len() {
            return Err(GridError::LengthMismatch {
                expected: range.len(),
                actual: durations.len(),
            });
        }
        for (offset, &value) in durations.iter().enumerate() {
            let index = range.start + offset;
            if written[index] {
                return Err(GridError::OverlappingWrite { index });
            }
            written[index] = true;
            column[index] = value;
        }
    }

    if let Some(index) = written.iter().position(|&w| !w) {
        return Err(GridError::IncompleteCoverage { index });
    }

    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_full_partition() {
        let batches = vec![
            (0..2, vec![Some(10.0), Some(20.0)]),
            (2..4, vec![None, Some(40.0)]),
            (4..5, vec![Some(50.0)]),
        ];

        let column = assemble(5, &batches).unwrap();

        assert_eq!(
            column,
            vec![Some(10.0), Some(20.0), None, Some(40.0), Some(50.0)]
        );
    }

    #[test]
    fn test_assemble_order_independent() {
        // Batches arriving out of order still scatter by range offset.
        let batches = vec![
            (2..4, vec![Some(30.0), Some(40.0)]),
            (0..2, vec![Some(10.0), Some(20.0)]),
        ];

        let column = assemble(4, &batches).unwrap();

        assert_eq!(
            column,
            vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)]
        );
    }

    #[test]
    fn test_assemble_gap_detected() {
        let batches = vec![(0..2, vec![Some(1.0), Some(2.0)]), (3..4, vec![Some(4.0)])];

        assert_eq!(
            assemble(4, &batches),
            Err(GridError::IncompleteCoverage { index: 2 })
        );
    }

    #[test]
    fn test_assemble_overlap_detected() {
        let batches = vec![
            (0..2, vec![Some(1.0), Some(2.0)]),
            (1..3, vec![Some(2.5), Some(3.0)]),
        ];

        assert_eq!(
            assemble(3, &batches),
            Err(GridError::OverlappingWrite { index: 1 })
        );
    }

    #[test]
    fn test_assemble_length_mismatch() {
        let batches = vec![(0..3, vec![Some(1.0)])];

        assert_eq!(
            assemble(3, &batches),
            Err(GridError::LengthMismatch {
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn test_assemble_out_of_range() {
        let batches = vec![(0..5, vec![Some(1.0); 5])];

        assert_eq!(
            assemble(3, &batches),
            Err(GridError::BatchOutOfRange { end: 5, len: 3 })
        );
    }
}
