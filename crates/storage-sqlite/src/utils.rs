//! Utility functions for SQLite storage operations.

/// Maximum number of bound parameters per statement.
///
/// SQLite builds may be compiled with a limit as low as 999
/// (`SQLITE_MAX_VARIABLE_NUMBER`). Staying at 500 leaves headroom for any
/// extra parameters a statement carries.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Split multi-row inserts so each statement binds at most
/// [`SQLITE_MAX_PARAMS_CHUNK`] parameters.
pub fn chunk_rows_for_sqlite<T>(rows: &[T], columns_per_row: usize) -> impl Iterator<Item = &[T]> {
    let rows_per_chunk = (SQLITE_MAX_PARAMS_CHUNK / columns_per_row.max(1)).max(1);
    rows.chunks(rows_per_chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_rows_empty() {
        let rows: Vec<i32> = vec![];
        assert_eq!(chunk_rows_for_sqlite(&rows, 10).count(), 0);
    }

    #[test]
    fn test_chunk_rows_under_limit() {
        let rows: Vec<i32> = (0..50).collect();
        let chunks: Vec<_> = chunk_rows_for_sqlite(&rows, 10).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 50);
    }

    #[test]
    fn test_chunk_rows_over_limit() {
        let rows: Vec<i32> = (0..120).collect();
        let chunks: Vec<_> = chunk_rows_for_sqlite(&rows, 10).collect();
        assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![50, 50, 20]);
    }

    #[test]
    fn test_chunk_rows_wide_rows_still_progress() {
        let rows: Vec<i32> = (0..3).collect();
        assert_eq!(chunk_rows_for_sqlite(&rows, 10_000).count(), 3);
        assert_eq!(chunk_rows_for_sqlite(&rows, 0).count(), 1);
    }
}
