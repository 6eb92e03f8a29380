//! FILENAME: app/viewer-bridge/src/fingerprint.rs
//! PURPOSE: Content-derived identity of a source table.
//! CONTEXT: A session remembers the fingerprint it was opened with. When the
//! viewer reopens a table it sends that fingerprint back; a mismatch means
//! the table was replaced or reshaped and the old view must not be reused.

use sha2::{Digest, Sha256};
use style_engine::SourceTable;

/// SHA-256 over identity, shape, the first `sample_size` row labels and the
/// first `sample_size` column dtypes, hex encoded.
pub fn compute_fingerprint(table: &dyn SourceTable, sample_size: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(table.identity().to_le_bytes());
    hasher.update((table.row_count() as u64).to_le_bytes());
    hasher.update((table.column_count() as u64).to_le_bytes());

    for row in 0..table.row_count().min(sample_size) {
        hasher.update(table.row_label(row).as_bytes());
        hasher.update([0u8]);
    }
    for col in 0..table.column_count().min(sample_size) {
        hasher.update(table.dtype(col).name().as_bytes());
        hasher.update([0u8]);
    }

    format!("{:x}", hasher.finalize())
}
