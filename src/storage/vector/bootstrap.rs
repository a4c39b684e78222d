//! Loads the `sqlite-vec` extension and creates `vec0` virtual tables.
//! Grounded on the teacher's `SqliteVecStore::new` bootstrap. If the
//! extension or virtual table creation fails, the caller falls back to
//! brute-force scoring over the same relational tables; we log that
//! exactly once per process (spec §4.5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();
static FALLBACK_WARNED: AtomicBool = AtomicBool::new(false);

fn register_extension() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    });
}

/// Attempts to create a `vec0` virtual table for `table`. Returns `true` if
/// native vector indexing is available for this connection, `false` if the
/// provider must fall back to brute-force scoring.
pub fn try_create_vec_table(conn: &rusqlite::Connection, table: &str, dimension: usize) -> bool {
    register_extension();
    let sql = format!("CREATE VIRTUAL TABLE IF NOT EXISTS {table} USING vec0(embedding float[{dimension}])");
    match conn.execute(&sql, []) {
        Ok(_) => true,
        Err(error) => {
            if !FALLBACK_WARNED.swap(true, Ordering::SeqCst) {
                tracing::warn!(
                    %error,
                    table,
                    "sqlite-vec unavailable, falling back to brute-force similarity search"
                );
            }
            false
        }
    }
}
