use crate::errors::{AppError, AppResult};
use crate::models::User;

/// Lifetime number of uploads a free account gets. The counter never
/// decrements, so deleting nothing and re-uploading does not free a slot.
pub const FREE_DOC_LIMIT: i64 = 3;

/// Whether this account may upload another document right now.
pub fn allows(user: &User) -> bool {
    user.is_paid || user.free_docs_used < FREE_DOC_LIMIT
}

/// Fast-path policy check used before any bytes touch disk. This snapshot
/// check is advisory only; the document store repeats it atomically when it
/// reserves the slot.
pub fn check(user: &User) -> AppResult<()> {
    if allows(user) {
        Ok(())
    } else {
        Err(AppError::QuotaExceeded)
    }
}
