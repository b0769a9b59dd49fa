//! Errors surfaced by the fallible (`try_*`) table operations.

use core::alloc::Layout;
use thiserror::Error;

/// Failure to obtain or size the slot array.
///
/// Returned only by `try_*` constructors and inserts. A failed growth leaves
/// the table exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The requested capacity exceeds `2^31` slots or overflows `isize`.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator refused the slot array.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocFailed { layout: Layout },
}

pub type Result<T> = core::result::Result<T, TableError>;

/// Unwraps a table result the way `std` collections handle allocation
/// failure: abort through the allocation error handler, or panic on
/// overflow.
pub(crate) fn infallible<T>(r: Result<T>) -> T {
    match r {
        Ok(v) => v,
        Err(TableError::CapacityOverflow) => panic!("capacity overflow"),
        Err(TableError::AllocFailed { layout }) => std::alloc::handle_alloc_error(layout),
    }
}
