//! Dry-run short-circuiting.
//!
//! Every mutating handler calls [`dry_run_guard`] after validating its
//! request and before its first store mutation. Placement is the handler's
//! responsibility; nothing intercepts requests automatically.

use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Short-circuits a dry run.
///
/// Returns `Ok(())` when `dry_run` is false so the handler proceeds. When it
/// is true the result is always an error: `DryRunOperation` if the caller
/// holds permission, `UnauthorizedOperation` otherwise.
///
/// # Examples
///
/// ```
/// use computesim::{dry_run_guard, ApiError};
///
/// assert!(dry_run_guard(false, false).is_ok());
/// assert!(matches!(dry_run_guard(true, true), Err(ApiError::DryRunOperation)));
/// assert!(matches!(dry_run_guard(true, false), Err(ApiError::UnauthorizedOperation)));
/// ```
pub fn dry_run_guard(dry_run: bool, has_permission: bool) -> ApiResult<()> {
    if !dry_run {
        return Ok(());
    }
    debug!(has_permission, "dry run short-circuit");
    if has_permission {
        Err(ApiError::DryRunOperation)
    } else {
        Err(ApiError::UnauthorizedOperation)
    }
}
