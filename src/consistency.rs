//! Structural consistency checks for data objects.
//!
//! A data set is consistent when its attribute arrays carry one tuple per
//! point (or cell), its connectivity only references existing points, and
//! its structured dimensions agree with the point count. Sources and
//! filters that build outputs by hand assert this before handing them to
//! the executive.

use crate::pipeline_error::PipelineResult;

/// Data objects whose buffers must agree with their declared shape.
pub trait Consistent {
    /// First mismatch between the shape and the buffers, if any.
    fn check_consistency(&self) -> PipelineResult<()>;

    /// Panics on the first mismatch in debug builds or with the
    /// `check-consistency` feature; a no-op otherwise.
    fn assert_consistent(&self) {
        crate::assert_consistent!(self.check_consistency(), "inconsistent data object");
    }
}

/// Run a consistency check and panic with `$ctx` on failure when checks are
/// compiled in.
#[macro_export]
macro_rules! assert_consistent {
    ($check:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-consistency"))]
        if let Err(e) = $check {
            panic!(concat!("[consistency] ", $($ctx)*, ": {}"), e);
        }
    };
}
