//! CLI command implementations.

pub mod check;
pub mod diff;
pub mod record;
pub mod rotate;
pub mod run;

use chrono::{DateTime, FixedOffset, Local};

/// Wall-clock time in the local offset, as stamped into audit lines.
pub(crate) fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}
