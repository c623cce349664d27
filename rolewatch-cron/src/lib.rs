//! Cron expressions and fixed-tick job scheduling for rolewatch.
//!
//! Provides:
//! - Five-field cron expressions with the `H` hash token, aliases such as
//!   `@daily`, month and weekday names, and multi-line tables
//! - A scheduler that invokes every registered job once per tick without
//!   overlapping runs of the same job
//!
//! ## Quick Start - Cron Expressions
//!
//! ```
//! use chrono::{FixedOffset, TimeZone};
//! use rolewatch_cron::CronExpression;
//!
//! let expr = CronExpression::parse("0 0 * * *").unwrap();
//!
//! let midnight = FixedOffset::east_opt(0)
//!     .unwrap()
//!     .with_ymd_and_hms(2024, 3, 5, 0, 0, 0)
//!     .unwrap();
//! assert!(expr.matches(&midnight));
//! ```
//!
//! ## Hashed Schedules
//!
//! ```
//! use chrono::Utc;
//! use rolewatch_cron::expression::{CronExpression, CronPresets};
//!
//! // `H` picks a stable value per seed, spreading load across jobs
//! let a = CronExpression::parse_with_seed(CronPresets::DAILY, Some("roles")).unwrap();
//! let b = CronExpression::parse_with_seed(CronPresets::DAILY, Some("roles")).unwrap();
//!
//! let now = Utc::now();
//! assert_eq!(a.next_after(&now), b.next_after(&now));
//! ```
//!
//! ## Scheduler
//!
//! ```no_run
//! use rolewatch_cron::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CronError> {
//!     let mut scheduler = CronScheduler::new();
//!
//!     scheduler
//!         .add_job("rotate-audit-log", |ctx| async move {
//!             println!("tick {} at {}", ctx.execution_count, ctx.tick_time);
//!             Ok(())
//!         })
//!         .await?;
//!
//!     scheduler.start().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod expression;
pub mod job;
pub mod scheduler;

pub use error::{CronError, CronResult};
pub use expression::{CronExpression, CronPresets};
pub use job::{Job, JobContext, JobFn, JobStatus};
pub use scheduler::{CronScheduler, JobStats, SchedulerConfig};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CronError, CronResult};
    pub use crate::expression::{CronExpression, CronPresets};
    pub use crate::job::{Job, JobContext, JobFn, JobStatus};
    pub use crate::scheduler::{CronScheduler, JobStats, SchedulerConfig};
}
