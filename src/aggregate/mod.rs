//! Bounded in-memory views fed by classified telemetry.
//!
//! Each view enforces its own fixed policy:
//!
//! | View           | Policy                                   |
//! |----------------|------------------------------------------|
//! | Log feed       | newest-first ring, capacity 50           |
//! | Notifications  | newest-first ring, capacity 10           |
//! | Incident ledger| newest-first ring, capacity 20           |
//! | Metric series  | exactly 7 buckets, rotated on a timer    |

pub mod ring;
pub mod series;

pub use self::ring::BoundedFeed;
pub use self::series::{MetricBucket, MetricSeries};

/// Capacity of the operator log feed.
pub const LOG_FEED_CAPACITY: usize = 50;

/// Capacity of the bell-menu notification feed (CRITICAL records only).
pub const NOTIFICATION_CAPACITY: usize = 10;

/// Capacity of the incident ledger.
pub const INCIDENT_CAPACITY: usize = 20;

/// Number of buckets in the metric series.
pub const BUCKET_COUNT: usize = 7;

/// Spacing of the initial bucket labels, in minutes.
pub const BUCKET_SPACING_MINUTES: i64 = 5;
