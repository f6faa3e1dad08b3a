//! Presence detection: is the user in a meeting right now?
//!
//! - [`window`]: padded time-window overlap
//! - [`event_filter`]: cancelled / all-day / transparent event policy
//! - [`join_link`]: video-call link and call-page recognition
//! - [`account`]: per-account free/busy + event confirmation
//! - [`decision`]: device overrides and account aggregation

pub mod account;
pub mod decision;
pub mod event_filter;
pub mod join_link;
pub mod window;

pub use account::{check_account, AccountOutcome, SkipReason};
pub use decision::{call_page, decide, Decision, DeviceSignals, SkippedAccount};
pub use event_filter::is_busy_relevant;
pub use join_link::{call_page_host, has_join_link, CALL_DOMAINS};
pub use window::overlaps_now;
