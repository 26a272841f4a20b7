//! Access control subsystem.
//!
//! # Data Flow
//! ```text
//! config (string or list of patterns)
//!     → allow_list.rs (normalize into AllowList once, at load time)
//!     → AccessConfig (origin + destination lists)
//!     → handler checks origin hostname, then destination URL
//! ```
//!
//! # Design Decisions
//! - An empty list is open: every candidate is permitted
//! - `*` is only meaningful as the trailing character (prefix match)
//! - Matching is a pure function; no I/O, no shared state

pub mod allow_list;

pub use allow_list::{is_permitted, AllowList, NotAllowed, Pattern, WILDCARD};
