//! Channels - header-to-channel parsing for AcquiSuite telemetry exports
//!
//! Turns free-text column headers such as `"SCE Main Power Pulse #1 (kWh)"`
//! into a canonical [`ChannelIdentity`] of `{source, metric, unit}`.
//!
//! The parser is an ordered cascade of static rule tables:
//! - [`unit`]: trailing `(unit)` group
//! - [`metric`]: trailing metric keyword
//! - [`normalize`]: case, whitespace and spelling corrections
//! - [`quantity`]: physical quantity fallback and prefix
//! - [`phase`]: phase / aggregate tag
//! - [`system`]: canonical source system
//! - [`identity`]: assembly and aliasing
//!
//! Parsing is pure: the same header always yields the same identity. The
//! loader and the header audit both go through [`parse_header`] so their view
//! of a column never drifts apart.

pub mod discovery;
pub mod identity;
pub mod metric;
pub mod normalize;
pub mod phase;
pub mod quantity;
pub mod reserved;
pub mod rules;
pub mod system;
pub mod unit;

pub use identity::{parse_header, trace_header, ChannelIdentity, HeaderTrace};
pub use quantity::Quantity;
pub use phase::Phase;
pub use system::SourceSystem;

/// Version of the vocabulary tables. Bump whenever a table entry or its order
/// changes, since that changes the identity of already stored channels.
pub const VOCABULARY_VERSION: u32 = 2;
