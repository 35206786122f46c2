//! Records module: the structured description of one extracted document.
//!
//! This module provides:
//! - `record`: `Record` and its `Category`
//! - `amount`: lenient amount parsing
//! - `date`: calendar-day parsing for extracted date strings
//! - `manifest`: loading a batch of records from JSON

mod amount;
mod date;
mod manifest;
mod record;

pub use amount::*;
pub use date::*;
pub use manifest::*;
pub use record::*;
