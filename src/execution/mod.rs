//! Execution Module
//!
//! Turns matched groups into files on disk in two stages:
//! - `plan`: pure folder and filename selection, usable as a dry run
//! - `executor`: the locked single-writer stage with collision handling
//!
//! `checksum` supplies content identity for the collision policy and
//! `outcome` holds the per-file results and run summary.

mod checksum;
mod executor;
mod outcome;
mod plan;


pub use checksum::*;
pub use executor::*;
pub use outcome::*;
pub use plan::*;
