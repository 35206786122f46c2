//! Naming module: target filenames for placed documents.
//!
//! This module provides:
//! - `filename`: the `date_merchant_role_amount` filename builder
//! - `merchant`: merchant name normalization
//! - `sanitize`: filesystem-safe filename cleanup

mod filename;
mod merchant;
mod sanitize;

pub use filename::*;
pub use merchant::*;
pub use sanitize::*;
