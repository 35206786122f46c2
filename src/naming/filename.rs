//! Deterministic target filenames.

use super::merchant::normalize_merchant;
use super::sanitize::{sanitize_filename, truncate_to_bytes};
use crate::records::{display_date, Record};

/// Role tag for formal invoices
pub const FORMAL_TAG: &str = "发票";

/// Role tag for vouchers, receipts and itineraries
pub const VOUCHER_TAG: &str = "凭证";

/// Upper bound for a generated filename, extension included
pub const MAX_FILENAME_BYTES: usize = 200;

/// Build the target filename for one record.
///
/// Components are date, normalized merchant, role tag and amount, joined by
/// `_`; empty components are left out. A zero amount means the amount is
/// unknown, so it is omitted rather than rendered as `0.00元`.
///
/// `member_index` is 1-based. For groups of more than one member the
/// `_{index}-of-{size}` suffix is appended after truncation so it always
/// survives. `override_date`, when non-empty, replaces the record's own
/// effective date so every member of a group sorts together.
pub fn generate_filename(
    record: &Record,
    member_index: usize,
    group_size: usize,
    override_date: Option<&str>,
) -> String {
    let date = override_date
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| record.effective_date());

    let tag = if record.is_formal { FORMAL_TAG } else { VOUCHER_TAG };

    let amount = if record.has_known_amount() {
        format!("{:.2}元", record.amount.round_dp(2))
    } else {
        String::new()
    };

    let components = [display_date(date), normalize_merchant(&record.merchant), tag.to_string(), amount];
    let base = components
        .iter()
        .map(|c| sanitize_filename(c))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    let suffix = if group_size > 1 {
        format!("_{}-of-{}", member_index, group_size)
    } else {
        String::new()
    };

    let extension = record
        .extension()
        .map(|e| sanitize_filename(&e))
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let budget = MAX_FILENAME_BYTES.saturating_sub(suffix.len() + extension.len());
    let base = truncate_to_bytes(&base, budget).trim_end_matches(['_', ' ']);

    format!("{}{}{}", base, suffix, extension)
}
