//! Merchant name normalization.

use once_cell::sync::Lazy;
use regex::Regex;

/// Full- and half-width parentheses; their content is kept
static PARENTHESES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()（）]").expect("valid regex"));

/// Corporate suffixes, longest alternatives first
static CORPORATE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(科技有限公司|信息技术有限公司|网络技术有限公司|股份有限公司|有限责任公司|有限公司|分公司|集团)$",
    )
    .expect("valid regex")
});

/// Shorten a merchant name to its recognizable core.
///
/// Removes parentheses (not their content) and strips corporate suffixes
/// from the end until none is left. A name made only of a suffix is kept
/// as is.
pub fn normalize_merchant(merchant: &str) -> String {
    let mut name = PARENTHESES.replace_all(merchant.trim(), "").trim().to_string();

    while let Some(m) = CORPORATE_SUFFIX.find(&name) {
        let stripped = name[..m.start()].trim_end();
        if stripped.is_empty() {
            break;
        }
        name = stripped.to_string();
    }

    name
}
