//! Folder selection for matched groups.
//!
//! A group lands in the folder of its anchor's category, or in the pending
//! bucket when there is not enough information to file it.

use crate::matching::Group;
use crate::records::Category;
use serde::Serialize;

/// Where a group is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum Destination {
    Category(Category),
    Pending,
}

impl Destination {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Pick the destination for a group.
///
/// | anchor category | anchor amount | group shape            | result    |
/// |-----------------|---------------|------------------------|-----------|
/// | other           | 0             | any                    | pending   |
/// | any             | 0             | lone non-formal record | pending   |
/// | c               | any           | otherwise              | folder c  |
pub fn categorize(group: &Group<'_>) -> Destination {
    let anchor = group.anchor();
    let amount_known = anchor.has_known_amount();
    let lone_voucher = group.is_singleton() && !anchor.is_formal;

    match (anchor.category, amount_known, lone_voucher) {
        (Category::Other, false, _) => Destination::Pending,
        (_, false, true) => Destination::Pending,
        (category, _, _) => Destination::Category(category),
    }
}
