//! Matching Engine
//!
//! Partitions a batch of records into groups that describe the same
//! transaction. Two passes over index sets:
//!
//! 1. Exact-key: records sharing a non-empty order reference are grouped,
//!    unless more than one of them is a formal invoice.
//! 2. Heuristic: each remaining voucher claims its best-scoring unclaimed
//!    formal invoice if the score reaches `MATCH_THRESHOLD`.
//!
//! Whatever is left becomes a singleton. The heuristic pass is greedy: an
//! earlier voucher keeps the invoice it claimed even if a later voucher
//! would have scored higher against it.

use super::group::Group;
use crate::records::Record;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Normalized order references agree
pub const ORDER_REFERENCE_SCORE: u32 = 10;
/// Amounts agree within `AMOUNT_TOLERANCE`
pub const AMOUNT_SCORE: u32 = 3;
/// Effective dates agree
pub const DATE_SCORE: u32 = 2;
/// Categories agree
pub const CATEGORY_SCORE: u32 = 1;

/// Minimum score for a heuristic pair
pub const MATCH_THRESHOLD: u32 = 3;

/// 0.01
pub const AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Score how likely `candidate` and `anchor` describe the same transaction.
///
/// Missing data never contributes: unknown (zero) amounts, empty dates and
/// empty references score nothing. Two records that both lack an amount are
/// not treated as agreeing on it, so a voucher with no amount needs a
/// reference or a date plus category to reach `MATCH_THRESHOLD`.
pub fn calculate_match_score(candidate: &Record, anchor: &Record) -> u32 {
    let mut score = 0;

    if references_match(candidate, anchor) {
        score += ORDER_REFERENCE_SCORE;
    }
    if amounts_match(candidate, anchor) {
        score += AMOUNT_SCORE;
    }
    if dates_match(candidate, anchor) {
        score += DATE_SCORE;
    }
    if candidate.category == anchor.category {
        score += CATEGORY_SCORE;
    }

    score
}

/// Trimmed, case-folded, alphanumeric-only form of an order reference
pub fn normalize_reference(reference: &str) -> String {
    reference
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn references_match(a: &Record, b: &Record) -> bool {
    let a = normalize_reference(&a.order_reference);
    !a.is_empty() && a == normalize_reference(&b.order_reference)
}

fn amounts_match(a: &Record, b: &Record) -> bool {
    a.has_known_amount() && b.has_known_amount() && (a.amount - b.amount).abs() < AMOUNT_TOLERANCE
}

fn dates_match(a: &Record, b: &Record) -> bool {
    match (a.effective_day(), b.effective_day()) {
        (Some(x), Some(y)) => x == y,
        _ => {
            let (x, y) = (a.effective_date(), b.effective_date());
            !x.is_empty() && x == y
        }
    }
}

/// Group `records` into transactions.
///
/// Every record lands in exactly one group. Groups come back ordered by the
/// smallest input index among their members.
pub fn match_records(records: &[Record]) -> Vec<Group<'_>> {
    let (key_groups, mut claimed) = exact_key_phase(records);
    let pairs = heuristic_phase(records, &claimed);

    for &(voucher, invoice) in &pairs {
        claimed.insert(voucher);
        claimed.insert(invoice);
    }

    let mut index_sets: Vec<Vec<usize>> = key_groups;
    index_sets.extend(pairs.into_iter().map(|(voucher, invoice)| vec![voucher, invoice]));
    index_sets.extend(
        (0..records.len())
            .filter(|i| !claimed.contains(i))
            .map(|i| vec![i]),
    );

    let mut groups: Vec<Group<'_>> = index_sets
        .iter()
        .map(|indices| Group::from_indices(records, indices))
        .collect();
    groups.sort_by_key(Group::first_index);

    tracing::info!(
        records = records.len(),
        groups = groups.len(),
        paired = claimed.len(),
        "Matched records"
    );

    groups
}

/// Bucket by exact order reference. Buckets of two or more with at most one
/// formal member become groups; returns those index sets and the set of
/// claimed indices.
fn exact_key_phase(records: &[Record]) -> (Vec<Vec<usize>>, HashSet<usize>) {
    let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut key_order: Vec<&str> = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let key = record.order_reference.trim();
        if key.is_empty() {
            continue;
        }
        let bucket = buckets.entry(key).or_insert_with(|| {
            key_order.push(key);
            Vec::new()
        });
        bucket.push(index);
    }

    let mut groups = Vec::new();
    let mut claimed = HashSet::new();

    for key in key_order {
        let Some(members) = buckets.remove(key) else {
            continue;
        };
        if members.len() < 2 {
            continue;
        }

        // A group holds at most one formal invoice; contested buckets are
        // left to the heuristic pass
        let formal_count = members.iter().filter(|&&i| records[i].is_formal).count();
        if formal_count > 1 {
            tracing::debug!(
                order_reference = key,
                formal = formal_count,
                "Order reference shared by several invoices; deferring to heuristic pass"
            );
            continue;
        }

        claimed.extend(members.iter().copied());
        groups.push(members);
    }

    (groups, claimed)
}

/// Greedy voucher → invoice assignment over unclaimed records.
///
/// Returns `(voucher, invoice)` index pairs.
fn heuristic_phase(records: &[Record], claimed: &HashSet<usize>) -> Vec<(usize, usize)> {
    let open = |i: &usize| !claimed.contains(i);

    let vouchers: Vec<usize> = (0..records.len())
        .filter(open)
        .filter(|&i| !records[i].is_formal)
        .collect();
    let invoices: Vec<usize> = (0..records.len())
        .filter(open)
        .filter(|&i| records[i].is_formal)
        .collect();

    let mut taken: HashSet<usize> = HashSet::new();
    let mut pairs = Vec::new();

    for voucher in vouchers {
        let mut best: Option<(usize, u32)> = None;

        for &invoice in &invoices {
            if taken.contains(&invoice) {
                continue;
            }
            let score = calculate_match_score(&records[voucher], &records[invoice]);
            // Strict comparison keeps the earliest invoice on ties
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((invoice, score));
            }
        }

        match best {
            Some((invoice, score)) if score >= MATCH_THRESHOLD => {
                tracing::debug!(voucher, invoice, score, "Paired voucher with invoice");
                taken.insert(invoice);
                pairs.push((voucher, invoice));
            }
            _ => {}
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Category;
    use std::path::PathBuf;

    fn invoice() -> Record {
        Record {
            category: Category::Taxi,
            subtype: "滴滴出行".to_string(),
            amount: Decimal::new(3550, 2),
            issue_date: "2024-01-15".to_string(),
            service_date: "2024-01-15".to_string(),
            merchant: "滴滴出行科技有限公司".to_string(),
            document_number: "12345678901234567890".to_string(),
            is_formal: true,
            order_reference: "DD202401150001".to_string(),
            source_path: PathBuf::from("/tmp/test_invoice.pdf"),
            ..Default::default()
        }
    }

    fn voucher() -> Record {
        Record {
            category: Category::Taxi,
            subtype: "滴滴出行".to_string(),
            amount: Decimal::new(3550, 2),
            issue_date: "2024-01-15".to_string(),
            service_date: "2024-01-15".to_string(),
            merchant: "滴滴出行".to_string(),
            is_formal: false,
            order_reference: "DD202401150001".to_string(),
            source_path: PathBuf::from("/tmp/test_voucher.pdf"),
            ..Default::default()
        }
    }

    fn assert_partition(records: &[Record], groups: &[Group<'_>]) {
        let mut seen: Vec<usize> = groups.iter().flat_map(|g| g.indices()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..records.len()).collect::<Vec<_>>());
        assert!(groups.iter().all(|g| !g.is_empty()));
    }

    #[test]
    fn test_empty_batch() {
        assert!(match_records(&[]).is_empty());
    }

    #[test]
    fn test_pair_by_order_reference_primary_first() {
        let mut inv = invoice();
        let mut vou = voucher();
        inv.order_reference = "DD001".to_string();
        vou.order_reference = "DD001".to_string();

        // Voucher listed first; invoice still becomes primary
        let records = vec![vou, inv];
        let groups = match_records(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0].indices(), vec![1, 0]);
        assert!(groups[0].primary().unwrap().is_formal);
    }

    #[test]
    fn test_order_reference_wins_regardless_of_amount_and_date() {
        let mut inv = invoice();
        let mut vou = voucher();
        inv.order_reference = "ORDER123".to_string();
        vou.order_reference = "ORDER123".to_string();
        vou.amount = Decimal::new(999, 0);
        vou.service_date = "2023-06-01".to_string();
        vou.category = Category::Other;

        let records = vec![inv, vou];
        let groups = match_records(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_pair_by_amount_and_date() {
        let mut inv = invoice();
        let mut vou = voucher();
        inv.order_reference.clear();
        vou.order_reference.clear();
        inv.amount = Decimal::new(100, 0);
        vou.amount = Decimal::new(100, 0);

        let records = vec![inv, vou];
        let groups = match_records(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert_partition(&records, &groups);
    }

    #[test]
    fn test_unpaired_invoice_standalone() {
        let records = vec![invoice()];
        let groups = match_records(&records);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_singleton());
        assert!(groups[0].anchor().is_formal);
    }

    #[test]
    fn test_lone_reference_falls_through_to_heuristics() {
        // Only the invoice carries the reference; amount + date still pair them
        let inv = invoice();
        let mut vou = voucher();
        vou.order_reference.clear();

        let records = vec![inv, vou];
        let groups = match_records(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_below_threshold_stays_single() {
        let mut inv = invoice();
        let mut vou = voucher();
        inv.order_reference.clear();
        vou.order_reference.clear();
        vou.amount = Decimal::new(12, 0);
        // Date (2) + category (1) = 3 would pair; drop the date match
        vou.service_date = "2024-02-01".to_string();

        let records = vec![inv, vou];
        let groups = match_records(&records);

        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(Group::is_singleton));
    }

    #[test]
    fn test_two_vouchers_never_pair_with_each_other() {
        let mut a = voucher();
        let mut b = voucher();
        a.order_reference.clear();
        b.order_reference.clear();

        let records = vec![a, b];
        let groups = match_records(&records);

        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_tie_goes_to_earliest_invoice() {
        let mut first = invoice();
        let mut second = invoice();
        let mut vou = voucher();
        first.order_reference.clear();
        second.order_reference.clear();
        vou.order_reference.clear();

        let records = vec![first, second, vou];
        let groups = match_records(&records);

        let pair = groups.iter().find(|g| g.len() == 2).unwrap();
        assert_eq!(pair.indices(), vec![0, 2]);
        assert_partition(&records, &groups);
    }

    #[test]
    fn test_greedy_claim_is_not_revisited() {
        // Invoice 0 matches both vouchers; voucher 1 is visited first and
        // claims it even though voucher 2 is a better fit.
        let mut inv = invoice();
        inv.order_reference.clear();

        let mut weak = voucher();
        weak.order_reference.clear();
        weak.service_date = "2024-03-01".to_string();

        let mut strong = voucher();
        strong.order_reference.clear();

        let records = vec![inv, weak, strong];
        assert_eq!(calculate_match_score(&records[1], &records[0]), 4);
        assert_eq!(calculate_match_score(&records[2], &records[0]), 6);

        let groups = match_records(&records);
        let pair = groups.iter().find(|g| g.len() == 2).unwrap();
        assert_eq!(pair.indices(), vec![0, 1]);
        assert!(groups.iter().any(|g| g.indices() == vec![2]));
    }

    #[test]
    fn test_each_record_in_exactly_one_group() {
        let mut records = Vec::new();
        for i in 0..6 {
            let mut inv = invoice();
            let mut vou = voucher();
            inv.order_reference = if i % 2 == 0 { format!("R{}", i) } else { String::new() };
            vou.order_reference = if i % 3 == 0 { format!("R{}", i) } else { String::new() };
            inv.amount = Decimal::new(100 + i, 0);
            vou.amount = Decimal::new(100 + (i % 4), 0);
            records.push(inv);
            records.push(vou);
        }

        let groups = match_records(&records);
        assert_partition(&records, &groups);
        assert!(groups
            .iter()
            .all(|g| g.records().filter(|r| r.is_formal).count() <= 1));
    }

    #[test]
    fn test_shared_reference_with_two_invoices_keeps_one_formal_per_group() {
        let mut second_invoice = invoice();
        second_invoice.source_path = PathBuf::from("/tmp/test_invoice_copy.pdf");
        let records = vec![invoice(), second_invoice, voucher()];

        let groups = match_records(&records);
        assert_partition(&records, &groups);
        assert!(groups
            .iter()
            .all(|g| g.records().filter(|r| r.is_formal).count() <= 1));

        // The voucher still follows its reference to the earliest invoice
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].indices(), vec![0, 2]);
        assert_eq!(groups[1].indices(), vec![1]);
    }

    #[test]
    fn test_score_components() {
        let inv = invoice();
        let vou = voucher();
        assert_eq!(
            calculate_match_score(&vou, &inv),
            ORDER_REFERENCE_SCORE + AMOUNT_SCORE + DATE_SCORE + CATEGORY_SCORE
        );

        let mut other = voucher();
        other.order_reference = " dd-2024-0115-0001 ".to_string();
        let mut anchor = invoice();
        anchor.order_reference = "DD20240115 0001".to_string();
        assert!(calculate_match_score(&other, &anchor) >= ORDER_REFERENCE_SCORE);
    }

    #[test]
    fn test_unknown_amounts_do_not_match() {
        let mut inv = invoice();
        let mut vou = voucher();
        inv.amount = Decimal::ZERO;
        vou.amount = Decimal::ZERO;
        inv.order_reference.clear();
        vou.order_reference.clear();
        inv.service_date.clear();
        inv.issue_date.clear();

        assert_eq!(calculate_match_score(&vou, &inv), CATEGORY_SCORE);
    }

    #[test]
    fn test_amount_tolerance() {
        let inv = invoice();
        let mut vou = voucher();
        vou.amount = Decimal::new(35505, 3);
        assert!(amounts_match(&vou, &inv));
        vou.amount = Decimal::new(3551, 2);
        assert!(!amounts_match(&vou, &inv));
    }

    #[test]
    fn test_dates_compare_as_days() {
        let inv = invoice();
        let mut vou = voucher();
        vou.service_date = "2024年1月15日".to_string();
        assert!(dates_match(&vou, &inv));
    }
}
