//! Groups of records that describe one transaction.

use crate::records::Record;

/// A record inside a group, with its position in the input batch
#[derive(Debug, Clone, Copy)]
pub struct Member<'a> {
    pub index: usize,
    pub record: &'a Record,
}

/// An ordered, non-empty set of records believed to be one transaction.
///
/// When any member is formal, the earliest formal member comes first and is
/// the primary; the rest keep input order.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    members: Vec<Member<'a>>,
}

impl<'a> Group<'a> {
    /// Build a group from input indices. `indices` must be non-empty and in
    /// bounds.
    pub(crate) fn from_indices(records: &'a [Record], indices: &[usize]) -> Self {
        debug_assert!(!indices.is_empty(), "groups are never empty");

        let mut ordered: Vec<usize> = indices.to_vec();
        ordered.sort_unstable();

        if let Some(pos) = ordered.iter().position(|&i| records[i].is_formal) {
            let primary = ordered.remove(pos);
            ordered.insert(0, primary);
        }

        Self {
            members: ordered
                .into_iter()
                .map(|index| Member {
                    index,
                    record: &records[index],
                })
                .collect(),
        }
    }

    pub fn members(&self) -> &[Member<'a>] {
        &self.members
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.members.iter().map(|m| m.record)
    }

    /// The formal invoice anchoring this group, if any
    pub fn primary(&self) -> Option<&'a Record> {
        self.members
            .first()
            .map(|m| m.record)
            .filter(|r| r.is_formal)
    }

    /// The record that speaks for the group: the primary, else the first member
    pub fn anchor(&self) -> &'a Record {
        self.members[0].record
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// Smallest input index among the members
    pub fn first_index(&self) -> usize {
        self.members.iter().map(|m| m.index).min().unwrap_or(0)
    }

    pub fn indices(&self) -> Vec<usize> {
        self.members.iter().map(|m| m.index).collect()
    }
}
