//! Selection of entries at or before a cutoff.

use crate::common::Entry;
use crate::threshold::RetentionCriterion;

/// True when the criterion's attribute of `entry` is at or before the cutoff.
/// Entries that do not carry the attribute never qualify.
pub fn is_selected(entry: &Entry, criterion: &RetentionCriterion) -> bool {
    criterion
        .attribute
        .of(entry)
        .is_some_and(|value| value <= criterion.cutoff)
}

/// Keeps the qualifying entries, preserving enumeration order.
pub fn select<'a, I>(
    entries: I,
    criterion: &'a RetentionCriterion,
) -> impl Iterator<Item = &'a Entry> + 'a
where
    I: IntoIterator<Item = &'a Entry>,
    I::IntoIter: 'a,
{
    entries.into_iter().filter(move |e| is_selected(e, criterion))
}
