//! Earliest free slot on a single date.

use flowplan_store::Event;

use super::WorkCalendar;

/// Whether the half-open hour intervals `[a_start, a_start + a_len)` and
/// `[b_start, b_start + b_len)` intersect. Touching endpoints do not.
pub fn overlaps(a_start: u32, a_len: u32, b_start: u32, b_len: u32) -> bool {
    a_start < b_start.saturating_add(b_len) && b_start < a_start.saturating_add(a_len)
}

/// Earliest start hour on a date where `duration` whole hours fit without
/// touching lunch or colliding with `events_on_date`.
///
/// The morning block is scanned before the afternoon block, hours ascending.
/// `events_on_date` is expected to hold only events of the date in question.
pub fn find_slot<'a, I>(calendar: &WorkCalendar, duration: u32, events_on_date: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a Event>,
{
    if duration == 0 {
        return None;
    }
    let busy: Vec<(u32, u32)> = events_on_date
        .into_iter()
        .map(|e| (e.start_hour, e.duration))
        .collect();

    calendar.blocks().into_iter().find_map(|(block_start, block_end)| {
        (block_start..block_end)
            .take_while(|h| h.checked_add(duration).is_some_and(|end| end <= block_end))
            .find(|h| {
                !busy
                    .iter()
                    .any(|(start, len)| overlaps(*h, duration, *start, *len))
            })
    })
}
