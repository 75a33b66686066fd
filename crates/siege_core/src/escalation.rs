//! Endless-mode wave-set selection.

/// Pick the endless wave-set for `day`.
///
/// Every `days_per_set` days past `base_day` moves one set up the catalog.
/// Days before `base_day` use the first set; days past the end of the
/// catalog stay on the last one. Returns 0 for an empty catalog.
#[must_use]
pub fn wave_set_index(day: u32, base_day: u32, days_per_set: u32, set_count: usize) -> usize {
    if set_count == 0 {
        return 0;
    }
    let steps = day.saturating_sub(base_day) / days_per_set.max(1);
    usize::try_from(steps)
        .unwrap_or(usize::MAX)
        .min(set_count - 1)
}
