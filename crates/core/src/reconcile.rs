//! Merging per-source partials into one record.

use crate::record::{max_hours, GameRecord, PartialRecord, SourceKind};

/// Merge two partial records into a canonical record.
///
/// Each duration is the larger of the two sources; a missing value never wins
/// over a measured one. Each partial's URL lands in its own source slot no
/// matter whose durations won, so a refresh can re-fetch every source.
///
/// The name is the first non-blank scraped title, `a` before `b`, and
/// `fallback_name` (the searched or stored name) when neither page showed a
/// title. Returns `None` when no duration was measured; such a result must
/// not be persisted.
pub fn reconcile(a: &PartialRecord, b: &PartialRecord, fallback_name: &str) -> Option<GameRecord> {
    let name = [a, b]
        .iter()
        .filter_map(|p| p.name.as_deref())
        .map(str::trim)
        .find(|n| !n.is_empty())
        .unwrap_or_else(|| fallback_name.trim());
    if name.is_empty() {
        return None;
    }

    let mut record = GameRecord::new(name);
    for partial in [a, b] {
        if partial.url.is_none() {
            continue;
        }
        match partial.source {
            SourceKind::Hltb => record.hltb_url = partial.url.clone(),
            SourceKind::Completionator => record.completionator_url = partial.url.clone(),
        }
    }

    record.main = max_hours(a.main, b.main);
    record.main_plus = max_hours(a.main_plus, b.main_plus);
    record.completionist = max_hours(a.completionist, b.completionist);

    record.has_measured_duration().then_some(record)
}
