use crate::daemon::storage::{entities::LogEntry, observation::Observation};

/// Folds the next observation into the currently open entry.
///
/// Returns the entry that has to be committed (if any) and the entry that stays open. The open
/// entry is extended only while the observed text is byte-identical to its text; any other text,
/// empty text included, closes it and starts a new one. Which application showed the text plays
/// no role.
pub fn fold(open: Option<LogEntry>, observation: Observation) -> (Option<LogEntry>, LogEntry) {
    match open {
        Some(mut entry) if entry.extracted_text == observation.extracted_text => {
            extend(&mut entry, &observation);
            (None, entry)
        }
        previous => (previous, observation.into()),
    }
}

fn extend(entry: &mut LogEntry, observation: &Observation) {
    entry.set_end(observation.timestamp.fixed_offset());
    entry.avg_confidence = running_average(
        entry.avg_confidence,
        entry.snapshot_count,
        observation.confidence,
    );
    entry.snapshot_count += 1;
}

/// Mean weighted by the amount of snapshots that were already folded. A confidence seen for the
/// first time replaces the average outright, a missing one leaves it as is.
fn running_average(average: Option<f64>, count: u32, next: Option<f64>) -> Option<f64> {
    match (average, next) {
        (Some(average), Some(next)) => {
            Some((average * count as f64 + next) / (count as f64 + 1.))
        }
        (None, Some(next)) => Some(next),
        (average, None) => average,
    }
}
