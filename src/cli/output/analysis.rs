use std::{collections::HashMap, sync::Arc};

use crate::daemon::storage::entities::LogEntry;

#[derive(Debug, PartialEq)]
pub struct AppUsage {
    pub app_name: Arc<str>,
    /// Number of journal entries attributed to the app.
    pub entries: usize,
    /// Sum of the entries' durations.
    pub minutes: u64,
}

impl AppUsage {
    fn new(app_name: Arc<str>) -> Self {
        Self {
            app_name,
            entries: 0,
            minutes: 0,
        }
    }
}

/// Returns usage of every app, most used first. Apps with the same number of entries are ordered
/// by name.
pub fn analyze_apps(entries: &[LogEntry]) -> Vec<AppUsage> {
    let mut map = HashMap::<Arc<str>, AppUsage>::new();

    for entry in entries {
        let usage = map
            .entry(entry.active_app.clone())
            .or_insert_with(|| AppUsage::new(entry.active_app.clone()));
        usage.entries += 1;
        usage.minutes += entry.duration_minutes as u64;
    }

    let mut usages = map.into_values().collect::<Vec<_>>();
    usages.sort_by(|a, b| {
        b.entries
            .cmp(&a.entries)
            .then_with(|| a.app_name.cmp(&b.app_name))
    });
    usages
}

/// The app with the most entries. Ties go to the app that showed up first.
pub fn main_app<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> Option<Arc<str>> {
    let mut counts: Vec<(Arc<str>, usize)> = Vec::new();
    for entry in entries {
        match counts.iter_mut().find(|(app, _)| *app == entry.active_app) {
            Some((_, count)) => *count += 1,
            None => counts.push((entry.active_app.clone(), 1)),
        }
    }

    // max_by_key keeps the last maximum, iterating in reverse makes it the first one seen.
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(app, _)| app)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};

    use crate::daemon::storage::entities::LogEntry;

    use super::{analyze_apps, main_app};

    fn entry(app: &str, minutes: u32) -> LogEntry {
        let start = DateTime::parse_from_rfc3339("2025-03-15T10:00:00+01:00").unwrap();
        let mut entry = LogEntry {
            start_time: start,
            end_time: start,
            duration_minutes: 1,
            snapshot_count: 1,
            active_app: app.into(),
            window_title: "title".into(),
            extracted_text: "text".into(),
            avg_confidence: None,
        };
        entry.set_end(start + Duration::minutes(minutes as i64 - 1));
        entry
    }

    #[test]
    fn test_analyze_apps_sorting() {
        let entries = [
            entry("kitty", 5),
            entry("firefox", 10),
            entry("code", 3),
            entry("firefox", 2),
            entry("code", 1),
        ];

        let usages = analyze_apps(&entries);
        let order = usages
            .iter()
            .map(|v| (&*v.app_name, v.entries, v.minutes))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![("code", 2, 4), ("firefox", 2, 12), ("kitty", 1, 5)]
        );
    }

    #[test]
    fn test_main_app_prefers_first_seen_on_ties() {
        let entries = [
            entry("firefox", 1),
            entry("code", 1),
            entry("code", 1),
            entry("firefox", 1),
        ];
        assert_eq!(main_app(&entries).as_deref(), Some("firefox"));

        let entries = [entry("firefox", 1), entry("code", 1), entry("code", 1)];
        assert_eq!(main_app(&entries).as_deref(), Some("code"));

        assert_eq!(main_app(Vec::<&LogEntry>::new()), None);
    }
}
