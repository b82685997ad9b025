//! Rendering of a day journal into a markdown digest. The digest is meant to be read by a person
//! or handed to a language model, so it keeps a fixed layout.

pub mod analysis;

use std::collections::BTreeMap;

use analysis::{analyze_apps, main_app};
use chrono::{Duration, NaiveDate, NaiveTime};

use crate::{
    daemon::storage::entities::LogEntry,
    ocr::truncate_chars,
    utils::{percentage::count_percentage, time::block_start},
};

const TIME_FORMAT: &str = "%H:%M";
const BAR_WIDTH: usize = 20;
const MAX_TITLE_LENGTH: usize = 60;
const TRUNCATION_MARKER: &str = "...(truncated)";
const EMPTY_BLOCK_PLACEHOLDER: &str = "(No meaningful text was captured in this block)";

#[derive(Debug, Clone)]
pub struct DigestOptions {
    pub block_minutes: u32,
    pub max_entries_per_block: usize,
    /// Entries with less text than this, in characters, are left out of time blocks.
    pub min_text_length: usize,
    /// Entries sharing this many leading characters with an earlier entry of the block are
    /// considered duplicates.
    pub dedup_prefix_length: usize,
    pub max_excerpt_length: usize,
    pub top_apps: usize,
}

impl Default for DigestOptions {
    fn default() -> Self {
        Self {
            block_minutes: 30,
            max_entries_per_block: 2,
            min_text_length: 50,
            dedup_prefix_length: 100,
            max_excerpt_length: 1500,
            top_apps: 10,
        }
    }
}

pub fn render_digest(date: NaiveDate, entries: &[LogEntry], options: &DigestOptions) -> String {
    let title = format!("## {} daylog", date.format("%Y-%m-%d"));
    let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
        return format!("{title}\n\nNo records.");
    };

    let mut lines = vec![
        title,
        String::new(),
        format!("**Entries**: {}", entries.len()),
        format!(
            "**Recorded**: {} - {}",
            first.start_time.format(TIME_FORMAT),
            last.end_time.format(TIME_FORMAT)
        ),
        String::new(),
        "---".into(),
        String::new(),
        "### App usage".into(),
        String::new(),
    ];

    for usage in analyze_apps(entries).into_iter().take(options.top_apps) {
        let percentage = count_percentage(usage.entries, entries.len());
        lines.push(format!(
            "- {}: {} entries, {} min ({percentage}) {}",
            usage.app_name,
            usage.entries,
            usage.minutes,
            percentage.bar(BAR_WIDTH)
        ));
    }

    lines.extend([
        String::new(),
        "---".into(),
        String::new(),
        "### Activity by time block (extracted text)".into(),
        String::new(),
    ]);

    for (start, block) in group_by_block(entries, options.block_minutes) {
        render_block(&mut lines, start, &block, options);
    }

    lines.join("\n")
}

/// Groups entries by the block their start falls into. Entries keep their order within a block.
fn group_by_block(entries: &[LogEntry], block_minutes: u32) -> BTreeMap<NaiveTime, Vec<&LogEntry>> {
    let mut blocks = BTreeMap::<NaiveTime, Vec<&LogEntry>>::new();
    for entry in entries {
        blocks
            .entry(block_start(entry.start_time.time(), block_minutes))
            .or_default()
            .push(entry);
    }
    blocks
}

fn render_block(
    lines: &mut Vec<String>,
    start: NaiveTime,
    block: &[&LogEntry],
    options: &DigestOptions,
) {
    let end = start + Duration::minutes(options.block_minutes.max(1) as i64);
    let app = main_app(block.iter().copied()).unwrap_or_else(|| "Unknown".into());
    lines.push(format!(
        "#### {} - {} ({app})",
        start.format(TIME_FORMAT),
        end.format(TIME_FORMAT)
    ));
    lines.push(String::new());

    let mut seen_prefixes = Vec::<String>::new();
    let mut rendered = 0;
    for entry in block {
        if rendered >= options.max_entries_per_block {
            break;
        }

        let text = entry.extracted_text.trim();
        if text.chars().count() < options.min_text_length {
            continue;
        }
        let prefix = truncate_chars(text.to_string(), options.dedup_prefix_length);
        if seen_prefixes.contains(&prefix) {
            continue;
        }
        seen_prefixes.push(prefix);

        lines.push(format!(
            "**{}** [{}] {}",
            entry.start_time.format(TIME_FORMAT),
            entry.active_app,
            truncate_chars(entry.window_title.to_string(), MAX_TITLE_LENGTH)
        ));
        lines.push("```".into());
        lines.push(excerpt(text, options.max_excerpt_length));
        lines.push("```".into());
        lines.push(String::new());
        rendered += 1;
    }

    if rendered == 0 {
        lines.push(EMPTY_BLOCK_PLACEHOLDER.into());
        lines.push(String::new());
    }
}

fn excerpt(text: &str, max_length: usize) -> String {
    if text.chars().count() > max_length {
        format!(
            "{}\n{TRUNCATION_MARKER}",
            truncate_chars(text.to_string(), max_length)
        )
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate};

    use crate::daemon::storage::entities::LogEntry;

    use super::{render_digest, DigestOptions, EMPTY_BLOCK_PLACEHOLDER, TRUNCATION_MARKER};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn entry(start: &str, minutes: u32, app: &str, title: &str, text: &str) -> LogEntry {
        let start =
            DateTime::parse_from_rfc3339(&format!("2025-03-15T{start}:00+01:00")).unwrap();
        let mut entry = LogEntry {
            start_time: start,
            end_time: start,
            duration_minutes: 1,
            snapshot_count: 1,
            active_app: app.into(),
            window_title: title.into(),
            extracted_text: text.into(),
            avg_confidence: Some(0.9),
        };
        entry.set_end(start + Duration::minutes(minutes as i64 - 1));
        entry
    }

    fn long_text(seed: &str) -> String {
        format!("{seed} {}", "lorem ipsum dolor sit amet ".repeat(4))
    }

    #[test]
    fn test_empty_day() {
        let digest = render_digest(date(), &[], &DigestOptions::default());
        assert_eq!(digest, "## 2025-03-15 daylog\n\nNo records.");
    }

    #[test]
    fn test_header_and_app_usage() {
        let entries = [
            entry("09:02", 10, "code", "main.rs", &long_text("fn main")),
            entry("09:12", 5, "firefox", "docs.rs", &long_text("tokio docs")),
            entry("09:40", 6, "code", "lib.rs", &long_text("pub mod")),
        ];

        let digest = render_digest(date(), &entries, &DigestOptions::default());

        assert!(digest.starts_with("## 2025-03-15 daylog\n\n**Entries**: 3\n"));
        assert!(digest.contains("**Recorded**: 09:02 - 09:45"));
        assert!(digest.contains(&format!(
            "- code: 2 entries, 16 min (67%) {}{}",
            "█".repeat(13),
            "░".repeat(7)
        )));
        assert!(digest.contains(&format!(
            "- firefox: 1 entries, 5 min (33%) {}{}",
            "█".repeat(6),
            "░".repeat(14)
        )));
    }

    #[test]
    fn test_time_blocks() {
        let entries = [
            entry("09:02", 1, "code", "main.rs", &long_text("fn main")),
            entry("09:12", 1, "code", "main.rs", &long_text("fn main")),
            entry("09:20", 1, "firefox", "docs.rs", &long_text("tokio docs")),
            entry("09:25", 1, "code", "lib.rs", &long_text("pub mod")),
            entry("10:31", 1, "kitty", "bash", "ls"),
        ];

        let digest = render_digest(date(), &entries, &DigestOptions::default());

        let first_block = digest.find("#### 09:00 - 09:30 (code)").unwrap();
        let second_block = digest.find("#### 10:30 - 11:00 (kitty)").unwrap();
        assert!(first_block < second_block);

        // 09:12 repeats 09:02, the limit of two entries stops before 09:25.
        let block = &digest[first_block..second_block];
        assert!(block.contains("**09:02** [code] main.rs\n```\nfn main"));
        assert!(!block.contains("**09:12**"));
        assert!(block.contains("**09:20** [firefox] docs.rs"));
        assert!(!block.contains("**09:25**"));

        // Too little text to be worth showing.
        assert!(digest[second_block..].contains(EMPTY_BLOCK_PLACEHOLDER));
    }

    #[test]
    fn test_long_text_and_title_are_cut() {
        let title = "t".repeat(80);
        let text = "x".repeat(2000);
        let entries = [entry("13:00", 1, "code", &title, &text)];

        let digest = render_digest(date(), &entries, &DigestOptions::default());

        assert!(digest.contains(&format!("**13:00** [code] {}\n", "t".repeat(60))));
        assert!(digest.contains(&format!("{}\n{TRUNCATION_MARKER}\n```", "x".repeat(1500))));
    }

    #[test]
    fn test_custom_options() {
        let entries = [
            entry("09:02", 1, "code", "a", &long_text("first")),
            entry("09:50", 1, "code", "b", &long_text("second")),
            entry("09:55", 1, "code", "c", &long_text("third")),
        ];
        let options = DigestOptions {
            block_minutes: 60,
            max_entries_per_block: 3,
            ..DigestOptions::default()
        };

        let digest = render_digest(date(), &entries, &options);

        assert!(digest.contains("#### 09:00 - 10:00 (code)"));
        assert_eq!(digest.matches("####").count(), 1);
        assert_eq!(digest.matches("```\n").count(), 6);
    }
}
