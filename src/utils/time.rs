use chrono::{Duration, NaiveDate, NaiveTime, Timelike};

const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";
const RECORD_EXTENSION: &str = "jsonl";

/// This is the standard way of converting a date to a journal file name in daylog.
pub fn date_to_record_name(date: NaiveDate) -> String {
    format!("{}.{RECORD_EXTENSION}", date.format(RECORD_DATE_FORMAT))
}

/// Reverse of [date_to_record_name]. Anything that isn't exactly `YYYY-MM-DD.jsonl` yields
/// [None].
pub fn record_name_to_date(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(RECORD_EXTENSION)?.strip_suffix('.')?;
    NaiveDate::parse_from_str(stem, RECORD_DATE_FORMAT).ok()
}

/// Returns start of the block of `block_minutes` that contains `time`. Blocks are aligned to
/// midnight.
pub fn block_start(time: NaiveTime, block_minutes: u32) -> NaiveTime {
    let block_minutes = block_minutes.max(1);
    let minute_of_day = time.hour() * 60 + time.minute();
    let start = minute_of_day / block_minutes * block_minutes;
    NaiveTime::MIN + Duration::minutes(start as i64)
}
