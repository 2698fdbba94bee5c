use anyhow::{anyhow, Result};
use serde::Serialize;

use puzlog_core_types::Alert;
use puzlog_puzzle_model::{serialize, PuzzleRecord};

/// Alerts carry the text a UI surface would show; the CLI reports it verbatim.
pub fn alert_error(alert: Alert) -> anyhow::Error {
    anyhow!("{alert}")
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `h:mm:ss` for an elapsed time in milliseconds.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total = elapsed_ms / 1000;
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

pub fn print_record(record: &PuzzleRecord, json: bool) -> Result<()> {
    if json {
        return print_json(&serialize(record));
    }

    println!("{}", record.title);
    println!("  id:        {}", record.id);
    println!("  url:       {}", record.url);
    println!("  status:    {} (timer {})", record.status, record.timer_state);
    println!("  elapsed:   {}", format_elapsed(record.elapsed_time));
    println!("  started:   {}", record.time_start.to_rfc3339());
    if let Some(finished) = record.time_finish {
        println!("  finished:  {}", finished.to_rfc3339());
    }
    if let Some(rating) = record.rating {
        println!("  rating:    {}", rating);
    }
    if let Some(hints) = record.hints_or_mistakes {
        println!("  hints:     {}", hints);
    }
    if !record.notes.is_empty() {
        println!("  notes:     {}", record.notes);
    }
    let meta = &record.metadata;
    for (label, value) in [
        ("series", meta.series.as_deref()),
        ("setter", meta.setter.as_deref()),
        ("title", meta.title.as_deref()),
    ] {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            println!("  {:<10} {}", format!("{label}:"), value);
        }
    }
    if let Some(published) = meta.date_published {
        println!("  published: {}", published.format("%Y-%m-%d"));
    }
    Ok(())
}

pub fn print_summary_line(record: &PuzzleRecord) {
    println!(
        "{:<10} {:>9}  {}  {}",
        record.status.as_str(),
        format_elapsed(record.elapsed_time),
        record.title,
        record.id
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_rendered_as_clock_time() {
        assert_eq!(format_elapsed(0), "0:00:00");
        assert_eq!(format_elapsed(61_999), "0:01:01");
        assert_eq!(format_elapsed(3_723_000), "1:02:03");
    }
}
