use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Format a run start time (unix seconds) according to the configured date
/// format.
///
/// If `date_format` is `"relative"` (or empty), displays relative times like
/// `"2h"`, `"3d"`, `"1w"`. Otherwise, uses `strftime`-style formatting in UTC.
/// Unknown times (`unix <= 0`) render as `"-"`.
pub(crate) fn format_unix(unix: i64, date_format: &str) -> String {
    let Some(dt) = DateTime::<Utc>::from_timestamp(unix, 0).filter(|_| unix > 0) else {
        return "-".to_owned();
    };
    if date_format.is_empty() || date_format == "relative" {
        format_relative_time(&dt, Utc::now())
    } else {
        dt.format(date_format).to_string()
    }
}

/// Format a datetime relative to `now` (e.g., `"2h"`, `"3d"`, `"1w"`).
pub(crate) fn format_relative_time(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(dt);

    let minutes = duration.num_minutes();
    if minutes < 1 {
        return "now".to_owned();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }

    let hours = duration.num_hours();
    if hours < 24 {
        return format!("{hours}h");
    }

    let days = duration.num_days();
    if days < 7 {
        return format!("{days}d");
    }
    if days < 30 {
        return format!("{}w", days / 7);
    }
    if days < 365 {
        return format!("{}mo", days / 30);
    }

    format!("{}y", days / 365)
}

/// Truncate `text` to at most `width` terminal columns, ending with `…` when
/// anything was cut.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_owned();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Truncate and right-pad `text` to exactly `width` columns.
pub(crate) fn fit_to_width(text: &str, width: usize) -> String {
    let mut out = truncate_to_width(text, width);
    let used = UnicodeWidthStr::width(out.as_str());
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn unknown_time_is_a_dash() {
        assert_eq!(format_unix(0, "%Y"), "-");
        assert_eq!(format_unix(-5, "relative"), "-");
    }

    #[test]
    fn strftime_format_is_applied_in_utc() {
        // 2021-01-01T00:00:00Z
        assert_eq!(format_unix(1_609_459_200, "%Y-%m-%d %H:%M"), "2021-01-01 00:00");
    }

    #[test]
    fn relative_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let ago = |secs: i64| now - chrono::Duration::seconds(secs);
        assert_eq!(format_relative_time(&ago(30), now), "now");
        assert_eq!(format_relative_time(&ago(5 * 60), now), "5m");
        assert_eq!(format_relative_time(&ago(3 * 3600), now), "3h");
        assert_eq!(format_relative_time(&ago(2 * 86_400), now), "2d");
        assert_eq!(format_relative_time(&ago(14 * 86_400), now), "2w");
        assert_eq!(format_relative_time(&ago(60 * 86_400), now), "2mo");
        assert_eq!(format_relative_time(&ago(800 * 86_400), now), "2y");
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("load_orders", 20), "load_orders");
        assert_eq!(truncate_to_width("load_orders", 5), "load…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn fit_pads_short_text() {
        assert_eq!(fit_to_width("ab", 4), "ab  ");
        assert_eq!(fit_to_width("abcdef", 4), "abc…");
    }
}
