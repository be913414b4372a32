//! Text helpers shared by the receipt and pick-slip layouts.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Leading `$`, two decimals, no thousands separator.
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

/// Short US date in local time, e.g. `3/7/2025`.
pub fn format_short_date(value: &DateTime<Utc>) -> String {
    value.with_timezone(&Local).format("%-m/%-d/%Y").to_string()
}

pub fn format_naive_date(value: &NaiveDate) -> String {
    value.format("%-m/%-d/%Y").to_string()
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value
        .with_timezone(&Local)
        .format("%-m/%-d/%Y %-I:%M %p")
        .to_string()
}

/// Upper-case the first letter, leave the rest untouched.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn is_rush(special_instructions: Option<&str>) -> bool {
    special_instructions
        .map(|s| {
            let s = s.to_lowercase();
            s.contains("rush") || s.contains("urgent")
        })
        .unwrap_or(false)
}

pub fn requires_delivery<'a, I>(addon_names: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    addon_names
        .into_iter()
        .any(|name| name.to_lowercase().contains("delivery"))
}

/// Greedy word wrap on a character budget per line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            // hard-split words longer than a full line
            while word.chars().count() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let head: String = word.chars().take(max_chars).collect();
                word = word.chars().skip(max_chars).collect();
                lines.push(head);
            }
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Shorten `value` to at most `max_chars`, marking the cut with `...`.
pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let kept: String = value.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_has_two_decimals() {
        assert_eq!(format_currency(100.0), "$100.00");
        assert_eq!(format_currency(25.5), "$25.50");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(-4.2), "-$4.20");
    }

    #[test]
    fn test_naive_date_is_short_us_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(format_naive_date(&date), "3/7/2025");
    }

    #[test]
    fn test_timestamp_date_is_month_day_year_without_padding() {
        let value = DateTime::parse_from_rfc3339("2025-03-07T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        // local offset can move the day, never the shape
        let formatted = format_short_date(&value);
        assert!(["3/6/2025", "3/7/2025", "3/8/2025"].contains(&formatted.as_str()), "{}", formatted);
    }

    #[test]
    fn test_capitalize_only_touches_first_letter() {
        assert_eq!(capitalize("bouquet"), "Bouquet");
        assert_eq!(capitalize("mixed Variety"), "Mixed Variety");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_rush_detection_ignores_case() {
        assert!(is_rush(Some("RUSH please")));
        assert!(is_rush(Some("this is Urgent")));
        assert!(is_rush(Some("needs a rUsH")));
        assert!(!is_rush(Some("please expedite")));
        assert!(!is_rush(None));
    }

    #[test]
    fn test_delivery_detection_on_addon_names() {
        assert!(requires_delivery(["Gift Wrap", "Local Delivery"]));
        assert!(requires_delivery(["DELIVERY fee"]));
        assert!(!requires_delivery(["Gift Wrap"]));
        assert!(!requires_delivery(Vec::<&str>::new()));
    }

    #[test]
    fn test_wrap_text_respects_budget() {
        let lines = wrap_text("leave the boxes at the loading dock behind the building", 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert_eq!(lines.join(" "), "leave the boxes at the loading dock behind the building");
    }

    #[test]
    fn test_wrap_text_splits_long_words_and_keeps_paragraphs() {
        let lines = wrap_text("abcdefghij\nnext", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "next"]);
    }

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long product name", 10), "a very ...");
    }
}
