//! Bilingual temporal-expression parsing for trial durations.
//!
//! Handles explicit day counts ("14 days", "30-day", "7天"), month counts
//! converted at 30 days/month ("3 months", "2个月"), and Chinese numeral
//! words combined with a month unit ("三个月").

use once_cell::sync::Lazy;
use regex::Regex;

/// Days used when converting month-denominated durations
pub const DAYS_PER_MONTH: u32 = 30;

/// Keywords that indicate trial intent (English + Chinese)
pub const TRIAL_KEYWORDS: &[&str] = &["free", "trial", "试用", "免费", "体验"];

// Explicit day counts: "14 days", "30-day", "7天"
static DAYS_EN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*-?\s*days?\b").expect("Invalid day count regex"));
static DAYS_ZH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*天").expect("Invalid day count regex"));

// Month counts: "3 months", "1-month", "2个月", "三个月"
static MONTHS_EN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*-?\s*months?\b").expect("Invalid month count regex"));
static MONTHS_ZH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9一二两三四五六七八九十]+)\s*个月").expect("Invalid month count regex")
});

/// Byte window checked around a duration expression for trial keywords
const CONTEXT_PAD: usize = 12;

/// One duration expression found in the text
#[derive(Debug, Clone, Copy)]
struct DurationHit {
    days: u32,
    start: usize,
    end: usize,
}

/// Map a Chinese numeral word (一 through 十, plus 两) to its value
fn chinese_numeral(word: &str) -> Option<u32> {
    match word {
        "一" => Some(1),
        "二" | "两" => Some(2),
        "三" => Some(3),
        "四" => Some(4),
        "五" => Some(5),
        "六" => Some(6),
        "七" => Some(7),
        "八" => Some(8),
        "九" => Some(9),
        "十" => Some(10),
        _ => word.parse().ok(),
    }
}

/// Collect every duration expression in the text, in text order
fn scan_durations(text: &str) -> Vec<DurationHit> {
    let mut hits = Vec::new();

    for caps in DAYS_EN_RE.captures_iter(text).chain(DAYS_ZH_RE.captures_iter(text)) {
        if let Ok(days) = caps[1].parse() {
            let m = caps.get(0).expect("capture 0 always present");
            hits.push(DurationHit {
                days,
                start: m.start(),
                end: m.end(),
            });
        }
    }

    for caps in MONTHS_EN_RE.captures_iter(text) {
        if let Ok(months) = caps[1].parse::<u32>() {
            let m = caps.get(0).expect("capture 0 always present");
            hits.push(DurationHit {
                days: months * DAYS_PER_MONTH,
                start: m.start(),
                end: m.end(),
            });
        }
    }

    for caps in MONTHS_ZH_RE.captures_iter(text) {
        if let Some(months) = chinese_numeral(&caps[1]) {
            let m = caps.get(0).expect("capture 0 always present");
            hits.push(DurationHit {
                days: months * DAYS_PER_MONTH,
                start: m.start(),
                end: m.end(),
            });
        }
    }

    hits.sort_by_key(|h| h.start);
    hits
}

/// Slice a byte window around a match, snapped to char boundaries
fn context_window(text: &str, start: usize, end: usize) -> &str {
    let mut s = start.saturating_sub(CONTEXT_PAD);
    while !text.is_char_boundary(s) {
        s -= 1;
    }
    let mut e = (end + CONTEXT_PAD).min(text.len());
    while !text.is_char_boundary(e) {
        e += 1;
    }
    &text[s..e]
}

/// Whether a trial keyword appears next to this expression
fn has_trial_context(text: &str, hit: &DurationHit) -> bool {
    let window = context_window(text, hit.start, hit.end).to_lowercase();
    TRIAL_KEYWORDS.iter().any(|k| window.contains(k))
}

/// Whether the text expresses trial intent at all
pub fn has_trial_intent(text: &str) -> bool {
    let lower = text.to_lowercase();
    TRIAL_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Extract the trial duration in days from free text.
///
/// When several duration expressions occur, the one adjacent to a trial
/// keyword wins ("一个月6.99 前三个月免费" resolves to 90, not 30); with no
/// adjacent expression the first one found is used. Returns `None` when the
/// text carries no duration expression at all.
pub fn parse_trial_days(text: &str) -> Option<u32> {
    let hits = scan_durations(text);
    hits.iter()
        .find(|h| has_trial_context(text, h))
        .or_else(|| hits.first())
        .map(|h| h.days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_day_counts() {
        assert_eq!(parse_trial_days("14 days free"), Some(14));
        assert_eq!(parse_trial_days("30-day trial"), Some(30));
        assert_eq!(parse_trial_days("free for 7 days"), Some(7));
    }

    #[test]
    fn test_chinese_day_counts() {
        assert_eq!(parse_trial_days("免费试用30天"), Some(30));
        assert_eq!(parse_trial_days("前7天免费"), Some(7));
    }

    #[test]
    fn test_month_counts_convert_at_thirty() {
        assert_eq!(parse_trial_days("3 months free"), Some(90));
        assert_eq!(parse_trial_days("1-month trial"), Some(30));
        assert_eq!(parse_trial_days("2个月免费"), Some(60));
    }

    #[test]
    fn test_chinese_numeral_months() {
        assert_eq!(parse_trial_days("一个月免费"), Some(30));
        assert_eq!(parse_trial_days("两个月试用"), Some(60));
        assert_eq!(parse_trial_days("三个月免费"), Some(90));
        assert_eq!(parse_trial_days("十个月免费"), Some(300));
    }

    #[test]
    fn test_trial_adjacency_wins_over_first_match() {
        // "一个月" belongs to the price phrase; "三个月" carries the trial
        let text = "添加amazon prime 服务 一个月6.99 前三个月免费";
        assert_eq!(parse_trial_days(text), Some(90));
    }

    #[test]
    fn test_first_match_without_context() {
        assert_eq!(parse_trial_days("2 months then 12 months"), Some(60));
    }

    #[test]
    fn test_no_duration() {
        assert_eq!(parse_trial_days("just a free trial"), None);
    }

    #[test]
    fn test_trial_intent() {
        assert!(has_trial_intent("Start your FREE trial"));
        assert!(has_trial_intent("前三个月免费"));
        assert!(!has_trial_intent("$9.99 per month"));
    }
}
