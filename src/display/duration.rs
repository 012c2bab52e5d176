//! Relative-time phrases and age-based color classes
//!
//! Both ladders split a span into whole days plus a sub-day remainder and walk
//! an ordered rule table top-down, returning on the first match.

use chrono::TimeDelta;

const SECONDS_PER_DAY: i64 = 86_400;

/// Wording used around the quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeMode {
    /// "3 days ago"
    Past,
    /// "in 3 days"
    Expiry,
}

/// A span split into whole days and the remaining seconds of the last day.
///
/// Negative spans are clamped to zero before splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpanParts {
    days: i64,
    seconds: i64,
}

impl SpanParts {
    fn from_delta(delta: TimeDelta) -> Self {
        let total = delta.num_seconds().max(0);
        Self {
            days: total / SECONDS_PER_DAY,
            seconds: total % SECONDS_PER_DAY,
        }
    }

    fn hours(&self) -> i64 {
        self.days * 24 + self.seconds / 3600
    }

    fn minutes(&self) -> i64 {
        (self.seconds % 3600) / 60
    }

    fn secs(&self) -> i64 {
        self.seconds % 60
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Day,
    Hour,
    Minute,
    Second,
}

impl Unit {
    fn word(self, count: i64) -> &'static str {
        match (self, count == 1) {
            (Unit::Day, true) => "day",
            (Unit::Day, false) => "days",
            (Unit::Hour, true) => "hour",
            (Unit::Hour, false) => "hours",
            (Unit::Minute, true) => "minute",
            (Unit::Minute, false) => "minutes",
            (Unit::Second, true) => "second",
            (Unit::Second, false) => "seconds",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phrase {
    OverTwoYears,
    OverOneYear,
    Count(i64, Unit),
}

impl Phrase {
    fn render(self, mode: RelativeMode) -> String {
        match (self, mode) {
            (Phrase::OverTwoYears, RelativeMode::Past) => "over two years ago".to_string(),
            (Phrase::OverTwoYears, RelativeMode::Expiry) => "in greater than two years".to_string(),
            (Phrase::OverOneYear, RelativeMode::Past) => "over a year ago".to_string(),
            (Phrase::OverOneYear, RelativeMode::Expiry) => "in greater than a year".to_string(),
            (Phrase::Count(n, unit), RelativeMode::Past) => format!("{} {} ago", n, unit.word(n)),
            (Phrase::Count(n, unit), RelativeMode::Expiry) => format!("in {} {}", n, unit.word(n)),
        }
    }
}

struct PhraseRule {
    applies: fn(&SpanParts) -> bool,
    phrase: fn(&SpanParts) -> Phrase,
}

const PHRASE_RULES: &[PhraseRule] = &[
    PhraseRule {
        applies: |p| p.days > 730,
        phrase: |_| Phrase::OverTwoYears,
    },
    PhraseRule {
        applies: |p| p.days > 365,
        phrase: |_| Phrase::OverOneYear,
    },
    PhraseRule {
        applies: |p| p.days > 0,
        phrase: |p| Phrase::Count(p.days, Unit::Day),
    },
    PhraseRule {
        applies: |p| p.hours() > 0,
        phrase: |p| Phrase::Count(p.hours(), Unit::Hour),
    },
    PhraseRule {
        applies: |p| p.minutes() > 0,
        phrase: |p| Phrase::Count(p.minutes(), Unit::Minute),
    },
];

/// Render a span as a relative-time phrase
pub fn format_relative(delta: TimeDelta, mode: RelativeMode) -> String {
    let parts = SpanParts::from_delta(delta);
    PHRASE_RULES
        .iter()
        .find(|rule| (rule.applies)(&parts))
        .map(|rule| (rule.phrase)(&parts))
        .unwrap_or(Phrase::Count(parts.secs(), Unit::Second))
        .render(mode)
}

// --- Age color ladder ---

const COLOR_RULES: &[(fn(&SpanParts) -> bool, &str)] = &[
    (|p| p.days > 30, "grey-text"),
    (|p| p.days > 14, "red-text text-darken-2"),
    (|p| p.days > 5, "deep-orange-text text-lighten-1"),
    (|p| p.days > 1, "deep-orange-text text-lighten-1"),
    (|p| p.hours() > 12, "orange-text"),
    (|p| p.hours() > 1, "orange-text text-lighten-2"),
    (|p| p.hours() == 1, "yellow-text"),
    (|p| p.minutes() > 15, "yellow-text text-lighten-2"),
    (|p| p.minutes() > 5, "green-text text-lighten-3"),
    (|p| p.secs() > 30, "green-text text-lighten-2"),
];

const FRESH_COLOR: &str = "green-text";

/// Text color class for "last seen" style ages: green when fresh, fading to
/// grey after a month.
pub fn duration_color(delta: TimeDelta) -> &'static str {
    let parts = SpanParts::from_delta(delta);
    COLOR_RULES
        .iter()
        .find(|(applies, _)| applies(&parts))
        .map(|(_, token)| *token)
        .unwrap_or(FRESH_COLOR)
}
