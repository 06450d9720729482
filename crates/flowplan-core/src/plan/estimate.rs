//! Hour estimates for subtask phrases.

use std::sync::LazyLock;

use regex::Regex;

/// Smallest estimate ever returned.
pub const MIN_ESTIMATE_HOURS: f64 = 0.5;

/// Longest block ever put on the grid: one whole day.
pub const MAX_SCHEDULING_HOURS: u32 = 24;

static EXPLICIT_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:h|hr|hrs|hour|hours)\b").expect("valid hours regex")
});

static EXPLICIT_MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:m|min|mins|minute|minutes)\b").expect("valid minutes regex")
});

/// Keyword categories, checked in order; the first match wins. Only the
/// listed word forms count, so "planet" or "ready" fall through.
static CATEGORIES: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    [
        (
            r"\b(?:research|researching|investigate|investigating|investigation|read|reading|design|designing|plan|plans|planning|architecture|proposal|proposals)\b",
            2.0,
        ),
        (
            r"\b(?:implement|implementing|implementation|code|coding|build|building|train|training|integrate|integrating|integration|refactor|refactoring)\b",
            2.0,
        ),
        (
            r"\b(?:write|writing|draft|drafting|report|reports|doc|docs|document|documentation|slide|slides|present|presentation)\b",
            1.5,
        ),
        (
            r"\b(?:test|tests|testing|review|reviewing|lint|linting|fix|fixes|fixing|debug|debugging)\b",
            1.0,
        ),
    ]
    .into_iter()
    .map(|(pattern, hours)| (Regex::new(pattern).expect("valid category regex"), hours))
    .collect()
});

/// Estimate the hours a phrase will take.
///
/// Explicit durations ("2.5h", "90 min") win over keyword categories;
/// anything unrecognised is one hour.
pub fn estimate(phrase: &str) -> f64 {
    let text = phrase.to_lowercase();

    if let Some(hours) = EXPLICIT_HOURS
        .captures(&text)
        .and_then(|c| c[1].parse::<f64>().ok())
    {
        return hours.max(MIN_ESTIMATE_HOURS);
    }

    if let Some(minutes) = EXPLICIT_MINUTES
        .captures(&text)
        .and_then(|c| c[1].parse::<f64>().ok())
    {
        return (minutes / 60.0).max(MIN_ESTIMATE_HOURS);
    }

    CATEGORIES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&text))
        .map(|(_, hours)| *hours)
        .unwrap_or(1.0)
}

/// Whole hours used on the calendar grid: rounded up, at least one, at
/// most [`MAX_SCHEDULING_HOURS`].
pub fn scheduling_hours(estimate: f64) -> u32 {
    if !estimate.is_finite() || estimate <= 1.0 {
        1
    } else if estimate >= f64::from(MAX_SCHEDULING_HOURS) {
        MAX_SCHEDULING_HOURS
    } else {
        estimate.ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_hours() {
        assert_eq!(estimate("Research for 2.5h"), 2.5);
        assert_eq!(estimate("deploy 3 hours"), 3.0);
        assert_eq!(estimate("tiny 0.1 hr task"), 0.5);
    }

    #[test]
    fn explicit_minutes() {
        assert_eq!(estimate("quick 90 min review"), 1.5);
        assert_eq!(estimate("stand-up 15 minutes"), 0.5);
    }

    #[test]
    fn hours_take_precedence_over_minutes() {
        assert_eq!(estimate("2h coding plus 30 min break"), 2.0);
    }

    #[test]
    fn keyword_categories() {
        assert_eq!(estimate("draft a report"), 1.5);
        assert_eq!(estimate("Research the market"), 2.0);
        assert_eq!(estimate("Implement the parser"), 2.0);
        assert_eq!(estimate("Prepare slides"), 1.5);
        assert_eq!(estimate("debug flaky login"), 1.0);
    }

    #[test]
    fn research_outranks_writing() {
        // Both categories match; the earlier one wins.
        assert_eq!(estimate("write up research notes"), 2.0);
    }

    #[test]
    fn default_is_one_hour() {
        assert_eq!(estimate(""), 1.0);
        assert_eq!(estimate("call mom"), 1.0);
    }

    #[test]
    fn minute_suffix_needs_a_word_boundary() {
        // "5 mangoes" is not a duration.
        assert_eq!(estimate("buy 5 mangoes"), 1.0);
    }

    #[test]
    fn scheduling_hours_round_up_with_floor() {
        assert_eq!(scheduling_hours(0.5), 1);
        assert_eq!(scheduling_hours(1.0), 1);
        assert_eq!(scheduling_hours(1.5), 2);
        assert_eq!(scheduling_hours(2.0), 2);
        assert_eq!(scheduling_hours(2.01), 3);
        assert_eq!(scheduling_hours(f64::NAN), 1);
    }

    #[test]
    fn scheduling_hours_are_capped_at_a_day() {
        assert_eq!(scheduling_hours(23.5), 24);
        assert_eq!(scheduling_hours(1e12), MAX_SCHEDULING_HOURS);
        assert_eq!(scheduling_hours(f64::INFINITY), 1);
        assert_eq!(scheduling_hours(estimate("Research for 99999999999h")), 24);
    }

    #[test]
    fn categories_need_whole_words() {
        assert_eq!(estimate("name the planet"), 1.0);
        assert_eq!(estimate("get ready"), 1.0);
        assert_eq!(estimate("clean the fixture"), 1.0);
        assert_eq!(estimate("buy trainers"), 1.0);
        assert_eq!(estimate("planning session"), 2.0);
        assert_eq!(estimate("fixing the sink"), 1.0);
        assert_eq!(estimate("writing the intro"), 1.5);
    }
}
