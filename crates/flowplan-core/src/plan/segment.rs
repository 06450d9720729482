//! Free-text goal segmentation into subtask phrases.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Default upper bound on phrases per goal.
pub const DEFAULT_MAX_PHRASES: usize = 7;

/// Newlines, bullet markers and numbered-list markers. A numbered marker
/// only counts at the start of a line or right after a sentence end, so
/// "Budget is 5. Next" keeps its number.
static LIST_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:(?:^|\s)[•▪●\-–]\s+|(?:^[ \t]*|[.;!?][ \t]+)\d+[.)]\s+|\n)")
        .expect("valid list regex")
});

static CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:and then|then|next|afterwards|simultaneously|finally)\b")
        .expect("valid connector regex")
});

/// Split a goal's description and title into ordered, unique subtask phrases.
///
/// Always returns between 1 and `max_phrases` entries (3 synthesized ones
/// when the text yields nothing), unless `max_phrases` is zero.
pub fn segment(title: &str, description: &str, max_phrases: usize) -> Vec<String> {
    let raw = format!("{description}\n{title}").replace('\r', "");

    let mut phrases = dedup(
        LIST_BREAK
            .split(&raw)
            .flat_map(split_sentences)
            .map(clean)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );

    if phrases.len() == 1 {
        let by_connector = dedup(
            CONNECTOR
                .split(&phrases[0])
                .map(clean)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        if by_connector.len() > 1 {
            phrases = by_connector;
        }
    }

    if phrases.is_empty() {
        phrases = synthesized(title);
    }

    phrases.truncate(max_phrases);
    phrases
}

/// Generic phrases for a goal whose text produced none.
fn synthesized(title: &str) -> Vec<String> {
    let title = match title.trim() {
        "" => "Goal",
        t => t,
    };
    vec![
        format!("Analyze requirements for “{title}”"),
        "Execute core work".to_string(),
        "Consolidate and report".to_string(),
    ]
}

/// Split on `.`, `;`, `!` and `?`, keeping decimal points such as `2.5`.
fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    for (i, &(pos, c)) in chars.iter().enumerate() {
        let is_break = match c {
            ';' | '!' | '?' => true,
            '.' => {
                let digit_before = i > 0 && chars[i - 1].1.is_ascii_digit();
                let digit_after = chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_digit());
                !(digit_before && digit_after)
            }
            _ => false,
        };
        if is_break {
            pieces.push(&text[start..pos]);
            start = pos + c.len_utf8();
        }
    }
    pieces.push(&text[start..]);
    pieces
}

fn clean(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == ',')
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|s| seen.insert(s.clone())).collect()
}
