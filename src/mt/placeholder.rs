//! Placeholder masking for machine translation
//!
//! Interpolation tokens must reach the translated text untouched. Before a
//! string is sent to a backend every token is replaced by a marker that
//! translation systems leave alone, and the markers are swapped back
//! afterwards.
//!
//! Two token grammars are recognized:
//!
//! - i18next interpolation: `{{name}}`, `{{count, number}}`, `{{- html}}`
//! - ICU MessageFormat arguments: `{name}`, `{count, plural, one {# item} other {# items}}`
//!
//! Markers look like `⟦0⟧`, `⟦1⟧`, ... where the number is the index of the
//! placeholder in extraction order.
//!
//! # Example
//!
//! ```ignore
//! Source:      "{{user}} sent you {count, plural, one {a file} other {# files}}"
//! Masked:      "⟦0⟧ sent you ⟦1⟧"
//! Translated:  "⟦0⟧ vous a envoyé ⟦1⟧"
//! Unmasked:    "{{user}} vous a envoyé {count, plural, one {a file} other {# files}}"
//! ```

use regex::Regex;
use std::sync::LazyLock;

const MARKER_OPEN: char = '⟦';
const MARKER_CLOSE: char = '⟧';

static DOUBLE_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{[^{}]+\}\}").expect("valid interpolation regex"));

static ICU_ARGUMENT_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{\s*[A-Za-z_][A-Za-z0-9_.\-]*\s*[,}]").expect("valid ICU argument regex")
});

/// One extracted token and the marker standing in for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub marker: String,
    pub original: String,
}

/// Result of masking a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedText {
    pub text: String,
    pub placeholders: Vec<Placeholder>,
}

/// Result of restoring markers in a (translated) string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmaskedText {
    pub text: String,
    /// Indices of placeholders whose marker never appeared
    pub missing: Vec<usize>,
    /// Indices of placeholders whose marker appeared more than once
    pub duplicated: Vec<usize>,
}

impl UnmaskedText {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.duplicated.is_empty()
    }
}

/// Find the byte length of the token starting at the beginning of `rest`
fn token_length(rest: &str) -> Option<usize> {
    if let Some(m) = DOUBLE_BRACE.find(rest) {
        return Some(m.end());
    }
    if !ICU_ARGUMENT_HEAD.is_match(rest) {
        return None;
    }

    let mut depth = 0usize;
    for (offset, c) in rest.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Longest run of the opening sentinel already present in the text
fn longest_open_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == MARKER_OPEN {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn make_marker(open: &str, index: usize) -> String {
    format!("{}{}{}", open, index, MARKER_CLOSE)
}

/// Replace interpolation tokens with translation-stable markers
///
/// Tokens are taken left to right; a token that repeats gets one entry per
/// occurrence. Text without tokens masks to itself.
pub fn mask(text: &str) -> MaskedText {
    let open = MARKER_OPEN.to_string().repeat(longest_open_run(text) + 1);
    let mut masked = String::with_capacity(text.len());
    let mut placeholders = Vec::new();

    let mut position = 0;
    while position < text.len() {
        let rest = &text[position..];
        if rest.starts_with('{') {
            if let Some(length) = token_length(rest) {
                let marker = make_marker(&open, placeholders.len());
                masked.push_str(&marker);
                placeholders.push(Placeholder {
                    marker,
                    original: rest[..length].to_string(),
                });
                position += length;
                continue;
            }
        }
        // Step over one full character
        let c = rest.chars().next().unwrap_or_default();
        masked.push(c);
        position += c.len_utf8().max(1);
    }

    MaskedText {
        text: masked,
        placeholders,
    }
}

/// Restore markers to their original tokens
///
/// Markers are resolved by their index. Marker-shaped text whose index or
/// exact form does not belong to `placeholders` is left as it is.
pub fn unmask(masked_text: &str, placeholders: &[Placeholder]) -> UnmaskedText {
    if placeholders.is_empty() {
        return UnmaskedText {
            text: masked_text.to_string(),
            missing: Vec::new(),
            duplicated: Vec::new(),
        };
    }

    let open_width = placeholders[0]
        .marker
        .chars()
        .take_while(|c| *c == MARKER_OPEN)
        .count();
    let pattern = format!(
        "{}([0-9]+){}",
        regex::escape(&MARKER_OPEN.to_string().repeat(open_width)),
        regex::escape(&MARKER_CLOSE.to_string())
    );
    let marker_regex = match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(_) => {
            return UnmaskedText {
                text: masked_text.to_string(),
                missing: (0..placeholders.len()).collect(),
                duplicated: Vec::new(),
            };
        }
    };

    let mut seen = vec![0usize; placeholders.len()];
    let mut restored = String::with_capacity(masked_text.len());
    let mut last = 0;

    for captures in marker_regex.captures_iter(masked_text) {
        let (Some(whole), Some(digits)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let Some(index) = digits.as_str().parse::<usize>().ok() else {
            continue;
        };
        let Some(placeholder) = placeholders.get(index) else {
            continue;
        };
        if placeholder.marker != whole.as_str() {
            continue;
        }

        restored.push_str(&masked_text[last..whole.start()]);
        restored.push_str(&placeholder.original);
        last = whole.end();
        seen[index] += 1;
    }
    restored.push_str(&masked_text[last..]);

    let missing = (0..placeholders.len()).filter(|&i| seen[i] == 0).collect();
    let duplicated = (0..placeholders.len()).filter(|&i| seen[i] > 1).collect();

    UnmaskedText {
        text: restored,
        missing,
        duplicated,
    }
}
