//! Text heuristics shared by scoring, synthesis and the session tracker:
//! tokenization, phrase containment and clipboard syntax detection.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Split into lower-cased alphanumeric tokens.
///
/// `#`, `+` and `-` stay inside tokens so `c#`, `c++` and `objective-c`
/// survive intact.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '#' | '+' | '-' | '\'')))
        .map(|t| t.trim_matches(|c: char| c == '-' || c == '\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokenized text prepared for repeated keyword lookups
#[derive(Debug, Clone, Default)]
pub struct TokenizedText {
    tokens: HashSet<String>,
    /// Space-joined tokens, padded so phrase matches respect word boundaries
    joined: String,
    word_count: usize,
}

impl TokenizedText {
    pub fn new(text: &str) -> Self {
        let tokens = tokenize(text);
        let joined = format!(" {} ", tokens.join(" "));
        Self {
            word_count: tokens.len(),
            tokens: tokens.into_iter().collect(),
            joined,
        }
    }

    /// Whether a keyword occurs: single words by token, multi-word keywords as a phrase
    pub fn contains(&self, keyword: &str) -> bool {
        if is_bigram(keyword) {
            let phrase = tokenize(keyword).join(" ");
            !phrase.is_empty() && self.joined.contains(&format!(" {phrase} "))
        } else if is_unsegmented(keyword) {
            self.joined.contains(keyword)
        } else {
            self.tokens.contains(keyword)
        }
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }
}

/// Multi-word keywords are treated as bigrams
/// Written without spaces between words (kana, CJK ideographs, hangul, thai).
/// Keywords in these scripts match as substrings of a token.
pub fn is_unsegmented(keyword: &str) -> bool {
    keyword.chars().any(|c| {
        matches!(c,
            '\u{3040}'..='\u{30ff}'
            | '\u{3400}'..='\u{4dbf}'
            | '\u{4e00}'..='\u{9fff}'
            | '\u{f900}'..='\u{faff}'
            | '\u{ff66}'..='\u{ff9f}'
            | '\u{0e00}'..='\u{0e7f}'
            | '\u{ac00}'..='\u{d7af}')
    })
}

pub fn is_bigram(keyword: &str) -> bool {
    keyword.split_whitespace().nth(1).is_some()
}

/// Truncate for log previews without splitting a UTF-8 character
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

// ── Clipboard syntax detection ────────────────────────────────────────────────

static RUST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfn \w+\s*[<(]|\blet mut\b|\bimpl\b[^\n]*\{|#\[derive|\w+::\w+")
        .expect("RUST_RE regex should compile")
});
static GO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*package \w+\s*$|\w+ := |\bfmt\.Print")
        .expect("GO_RE regex should compile")
});
static SWIFT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bguard let\b|\bimport (SwiftUI|UIKit|Foundation)\b|\bfunc \w+\([^)]*\)\s*(->\s*\w+\s*)?\{|@(State|Published|MainActor)\b",
    )
    .expect("SWIFT_RE regex should compile")
});
static PYTHON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(def \w+\(.*\):|class \w+(\(.*\))?:|from [\w.]+ import )|\bself\.\w+")
        .expect("PYTHON_RE regex should compile")
});
static TYPESCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":\s*(string|number|boolean)\b|\binterface \w+\s*\{|\btype \w+ = ")
        .expect("TYPESCRIPT_RE regex should compile")
});
static JAVASCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(const|let|var) \w+ = |=>|\bfunction\s*\w*\(|console\.log|require\(")
        .expect("JAVASCRIPT_RE regex should compile")
});
static HTML_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(html|div|span|body|head|p|a|ul|li|section|button)\b[^>]*>|</\w+>")
        .expect("HTML_RE regex should compile")
});
static JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*[\{\[]\s*"[^"]*"\s*:"#).expect("JSON_RE regex should compile")
});
static SQL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bselect\b.+\bfrom\b|\binsert into\b|\bcreate table\b|\bupdate \w+ set\b")
        .expect("SQL_RE regex should compile")
});
static SHELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(#!/bin/(ba|z)?sh|\$ \w+|sudo |export \w+=)|\|\s*(grep|awk|sed)\b")
        .expect("SHELL_RE regex should compile")
});

/// Recognizable code or markup syntax found in clipboard text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxKind {
    Rust,
    Go,
    Swift,
    Python,
    TypeScript,
    JavaScript,
    Html,
    Json,
    Sql,
    Shell,
}

impl SyntaxKind {
    /// Detect the dominant syntax. Checks run most-distinctive first.
    pub fn detect(text: &str) -> Option<Self> {
        let checks: [(&LazyLock<Regex>, SyntaxKind); 10] = [
            (&JSON_RE, Self::Json),
            (&HTML_RE, Self::Html),
            (&RUST_RE, Self::Rust),
            (&GO_RE, Self::Go),
            (&SWIFT_RE, Self::Swift),
            (&PYTHON_RE, Self::Python),
            (&TYPESCRIPT_RE, Self::TypeScript),
            (&SQL_RE, Self::Sql),
            (&JAVASCRIPT_RE, Self::JavaScript),
            (&SHELL_RE, Self::Shell),
        ];
        if text.trim().is_empty() {
            return None;
        }
        checks
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, kind)| *kind)
    }

    /// Species segment for the language this syntax belongs to, if any
    pub fn language_tag(&self) -> Option<&'static str> {
        match self {
            Self::Rust => Some("rust"),
            Self::Go => Some("go"),
            Self::Swift => Some("swift"),
            Self::Python => Some("python"),
            Self::TypeScript => Some("typescript"),
            Self::JavaScript => Some("javascript"),
            Self::Html => Some("html"),
            Self::Sql => Some("sql"),
            Self::Shell => Some("shell"),
            Self::Json => None,
        }
    }

    /// Markup/data formats rather than programming languages
    pub fn is_markup(&self) -> bool {
        matches!(self, Self::Html | Self::Json)
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Rust => "Rust",
            Self::Go => "Go",
            Self::Swift => "Swift",
            Self::Python => "Python",
            Self::TypeScript => "TypeScript",
            Self::JavaScript => "JavaScript",
            Self::Html => "HTML",
            Self::Json => "JSON",
            Self::Sql => "SQL",
            Self::Shell => "shell",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keeps_language_names() {
        assert_eq!(tokenize("C# vs C++, and Objective-C!"), vec!["c#", "vs", "c++", "and", "objective-c"]);
        assert_eq!(tokenize("  "), Vec::<String>::new());
        assert_eq!(tokenize("¿Cómo arreglar?"), vec!["cómo", "arreglar"]);
    }

    #[test]
    fn test_phrase_respects_word_boundaries() {
        let text = TokenizedText::new("I have a memory leak in prod");
        assert!(text.contains("memory leak"));
        assert!(text.contains("leak"));
        assert!(!text.contains("emory leak"));
        assert!(!text.contains("go"));
        assert_eq!(text.word_count(), 7);
    }

    #[test]
    fn test_unsegmented_keywords_match_inside_tokens() {
        let text = TokenizedText::new("日本語で説明して。ありがとう");
        assert!(text.contains("日本語"));
        assert!(text.contains("ありがとう"));
        assert!(!text.contains("こんにちは"));
        assert!(!is_unsegmented("rust"));

        // Latin keywords still need a whole token
        assert!(!TokenizedText::new("rustacean").contains("rust"));
    }

    #[test]
    fn test_detect_common_syntax() {
        assert_eq!(SyntaxKind::detect("fn main() { let mut x = 1; }"), Some(SyntaxKind::Rust));
        assert_eq!(
            SyntaxKind::detect("guard let user = user else { return }"),
            Some(SyntaxKind::Swift)
        );
        assert_eq!(
            SyntaxKind::detect("def handler(event):\n    return self.x"),
            Some(SyntaxKind::Python)
        );
        assert_eq!(SyntaxKind::detect("<div class=\"a\">hi</div>"), Some(SyntaxKind::Html));
        assert_eq!(SyntaxKind::detect("{\"name\": \"x\"}"), Some(SyntaxKind::Json));
        assert_eq!(SyntaxKind::detect("SELECT id FROM users"), Some(SyntaxKind::Sql));
        assert_eq!(SyntaxKind::detect("const f = (a) => a + 1"), Some(SyntaxKind::JavaScript));
        assert_eq!(SyntaxKind::detect("just a grocery list"), None);
        assert_eq!(SyntaxKind::detect(""), None);
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("short", 10), "short");
    }
}
