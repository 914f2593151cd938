//! Response synthesis
//!
//! Builds deterministic response text for a surviving candidate from the
//! keywords it matched, a coarse query intent class, and an optional note
//! about recognizable code or markup on the clipboard. Every path produces
//! non-empty text.

use serde::{Deserialize, Serialize};

use crate::catalog::{DomainFamily, SpecialistTemplate};
use crate::session::{IntentSignal, SessionView};
use crate::snapshot::ContextSnapshot;
use crate::text::{SyntaxKind, TokenizedText};

/// Coarse shape of what the query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntentClass {
    HowTo,
    Debugging,
    Comparison,
    Optimization,
    General,
}

const DEBUGGING_TERMS: &[&str] = &[
    "bug", "error", "fix", "crash", "crashed", "broken", "failing", "exception", "panic",
    "fallo", "arreglar",
];
const COMPARISON_TERMS: &[&str] = &["vs", "versus", "compare", "difference", "better", "or", "comparar"];
const OPTIMIZATION_TERMS: &[&str] = &[
    "slow", "fast", "faster", "optimize", "performance", "perf", "speed", "memory", "lento",
    "optimizar",
];
const HOW_TO_TERMS: &[&str] = &["how", "how to", "guide", "steps", "tutorial", "cómo", "como"];

impl QueryIntentClass {
    /// Classify by the first matching term family, most specific first
    pub fn classify(query: &str) -> Self {
        let text = TokenizedText::new(query);
        let any = |terms: &[&str]| terms.iter().any(|t| text.contains(t));
        if any(DEBUGGING_TERMS) {
            Self::Debugging
        } else if any(OPTIMIZATION_TERMS) {
            Self::Optimization
        } else if any(COMPARISON_TERMS) && text.word_count() > 2 {
            Self::Comparison
        } else if any(HOW_TO_TERMS) {
            Self::HowTo
        } else {
            Self::General
        }
    }

    fn approach(&self) -> &'static str {
        match self {
            Self::HowTo => "Here is a step-by-step path",
            Self::Debugging => "Start by isolating the failure",
            Self::Comparison => "Weigh the options side by side",
            Self::Optimization => "Measure before changing anything",
            Self::General => "Here is an overview",
        }
    }
}

impl std::fmt::Display for QueryIntentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::HowTo => "how-to",
            Self::Debugging => "debugging",
            Self::Comparison => "comparison",
            Self::Optimization => "optimization",
            Self::General => "general",
        };
        f.write_str(name)
    }
}

/// Compose the response text for one candidate.
///
/// Reads only its inputs; safe to call from worker threads.
pub fn compose(
    template: &SpecialistTemplate,
    matched_keywords: &[String],
    query: &str,
    snapshot: &ContextSnapshot,
    session: &SessionView,
) -> String {
    let intent = QueryIntentClass::classify(query);
    let topic = topic_summary(template, matched_keywords);

    let mut out = format!("[{}] ", template.label);
    out.push_str(&family_body(template, intent, &topic));

    if let Some(note) = clipboard_note(template, snapshot) {
        out.push(' ');
        out.push_str(&note);
    }
    if let Some(hint) = session_hint(template, session) {
        out.push(' ');
        out.push_str(hint);
    }
    out
}

fn topic_summary(template: &SpecialistTemplate, matched: &[String]) -> String {
    match matched {
        [] => template.domain.clone(),
        [one] => one.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

fn family_body(template: &SpecialistTemplate, intent: QueryIntentClass, topic: &str) -> String {
    let approach = intent.approach();
    match (template.family(), intent) {
        (DomainFamily::Language, QueryIntentClass::Debugging) => format!(
            "{approach}: reproduce the {topic} issue with the smallest input, read the first error \
             rather than the last, then bisect recent changes in {}.",
            template.domain
        ),
        (DomainFamily::Language, QueryIntentClass::Optimization) => format!(
            "{approach}: profile the {topic} hot path in {}, check allocations and I/O, then fix \
             the single largest cost.",
            template.domain
        ),
        (DomainFamily::Language, _) => format!(
            "{approach} of {topic} in {}: sketch the types first, keep functions small, and add a \
             test for each edge case.",
            template.domain
        ),
        (DomainFamily::Creative, _) => format!(
            "{approach} for {topic}: pick one clear image or idea, draft quickly, then cut \
             everything that does not serve it."
        ),
        (DomainFamily::Infrastructure, QueryIntentClass::Debugging) => format!(
            "{approach}: check the {topic} logs and recent deploys, confirm configuration, then \
             roll back if the cause is unclear."
        ),
        (DomainFamily::Infrastructure, _) => format!(
            "{approach} for {topic}: describe the desired state declaratively, automate it, and \
             keep a rollback path."
        ),
        (DomainFamily::Research, _) => format!(
            "{approach} of {topic}: start from a survey source, note the key claims, then check \
             them against primary material."
        ),
        (DomainFamily::Business, _) => format!(
            "{approach} for {topic}: state the goal in one number, list the constraints, and \
             choose the option with the clearest payoff."
        ),
        (DomainFamily::Wellbeing, _) => format!(
            "{approach} around {topic}: take one small step now, keep it gentle, and notice how \
             it feels."
        ),
        (DomainFamily::Localized, _) => format!(
            "{approach} ({}) on {topic}: answer in the user's language and keep regional \
             conventions.",
            template.domain
        ),
        (DomainFamily::General, _) => format!("{approach} of {topic}."),
    }
}

fn clipboard_note(template: &SpecialistTemplate, snapshot: &ContextSnapshot) -> Option<String> {
    let kind = SyntaxKind::detect(snapshot.clipboard_text()?)?;
    let matches_specialty = kind
        .language_tag()
        .is_some_and(|tag| template.segments().any(|s| s == tag));

    let note = if kind.is_markup() {
        format!("(Clipboard holds {kind} markup; validate its structure first.)")
    } else if matches_specialty {
        format!("(Your clipboard {kind} snippet is in scope; start there.)")
    } else {
        format!("(Clipboard contains {kind} code.)")
    };
    Some(note)
}

fn session_hint(template: &SpecialistTemplate, session: &SessionView) -> Option<&'static str> {
    if session.in_momentum(&template.species) {
        return Some("Continuing from earlier in this session.");
    }
    match (session.intent, template.family()) {
        (IntentSignal::Resting, DomainFamily::Wellbeing) => Some("Take it slowly."),
        (IntentSignal::Shipping, DomainFamily::Infrastructure) => {
            Some("Ship behind a flag if you can.")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SpecialistCatalog;

    #[test]
    fn test_classify_intent_class() {
        assert_eq!(QueryIntentClass::classify("fix this bug"), QueryIntentClass::Debugging);
        assert_eq!(QueryIntentClass::classify("my loop is slow"), QueryIntentClass::Optimization);
        assert_eq!(
            QueryIntentClass::classify("rust vs go for servers"),
            QueryIntentClass::Comparison
        );
        assert_eq!(QueryIntentClass::classify("how to center a div"), QueryIntentClass::HowTo);
        assert_eq!(QueryIntentClass::classify("tell me about tides"), QueryIntentClass::General);
        assert_eq!(QueryIntentClass::classify(""), QueryIntentClass::General);
    }

    #[test]
    fn test_compose_mentions_label_and_topic() {
        let t = SpecialistTemplate::new("code.swift.debug", "Swift Debugging", "swift", &["swift", "bug"]);
        let text = compose(
            &t,
            &["swift".to_string(), "bug".to_string()],
            "fix this bug in my swift code",
            &ContextSnapshot::default(),
            &SessionView::default(),
        );
        assert!(text.starts_with("[Swift Debugging]"));
        assert!(text.contains("swift and bug"));
        assert!(text.contains("isolating the failure"));
    }

    #[test]
    fn test_clipboard_note_matches_specialty() {
        let t = SpecialistTemplate::new("code.rust", "Rust", "rust", &["rust"]);
        let snap = ContextSnapshot::default().with_clipboard("fn main() { let mut x = 1; }");
        let text = compose(&t, &[], "help", &snap, &SessionView::default());
        assert!(text.contains("Rust snippet is in scope"), "{text}");

        let other = SpecialistTemplate::new("code.go", "Go", "go", &["go"]);
        let text = compose(&other, &[], "help", &snap, &SessionView::default());
        assert!(text.contains("Clipboard contains Rust code"), "{text}");
    }

    #[test]
    fn test_compose_is_total_across_catalog() {
        let catalog = SpecialistCatalog::standard();
        let snap = ContextSnapshot::default().with_clipboard("<div>hi</div>");
        let view = SessionView {
            intent: IntentSignal::Resting,
            ..SessionView::default()
        };
        for q in ["", "how to deploy", "compare a vs b please", "it crashed"] {
            for t in catalog.all() {
                let text = compose(t, &[], q, &snap, &view);
                assert!(text.len() > t.label.len() + 3, "{}: {text}", t.species);
            }
        }
    }
}
