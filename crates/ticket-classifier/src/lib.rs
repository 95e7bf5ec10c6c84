//! Pure, synchronous ticket classification.
//!
//! [`classify`] derives urgency, sentiment and actionability from a ticket's
//! subject and message using fixed keyword sets. Matching is substring
//! containment, not word-boundary matching — `"broken"` inside
//! `"heartbroken"` counts. This is deliberate, not an oversight.
//!
//! ```
//! use ticket_classifier::classify;
//! use ticket_core::{Sentiment, Urgency};
//!
//! let result = classify("Urgent: refund", "legal action");
//! assert_eq!(result.urgency, Urgency::High);
//! assert_eq!(result.sentiment, Sentiment::Neutral);
//! assert!(result.requires_action);
//! ```

use ticket_core::{Classification, Sentiment, Urgency};

const HIGH_URGENCY: &[&str] = &[
    "urgent",
    "critical",
    "emergency",
    "asap",
    "immediately",
    "lawsuit",
    "legal",
    "lawyer",
    "attorney",
    "court",
    "refund",
    "chargeback",
    "fraud",
    "security breach",
    "data breach",
    "gdpr",
    "compliance",
    "violation",
    "outage",
    "down",
    "not working",
    "broken",
    "crashed",
];

const MEDIUM_URGENCY: &[&str] = &[
    "issue",
    "problem",
    "error",
    "bug",
    "concern",
    "complaint",
    "unhappy",
    "dissatisfied",
    "disappointed",
];

const NEGATIVE_SENTIMENT: &[&str] = &[
    "angry",
    "frustrated",
    "terrible",
    "awful",
    "horrible",
    "worst",
    "hate",
    "useless",
    "broken",
    "disappointed",
    "unacceptable",
    "poor",
    "bad",
    "annoyed",
    "upset",
];

const POSITIVE_SENTIMENT: &[&str] = &[
    "thank",
    "thanks",
    "appreciate",
    "great",
    "excellent",
    "good",
    "happy",
    "satisfied",
    "wonderful",
    "love",
];

const REQUIRES_ACTION: &[&str] = &[
    "refund",
    "cancel",
    "delete",
    "remove",
    "fix",
    "help",
    "urgent",
    "asap",
    "immediately",
    "lawsuit",
    "legal",
    "gdpr",
    "compliance",
    "broken",
    "not working",
    "error",
    "issue",
];

fn any_match(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Classify a ticket from its subject and message. Concatenates
/// `"{subject} {message}"` lowercased, then evaluates urgency, sentiment
/// (negative checked before positive) and actionability independently.
pub fn classify(subject: &str, message: &str) -> Classification {
    let text = format!("{subject} {message}").to_lowercase();

    let urgency = if any_match(&text, HIGH_URGENCY) {
        Urgency::High
    } else if any_match(&text, MEDIUM_URGENCY) {
        Urgency::Medium
    } else {
        Urgency::Low
    };

    let sentiment = if any_match(&text, NEGATIVE_SENTIMENT) {
        Sentiment::Negative
    } else if any_match(&text, POSITIVE_SENTIMENT) {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    };

    let requires_action = any_match(&text, REQUIRES_ACTION);

    Classification {
        urgency,
        sentiment,
        requires_action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgent_refund_is_high_neutral_actionable() {
        let c = classify("Urgent: refund", "legal action");
        assert_eq!(c.urgency, Urgency::High);
        assert_eq!(c.sentiment, Sentiment::Neutral);
        assert!(c.requires_action);
    }

    #[test]
    fn thanks_great_service_is_low_positive_not_actionable() {
        let c = classify("Thanks", "great service");
        assert_eq!(c.urgency, Urgency::Low);
        assert_eq!(c.sentiment, Sentiment::Positive);
        assert!(!c.requires_action);
    }

    #[test]
    fn broken_disappointed_prefers_negative_over_positive() {
        // "broken" -> high urgency; "disappointed" matches negative, which
        // is checked before positive, so sentiment is negative even though
        // neither set is exclusive of the other here.
        let c = classify("Broken", "disappointed");
        assert_eq!(c.urgency, Urgency::High);
        assert_eq!(c.sentiment, Sentiment::Negative);
        assert!(c.requires_action);
    }

    #[test]
    fn substring_matching_is_not_word_boundary_aware() {
        // "broken" inside "heartbroken" still counts. Part of the contract,
        // not a bug to fix.
        let c = classify("heartbroken", "nothing else");
        assert_eq!(c.urgency, Urgency::High);
    }

    #[test]
    fn empty_input_is_low_neutral_not_actionable() {
        let c = classify("", "");
        assert_eq!(c.urgency, Urgency::Low);
        assert_eq!(c.sentiment, Sentiment::Neutral);
        assert!(!c.requires_action);
    }

    proptest::proptest! {
        #[test]
        fn classify_never_panics(subject in ".*", message in ".*") {
            let _ = classify(&subject, &message);
        }
    }
}
