//! Query policy: decides whether a question may be answered at all.

use cropwise_core::config::{default_advisory_message, default_restricted_terms, PolicyConfig};
use serde::{Deserialize, Serialize};

/// Outcome of classifying a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Allowed,
    Restricted,
}

/// Gate run before retrieval and completion.
pub trait QueryPolicy: Send + Sync {
    fn classify(&self, query: &str) -> Classification;

    /// Message returned in place of an answer for restricted questions.
    fn advisory_message(&self) -> &str;
}

/// Restricts any question whose lowercased text contains a denylisted term.
///
/// Matching is plain substring search, not tokenised: "fertilizers" and
/// "biofertilizer" both match "fertilizer".
#[derive(Debug, Clone)]
pub struct DenylistPolicy {
    terms: Vec<String>,
    advisory: String,
}

impl DenylistPolicy {
    pub fn new(terms: Vec<String>, advisory: impl Into<String>) -> Self {
        let terms = terms
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            terms,
            advisory: advisory.into(),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(
            config.restricted_terms.clone(),
            config.advisory_message.clone(),
        )
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl Default for DenylistPolicy {
    fn default() -> Self {
        Self::new(default_restricted_terms(), default_advisory_message())
    }
}

impl QueryPolicy for DenylistPolicy {
    fn classify(&self, query: &str) -> Classification {
        let lower = query.to_lowercase();
        match self.terms.iter().find(|term| lower.contains(term.as_str())) {
            Some(term) => {
                tracing::debug!("Query restricted by term '{}'", term);
                Classification::Restricted
            }
            None => Classification::Allowed,
        }
    }

    fn advisory_message(&self) -> &str {
        &self.advisory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_examples() {
        let policy = DenylistPolicy::default();
        assert_eq!(
            policy.classify("What fertilizer amount should I use?"),
            Classification::Restricted
        );
        assert_eq!(
            policy.classify("What is the grain filling stage?"),
            Classification::Allowed
        );
    }

    #[test]
    fn test_every_default_term_restricts() {
        let policy = DenylistPolicy::default();
        for query in [
            "Tell me the CHEMICAL DOSAGE for wheat",
            "pesticide amount per acre",
            "give me a yield prediction",
            "How much urea for rice?",
            "profit estimate for maize",
        ] {
            assert_eq!(policy.classify(query), Classification::Restricted, "{}", query);
        }
    }

    #[test]
    fn test_substring_false_positive_accepted() {
        let policy = DenylistPolicy::default();
        assert_eq!(
            policy.classify("History of biofertilizers"),
            Classification::Restricted
        );
    }

    #[test]
    fn test_custom_terms_normalised() {
        let policy = DenylistPolicy::new(
            vec!["  Seed Price ".to_string(), "".to_string()],
            "Educational only.",
        );
        assert_eq!(policy.terms(), &["seed price".to_string()]);
        assert_eq!(
            policy.classify("what is the seed price today"),
            Classification::Restricted
        );
        assert_eq!(
            policy.classify("how much fertilizer?"),
            Classification::Allowed
        );
        assert_eq!(policy.advisory_message(), "Educational only.");
    }

    #[test]
    fn test_default_advisory() {
        assert_eq!(
            DenylistPolicy::default().advisory_message(),
            "This system provides educational explanations only."
        );
    }
}
