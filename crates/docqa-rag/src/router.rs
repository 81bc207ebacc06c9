use std::sync::Arc;

use tracing::{debug, warn};

use docqa_core::config::RouterConfig;
use docqa_core::traits::Generator;
use docqa_core::types::{RoutingDecision, RoutingReason};

use crate::prompt::PromptBuilder;

/// Decides per query whether retrieval is needed.
///
/// A configured keyword in the query always forces retrieval and skips the
/// classifier. Otherwise the classifier prompt is sent to the generator; a
/// failed call or an answer that is neither yes nor no also forces retrieval.
pub struct RetrievalRouter {
    keywords: Vec<String>,
    classifier: Option<Arc<dyn Generator>>,
}

impl RetrievalRouter {
    pub fn new(config: &RouterConfig, generator: Arc<dyn Generator>) -> Self {
        Self {
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
            classifier: config.classifier_enabled.then_some(generator),
        }
    }

    pub fn keyword_match(&self, query: &str) -> Option<&str> {
        let query = query.to_lowercase();
        self.keywords.iter().find(|k| query.contains(k.as_str())).map(String::as_str)
    }

    pub fn decide(&self, query: &str) -> RoutingDecision {
        if let Some(keyword) = self.keyword_match(query) {
            debug!(keyword, "keyword override, retrieving");
            return RoutingDecision::retrieve(RoutingReason::KeywordOverride);
        }
        let Some(classifier) = &self.classifier else {
            debug!("no keyword matched and classifier disabled, skipping retrieval");
            return RoutingDecision::skip(RoutingReason::NoKeywordMatch);
        };
        match classifier.generate(&PromptBuilder::classifier(query)) {
            Ok(answer) => match parse_verdict(&answer) {
                Some(true) => RoutingDecision::retrieve(RoutingReason::Classifier),
                Some(false) => RoutingDecision::skip(RoutingReason::Classifier),
                None => {
                    warn!(answer = %answer.trim(), "classifier answer not understood, retrieving");
                    RoutingDecision::retrieve(RoutingReason::ClassifierFallback)
                }
            },
            Err(e) => {
                warn!(error = %e, "classifier failed, retrieving");
                RoutingDecision::retrieve(RoutingReason::ClassifierFallback)
            }
        }
    }
}

/// Read a yes/no verdict from the first alphanumeric character.
pub fn parse_verdict(answer: &str) -> Option<bool> {
    match answer.chars().find(|c| c.is_alphanumeric())?.to_ascii_uppercase() {
        'Y' => Some(true),
        'N' => Some(false),
        _ => None,
    }
}
