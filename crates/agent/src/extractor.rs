//! Intent extraction: natural language in, untrusted candidate task out.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use atrium_core::catalog::Catalog;
use atrium_core::config::BuildingProfile;
use atrium_core::CandidateTask;

use crate::llm::LlmClient;
use crate::parser::parse_candidate;
use crate::prompts::intent_extraction_prompt;

pub struct IntentExtractor {
    llm: Arc<dyn LlmClient>,
    catalog: Arc<Catalog>,
    profile: Arc<BuildingProfile>,
}

impl IntentExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, catalog: Arc<Catalog>, profile: Arc<BuildingProfile>) -> Self {
        Self { llm, catalog, profile }
    }

    /// Never fails: a dead or incoherent model yields the sentinel candidate,
    /// which the planner rejects as `UnknownOperation`. That keeps validation
    /// as the pipeline's single choke point.
    pub async fn extract(&self, query: &str, now: DateTime<Utc>) -> CandidateTask {
        let prompt = intent_extraction_prompt(query, &self.catalog, &self.profile, now);
        match self.llm.complete(&prompt).await {
            Ok(reply) => match parse_candidate(&reply) {
                Some(candidate) => candidate,
                None => {
                    tracing::warn!(reply_len = reply.len(), "unparseable extraction reply");
                    CandidateTask::unrecognized()
                }
            },
            Err(error) => {
                tracing::warn!(error = %error, "intent extraction call failed");
                CandidateTask::unrecognized()
            }
        }
    }
}
