//! Suggestion generator: candidate topic drafts from the generative
//! capability, with structural validation and a deterministic fallback.

use std::sync::Arc;
use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use capbot_types::{CandidateDraft, SuggestionConfig, SuggestionCriteria, TopicContent};

use crate::client::{extract_json, GenerativeClient, GenerativeError};

/// Raw draft as parsed from model output. Every field defaults so a
/// partially-populated object still parses; validation happens after
/// conversion, not during deserialization.
#[derive(Debug, Deserialize)]
struct RawDraft {
    #[serde(default)]
    en_title: String,
    #[serde(default)]
    vn_title: String,
    #[serde(default)]
    abbreviation: String,
    #[serde(default)]
    problem: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    objectives: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    team_size: u8,
    #[serde(default)]
    suggested_roles: Vec<String>,
    #[serde(default)]
    rationale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestionPayload {
    suggestions: Vec<RawDraft>,
}

/// Produces candidate topic drafts matching the caller's criteria.
///
/// Never fails: a primary structured-output prompt is retried once with a
/// simplified prompt on malformed output, transient capability failures
/// are retried with backoff, and the last resort is a fixed deterministic
/// draft so the pipeline always has a candidate to proceed with.
pub struct SuggestionGenerator {
    client: Arc<dyn GenerativeClient>,
    config: SuggestionConfig,
}

impl SuggestionGenerator {
    pub fn new(client: Arc<dyn GenerativeClient>, config: SuggestionConfig) -> Self {
        Self { client, config }
    }

    /// Generate structurally valid drafts for the given criteria.
    #[instrument(skip(self, criteria))]
    pub async fn generate(&self, criteria: &SuggestionCriteria) -> Vec<CandidateDraft> {
        let mut prompt = self.build_primary_prompt(criteria);

        // Bounded parse attempts: primary prompt first, then simplified.
        for attempt in 0..=self.config.parse_retries {
            let response = match self.call_with_backoff(&prompt).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "generative capability exhausted retries, using fallback");
                    return self.fallback_drafts(criteria);
                }
            };

            match self.parse_drafts(&response, criteria) {
                Ok(drafts) => {
                    debug!(count = drafts.len(), attempt, "parsed suggestion drafts");
                    return drafts;
                }
                Err(reason) => {
                    warn!(attempt, reason, "malformed suggestion output, simplifying prompt");
                    prompt = self.build_simplified_prompt(criteria);
                }
            }
        }

        warn!("structured output malformed after retry, using fallback drafts");
        self.fallback_drafts(criteria)
    }

    /// Call the generative capability, retrying transient failures with
    /// exponential backoff.
    async fn call_with_backoff(&self, prompt: &str) -> Result<String, GenerativeError> {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self
                .client
                .complete(prompt, self.config.temperature, self.config.max_output_tokens)
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempts < self.config.transient_retries => {
                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "generative call failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Parse and validate drafts from model output.
    fn parse_drafts(
        &self,
        response: &str,
        criteria: &SuggestionCriteria,
    ) -> Result<Vec<CandidateDraft>, &'static str> {
        let json = extract_json(response);
        let payload: SuggestionPayload =
            serde_json::from_str(&json).map_err(|_| "not a suggestions object")?;

        let mut drafts = Vec::new();
        for raw in payload.suggestions {
            let mut content = TopicContent {
                en_title: raw.en_title,
                vn_title: raw.vn_title,
                abbreviation: raw.abbreviation,
                problem: raw.problem,
                context: raw.context,
                content: raw.content,
                description: raw.description,
                objectives: raw.objectives,
                category: raw.category,
                team_size: raw.team_size,
                suggested_roles: raw.suggested_roles,
            };
            if !matches!(content.team_size, 4 | 5) {
                content.team_size = criteria.effective_team_size();
            }
            if content.suggested_roles.is_empty() {
                content.suggested_roles = TopicContent::default_roles(content.team_size);
            }
            if content.validate().is_ok() {
                drafts.push(CandidateDraft {
                    content,
                    rationale: raw.rationale,
                });
            }
        }

        if drafts.is_empty() {
            return Err("no structurally valid draft in output");
        }
        Ok(drafts)
    }

    fn build_primary_prompt(&self, criteria: &SuggestionCriteria) -> String {
        let keywords = if criteria.keywords.is_empty() {
            "none".to_string()
        } else {
            criteria.keywords.join(", ")
        };
        let expertise = if criteria.supervisor_expertise.is_empty() {
            "none".to_string()
        } else {
            criteria.supervisor_expertise.join(", ")
        };

        format!(
            r#"Propose {count} capstone research-project topics.

CRITERIA:
- Semester: {semester}
- Category preference: {category}
- Keywords: {keywords}
- Supervisor expertise: {expertise}
- Student level: {level}
- Team size: {team_size}

Respond with JSON only:
{{
  "suggestions": [
    {{
      "en_title": "English title",
      "vn_title": "Vietnamese title",
      "abbreviation": "Short acronym",
      "problem": "Problem statement",
      "context": "Application context",
      "content": "Main technical content",
      "description": "One-paragraph description",
      "objectives": "Concrete objectives",
      "category": "Category",
      "team_size": {team_size},
      "suggested_roles": ["Role 1", "Role 2"],
      "rationale": "Why this topic fits the criteria"
    }}
  ]
}}

Every field is required and must be non-empty."#,
            count = self.config.draft_count,
            semester = criteria.semester,
            category = criteria.category_preference.as_deref().unwrap_or("any"),
            keywords = keywords,
            expertise = expertise,
            level = criteria.student_level,
            team_size = criteria.effective_team_size(),
        )
    }

    /// Reduced prompt for the retry after a structural parse failure:
    /// one draft, fewer degrees of freedom.
    fn build_simplified_prompt(&self, criteria: &SuggestionCriteria) -> String {
        format!(
            r#"Propose exactly one capstone project topic for a team of {team_size} {level} students.

Respond with a single JSON object and nothing else:
{{"suggestions": [{{"en_title": "...", "vn_title": "...", "abbreviation": "...", "problem": "...", "context": "...", "content": "...", "description": "...", "objectives": "...", "category": "...", "team_size": {team_size}, "suggested_roles": ["..."]}}]}}"#,
            team_size = criteria.effective_team_size(),
            level = criteria.student_level,
        )
    }

    /// Fixed draft set returned when generation or parsing fails twice.
    /// Deterministic for a given team size.
    fn fallback_drafts(&self, criteria: &SuggestionCriteria) -> Vec<CandidateDraft> {
        let team_size = criteria.effective_team_size();
        let content = TopicContent {
            en_title: "Real-time Object Recognition System using Deep Learning".to_string(),
            vn_title: "Hệ thống nhận diện đối tượng thời gian thực sử dụng Deep Learning"
                .to_string(),
            abbreviation: "RORS".to_string(),
            problem:
                "Recognizing and tracking objects in live video with high accuracy remains hard"
                    .to_string(),
            context: "Computer vision applications increasingly require real-time object detection"
                .to_string(),
            content:
                "Research and build an object recognition system capable of real-time video processing"
                    .to_string(),
            description:
                "An application that detects and tracks objects in live video using modern deep learning models"
                    .to_string(),
            objectives:
                "Implement a deep learning detection pipeline and optimize it for real-time throughput"
                    .to_string(),
            category: "Artificial Intelligence".to_string(),
            team_size,
            suggested_roles: TopicContent::default_roles(team_size),
        };
        vec![CandidateDraft {
            content,
            rationale: Some("Fallback draft used when generation fails".to_string()),
        }]
    }
}
