//! Insight generator client.
//!
//! Summarizes a read-only snapshot of the document into a prompt and asks an
//! OpenAI-compatible chat completions endpoint for a short analysis. The
//! generator is optional: any failure produces [`APOLOGY`] instead.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_engine::Document;

use crate::config::InsightConfig;

/// Returned whenever no insight could be generated.
pub const APOLOGY: &str =
    "Sorry, insights are unavailable right now. Please try again later.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("Insight endpoint not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Response contained no text")]
    EmptyResponse,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Deserialize)]
struct ChatContent {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InsightClient {
    http: reqwest::Client,
    config: InsightConfig,
}

impl InsightClient {
    pub fn new(config: InsightConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_url.is_some()
    }

    /// Generate an insight for `doc`. Never fails.
    pub async fn generate(&self, doc: &Document) -> String {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let prompt = build_prompt(doc, &today);

        match self.request(&prompt).await {
            Ok(text) => text,
            Err(InsightError::NotConfigured) => {
                tracing::debug!("Insight requested without a configured endpoint");
                APOLOGY.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Insight generation failed");
                APOLOGY.to_string()
            }
        }
    }

    async fn request(&self, prompt: &str) -> Result<String, InsightError> {
        let url = self
            .config
            .api_url
            .as_deref()
            .ok_or(InsightError::NotConfigured)?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.http.post(url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response: ChatResponse = request.send().await?.error_for_status()?.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(InsightError::EmptyResponse)
    }
}

/// Build the prompt describing `doc` as of `today` (`YYYY-MM-DD`).
pub fn build_prompt(doc: &Document, today: &str) -> String {
    let mut per_person: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    let mut per_category: BTreeMap<&str, u32> = BTreeMap::new();

    for task in doc.tasks.iter() {
        let entry = per_person
            .entry(doc.person_name(&task.person_id))
            .or_default();
        entry.0 += task.quantity;
        entry.1 += task.duration_minutes.unwrap_or(0);
        *per_category
            .entry(doc.category_name(&task.service_category_id))
            .or_default() += task.quantity;
    }

    let mut prompt = format!(
        "You are analysing a team productivity log. Today is {today}.\n\
         There are {} people, {} recorded tasks and {} noted particularities.\n",
        doc.people.len(),
        doc.tasks.len(),
        doc.particularities.len()
    );

    if !per_person.is_empty() {
        prompt.push_str("\nTasks per person:\n");
        for (name, (quantity, minutes)) in &per_person {
            let _ = writeln!(prompt, "- {name}: {quantity} tasks, {minutes} minutes");
        }
    }

    if !per_category.is_empty() {
        prompt.push_str("\nTasks per category:\n");
        for (name, quantity) in &per_category {
            let _ = writeln!(prompt, "- {name}: {quantity}");
        }
    }

    let recent: Vec<_> = doc
        .particularities
        .iter()
        .filter(|p| p.date.as_str() <= today)
        .collect();
    if !recent.is_empty() {
        prompt.push_str("\nParticularities:\n");
        for p in recent {
            let _ = writeln!(
                prompt,
                "- {} ({}): {} on {}",
                doc.person_name(&p.person_id),
                p.kind.as_str(),
                p.description,
                p.date
            );
        }
    }

    prompt.push_str(
        "\nWrite a short analysis of workload balance and notable trends, \
         with one or two concrete suggestions.",
    );
    prompt
}
