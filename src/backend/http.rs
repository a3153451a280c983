//! Chat-completions HTTP translation backend.

use crate::backend::Translator;
use crate::config::BackendConfig;
use crate::error::{ClipglotError, Result};
use crate::speaker::extract_speaker;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Dialogue shorter than this never gets the previous-lines context
/// message, even when the worker supplies one.
const CONTEXT_MIN_DIALOGUE_CHARS: usize = 15;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Translator backed by a chat-completions API.
pub struct HttpTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    system_prompt: String,
    known_names: HashSet<String>,
}

impl HttpTranslator {
    /// Build the backend from configuration.
    ///
    /// Fails fast when no API key is available — a missing credential is
    /// a startup problem, never a per-job one.
    pub fn new(config: &BackendConfig, known_names: HashSet<String>) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| ClipglotError::BackendCredential {
                message: format!(
                    "set backend.api_key in the config file or the {} environment variable",
                    crate::defaults::API_KEY_ENV
                ),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClipglotError::BackendRequest {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            system_prompt: build_system_prompt(&known_names),
            known_names,
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, context: &str) -> Result<String> {
        let (speaker, dialogue) = extract_speaker(text, &self.known_names);
        let messages = build_messages(
            &self.system_prompt,
            speaker.as_deref(),
            &dialogue,
            context,
        );

        let request = ChatRequest {
            model: &self.model,
            stream: false,
            temperature: self.temperature,
            messages,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClipglotError::BackendRequest {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClipglotError::BackendRequest {
                message: format!("status {status}: {body}"),
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ClipglotError::BackendResponse {
                    message: format!("invalid JSON: {e}"),
                })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ClipglotError::BackendResponse {
                message: "no choices in response".to_string(),
            })?;

        // Speaker prefix is re-attached here, for display only — the
        // model is told not to include it.
        Ok(match speaker {
            Some(name) => format!("{name}: {content}"),
            None => content,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Fixed system prompt: speaker rules plus the known-names registry.
fn build_system_prompt(known_names: &HashSet<String>) -> String {
    let mut names: Vec<&str> = known_names.iter().map(String::as_str).collect();
    names.sort_unstable();
    let known_list = names.join(", ");

    format!(
        "You are a translator for live narration and dialogue.\n\n\
         RULES:\n\
         - A character name at the START of a line is the SPEAKER.\n\
         - Never guess or invent the speaker.\n\
         - If [SPEAKER: Name] is provided, use it to understand who is speaking.\n\
         - If no speaker is given, treat the line as narration.\n\
         - Character names are never sounds or interjections.\n\
         - Known character names:\n{known_list}\n\n\
         OUTPUT:\n\
         - Translate ONLY the dialogue or narration.\n\
         - Do NOT include the speaker name in the output.\n\
         - Preserve honorifics (san, chan, kun, senpai, sama).\n\
         - Preserve emotion and punctuation (…, !, ?, hesitation).\n\
         - Output ONLY the translation. No comments."
    )
}

/// Assemble the message list for one request.
fn build_messages(
    system_prompt: &str,
    speaker: Option<&str>,
    dialogue: &str,
    context: &str,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage {
        role: "system".to_string(),
        content: system_prompt.to_string(),
    }];

    let use_context =
        !context.is_empty() && dialogue.chars().count() > CONTEXT_MIN_DIALOGUE_CHARS;
    if use_context {
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: format!("Previous lines:\n{context}"),
        });
    }

    let content = match speaker {
        Some(name) => format!("[SPEAKER: {name}]\n{dialogue}"),
        None => dialogue.to_string(),
    };
    messages.push(ChatMessage {
        role: "user".to_string(),
        content,
    });

    messages
}
