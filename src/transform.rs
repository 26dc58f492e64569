//! Chat-completion requests for rewriting paragraph text.
//!
//! Grammar fixes, summaries, suggestions and tone rewrites are built here as chat requests and
//! sent through a [`TextTransform`]. [`HttpTransform`] posts them with reqwest; tests swap in a
//! canned transport. [`transform_paragraph`] reads one paragraph, transforms it and writes the
//! result back through the section operations, so the change lands in the edit plan.

use crate::credentials::ApiConfig;
use crate::document::DocumentHost;
use crate::error::OperationError;
use crate::operations::SectionOperations;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// System prompt that keeps responses to the requested output only.
pub const SYSTEM_PROMPT: &str = "You are a text processing tool. Respond only with the exact \
output requested without any explanations, introductions, or additional text. Do not use phrases \
like \"Here is\" or \"Here's\". Never explain your reasoning or add notes. Just return the exact \
result.";

/// Cheaper model used for quick suggestions.
pub const QUICK_MODEL: &str = "gpt-3.5-turbo";

/// Longest selection, in characters, that a quick suggestion is offered for.
pub const QUICK_SUGGESTION_LIMIT: usize = 500;

/// Failure of a text-transform request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// Nothing but whitespace was selected.
    #[error("no text selected")]
    EmptySelection,

    /// The selection is too long for this kind of request.
    #[error("selection of {len} characters exceeds the limit of {limit}")]
    SelectionTooLong {
        /// Characters selected.
        len: usize,
        /// Largest accepted length.
        limit: usize,
    },

    /// No API key is stored.
    #[error("no API key configured")]
    MissingApiKey,

    /// The endpoint rejected the API key.
    #[error("API key was rejected")]
    Unauthorized,

    /// The request did not complete.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response carried no usable completion.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// What to do with the selected text.
pub enum TransformKind {
    /// Fix grammar, spelling and punctuation.
    FixGrammar,
    /// Summarize in two or three sentences.
    Summarize,
    /// Propose exactly three numbered improvements.
    SuggestChanges,
    /// Rewrite the text using previously suggested improvements.
    ApplySuggestions {
        /// Output of an earlier [`TransformKind::SuggestChanges`] request.
        suggestions: String,
    },
    /// One brief suggestion for a short fragment.
    QuickSuggestion,
    /// Rewrite in the given tone while preserving meaning.
    Rewrite {
        /// Tone name, for example "formal" or "smart casual".
        style: String,
    },
}

impl TransformKind {
    /// User prompt for `text`.
    #[must_use]
    pub fn prompt(&self, text: &str) -> String {
        match self {
            Self::FixGrammar => format!(
                "Fix grammar, spelling, and punctuation in this text:\n\n{text}\n\nReturn ONLY the corrected text:"
            ),
            Self::Summarize => format!(
                "Summarize this text in 2-3 concise sentences:\n\n{text}\n\nReturn ONLY the summary:"
            ),
            Self::SuggestChanges => format!(
                "Improve the following text:\n\n{text}\n\nReturn a numbered list with exactly 3 \
                 specific improvements. Format each point as \"1. [Issue]: [Suggestion]\" without \
                 any introduction or conclusion."
            ),
            Self::ApplySuggestions { suggestions } => format!(
                "Rewrite this text with the improvements:\n\nOriginal text: {text}\n\nSuggested \
                 improvements: {suggestions}\n\nReturn ONLY the improved version with no explanation:"
            ),
            Self::QuickSuggestion => format!(
                "Suggest one improvement for this text fragment: \"{text}\"\n\nReturn ONLY a \
                 single brief suggestion without any introduction or explanation."
            ),
            Self::Rewrite { .. } => text.to_string(),
        }
    }

    fn system_prompt(&self) -> String {
        match self {
            Self::Rewrite { style } => format!(
                "You are an AI assistant that helps improve writing. Rewrite the provided text in \
                 a {style} tone while preserving the meaning."
            ),
            _ => SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One message of a chat conversation.
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Chat-completion request body.
pub struct ChatRequest {
    /// Model name.
    pub model: String,
    /// System prompt followed by the user prompt.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Completion token limit.
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
/// Chat-completion response body, reduced to what is read from it.
pub struct ChatResponse {
    /// Completions, best first.
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
/// One completion.
pub struct ChatChoice {
    /// Assistant message.
    pub message: ChatMessage,
}

/// Builds the request for `kind` applied to `text`.
///
/// # Errors
///
/// Returns [`TransformError::EmptySelection`] for blank text, [`TransformError::MissingApiKey`]
/// without a stored key, and [`TransformError::SelectionTooLong`] when a quick suggestion is
/// asked for a long selection.
pub fn build_request(
    kind: &TransformKind,
    text: &str,
    api: &ApiConfig,
) -> Result<ChatRequest, TransformError> {
    if text.trim().is_empty() {
        return Err(TransformError::EmptySelection);
    }
    if !api.is_configured() {
        return Err(TransformError::MissingApiKey);
    }

    let (model, temperature, max_tokens) = match kind {
        TransformKind::QuickSuggestion => {
            let len = text.chars().count();
            if len >= QUICK_SUGGESTION_LIMIT {
                return Err(TransformError::SelectionTooLong {
                    len,
                    limit: QUICK_SUGGESTION_LIMIT,
                });
            }
            (QUICK_MODEL.to_string(), api.temperature, api.max_tokens)
        }
        TransformKind::Rewrite { .. } => (api.model.clone(), 0.7, 1000),
        _ => (api.model.clone(), api.temperature, api.max_tokens),
    };

    Ok(ChatRequest {
        model,
        messages: vec![
            ChatMessage::new("system", kind.system_prompt()),
            ChatMessage::new("user", kind.prompt(text)),
        ],
        temperature,
        max_tokens,
    })
}

/// Extracts the first completion from a response body, trimmed.
///
/// # Errors
///
/// Returns [`TransformError::MalformedResponse`] if the body does not parse or has no choices.
pub fn parse_chat_response(body: &str) -> Result<String, TransformError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| TransformError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or_else(|| TransformError::MalformedResponse("no choices".to_string()))
}

/// Sends chat-completion requests.
#[async_trait]
pub trait TextTransform: Send + Sync {
    /// Posts `request` to `api` and returns the raw response body.
    ///
    /// # Errors
    ///
    /// Returns a transport or authorization error.
    async fn send(&self, api: &ApiConfig, request: &ChatRequest) -> Result<String, TransformError>;
}

/// Builds, sends and parses one transform of `text`.
///
/// # Errors
///
/// Returns any error from [`build_request`], the transport, or [`parse_chat_response`].
pub async fn run_transform<T: TextTransform + ?Sized>(
    transport: &T,
    api: &ApiConfig,
    kind: &TransformKind,
    text: &str,
) -> Result<String, TransformError> {
    let request = build_request(kind, text, api)?;
    debug!("sending {kind:?} request to {} ({})", api.endpoint, request.model);
    let body = transport.send(api, &request).await.inspect_err(|err| {
        warn!("text transform failed: {err}");
    })?;
    parse_chat_response(&body)
}

/// Maps a non-success HTTP status to the error it stands for; `None` for 2xx.
#[must_use]
pub fn status_error(status: u16) -> Option<TransformError> {
    match status {
        200..=299 => None,
        401 | 403 => Some(TransformError::Unauthorized),
        other => Some(TransformError::Transport(format!("API error: status {other}"))),
    }
}

/// Chat-completion transport over HTTPS.
#[derive(Clone, Debug, Default)]
pub struct HttpTransform {
    client: reqwest::Client,
}

impl HttpTransform {
    #[must_use]
    /// Creates a transport with a fresh connection pool.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TextTransform for HttpTransform {
    async fn send(&self, api: &ApiConfig, request: &ChatRequest) -> Result<String, TransformError> {
        let Some(key) = api.api_key.as_deref() else {
            return Err(TransformError::MissingApiKey);
        };
        let response = self
            .client
            .post(&api.endpoint)
            .bearer_auth(key)
            .json(request)
            .send()
            .await
            .map_err(|e| TransformError::Transport(e.to_string()))?;
        if let Some(err) = status_error(response.status().as_u16()) {
            return Err(err);
        }
        response
            .text()
            .await
            .map_err(|e| TransformError::Transport(e.to_string()))
    }
}

/// Transforms the text of paragraph `index` and writes the result back in place.
///
/// Returns the new text. Nothing is written when the transform fails.
///
/// # Errors
///
/// Returns [`OperationError::StaleReference`] if the paragraph is gone,
/// [`OperationError::Transform`] if the request failed, and [`OperationError::Rejected`] if the
/// host refused the new text.
pub async fn transform_paragraph<H, T>(
    ops: &SectionOperations<'_, H>,
    transport: &T,
    api: &ApiConfig,
    kind: &TransformKind,
    index: usize,
) -> Result<String, OperationError>
where
    H: DocumentHost + ?Sized,
    T: TextTransform + ?Sized,
{
    let text = ops.paragraph_text(index).await?;
    let output = run_transform(transport, api, kind, &text).await?;
    if !ops.replace_text(index, &output).await? {
        return Err(OperationError::Rejected { index });
    }
    info!("applied {kind:?} to paragraph {index}");
    Ok(output)
}

#[cfg(test)]
#[path = "tests/transform.rs"]
mod tests;
