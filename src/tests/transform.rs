use super::{
    build_request, parse_chat_response, run_transform, status_error, transform_paragraph,
    ChatRequest, HttpTransform, TextTransform, TransformError, TransformKind, QUICK_MODEL,
    SYSTEM_PROMPT,
};
use crate::credentials::ApiConfig;
use crate::document::Mutation;
use crate::error::OperationError;
use crate::memory::MemoryDocument;
use crate::operations::{SectionOperations, VisibilityStyles};
use crate::test_support::styled;
use async_trait::async_trait;
use std::sync::Mutex;

fn api() -> ApiConfig {
    ApiConfig {
        api_key: Some("sk-test".to_string()),
        model: "gpt-4o".to_string(),
        endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        max_tokens: 2000,
        temperature: 0.3,
    }
}

struct CannedTransport {
    body: Result<String, TransformError>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl CannedTransport {
    fn new(body: Result<String, TransformError>) -> Self {
        Self {
            body,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextTransform for CannedTransport {
    async fn send(&self, _api: &ApiConfig, request: &ChatRequest) -> Result<String, TransformError> {
        self.seen.lock().unwrap().push(request.clone());
        self.body.clone()
    }
}

#[test]
fn test_grammar_request_uses_instruction_only_system_prompt() {
    let request = build_request(&TransformKind::FixGrammar, "teh cat", &api()).unwrap();
    assert_eq!(request.model, "gpt-4o");
    assert_eq!(request.messages[0].role, "system");
    assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
    assert!(request.messages[1].content.contains("teh cat"));
    assert!(request.messages[1]
        .content
        .ends_with("Return ONLY the corrected text:"));
}

#[test]
fn test_blank_selection_is_rejected_before_key_check() {
    let mut api = api();
    api.api_key = None;
    assert_eq!(
        build_request(&TransformKind::Summarize, "  \n", &api),
        Err(TransformError::EmptySelection)
    );
    assert_eq!(
        build_request(&TransformKind::Summarize, "words", &api),
        Err(TransformError::MissingApiKey)
    );
}

#[test]
fn test_quick_suggestion_uses_small_model_and_length_limit() {
    let request = build_request(&TransformKind::QuickSuggestion, "short", &api()).unwrap();
    assert_eq!(request.model, QUICK_MODEL);

    let long = "x".repeat(500);
    assert!(matches!(
        build_request(&TransformKind::QuickSuggestion, &long, &api()),
        Err(TransformError::SelectionTooLong { len: 500, .. })
    ));
}

#[test]
fn test_rewrite_puts_style_in_system_prompt() {
    let kind = TransformKind::Rewrite {
        style: "smart casual".to_string(),
    };
    let request = build_request(&kind, "Dear Sir", &api()).unwrap();
    assert!(request.messages[0].content.contains("smart casual tone"));
    assert_eq!(request.messages[1].content, "Dear Sir");
    assert_eq!(request.max_tokens, 1000);
}

#[test]
fn test_parse_takes_first_choice_trimmed() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Fixed.\n"}},
        {"message":{"role":"assistant","content":"other"}}]}"#;
    assert_eq!(parse_chat_response(body).unwrap(), "Fixed.");
    assert!(matches!(
        parse_chat_response(r#"{"choices":[]}"#),
        Err(TransformError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_run_transform_round_trip() {
    let transport = CannedTransport::new(Ok(
        r#"{"choices":[{"message":{"role":"assistant","content":"The cat."}}]}"#.to_string(),
    ));
    let out = run_transform(&transport, &api(), &TransformKind::FixGrammar, "teh cat")
        .await
        .unwrap();
    assert_eq!(out, "The cat.");
    assert_eq!(transport.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_run_transform_skips_transport_on_empty_selection() {
    let transport = CannedTransport::new(Err(TransformError::Unauthorized));
    let err = run_transform(&transport, &api(), &TransformKind::FixGrammar, "")
        .await
        .unwrap_err();
    assert_eq!(err, TransformError::EmptySelection);
    assert!(transport.seen.lock().unwrap().is_empty());

    let err = run_transform(&transport, &api(), &TransformKind::FixGrammar, "text")
        .await
        .unwrap_err();
    assert_eq!(err, TransformError::Unauthorized);
}

fn completion(content: &str) -> String {
    serde_json::json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
        .to_string()
}

fn doc() -> MemoryDocument {
    MemoryDocument::from_pairs(styled(&[(1, "Intro"), (0, "teh cat sat"), (0, "other")]))
}

#[test]
fn test_status_mapping() {
    assert_eq!(status_error(200), None);
    assert_eq!(status_error(204), None);
    assert_eq!(status_error(401), Some(TransformError::Unauthorized));
    assert_eq!(status_error(403), Some(TransformError::Unauthorized));
    assert_eq!(
        status_error(500),
        Some(TransformError::Transport("API error: status 500".to_string()))
    );
}

#[tokio::test]
async fn test_http_transport_needs_a_key() {
    let mut api = api();
    let request = build_request(&TransformKind::Summarize, "words", &api).unwrap();
    api.api_key = None;
    let err = HttpTransform::new().send(&api, &request).await.unwrap_err();
    assert_eq!(err, TransformError::MissingApiKey);
}

#[tokio::test]
async fn test_transform_paragraph_replaces_text_and_records_edit() {
    let doc = doc();
    let ops = SectionOperations::new(&doc, VisibilityStyles::default());
    let transport = CannedTransport::new(Ok(completion("The cat sat.")));

    let out = transform_paragraph(&ops, &transport, &api(), &TransformKind::FixGrammar, 1)
        .await
        .unwrap();
    assert_eq!(out, "The cat sat.");

    let snapshot = doc.snapshot().await;
    assert_eq!(snapshot[1].text, "The cat sat.");
    assert_eq!(snapshot[1].style, "Normal");
    assert_eq!(snapshot[2].text, "other");

    assert!(transport.seen.lock().unwrap()[0].messages[1]
        .content
        .contains("teh cat sat"));

    let plan = doc.edit_plan().await;
    assert_eq!(plan.len(), 1);
    assert_eq!(
        plan.edits[0].mutation,
        Mutation::ReplaceText {
            index: 1,
            text: "The cat sat.".to_string()
        }
    );
    assert_eq!(plan.edits[0].target_text, "teh cat sat");
}

#[tokio::test]
async fn test_failed_transform_leaves_paragraph_alone() {
    let doc = doc();
    let ops = SectionOperations::new(&doc, VisibilityStyles::default());
    let transport = CannedTransport::new(Err(TransformError::Unauthorized));

    let err = transform_paragraph(&ops, &transport, &api(), &TransformKind::Summarize, 1)
        .await
        .unwrap_err();
    assert_eq!(err, OperationError::Transform(TransformError::Unauthorized));
    assert_eq!(doc.snapshot().await[1].text, "teh cat sat");
    assert!(doc.edit_plan().await.is_empty());
}

#[tokio::test]
async fn test_transform_on_locked_or_missing_paragraph() {
    let doc = doc();
    doc.lock_paragraph(1).await;
    let ops = SectionOperations::new(&doc, VisibilityStyles::default());
    let transport = CannedTransport::new(Ok(completion("The cat sat.")));

    let err = transform_paragraph(&ops, &transport, &api(), &TransformKind::FixGrammar, 1)
        .await
        .unwrap_err();
    assert_eq!(err, OperationError::Rejected { index: 1 });
    assert_eq!(doc.snapshot().await[1].text, "teh cat sat");

    let err = transform_paragraph(&ops, &transport, &api(), &TransformKind::FixGrammar, 9)
        .await
        .unwrap_err();
    assert_eq!(err, OperationError::StaleReference { index: 9 });
    assert_eq!(transport.seen.lock().unwrap().len(), 1);
}
