use super::{RefreshDebounce, SessionState};
use crate::document::{ContentControl, DocumentHost, Mutation, MutationOutcome};
use crate::error::{HostError, MutationError, OperationError};
use crate::memory::MemoryDocument;
use crate::operations::{SectionOperations, VisibilityStyles};
use crate::outline::build_outline;
use crate::section::Expansion;
use crate::tag::ControlTag;
use crate::paragraph::Paragraph;
use crate::test_support::{paragraphs, styled};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

fn doc() -> MemoryDocument {
    MemoryDocument::from_pairs(styled(&[
        (1, "Intro"),
        (0, "a"),
        (2, "Detail"),
        (0, "b"),
        (1, "Outro"),
        (0, "c"),
    ]))
}

/// Host that refuses new content controls and can drop the connection on a chosen removal.
struct GuardedDocument {
    inner: MemoryDocument,
    refuse_controls: bool,
    fail_removal: Option<usize>,
    removals: AtomicUsize,
}

impl GuardedDocument {
    fn new(inner: MemoryDocument) -> Self {
        Self {
            inner,
            refuse_controls: false,
            fail_removal: None,
            removals: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentHost for GuardedDocument {
    async fn paragraphs(&self) -> Result<Vec<Paragraph>, HostError> {
        self.inner.paragraphs().await
    }

    async fn content_controls(&self) -> Result<Vec<ContentControl>, HostError> {
        self.inner.content_controls().await
    }

    async fn execute(&self, mutations: Vec<Mutation>) -> Result<Vec<MutationOutcome>, HostError> {
        if mutations
            .iter()
            .any(|m| matches!(m, Mutation::RemoveContentControl { .. }))
        {
            let seen = self.removals.fetch_add(1, Ordering::SeqCst);
            if self.fail_removal == Some(seen) {
                return Err(HostError::Unavailable("connection dropped".to_string()));
            }
        }
        if self.refuse_controls {
            if let Some(Mutation::InsertContentControl { start, .. }) = mutations.first() {
                return Ok(vec![Err(MutationError::Rejected {
                    index: *start,
                    reason: "controls are locked".to_string(),
                })]);
            }
        }
        self.inner.execute(mutations).await
    }
}

async fn session_for(doc: &MemoryDocument) -> SessionState {
    let outline = build_outline(&doc.paragraphs().await.unwrap()).unwrap();
    SessionState::new(outline, Duration::from_millis(2000))
}

#[test]
fn test_toggle_flips_state_without_guard() {
    let outline = build_outline(&paragraphs(&[(1, "A"), (0, "x")])).unwrap();
    let mut session = SessionState::new(outline, Duration::ZERO);

    assert_eq!(session.toggle(0), Some(Expansion::Collapsed));
    assert_eq!(session.toggle(0), Some(Expansion::Expanded));
    assert_eq!(session.toggle(9), None);
}

#[test]
fn test_refresh_carries_collapsed_state_by_identity() {
    let outline = build_outline(&paragraphs(&[(1, "A"), (0, "x"), (1, "B"), (0, "y")])).unwrap();
    let mut session = SessionState::new(outline, Duration::ZERO);
    session.toggle(0);
    session.toggle(1);
    session.current = 1;

    // "A" keeps its index and text; "B" moves down by one paragraph.
    let rebuilt = build_outline(&paragraphs(&[
        (1, "A"),
        (0, "x"),
        (0, "new"),
        (1, "B"),
        (0, "y"),
    ]))
    .unwrap();
    session.refresh(rebuilt);

    assert_eq!(session.outline.sections[0].expansion, Expansion::Collapsed);
    assert_eq!(session.outline.sections[1].expansion, Expansion::Expanded);
    assert_eq!(session.current, 1, "cursor clamps when its heading moved");
}

#[test]
fn test_refresh_follows_cursor_heading() {
    let outline = build_outline(&paragraphs(&[(0, "pre"), (1, "A"), (1, "B")])).unwrap();
    let mut session = SessionState::new(outline, Duration::ZERO);
    session.current = 2;

    // The orphan paragraph was blanked: "B" keeps its index but moves up in the outline.
    let rebuilt = build_outline(&paragraphs(&[(0, " "), (1, "A"), (1, "B")])).unwrap();
    session.refresh(rebuilt);
    assert_eq!(session.current, 1);
    assert_eq!(session.current_section().unwrap().title, "B");
}

#[test]
fn test_refresh_on_empty_outline_resets_cursor() {
    let outline = build_outline(&paragraphs(&[(1, "A"), (1, "B")])).unwrap();
    let mut session = SessionState::new(outline, Duration::ZERO);
    session.current = 1;
    session.refresh(build_outline(&[]).unwrap());
    assert_eq!(session.current, 0);
    assert!(session.current_section().is_none());
}

#[tokio::test]
async fn test_toggle_section_hides_then_shows() {
    let doc = doc();
    let ops = SectionOperations::new(&doc, VisibilityStyles::default());
    let mut session = session_for(&doc).await;

    let hidden = session.toggle_section(&ops, 0).await.unwrap();
    assert_eq!(hidden.affected, 2, "paragraphs 1 and 3; heading 2 stays");
    assert_eq!(session.outline.sections[0].expansion, Expansion::Collapsed);
    assert_eq!(doc.snapshot().await[3].style, "HiddenContent");

    session.toggle_section(&ops, 0).await.unwrap();
    assert_eq!(doc.snapshot().await[3].style, "Normal");
    assert_eq!(session.outline.sections[0].expansion, Expansion::Expanded);
}

#[tokio::test]
async fn test_stale_toggle_reverts_and_rebuilds() {
    let doc = doc();
    let ops = SectionOperations::new(&doc, VisibilityStyles::default());
    let mut session = session_for(&doc).await;
    doc.insert_paragraph(0, "Normal", "inserted").await;

    let err = session.toggle_section(&ops, 0).await.unwrap_err();
    assert!(err.is_stale());
    assert_eq!(session.outline.sections[0].title, "inserted");
    assert!(session
        .outline
        .sections
        .iter()
        .all(|s| s.expansion == Expansion::Expanded));
    assert!(session.message.as_deref().unwrap_or("").starts_with("Error"));
}

#[tokio::test]
async fn test_critiques_get_sequential_tags() {
    let doc = doc();
    let ops = SectionOperations::new(&doc, VisibilityStyles::default());
    let mut session = session_for(&doc).await;

    let first = session.add_critique(&ops, 1, "vague").await.unwrap();
    let second = session.add_critique(&ops, 3, "passive").await.unwrap();
    assert_eq!(first.tag(), ControlTag::Critique { id: 1 });
    assert_eq!(second.tag(), ControlTag::Critique { id: 2 });

    let controls = doc.content_controls().await.unwrap();
    assert_eq!(controls.len(), 2);
    assert_eq!(doc.snapshot().await[3].comments, vec!["passive".to_string()]);

    let removed = session.clear_critiques(&ops).await.unwrap();
    assert_eq!(removed, 2);
    assert!(session.critiques.is_empty());
    assert!(doc.content_controls().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_critique_on_locked_paragraph_is_rejected() {
    let doc = doc();
    doc.lock_paragraph(1).await;
    let ops = SectionOperations::new(&doc, VisibilityStyles::default());
    let mut session = session_for(&doc).await;

    let err = session.add_critique(&ops, 1, "nope").await.unwrap_err();
    assert_eq!(err, OperationError::Rejected { index: 1 });
    assert!(session.critiques.is_empty());
}

#[tokio::test]
async fn test_critique_with_refused_control_is_not_recorded() {
    let mut host = GuardedDocument::new(doc());
    host.refuse_controls = true;
    let ops = SectionOperations::new(&host, VisibilityStyles::default());
    let mut session = session_for(&host.inner).await;

    let err = session.add_critique(&ops, 1, "vague").await.unwrap_err();
    assert_eq!(err, OperationError::Rejected { index: 1 });
    assert!(session.critiques.is_empty());

    // The id was not consumed by the refused attempt.
    host.refuse_controls = false;
    let ops = SectionOperations::new(&host, VisibilityStyles::default());
    let critique = session.add_critique(&ops, 1, "vague").await.unwrap();
    assert_eq!(critique.id, 1);
}

#[tokio::test]
async fn test_clear_keeps_unremoved_critiques_after_host_failure() {
    let mut host = GuardedDocument::new(doc());
    host.fail_removal = Some(1);
    let ops = SectionOperations::new(&host, VisibilityStyles::default());
    let mut session = session_for(&host.inner).await;
    session.add_critique(&ops, 1, "vague").await.unwrap();
    session.add_critique(&ops, 3, "passive").await.unwrap();

    let err = session.clear_critiques(&ops).await.unwrap_err();
    assert!(matches!(err, OperationError::Host(HostError::Unavailable(_))));
    assert_eq!(session.critiques.len(), 1);
    assert_eq!(session.critiques[0].id, 2);
    assert_eq!(host.content_controls().await.unwrap().len(), 1);

    assert_eq!(session.clear_critiques(&ops).await.unwrap(), 1);
    assert!(session.critiques.is_empty());
    assert!(host.content_controls().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_failing_first_removal_keeps_everything() {
    let mut host = GuardedDocument::new(doc());
    host.fail_removal = Some(0);
    let ops = SectionOperations::new(&host, VisibilityStyles::default());
    let mut session = session_for(&host.inner).await;
    session.add_critique(&ops, 1, "vague").await.unwrap();
    session.add_critique(&ops, 3, "passive").await.unwrap();

    assert!(session.clear_critiques(&ops).await.is_err());
    assert_eq!(session.critiques.len(), 2);
    assert_eq!(host.content_controls().await.unwrap().len(), 2);
}

#[test]
fn test_debounce_fires_once_after_quiet_period() {
    let start = Instant::now();
    let mut debounce = RefreshDebounce::new(Duration::from_millis(2000));

    assert!(!debounce.poll(start));
    debounce.on_selection_changed(start);
    debounce.on_selection_changed(start + Duration::from_millis(1500));
    assert!(debounce.is_pending());
    assert!(!debounce.poll(start + Duration::from_millis(3000)));
    assert!(debounce.poll(start + Duration::from_millis(3500)));
    assert!(!debounce.poll(start + Duration::from_millis(9000)));
}
