use super::{run_batch, Batch, DocumentHost, FontFormat, Mutation};
use crate::error::{HostError, MutationError};
use crate::memory::MemoryDocument;
use crate::test_support::styled;

fn doc() -> MemoryDocument {
    MemoryDocument::from_pairs(styled(&[(1, "Title"), (0, "one"), (0, "two")]))
}

#[tokio::test]
async fn test_batch_applies_nothing_until_sync() {
    let doc = doc();
    let mut batch = Batch::new(&doc);
    batch.queue(Mutation::SetHighlight {
        index: 1,
        color: Some("Yellow".to_string()),
    });
    assert_eq!(batch.pending(), 1);
    assert_eq!(doc.snapshot().await[1].highlight, None);

    let outcomes = batch.sync().await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].1.is_ok());
    assert_eq!(doc.snapshot().await[1].highlight.as_deref(), Some("Yellow"));
}

#[tokio::test]
async fn test_run_batch_flushes_when_closure_fails() {
    let doc = doc();
    let (result, outcomes) = run_batch(&doc, |batch| {
        batch.queue(Mutation::InsertComment {
            index: 2,
            text: "queued before failing".to_string(),
        });
        Err::<(), &str>("gave up half way")
    })
    .await
    .unwrap();

    assert!(result.is_err());
    assert_eq!(outcomes.len(), 1);
    assert_eq!(doc.snapshot().await[2].comments.len(), 1);
}

#[tokio::test]
async fn test_outcomes_are_per_mutation() {
    let doc = doc();
    let ((), outcomes) = run_batch(&doc, |batch| {
        batch.queue(Mutation::SetStyle {
            index: 9,
            style: "Normal".to_string(),
        });
        batch.queue(Mutation::SetStyle {
            index: 1,
            style: "Quote".to_string(),
        });
    })
    .await
    .unwrap();

    assert_eq!(outcomes[0].1, Err(MutationError::NotFound(9)));
    assert!(outcomes[1].1.is_ok());
}

#[tokio::test]
async fn test_empty_batch_skips_the_host() {
    let doc = doc();
    doc.set_offline(true).await;
    let outcomes = Batch::new(&doc).sync().await.unwrap();
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn test_transport_failure_fails_the_batch() {
    let doc = doc();
    doc.set_offline(true).await;
    let result = run_batch(&doc, |batch| {
        batch.queue(Mutation::ScrollIntoView { index: 0 });
    })
    .await;
    assert!(matches!(result, Err(HostError::Unavailable(_))));
}

#[tokio::test]
async fn test_paragraphs_carry_heading_levels() {
    let doc = doc();
    let paragraphs = doc.paragraphs().await.unwrap();
    assert_eq!(paragraphs[0].heading_level, 1);
    assert_eq!(paragraphs[1].heading_level, 0);
    assert_eq!(paragraphs[2].index, 2);
}

#[test]
fn test_font_merge_keeps_unset_fields() {
    let base = FontFormat {
        bold: Some(true),
        size: Some(11),
        ..FontFormat::default()
    };
    let overlay = FontFormat {
        italic: Some(true),
        size: Some(14),
        ..FontFormat::default()
    };
    let merged = base.merged(&overlay);
    assert_eq!(merged.bold, Some(true));
    assert_eq!(merged.italic, Some(true));
    assert_eq!(merged.size, Some(14));
    assert_eq!(merged.merged(&overlay), merged);
}
