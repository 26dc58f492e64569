use super::MemoryDocument;
use crate::document::{DocumentHost, Mutation};
use crate::error::MutationError;
use crate::tag::ControlTag;
use crate::test_support::styled;

#[tokio::test]
async fn test_locked_paragraph_rejects_changes() {
    let doc = MemoryDocument::from_pairs(styled(&[(0, "a"), (0, "b")]));
    doc.lock_paragraph(0).await;

    let outcomes = doc
        .execute(vec![
            Mutation::SetHighlight {
                index: 0,
                color: Some("Red".to_string()),
            },
            Mutation::SetHighlight {
                index: 1,
                color: Some("Red".to_string()),
            },
        ])
        .await
        .unwrap();

    assert!(matches!(
        outcomes[0],
        Err(MutationError::Rejected { index: 0, .. })
    ));
    assert!(outcomes[1].is_ok());
}

#[tokio::test]
async fn test_only_successful_mutations_are_recorded() {
    let doc = MemoryDocument::from_pairs(styled(&[(1, "Head"), (0, "body")]));
    doc.execute(vec![
        Mutation::InsertComment {
            index: 1,
            text: "note".to_string(),
        },
        Mutation::InsertComment {
            index: 5,
            text: "lost".to_string(),
        },
    ])
    .await
    .unwrap();

    let plan = doc.edit_plan().await;
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.edits[0].target_text, "body");
}

#[tokio::test]
async fn test_selection_must_fit_document() {
    let doc = MemoryDocument::from_pairs(styled(&[(0, "a"), (0, "b")]));
    let outcomes = doc
        .execute(vec![
            Mutation::SelectRange { start: 0, end: 2 },
            Mutation::SelectRange { start: 1, end: 0 },
            Mutation::SelectRange { start: 0, end: 1 },
        ])
        .await
        .unwrap();

    assert!(outcomes[0].is_err());
    assert!(outcomes[1].is_err());
    assert!(outcomes[2].is_ok());
    assert_eq!(doc.selection().await, Some((0, 1)));
}

#[tokio::test]
async fn test_content_controls_round_trip_through_host() {
    let doc = MemoryDocument::from_pairs(styled(&[(0, "a"), (0, "b"), (0, "c")]));
    doc.execute(vec![
        Mutation::InsertContentControl {
            start: 1,
            end: 2,
            tag: ControlTag::Critique { id: 1 },
            title: "Critique".to_string(),
        },
        Mutation::InsertContentControl {
            start: 0,
            end: 0,
            tag: ControlTag::Other("legacy".to_string()),
            title: String::new(),
        },
    ])
    .await
    .unwrap();

    let controls = doc.content_controls().await.unwrap();
    assert_eq!(controls.len(), 2);

    doc.execute(vec![Mutation::RemoveContentControl {
        tag: ControlTag::Critique { id: 1 },
    }])
    .await
    .unwrap();
    let controls = doc.content_controls().await.unwrap();
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0].tag, ControlTag::Other("legacy".to_string()));
}

#[tokio::test]
async fn test_edits_change_indices() {
    let doc = MemoryDocument::from_pairs(styled(&[(1, "H"), (0, "a")]));
    doc.insert_paragraph(1, "Heading 2", "Inserted").await;
    let paragraphs = doc.paragraphs().await.unwrap();
    assert_eq!(paragraphs.len(), 3);
    assert_eq!(paragraphs[1].heading_level, 2);
    assert_eq!(paragraphs[2].text, "a");

    doc.remove_paragraph(0).await;
    assert_eq!(doc.paragraphs().await.unwrap()[0].text, "Inserted");
}
