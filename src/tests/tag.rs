use super::ControlTag;

#[test]
fn test_parses_known_prefixes() {
    assert_eq!(ControlTag::parse("critique-3"), ControlTag::Critique { id: 3 });
    assert_eq!(ControlTag::parse("para-12"), ControlTag::Paragraph { index: 12 });
    assert_eq!(ControlTag::parse("section-0"), ControlTag::Section { index: 0 });
}

#[test]
fn test_malformed_suffix_is_other() {
    for raw in ["critique-", "critique-x", "para--1", "section-1a", "Critique-1", ""] {
        assert_eq!(ControlTag::parse(raw), ControlTag::Other(raw.to_string()));
    }
}

#[test]
fn test_leading_zero_suffix_is_other() {
    for raw in ["para-01", "critique-007", "section-00"] {
        let tag = ControlTag::parse(raw);
        assert_eq!(tag, ControlTag::Other(raw.to_string()));
        assert_eq!(tag.to_string(), raw);
    }
    assert_eq!(ControlTag::parse("para-0"), ControlTag::Paragraph { index: 0 });
    assert_eq!(ControlTag::parse("section-10"), ControlTag::Section { index: 10 });
}

#[test]
fn test_other_tags_are_preserved_verbatim() {
    let tag: ControlTag = "legal-review".parse().unwrap();
    assert_eq!(tag.to_string(), "legal-review");
    assert!(!tag.is_critique());
}

#[test]
fn test_display_matches_host_string_form() {
    assert_eq!(ControlTag::Critique { id: 7 }.to_string(), "critique-7");
    assert_eq!(ControlTag::Section { index: 4 }.to_string(), "section-4");
}

#[test]
fn test_serialises_as_plain_string() {
    let json = serde_json::to_string(&ControlTag::Paragraph { index: 2 }).unwrap();
    assert_eq!(json, "\"para-2\"");
    let back: ControlTag = serde_json::from_str("\"critique-9\"").unwrap();
    assert!(back.is_critique());
}
