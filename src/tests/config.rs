use super::Config;
use log::LevelFilter;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_empty_file_gives_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.hidden_style, "HiddenContent");
    assert_eq!(config.visible_style, "Normal");
    assert_eq!(config.refresh_wait(), Duration::from_millis(2000));
    assert_eq!(config.model, "gpt-4o");
    assert_eq!(config.max_tokens, 2000);
    assert_eq!(config.level_filter(), LevelFilter::Info);
}

#[test]
fn test_file_overrides_selected_keys() {
    let config = Config::from_toml(
        "hidden_style = \"Collapsed\"\nrefresh_debounce_ms = 500\nlog_level = \"debug\"\n",
    )
    .unwrap();
    let styles = config.visibility_styles();
    assert_eq!(styles.hidden, "Collapsed");
    assert_eq!(styles.visible, "Normal");
    assert_eq!(config.refresh_wait(), Duration::from_millis(500));
    assert_eq!(config.level_filter(), LevelFilter::Debug);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("sectional.toml")).unwrap();
    assert_eq!(config.file_extensions, crate::formats::supported_extensions());
}

#[test]
fn test_default_extensions_cover_every_format() {
    let config = Config::from_toml("").unwrap();
    for ext in ["md", "markdown", "json", "jsonl", "ndjson"] {
        assert!(
            config.file_extensions.iter().any(|e| e == ext),
            "{ext} missing from defaults"
        );
    }
}

#[test]
fn test_unknown_log_level_falls_back_to_info() {
    let config = Config::from_toml("log_level = \"chatty\"").unwrap();
    assert_eq!(config.level_filter(), LevelFilter::Info);
}
