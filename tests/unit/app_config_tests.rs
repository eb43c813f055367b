/*!
 * Tests for application configuration loading and validation
 */

use doctran::app_config::{Config, TranslationProvider};

use crate::common::{create_temp_dir, create_test_file};

/// The default configuration is valid as-is
#[test]
fn test_default_config_shouldValidate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
}

/// Accessors fall back to per-provider defaults
#[test]
fn test_provider_accessors_withDefaults_shouldResolvePerProvider() {
    let mut config = Config::default();

    config.translation.provider = TranslationProvider::Ollama;
    assert_eq!(config.translation.get_endpoint(), "http://localhost:11434");
    assert!(!config.translation.get_model().is_empty());

    config.translation.provider = TranslationProvider::Anthropic;
    assert_eq!(config.translation.get_endpoint(), "https://api.anthropic.com");
    assert_eq!(config.translation.get_timeout_secs(), 60);

    let anthropic = config
        .translation
        .get_provider_config(&TranslationProvider::Anthropic)
        .unwrap();
    assert_eq!(anthropic.concurrent_requests, 3);
}

/// Cloud providers require an API key to validate
#[test]
fn test_validate_withCloudProviderAndNoKey_shouldFail() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;

    assert!(config.validate().is_err());

    if let Some(provider) = config
        .translation
        .available_providers
        .iter_mut()
        .find(|p| p.provider_type == "openai")
    {
        provider.api_key = "sk-test".to_string();
    }
    assert!(config.validate().is_ok());
}

/// Identical source and target languages are rejected
#[test]
fn test_validate_withSameLanguages_shouldFail() {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "eng".to_string(); // same language, other code form

    assert!(config.validate().is_err());
}

/// Pipeline tuning values are bounds-checked
#[test]
fn test_validate_withBadPipelineSettings_shouldFail() {
    let mut config = Config::default();
    config.pipeline.min_overlap_fraction = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.pipeline.chunk_budget_tokens = 0;
    assert!(config.validate().is_err());
}

/// Configs round-trip through their JSON file form
#[test]
fn test_config_file_withRoundTrip_shouldPreserveSettings() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "de".to_string();
    config.pipeline.chunk_budget_tokens = 512;
    config.write_to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.target_language, "de");
    assert_eq!(loaded.pipeline.chunk_budget_tokens, 512);
}

/// Partial config files pick up serde defaults for missing sections
#[test]
fn test_config_file_withMinimalJson_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let dir_path = dir.path().to_path_buf();
    let content = r#"{
        "source_language": "en",
        "target_language": "ja",
        "translation": {}
    }"#;
    let path = create_test_file(&dir_path, "minimal.json", content).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.target_language, "ja");
    assert_eq!(config.pipeline.merge_gap_tolerance, 2);
    assert_eq!(config.pipeline.chunk_budget_tokens, 1000);
    assert_eq!(config.translation.common.retry_count, 3);
}

/// Provider identifiers parse case-insensitively
#[test]
fn test_provider_from_str_withMixedCase_shouldParse() {
    assert_eq!(
        "Anthropic".parse::<TranslationProvider>().unwrap(),
        TranslationProvider::Anthropic
    );
    assert_eq!(
        "LMSTUDIO".parse::<TranslationProvider>().unwrap(),
        TranslationProvider::LMStudio
    );
    assert!("unknown".parse::<TranslationProvider>().is_err());
}
