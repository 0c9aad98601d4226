use super::*;

#[test]
fn test_empty_file_gives_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.search.topics.len(), 7);
    assert_eq!(config.search.topics[0], "medical technology innovations");
    assert_eq!(config.search.limit_per_source, 3);
    assert_eq!(config.search.lookback_days, 1);
    assert_eq!(config.llm.models.len(), 7);
    assert!(config.llm.models.iter().all(|m| m.starts_with("huggingface_")));
    assert_eq!(config.llm.retry_delay_secs, 20);
    assert_eq!(config.output.dir, PathBuf::from("results"));
}

#[test]
fn test_serde_defaults_match_default_impl() {
    let parsed = Config::from_toml("").unwrap();
    let built = Config::default();
    assert_eq!(parsed.search.topics, built.search.topics);
    assert_eq!(parsed.search.required_fields, built.search.required_fields);
    assert_eq!(parsed.llm.models, built.llm.models);
    assert_eq!(parsed.llm.chunk_size, built.llm.chunk_size);
    assert_eq!(parsed.sources.pubmed, built.sources.pubmed);
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let config = Config::from_toml(
        r#"
        [search]
        topics = ["wearable sensors"]
        topic_delay_ms = 0

        [llm]
        models = ["huggingface_flan_t5"]
        parallel = false
        "#,
    )
    .unwrap();
    assert_eq!(config.search.topics, vec!["wearable sensors"]);
    assert_eq!(config.search.limit_per_source, 3);
    assert!(!config.llm.parallel);
    assert_eq!(config.llm.api_key_env, "HF_API_KEY");
    assert!(config.output.csv);

    let search = config.search_settings();
    assert!(search.topic_delay.is_zero());
}

#[test]
fn test_rejects_unknown_required_field() {
    let err = Config::from_toml("[search]\nrequired_fields = [\"title\", \"doi\"]").unwrap_err();
    assert!(err.to_string().contains("doi"));
}

#[test]
fn test_rejects_all_sources_disabled() {
    let toml = "[sources]\npubmed = false\nclinicaltrials = false\nmedrxiv = false";
    assert!(matches!(Config::from_toml(toml), Err(MedpulseError::Config(_))));
}

#[test]
fn test_rejects_zero_limit_and_empty_models() {
    assert!(Config::from_toml("[search]\nlimit_per_source = 0").is_err());
    assert!(Config::from_toml("[llm]\nmodels = []").is_err());
}

#[test]
fn test_rejects_chunk_size_above_input_budget() {
    let err = Config::from_toml("[llm]\nchunk_size = 400\nmax_input_chars = 200").unwrap_err();
    assert!(matches!(err, MedpulseError::Config(ref m) if m.contains("llm.chunk_size")));
    assert!(Config::from_toml("[llm]\nchunk_size = 200\nmax_input_chars = 200").is_ok());
}

#[test]
fn test_lookback_zero_disables_window() {
    let config = Config::from_toml("[search]\nlookback_days = 0").unwrap();
    assert_eq!(config.source_settings().lookback_days, None);
    assert_eq!(Config::default().source_settings().lookback_days, Some(1));
}

#[test]
fn test_missing_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.search.topics.len(), 7);
}

#[test]
fn test_load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medpulse.toml");
    std::fs::write(&path, "[output]\ndir = \"out\"\npdf = false\n").unwrap();
    let config = Config::load(&path).unwrap();
    assert_eq!(config.output.dir, PathBuf::from("out"));
    assert!(!config.output.pdf);
}

#[test]
fn test_explicit_path_wins() {
    let p = Path::new("/tmp/custom.toml");
    assert_eq!(Config::resolve_path(Some(p)), PathBuf::from("/tmp/custom.toml"));
}

#[test]
fn test_huggingface_settings_conversion() {
    let config = Config::from_toml("[llm]\nretry_delay_secs = 2\nchunk_size = 800\n").unwrap();
    let hf = config.huggingface_settings();
    assert_eq!(hf.retry_delay, Duration::from_secs(2));
    assert_eq!(hf.chunk_size, 800);
    assert_eq!(hf.timeout, Duration::from_secs(30));
}

#[test]
fn test_example_file_matches_defaults() {
    let example = Config::from_toml(include_str!("../../../../medpulse.example.toml")).unwrap();
    let defaults = Config::default();
    assert_eq!(example.search.topics, defaults.search.topics);
    assert_eq!(example.llm.models, defaults.llm.models);
    assert_eq!(example.llm.base_url, defaults.llm.base_url);
    assert_eq!(example.output.dir, defaults.output.dir);
}
