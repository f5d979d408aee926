use super::*;
use std::io::Write;

fn write_temp_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn default_config_targets_local_services() {
    let config = default_config();
    validate_config(&config).expect("defaults are valid");
    assert_eq!(
        config.endpoint(Capability::Crop).url,
        "http://localhost:5000/predict"
    );
    assert_eq!(
        config.endpoint(Capability::Nutrient).url,
        "http://localhost:5001/predict"
    );
    assert_eq!(
        config.endpoint(Capability::Fertilizer).url,
        "http://localhost:5002/predict"
    );
    assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let file = write_temp_config(
        r#"{"endpoints": {"crop": "http://models:9000/crop"}, "timeout_ms": null}"#,
    );
    let config = load_config(file.path()).expect("load partial config");

    assert_eq!(config.endpoints.crop, "http://models:9000/crop");
    assert_eq!(config.endpoints.nutrient, "http://localhost:5001/predict");
    assert_eq!(config.schema_version, CONFIG_SCHEMA_VERSION);
    assert_eq!(config.timeout(), None);
}

#[test]
fn resolve_prefers_explicit_file() {
    let file = write_temp_config(r#"{"endpoints": {"fertilizer": "http://fert:1/p"}}"#);
    let config = resolve_config(Some(file.path())).expect("resolve config");
    assert_eq!(config.endpoints.fertilizer, "http://fert:1/p");
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_temp_config(r#"{"endpoint": {}}"#);
    let err = load_config(file.path()).expect_err("typo should fail");
    assert!(format!("{err:#}").contains("unknown field"));
}

#[test]
fn env_overrides_replace_credentials() {
    let mut config = default_config();
    config.weather_api_key = Some("from-file".to_string());
    apply_env_overrides(&mut config, |name| match name {
        WEATHER_KEY_ENV => Some("from-env".to_string()),
        GEOCODE_TOKEN_ENV => Some("   ".to_string()),
        _ => None,
    });
    assert_eq!(config.weather_api_key.as_deref(), Some("from-env"));
    assert_eq!(config.geocode_token, None);
    assert_eq!(
        config.endpoint(Capability::Weather).credential.as_deref(),
        Some("from-env")
    );
}

#[test]
fn validate_rejects_bad_values() {
    let mut config = default_config();
    config.schema_version = 9;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.endpoints.crop = "not a url".to_string();
    let err = validate_config(&config).expect_err("bad url");
    assert!(err.to_string().contains("endpoints.crop"));

    let mut config = default_config();
    config.timeout_ms = Some(0);
    assert!(validate_config(&config).is_err());
}

#[test]
fn rendered_config_hides_credentials() {
    let mut config = default_config();
    config.geocode_token = Some("pk.secret".to_string());
    let text = render_config(&config).expect("render");
    assert!(!text.contains("pk.secret"));
    assert!(text.contains("<redacted>"));
}
