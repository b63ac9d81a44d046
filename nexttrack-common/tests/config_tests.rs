//! Configuration resolution tests

use nexttrack_common::config::{
    load_toml_config, resolve_config, ENV_SPOTIFY_CLIENT_ID, ENV_SPOTIFY_CLIENT_SECRET,
};
use serial_test::serial;
use std::io::Write;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn clear_env() {
    std::env::remove_var(ENV_SPOTIFY_CLIENT_ID);
    std::env::remove_var(ENV_SPOTIFY_CLIENT_SECRET);
}

#[test]
#[serial]
fn toml_values_are_loaded() {
    clear_env();
    let file = write_config(
        r#"
spotify_client_id = "toml-id"
spotify_client_secret = "toml-secret"
contact = "admin@example.com"
"#,
    );

    let config = resolve_config(Some(file.path())).unwrap();
    assert_eq!(config.spotify_client_id.as_deref(), Some("toml-id"));
    assert_eq!(config.spotify_client_secret.as_deref(), Some("toml-secret"));
    assert_eq!(config.contact.as_deref(), Some("admin@example.com"));
}

#[test]
#[serial]
fn env_overrides_toml() {
    clear_env();
    let file = write_config(r#"spotify_client_id = "toml-id""#);

    std::env::set_var(ENV_SPOTIFY_CLIENT_ID, "env-id");
    let config = resolve_config(Some(file.path())).unwrap();
    clear_env();

    assert_eq!(config.spotify_client_id.as_deref(), Some("env-id"));
}

#[test]
#[serial]
fn missing_file_yields_empty_config() {
    clear_env();
    let config = resolve_config(Some(std::path::Path::new("/nonexistent/config.toml"))).unwrap();
    assert!(config.spotify_client_id.is_none());
    assert!(config.spotify_credentials().is_none());
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    clear_env();
    let file = write_config("spotify_client_id = [not toml");
    assert!(resolve_config(Some(file.path())).is_err());
}

#[test]
fn load_toml_config_absent_file() {
    let loaded = load_toml_config(std::path::Path::new("/nonexistent/config.toml")).unwrap();
    assert!(loaded.is_none());
}
