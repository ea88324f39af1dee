use std::fs;
use std::path::PathBuf;

use bonsai_config::{Config, ConfigError, Profile, RateLimitConfig};
use tempfile::TempDir;

#[cfg(unix)]
fn is_root() -> bool {
    std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn load_from_nonexistent_path_returns_default_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("config.toml");

    let config = Config::load_from_path(&path).expect("missing file is an empty config");

    assert!(config.profiles.is_empty());
    assert!(config.default_profile.is_none());
}

#[test]
fn load_empty_config_file_returns_default_config() {
    let (_dir, path) = write_config("");

    let config = Config::load_from_path(&path).expect("empty file should parse as default");

    assert_eq!(config, Config::default());
}

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let (_dir, path) = write_config("[[[broken");

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    assert!(err.to_string().starts_with("malformed bonsaictl config"));
}

#[test]
fn load_profile_missing_token_returns_error() {
    let (_dir, path) = write_config(
        r#"
[profiles.broken]
api_key = "key"
"#,
    );

    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn load_profile_with_blank_key_is_invalid() {
    let (_dir, path) = write_config(
        r#"
[profiles.blank]
api_key = "  "
api_token = "token"
"#,
    );

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidProfile { ref name, .. } if name == "blank"));
}

#[test]
fn load_dangling_default_profile_is_invalid() {
    let (_dir, path) = write_config(
        r#"
default_profile = "gone"

[profiles.kept]
api_key = "key"
api_token = "token"
"#,
    );

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("gone"));
}

#[test]
fn load_config_with_unknown_fields_ignores_them() {
    let (_dir, path) = write_config(
        r#"
unknown_top_level_key = "hello"

[profiles.dev]
api_key = "key"
api_token = "token"
totally_unknown_field = true
"#,
    );

    let config = Config::load_from_path(&path).expect("unknown fields should be ignored");
    assert!(config.profiles.contains_key("dev"));
}

#[test]
fn load_rate_limit_overrides() {
    let (_dir, path) = write_config(
        r#"
[profiles.ci]
api_key = "key"
api_token = "token"
api_url = "http://localhost:8080"

[profiles.ci.rate_limit]
default_burst = 10
provision_burst = 1
"#,
    );

    let config = Config::load_from_path(&path).unwrap();
    let profile = config.profile("ci").unwrap();
    assert_eq!(profile.api_url, "http://localhost:8080");
    assert_eq!(profile.rate_limit().default_limit().0, 10);
    assert_eq!(profile.rate_limit().provision_limit().0, 1);
}

#[test]
fn save_creates_parent_directories_and_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("dir").join("config.toml");

    let mut config = Config::default();
    config.set_profile(
        "production",
        Profile::new("prod-key", "prod-token").with_rate_limit(RateLimitConfig {
            provision_interval_secs: Some(300),
            ..Default::default()
        }),
    );
    config.set_default_profile("production").unwrap();
    config.save_to_path(&path).unwrap();

    let loaded = Config::load_from_path(&path).unwrap();
    assert_eq!(loaded, config);

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("default_profile = \"production\""));
    assert!(raw.contains("[profiles.production]"));
}

#[cfg(unix)]
#[test]
fn load_unreadable_file_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let (_dir, path) = write_config("# valid toml");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

    let result = Config::load_from_path(&path);

    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }), "got {err:?}");
}

#[cfg(unix)]
#[test]
fn save_to_readonly_directory_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let readonly_dir = dir.path().join("readonly");
    fs::create_dir(&readonly_dir).unwrap();
    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o555)).unwrap();

    let result = Config::default().save_to_path(&readonly_dir.join("config.toml"));

    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o755)).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, ConfigError::Write { .. }), "got {err:?}");
}
