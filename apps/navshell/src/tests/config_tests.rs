use super::{apply_env_overrides, load_settings, parse_settings, Settings};

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn partial_file_keeps_defaults_for_missing_keys() {
    let settings = parse_settings("origin = \"http://site.test\"\n").expect("parse");
    assert_eq!(settings.origin, "http://site.test");
    assert_eq!(settings.start, Settings::default().start);
    assert_eq!(settings.timeout_ms, 10_000);
}

#[test]
fn rejects_wrong_types() {
    assert!(parse_settings("timeout_ms = \"soon\"\n").is_err());
}

#[test]
fn env_overrides_file_values() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("NAVSHELL_ORIGIN", "http://env.test"),
        ("NAVSHELL_MENU", "env-menu.toml"),
        ("NAVSHELL_TIMEOUT_MS", "250"),
    ]);
    let mut settings = Settings::default();

    apply_env_overrides(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.origin, "http://env.test");
    assert_eq!(settings.menu_path, PathBuf::from("env-menu.toml"));
    assert_eq!(settings.start, "/");
    assert_eq!(settings.timeout().as_millis(), 250);
}

#[test]
fn unparsable_timeout_override_is_ignored() {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, |key| {
        (key == "NAVSHELL_TIMEOUT_MS").then(|| "fast".to_string())
    });
    assert_eq!(settings.timeout_ms, 10_000);
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let err = load_settings(Some(Path::new("/definitely/not/here/navshell.toml")))
        .expect_err("must fail");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn loads_explicit_config_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("navshell_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("navshell.toml");
    fs::write(&path, "start = \"/about\"\ntimeout_ms = 500\n").expect("write config");

    let settings = load_settings(Some(&path)).expect("load");

    assert_eq!(settings.start, "/about");
    assert_eq!(settings.timeout_ms, 500);

    fs::remove_dir_all(temp_root).expect("cleanup");
}
