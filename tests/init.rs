use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_vitae"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "vitae init failed: {}", String::from_utf8_lossy(&output.stderr));

    let config_path = dir.path().join(".vitae.toml");
    assert!(config_path.exists(), ".vitae.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[tokenizer]"));
    assert!(content.contains("[chunker]"));
    assert!(content.contains("[vectorizer]"));
    assert!(content.contains("[query]"));

    // Commented-out template parses to the defaults
    let config: vitae_core::VitaeConfig = toml::from_str(&content).unwrap();
    assert_eq!(config, vitae_core::VitaeConfig::default());
}

#[test]
fn init_template_values_match_defaults_when_uncommented() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_vitae"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let content = std::fs::read_to_string(dir.path().join(".vitae.toml")).unwrap();
    let uncommented: String = content
        .lines()
        .filter_map(|line| {
            if line.starts_with('[') {
                return Some(line);
            }
            let setting = line.strip_prefix("# ")?;
            let is_key = setting.starts_with(|c: char| c.is_ascii_lowercase()) && setting.contains(" = ");
            (is_key && !setting.starts_with("stopwords")).then_some(setting)
        })
        .map(|line| format!("{line}\n"))
        .collect();

    let config = vitae_core::VitaeConfig::from_toml(&uncommented).unwrap();
    assert_eq!(config, vitae_core::VitaeConfig::default());
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".vitae.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_vitae"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".vitae.toml")).unwrap();
    assert_eq!(content, "# existing");
}
