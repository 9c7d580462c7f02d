use clap::Parser;
use curator::cli::Cli;
use curator::config::Settings;
use std::fs;
use tempfile::TempDir;
use tracing::Level;

#[test]
fn test_missing_file_uses_defaults() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = Settings::from_path(&temp_dir.path().join("absent.toml"))?;

    assert_eq!(settings.form.empty_option_label, "-- Select --");
    assert_eq!(settings.form.long_text_keywords, vec!["description".to_string()]);
    assert_eq!(settings.form.long_text_rows, 3);
    assert_eq!(settings.form.max_schema_depth, 20);
    assert_eq!(settings.log_level(), Level::INFO);
    Ok(())
}

#[test]
fn test_file_overrides_defaults() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("curator.toml");
    let curator_toml = r#"
[form]
empty_option_label = "(none)"
long_text_keywords = ["description", "notes"]
long_text_rows = 6

[logging]
level = "debug"
"#;
    fs::write(&path, curator_toml)?;

    let settings = Settings::from_path(&path)?;
    let options = settings.builder_options();
    assert_eq!(options.empty_option_label, "(none)");
    assert_eq!(options.long_text_keywords.len(), 2);
    assert_eq!(options.long_text_rows, 6);
    assert_eq!(settings.form.max_schema_depth, 20);
    assert_eq!(settings.log_level(), Level::DEBUG);
    Ok(())
}

#[test]
fn test_invalid_values_are_rejected() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("curator.toml");
    fs::write(&path, "[form]\nlong_text_rows = 0\n\n[logging]\nlevel = \"chatty\"\n")?;

    let err = Settings::from_path(&path).unwrap_err().to_string();
    assert!(err.contains("form.long_text_rows"));
    assert!(err.contains("logging.level"));
    Ok(())
}

#[test]
fn test_cli_log_level_overrides_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("curator.toml");
    fs::write(&path, "[logging]\nlevel = \"warn\"\n")?;

    let config = path.to_string_lossy().to_string();
    let cli = Cli::parse_from(["curator", "--config", &config, "--log-level", "trace", "deck", "d.json"]);
    let settings = Settings::new_with_cli(&cli)?;
    assert_eq!(settings.log_level(), Level::TRACE);
    Ok(())
}
