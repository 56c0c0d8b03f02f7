/// Configuration system for insightboard.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::BoardConfig::default()`]
/// 2. **User global config**: `~/.insightboard/config.toml`
/// 3. **Project local config**: `.insightboard.toml` in the current directory
/// 4. **Environment variables**: `INSIGHTBOARD_*` overrides (highest precedence)
///
/// Later layers replace earlier ones. Missing sections in a TOML file fall
/// back to built-in defaults.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::chart::ChartType;

pub use schema::BoardConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> BoardConfig {
    let mut config = BoardConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A broken config file never stops the dashboard.
fn load_toml_file(path: Option<PathBuf>) -> Option<BoardConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.insightboard/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".insightboard").join("config.toml"))
}

/// Path to the project local config: `.insightboard.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".insightboard.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `INSIGHTBOARD_BASE_URL`: data API base URL
/// - `INSIGHTBOARD_TIMEOUT_MS`: request timeout
/// - `INSIGHTBOARD_WEB_ADDR`: dashboard listen address
/// - `INSIGHTBOARD_CHART`: default chart type
/// - `INSIGHTBOARD_LOG`: fetch log on/off (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut BoardConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("INSIGHTBOARD_BASE_URL")
        && !val.is_empty()
    {
        config.source.base_url = val;
    }
    if let Some(val) = var("INSIGHTBOARD_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.source.timeout_ms = ms;
    }
    if let Some(val) = var("INSIGHTBOARD_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Some(val) = var("INSIGHTBOARD_CHART")
        && let Some(chart_type) = ChartType::from_str_opt(&val)
    {
        config.chart.default_type = chart_type;
    }
    if let Some(val) = var("INSIGHTBOARD_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.insightboard/config.toml`.
///
/// Creates the directory if it doesn't exist. Returns an error if the file
/// already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.insightboard/ directory")?;
    }

    fs::write(&path, BoardConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key in the global config file.
///
/// Supports dotted keys like `source.base_url`. The resulting file must
/// still deserialize as a [`BoardConfig`], so a value of the wrong shape
/// (e.g. `chart.default_type = "radar"`) is rejected before writing.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&BoardConfig::default())
            .context("failed to serialize default config")?
    };

    let updated = update_toml_text(&content, key, value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(())
}

/// Apply a dotted-key update to TOML text and validate the result.
fn update_toml_text(content: &str, key: &str, value: &str) -> Result<String> {
    let mut root: toml::Value =
        toml::from_str(content).context("failed to parse config as TOML value")?;

    set_toml_value(&mut root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    let _: BoardConfig = toml::from_str(&output)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;
    Ok(output)
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The key must already exist; its current type decides how `raw_value`
/// is parsed.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section_path, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must be dotted, e.g. 'source.base_url'");
    };

    let mut current = root;
    for part in section_path.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section_path}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected number for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = BoardConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("INSIGHTBOARD_BASE_URL", "http://data:8000"),
                ("INSIGHTBOARD_TIMEOUT_MS", "2500"),
                ("INSIGHTBOARD_CHART", "Timeline"),
                ("INSIGHTBOARD_LOG", "0"),
            ]),
        );
        assert_eq!(config.source.base_url, "http://data:8000");
        assert_eq!(config.source.timeout_ms, 2500);
        assert_eq!(config.chart.default_type, ChartType::Timeline);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = BoardConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("INSIGHTBOARD_TIMEOUT_MS", "soon"),
                ("INSIGHTBOARD_CHART", "radar"),
                ("INSIGHTBOARD_BASE_URL", ""),
            ]),
        );
        assert_eq!(config, BoardConfig::default());
    }

    #[test]
    fn set_toml_value_updates_string() {
        let toml_str = r#"
[source]
base_url = "http://localhost:5000"
"#;
        let mut root: toml::Value = toml::from_str(toml_str).unwrap();
        set_toml_value(&mut root, "source.base_url", "http://other:1").unwrap();
        assert_eq!(root["source"]["base_url"].as_str(), Some("http://other:1"));
    }

    #[test]
    fn set_toml_value_updates_typed_values() {
        let toml_str = r#"
[source]
timeout_ms = 100
server_side_filters = false

[chart]
band_padding = 0.1
"#;
        let mut root: toml::Value = toml::from_str(toml_str).unwrap();
        set_toml_value(&mut root, "source.timeout_ms", "50").unwrap();
        set_toml_value(&mut root, "source.server_side_filters", "yes").unwrap();
        set_toml_value(&mut root, "chart.band_padding", "0.25").unwrap();

        assert_eq!(root["source"]["timeout_ms"].as_integer(), Some(50));
        assert_eq!(root["source"]["server_side_filters"].as_bool(), Some(true));
        assert_eq!(root["chart"]["band_padding"].as_float(), Some(0.25));
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root: toml::Value = toml::from_str("[source]\nbase_url = \"x\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "v").is_err());
        assert!(set_toml_value(&mut root, "source.nope", "v").is_err());
        assert!(set_toml_value(&mut root, "undotted", "v").is_err());
    }

    #[test]
    fn update_rejects_invalid_chart_type() {
        let defaults = toml::to_string_pretty(&BoardConfig::default()).unwrap();
        assert!(update_toml_text(&defaults, "chart.default_type", "radar").is_err());
        let ok = update_toml_text(&defaults, "chart.default_type", "pie").unwrap();
        let config: BoardConfig = toml::from_str(&ok).unwrap();
        assert_eq!(config.chart.default_type, ChartType::Pie);
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: BoardConfig = toml::from_str(&toml_str).unwrap();
    }
}
