use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants::constants;

/// User preferences persisted to `prefs.toml` in the platform config dir.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Gemini model override (defaults to `gemini_model` in constants.ron).
  pub model: Option<String>,
  /// Fallback API key when the environment variable is unset.
  pub api_key: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ytquiz") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ytquiz") {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Resolve the API key: environment variable first, then the config file.
  pub fn resolve_api_key(&self) -> Option<String> {
    let from_env = std::env::var(&constants().api_key_env).ok();
    pick_api_key(from_env, self.api_key.clone())
  }

  /// Resolve the model: CLI flag, then config file, then the built-in default.
  pub fn resolve_model(&self, cli: Option<&str>) -> String {
    cli
      .map(str::to_string)
      .or_else(|| self.model.clone())
      .map(|m| m.trim().to_string())
      .filter(|m| !m.is_empty())
      .unwrap_or_else(|| constants().gemini_model.clone())
  }
}

fn pick_api_key(from_env: Option<String>, from_config: Option<String>) -> Option<String> {
  [from_env, from_config].into_iter().flatten().map(|k| k.trim().to_string()).find(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn api_key_prefers_env() {
    assert_eq!(pick_api_key(Some("env".into()), Some("cfg".into())).as_deref(), Some("env"));
  }

  #[test]
  fn api_key_skips_blank_env() {
    assert_eq!(pick_api_key(Some("  ".into()), Some("cfg".into())).as_deref(), Some("cfg"));
    assert_eq!(pick_api_key(None, None), None);
  }

  #[test]
  fn model_resolution_order() {
    let config = Config { model: Some("gemini-2.5-pro".into()), ..Config::default() };
    assert_eq!(config.resolve_model(Some("custom")), "custom");
    assert_eq!(config.resolve_model(None), "gemini-2.5-pro");
    assert_eq!(Config::default().resolve_model(None), constants().gemini_model);
    assert_eq!(Config::default().resolve_model(Some(" ")), constants().gemini_model);
  }

  #[test]
  fn config_roundtrips_through_toml() {
    let config = Config { theme_name: Some("Paper".into()), model: None, api_key: None };
    let text = toml::to_string(&config).unwrap();
    let back: Config = toml::from_str(&text).unwrap();
    assert_eq!(back, config);
  }
}
