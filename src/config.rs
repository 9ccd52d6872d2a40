use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;

use crate::constants::constants;

const APP_NAME: &str = "clipseek";

/// User preferences persisted in `prefs.toml`.
#[derive(Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub backend_url: Option<String>,
  pub backend_command: Option<String>,
  #[serde(default)]
  pub backend_args: Vec<String>,
  pub caption_lang: Option<String>,
  pub autoplay: Option<bool>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = Self::parse(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }
}

/// Directory for the log file; falls back to the temp dir when no home is known.
pub fn log_dir() -> PathBuf {
  ProjectDirs::from("", "", APP_NAME).map(|d| d.data_dir().to_path_buf()).unwrap_or_else(std::env::temp_dir)
}

/// Command-line values that take precedence over `prefs.toml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
  pub backend_url: Option<String>,
  pub backend_command: Option<String>,
  pub backend_args: Vec<String>,
  pub caption_lang: Option<String>,
  pub no_autoplay: bool,
}

/// Which transport the search backend is reached through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSpec {
  Http { url: String },
  Command { program: String, args: Vec<String> },
}

/// Effective runtime settings after merging CLI, config file, and constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub backend: BackendSpec,
  pub caption_lang: String,
  pub autoplay: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self::resolve(Overrides::default(), Config::default())
  }
}

impl Settings {
  /// CLI beats the config file, which beats the compiled-in defaults. A backend chosen on the
  /// command line replaces the file's backend entirely, whichever transport either one names.
  pub fn resolve(cli: Overrides, file: Config) -> Self {
    let backend = if let Some(program) = cli.backend_command {
      BackendSpec::Command { program, args: cli.backend_args }
    } else if let Some(url) = cli.backend_url {
      BackendSpec::Http { url }
    } else if let Some(program) = file.backend_command {
      BackendSpec::Command { program, args: file.backend_args }
    } else {
      BackendSpec::Http { url: file.backend_url.unwrap_or_else(|| constants().default_backend_url.clone()) }
    };

    let caption_lang = cli
      .caption_lang
      .or(file.caption_lang)
      .map(|l| l.trim().to_string())
      .filter(|l| !l.is_empty())
      .unwrap_or_else(|| constants().caption_lang.clone());

    let autoplay = !cli.no_autoplay && file.autoplay.unwrap_or(true);

    Self { backend, caption_lang, autoplay }
  }
}
