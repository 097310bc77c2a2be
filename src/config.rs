use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sampler::{DEFAULT_SHUFFLE_THRESHOLD, DrawStrategy, ReseedPolicy, SamplerOptions};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_dict_paths")]
    pub dict_paths: Vec<PathBuf>,
    #[serde(default = "default_template_paths")]
    pub template_paths: Vec<PathBuf>,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub strategy: DrawStrategy,
    #[serde(default)]
    pub reseed: ReseedPolicy,
    #[serde(default = "default_shuffle_threshold")]
    pub shuffle_threshold: u64,
}

fn default_dict_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("data/dicts")]
}
fn default_template_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("data/prompts")]
}
fn default_count() -> usize {
    10
}
fn default_shuffle_threshold() -> u64 {
    DEFAULT_SHUFFLE_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dict_paths: default_dict_paths(),
            template_paths: default_template_paths(),
            count: default_count(),
            seed: None,
            strategy: DrawStrategy::default(),
            reseed: ReseedPolicy::default(),
            shuffle_threshold: default_shuffle_threshold(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the user config directory when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(Self::config_path, Path::to_path_buf);
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("failed to parse config {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = path.map_or_else(Self::config_path, Path::to_path_buf);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prope")
            .join("config.toml")
    }

    pub fn sampler_options(&self) -> SamplerOptions {
        SamplerOptions {
            seed: self.seed,
            strategy: self.strategy,
            reseed: self.reseed,
            shuffle_threshold: self.shuffle_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.count, 10);
        assert_eq!(config.seed, None);
        assert_eq!(config.strategy, DrawStrategy::Auto);
        assert_eq!(config.reseed, ReseedPolicy::Fresh);
    }

    #[test]
    fn test_config_partial_file() {
        let toml_str = r#"
dict_paths = ["data/dicts", "extra.json"]
count = 3
seed = 99
strategy = "rejection"
reseed = "replay"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.dict_paths,
            vec![PathBuf::from("data/dicts"), PathBuf::from("extra.json")]
        );
        assert_eq!(config.template_paths, default_template_paths());
        assert_eq!(config.count, 3);

        let options = config.sampler_options();
        assert_eq!(options.seed, Some(99));
        assert_eq!(options.strategy, DrawStrategy::Rejection);
        assert_eq!(options.reseed, ReseedPolicy::Replay);
        assert_eq!(options.shuffle_threshold, DEFAULT_SHUFFLE_THRESHOLD);
    }

    #[test]
    fn test_config_rejects_unknown_strategy() {
        assert!(toml::from_str::<Config>(r#"strategy = "bogus""#).is_err());
    }

    #[test]
    fn test_config_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.seed = Some(7);
        config.strategy = DrawStrategy::Shuffle;
        config.save(Some(&path)).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_config_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }
}
