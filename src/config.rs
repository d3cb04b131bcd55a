use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dictionary::DEFAULT_DICTIONARY_URL;
use crate::postprocess::PostprocessConfig;

const DEFAULT_DB_PATH: &str = "lexicam.db";
const DEFAULT_SOURCE_URL: &str = "stub://camera";
const DEFAULT_INTERVAL_MS: u64 = 1000;
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_BACKEND: &str = "stub";

#[derive(Debug, Deserialize, Default)]
struct LexicamConfigFile {
    db_path: Option<String>,
    autosave: Option<bool>,
    source: Option<SourceConfigFile>,
    detection: Option<DetectionConfigFile>,
    postprocess: Option<PostprocessConfigFile>,
    dictionary: Option<DictionaryConfigFile>,
    aliases_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    interval_ms: Option<u64>,
    backend: Option<String>,
    model_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct PostprocessConfigFile {
    confidence_floor: Option<f32>,
    min_extent: Option<f32>,
    overlap_threshold: Option<f32>,
    max_per_category: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct DictionaryConfigFile {
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LexicamConfig {
    pub db_path: String,
    /// Save every committed category to the vocabulary.
    pub autosave: bool,
    pub source: SourceSettings,
    pub detection: DetectionSettings,
    pub postprocess: PostprocessConfig,
    pub dictionary_url: String,
    pub aliases_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub interval: Duration,
    /// `stub` or `tract`.
    pub backend: String,
    pub model_path: Option<PathBuf>,
}

impl LexicamConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("LEXICAM_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: LexicamConfigFile) -> Result<Self> {
        let db_path = file.db_path.unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let source = SourceSettings {
            url: file
                .source
                .as_ref()
                .and_then(|source| source.url.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            width: file
                .source
                .as_ref()
                .and_then(|source| source.width)
                .unwrap_or(DEFAULT_FRAME_WIDTH),
            height: file
                .source
                .as_ref()
                .and_then(|source| source.height)
                .unwrap_or(DEFAULT_FRAME_HEIGHT),
        };
        let detection = DetectionSettings {
            interval: Duration::from_millis(
                file.detection
                    .as_ref()
                    .and_then(|d| d.interval_ms)
                    .unwrap_or(DEFAULT_INTERVAL_MS),
            ),
            backend: file
                .detection
                .as_ref()
                .and_then(|d| d.backend.clone())
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: file.detection.and_then(|d| d.model_path),
        };
        let defaults = PostprocessConfig::default();
        let postprocess = match file.postprocess {
            Some(pp) => PostprocessConfig {
                confidence_floor: pp.confidence_floor.unwrap_or(defaults.confidence_floor),
                min_extent: pp.min_extent.unwrap_or(defaults.min_extent),
                overlap_threshold: pp.overlap_threshold.unwrap_or(defaults.overlap_threshold),
                max_per_category: pp.max_per_category.unwrap_or(defaults.max_per_category),
            },
            None => defaults,
        };
        let dictionary_url = file
            .dictionary
            .and_then(|d| d.url)
            .unwrap_or_else(|| DEFAULT_DICTIONARY_URL.to_string());
        Ok(Self {
            db_path,
            autosave: file.autosave.unwrap_or(false),
            source,
            detection,
            postprocess,
            dictionary_url,
            aliases_path: file.aliases_path,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("LEXICAM_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = path;
            }
        }
        if let Ok(url) = std::env::var("LEXICAM_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(interval) = std::env::var("LEXICAM_INTERVAL_MS") {
            let ms: u64 = interval.trim().parse().map_err(|_| {
                anyhow!("LEXICAM_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.detection.interval = Duration::from_millis(ms);
        }
        if let Some(v) = env_f32("LEXICAM_CONFIDENCE_FLOOR")? {
            self.postprocess.confidence_floor = v;
        }
        if let Some(v) = env_f32("LEXICAM_MIN_EXTENT")? {
            self.postprocess.min_extent = v;
        }
        if let Some(v) = env_f32("LEXICAM_OVERLAP_THRESHOLD")? {
            self.postprocess.overlap_threshold = v;
        }
        if let Ok(max) = std::env::var("LEXICAM_MAX_PER_CATEGORY") {
            self.postprocess.max_per_category = max
                .trim()
                .parse()
                .map_err(|_| anyhow!("LEXICAM_MAX_PER_CATEGORY must be a non-negative integer"))?;
        }
        if let Ok(url) = std::env::var("LEXICAM_DICTIONARY_URL") {
            if !url.trim().is_empty() {
                self.dictionary_url = url;
            }
        }
        if let Ok(path) = std::env::var("LEXICAM_ALIASES_PATH") {
            if !path.trim().is_empty() {
                self.aliases_path = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.postprocess.validate()?;
        if self.detection.interval.is_zero() {
            return Err(anyhow!("detection interval must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("frame size must be non-zero"));
        }
        self.detection.backend = self.detection.backend.trim().to_lowercase();
        match self.detection.backend.as_str() {
            "stub" => {}
            "tract" => {
                if self.detection.model_path.is_none() {
                    return Err(anyhow!("the tract backend requires detection.model_path"));
                }
            }
            other => return Err(anyhow!("unknown detection backend '{}'", other)),
        }
        url::Url::parse(&self.dictionary_url)
            .map_err(|e| anyhow!("invalid dictionary url {}: {}", self.dictionary_url, e))?;
        Ok(())
    }
}

fn env_f32(key: &str) -> Result<Option<f32>> {
    match std::env::var(key) {
        Ok(raw) => {
            let value: f32 = raw
                .trim()
                .parse()
                .map_err(|_| anyhow!("{} must be a number", key))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<LexicamConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
