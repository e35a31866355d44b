use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Version understood by this crate.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlideshowConfig {
    pub version: u32,
    /// Displacement map shown first; falls back to the head of `displacements`.
    #[serde(default)]
    pub displacement: Option<PathBuf>,
    /// Alternative displacement maps the window host can cycle through.
    #[serde(default)]
    pub displacements: Vec<PathBuf>,
    #[serde(default)]
    pub slides: Vec<PathBuf>,
    #[serde(default)]
    pub transition: TransitionSettings,
    #[serde(default)]
    pub window: WindowSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionSettings {
    #[serde(
        default = "default_settle_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub settle_delay: Duration,
    #[serde(default = "default_decay")]
    pub decay: f64,
    #[serde(default = "default_snap_threshold")]
    pub snap_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "default_size", deserialize_with = "deserialize_size")]
    pub size: (u32, u32),
    #[serde(default, deserialize_with = "deserialize_antialias_opt")]
    pub antialias: Option<AntialiasSetting>,
    #[serde(default = "default_title")]
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }
}

impl fmt::Display for AntialiasSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Off => f.write_str("off"),
            Self::Samples2 => f.write_str("2"),
            Self::Samples4 => f.write_str("4"),
            Self::Samples8 => f.write_str("8"),
            Self::Samples16 => f.write_str("16"),
        }
    }
}

pub fn default_settle_delay() -> Duration {
    Duration::from_millis(1700)
}

fn default_decay() -> f64 {
    0.04
}

fn default_snap_threshold() -> f64 {
    88.5
}

fn default_size() -> (u32, u32) {
    (1280, 720)
}

fn default_title() -> String {
    "slidewall".to_string()
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            settle_delay: default_settle_delay(),
            decay: default_decay(),
            snap_threshold: default_snap_threshold(),
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            size: default_size(),
            antialias: None,
            title: default_title(),
        }
    }
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            displacement: None,
            displacements: Vec::new(),
            slides: Vec::new(),
            transition: TransitionSettings::default(),
            window: WindowSettings::default(),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_duration(v).map_err(E::custom)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<(u32, u32), D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Pair([u32; 2]),
    }

    match Helper::deserialize(deserializer)? {
        Helper::Str(raw) => parse_size(&raw).map_err(de::Error::custom),
        Helper::Pair([width, height]) => Ok((width, height)),
    }
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(parse_antialias(&raw).map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            let raw = value.to_string();
            Some(parse_antialias(&raw).map_err(de::Error::custom)?)
        }
    };
    Ok(result)
}

/// Parses `"2s"`, `"1700ms"` or a bare number of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if let Ok(seconds) = trimmed.parse::<f64>() {
        if !seconds.is_finite() || seconds.is_sign_negative() {
            return Err(format!("invalid duration '{raw}': must be non-negative"));
        }
        return Ok(Duration::from_secs_f64(seconds));
    }
    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{raw}': {err}"))
}

/// Parses a `WIDTHxHEIGHT` window size.
pub fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let normalized = raw.trim().to_ascii_lowercase();
    let (width, height) = normalized
        .split_once('x')
        .ok_or_else(|| format!("invalid size '{raw}'; expected WIDTHxHEIGHT"))?;
    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid width in '{raw}': {err}"))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid height in '{raw}': {err}"))?;
    Ok((width, height))
}

pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

impl SlideshowConfig {
    /// Parses a configuration and checks its settings.
    ///
    /// The image lists are not required here so that a file can carry only
    /// tuning values while the slides come from the command line; call
    /// [`SlideshowConfig::validate`] once everything has been merged.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SlideshowConfig = toml::from_str(input)?;
        raw.validate_settings()?;
        Ok(raw)
    }

    /// Loads a configuration file, resolving relative image paths against
    /// the directory that contains it.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Joins every relative image path onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        if let Some(displacement) = self.displacement.as_mut() {
            resolve(displacement);
        }
        self.displacements.iter_mut().for_each(resolve);
        self.slides.iter_mut().for_each(resolve);
    }

    /// Displacement maps in cycling order, starting with the initial one.
    pub fn displacement_cycle(&self) -> Vec<PathBuf> {
        let mut cycle: Vec<PathBuf> = Vec::new();
        for path in self.displacement.iter().chain(self.displacements.iter()) {
            if !cycle.contains(path) {
                cycle.push(path.clone());
            }
        }
        cycle
    }

    pub fn initial_displacement(&self) -> Option<&Path> {
        self.displacement
            .as_deref()
            .or_else(|| self.displacements.first().map(PathBuf::as_path))
    }

    /// Checks settings and image lists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_settings()?;

        if self.initial_displacement().is_none() {
            return Err(ConfigError::Invalid(
                "a displacement map is required (set 'displacement' or 'displacements')".into(),
            ));
        }

        if self.slides.is_empty() {
            return Err(ConfigError::Invalid(
                "config must list at least one slide".into(),
            ));
        }

        for path in self.displacement_cycle().iter().chain(self.slides.iter()) {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("image paths may not be empty".into()));
            }
        }

        Ok(())
    }

    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        let transition = &self.transition;
        if !(transition.decay > 0.0 && transition.decay <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "transition.decay must be in (0, 1], got {}",
                transition.decay
            )));
        }

        if !(transition.snap_threshold > 0.0 && transition.snap_threshold < 90.0) {
            return Err(ConfigError::Invalid(format!(
                "transition.snap_threshold must be in (0, 90), got {}",
                transition.snap_threshold
            )));
        }

        if transition.settle_delay.is_zero() {
            return Err(ConfigError::Invalid(
                "transition.settle_delay must be greater than zero".into(),
            ));
        }

        let (width, height) = self.window.size;
        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window.size must be non-zero, got {width}x{height}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1
displacement = "maps/waves.jpg"
displacements = ["maps/waves.jpg", "maps/clouds.png"]
slides = ["one.jpg", "two.jpg", "/srv/three.jpg"]

[transition]
settle_delay = "1200ms"
decay = 0.05
snap_threshold = 89

[window]
size = "1920x1080"
antialias = 4
title = "gallery"
"#;

    #[test]
    fn parses_sample_config() {
        let config = SlideshowConfig::from_toml_str(SAMPLE).expect("parse config");
        config.validate().expect("valid config");
        assert_eq!(config.slides.len(), 3);
        assert_eq!(config.transition.settle_delay, Duration::from_millis(1200));
        assert_eq!(config.transition.decay, 0.05);
        assert_eq!(config.transition.snap_threshold, 89.0);
        assert_eq!(config.window.size, (1920, 1080));
        assert_eq!(config.window.antialias, Some(AntialiasSetting::Samples4));
        assert_eq!(config.window.title, "gallery");
    }

    #[test]
    fn defaults_match_reference_timing() {
        let config = SlideshowConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.transition.settle_delay, Duration::from_millis(1700));
        assert_eq!(config.transition.decay, 0.04);
        assert_eq!(config.transition.snap_threshold, 88.5);
        assert_eq!(config.window.size, (1280, 720));
        assert_eq!(config.window.antialias, None);
    }

    #[test]
    fn numeric_durations_are_seconds() {
        let config = SlideshowConfig::from_toml_str(
            r#"
version = 1
[transition]
settle_delay = 2
"#,
        )
        .unwrap();
        assert_eq!(config.transition.settle_delay, Duration::from_secs(2));

        let config = SlideshowConfig::from_toml_str(
            r#"
version = 1
[transition]
settle_delay = 0.25
"#,
        )
        .unwrap();
        assert_eq!(config.transition.settle_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_out_of_range_easing() {
        for body in [
            "decay = 0",
            "decay = 1.5",
            "snap_threshold = 90",
            "snap_threshold = -1",
        ] {
            let input = format!("version = 1\n[transition]\n{body}\n");
            let err = SlideshowConfig::from_toml_str(&input).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{body}");
        }
    }

    #[test]
    fn rejects_bad_durations_and_sizes() {
        let err = SlideshowConfig::from_toml_str(
            "version = 1\n[transition]\nsettle_delay = \"soon\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err =
            SlideshowConfig::from_toml_str("version = 1\n[window]\nsize = \"0x10\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = SlideshowConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn full_validation_requires_images() {
        let mut config = SlideshowConfig::from_toml_str("version = 1").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.displacements.push(PathBuf::from("map.png"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.slides.push(PathBuf::from("a.png"));
        config.validate().expect("one slide and a map is enough");
        assert_eq!(config.initial_displacement(), Some(Path::new("map.png")));
    }

    #[test]
    fn displacement_cycle_starts_with_primary_and_skips_duplicates() {
        let config = SlideshowConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            config.displacement_cycle(),
            vec![
                PathBuf::from("maps/waves.jpg"),
                PathBuf::from("maps/clouds.png")
            ]
        );
    }

    #[test]
    fn parses_size_and_antialias_tokens() {
        assert_eq!(parse_size("800x600"), Ok((800, 600)));
        assert_eq!(parse_size(" 640 X 480 "), Ok((640, 480)));
        assert!(parse_size("800").is_err());
        assert_eq!(parse_antialias("MAX"), Ok(AntialiasSetting::Auto));
        assert_eq!(parse_antialias("none"), Ok(AntialiasSetting::Off));
        assert!(parse_antialias("3").is_err());
        assert_eq!(parse_duration("1700ms"), Ok(Duration::from_millis(1700)));
        assert_eq!(parse_duration("1.5"), Ok(Duration::from_millis(1500)));
    }

    #[test]
    fn size_accepts_pair() {
        let config =
            SlideshowConfig::from_toml_str("version = 1\n[window]\nsize = [320, 200]\n").unwrap();
        assert_eq!(config.window.size, (320, 200));
    }
}
