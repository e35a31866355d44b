use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use renderer::{reference, Antialiasing, Renderer, RendererConfig};
use slideconfig::{AntialiasSetting, SlideshowConfig};
use tracing_subscriber::EnvFilter;
use transition::{EaseOut, SlideSet, TransitionConfig};

use crate::cli::{RenderArgs, RunArgs};
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Opens the slideshow window.
pub fn run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let config = resolve_config(config_path, &args)?;
    let renderer_config = renderer_config(&config, args.no_gpu);
    tracing::info!(
        slides = renderer_config.slides.len(),
        displacements = renderer_config.displacements.len(),
        width = renderer_config.surface_size.0,
        height = renderer_config.surface_size.1,
        degraded = renderer_config.force_degraded,
        "starting slideshow"
    );
    Renderer::new(renderer_config).run()
}

/// Validates the merged configuration and prints a summary.
pub fn check(config_path: Option<&Path>, args: &RunArgs) -> Result<()> {
    let config = resolve_config(config_path, args)?;

    let displacements = config.displacement_cycle();
    println!("displacement maps: {}", displacements.len());
    for path in &displacements {
        println!("  {}", path.display());
    }
    println!("slides: {}", config.slides.len());
    for (index, path) in config.slides.iter().enumerate() {
        println!("  {:>3}: {}", index + 1, path.display());
    }

    let easing = easing(&config);
    println!("settle delay: {:?}", config.transition.settle_delay);
    match easing.frames_to_target() {
        Some(frames) => println!(
            "easing: decay {}, snap at {} ({frames} frames to finish)",
            easing.decay(),
            easing.snap_threshold()
        ),
        None => println!(
            "easing: decay {}, snap at {}",
            easing.decay(),
            easing.snap_threshold()
        ),
    }
    let (width, height) = config.window.size;
    let antialias = config
        .window
        .antialias
        .map_or_else(|| "auto".to_string(), |setting| setting.to_string());
    println!("window: {width}x{height}, antialias {antialias}");

    let missing: Vec<&PathBuf> = displacements
        .iter()
        .chain(config.slides.iter())
        .filter(|path| !path.is_file())
        .collect();
    if !missing.is_empty() {
        for path in &missing {
            eprintln!("missing image: {}", path.display());
        }
        bail!("{} configured image(s) not found", missing.len());
    }

    println!("configuration ok");
    Ok(())
}

/// Writes a CPU-rendered frame of the transition away from the first slide
/// to a PNG file.
pub fn render(config_path: Option<&Path>, run_args: &RunArgs, args: RenderArgs) -> Result<()> {
    let config = resolve_config(config_path, run_args)?;
    let displacement = config
        .initial_displacement()
        .ok_or_else(|| anyhow!("no displacement map configured"))?
        .to_path_buf();
    let sources = SlideSet::from_parts(displacement, config.slides.iter().cloned())?;

    let frame =
        reference::render_still(sources, args.direction, args.timer, config.window.size)?;
    frame
        .save_with_format(&args.output, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    tracing::info!(
        timer = args.timer,
        direction = %args.direction,
        path = %args.output.display(),
        "still frame written"
    );
    Ok(())
}

/// Loads the configuration file, applies command-line overrides and validates
/// the result.
fn resolve_config(config_path: Option<&Path>, args: &RunArgs) -> Result<SlideshowConfig> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args);
    config.validate().context("invalid slideshow configuration")?;
    Ok(config)
}

fn load_config(explicit: Option<&Path>) -> Result<SlideshowConfig> {
    if let Some(path) = explicit {
        return SlideshowConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }

    let paths = AppPaths::discover()?;
    let path = paths.config_file();
    if path.is_file() {
        tracing::debug!(path = %path.display(), "loading default config");
        SlideshowConfig::from_path(&path)
            .with_context(|| format!("failed to load config {}", path.display()))
    } else {
        tracing::debug!(
            config_dir = %paths.config_dir().display(),
            "no config file found; using command-line values only"
        );
        Ok(SlideshowConfig::default())
    }
}

fn apply_overrides(config: &mut SlideshowConfig, args: &RunArgs) {
    if !args.slides.is_empty() {
        config.slides = args.slides.clone();
    }
    if !args.displacements.is_empty() {
        config.displacement = None;
        config.displacements = args.displacements.clone();
    }
    if let Some(size) = args.size {
        config.window.size = size;
    }
    if let Some(antialias) = args.antialias {
        config.window.antialias = Some(antialias);
    }
    if let Some(delay) = args.settle_delay {
        config.transition.settle_delay = delay;
    }
}

fn easing(config: &SlideshowConfig) -> EaseOut {
    EaseOut::new(config.transition.decay, config.transition.snap_threshold)
}

fn antialiasing(setting: Option<AntialiasSetting>) -> Antialiasing {
    match setting {
        None | Some(AntialiasSetting::Auto) => Antialiasing::Auto,
        Some(AntialiasSetting::Off) => Antialiasing::Off,
        Some(AntialiasSetting::Samples2) => Antialiasing::Samples(2),
        Some(AntialiasSetting::Samples4) => Antialiasing::Samples(4),
        Some(AntialiasSetting::Samples8) => Antialiasing::Samples(8),
        Some(AntialiasSetting::Samples16) => Antialiasing::Samples(16),
    }
}

fn renderer_config(config: &SlideshowConfig, no_gpu: bool) -> RendererConfig {
    RendererConfig {
        surface_size: config.window.size,
        title: config.window.title.clone(),
        slides: config.slides.clone(),
        displacements: config.displacement_cycle(),
        antialiasing: antialiasing(config.window.antialias),
        transition: TransitionConfig {
            settle_delay: config.transition.settle_delay,
            easing: easing(config),
        },
        force_degraded: no_gpu,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn file_config() -> SlideshowConfig {
        SlideshowConfig::from_toml_str(
            r#"
version = 1
displacement = "maps/ripple.png"
displacements = ["maps/ripple.png", "maps/stripes.png"]
slides = ["one.jpg", "two.jpg", "three.jpg"]

[transition]
settle_delay = "2s"
decay = 0.05

[window]
size = "1024x768"
antialias = 2
"#,
        )
        .unwrap()
    }

    #[test]
    fn command_line_values_win() {
        let mut config = file_config();
        let args = RunArgs {
            slides: vec![PathBuf::from("cli.jpg")],
            displacements: vec![PathBuf::from("cli-map.png")],
            size: Some((640, 480)),
            antialias: Some(AntialiasSetting::Off),
            settle_delay: Some(Duration::from_millis(500)),
            no_gpu: false,
        };
        apply_overrides(&mut config, &args);
        config.validate().unwrap();

        assert_eq!(config.slides, vec![PathBuf::from("cli.jpg")]);
        assert_eq!(config.displacement_cycle(), vec![PathBuf::from("cli-map.png")]);
        assert_eq!(config.window.size, (640, 480));
        assert_eq!(config.window.antialias, Some(AntialiasSetting::Off));
        assert_eq!(config.transition.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn file_values_survive_empty_overrides() {
        let mut config = file_config();
        apply_overrides(&mut config, &RunArgs::default());
        assert_eq!(config.slides.len(), 3);
        assert_eq!(config.window.size, (1024, 768));
    }

    #[test]
    fn renderer_config_carries_transition_tuning() {
        let config = file_config();
        let renderer = renderer_config(&config, true);
        assert_eq!(renderer.surface_size, (1024, 768));
        assert_eq!(renderer.antialiasing, Antialiasing::Samples(2));
        assert_eq!(renderer.displacements.len(), 2);
        assert_eq!(renderer.transition.settle_delay, Duration::from_secs(2));
        assert_eq!(renderer.transition.easing.decay(), 0.05);
        assert!(renderer.force_degraded);
    }
}
