use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use slideconfig::{parse_antialias, parse_duration, parse_size, AntialiasSetting};
use transition::Direction;

#[derive(Parser, Debug)]
#[command(
    name = "slidewall",
    author,
    version,
    about = "Full-screen slideshow with displacement-map transitions",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Configuration file (defaults to `slidewall.toml` in the config directory).
    #[arg(long, global = true, value_name = "FILE", env = "SLIDEWALL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Overrides applied on top of the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Slide images in display order; replaces the configured list.
    #[arg(value_name = "SLIDES")]
    pub slides: Vec<PathBuf>,

    /// Displacement map; repeat to give the `D` key more maps to cycle through.
    #[arg(long = "displacement", value_name = "FILE")]
    pub displacements: Vec<PathBuf>,

    /// Window size (e.g. `1920x1080`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// MSAA mode: `auto`, `off`, `2`, `4`, `8` or `16`.
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<AntialiasSetting>,

    /// Delay from a click to the commit of the transition (`1700ms`, `2s`, `1.5`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub settle_delay: Option<Duration>,

    /// Skip the GPU and change slides without animation.
    #[arg(long)]
    pub no_gpu: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration and print what would be shown.
    Check,
    /// Render a still frame of a transition from the first slide on the CPU.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Transition timer to evaluate, from 0 (first slide) to 90 (second slide).
    #[arg(long, value_name = "0-90")]
    pub timer: f32,

    /// Which way to leave the first slide: `next` or `previous`.
    #[arg(long, value_name = "DIRECTION", default_value = "next")]
    pub direction: Direction,

    /// PNG file to write.
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse_into_overrides() {
        let cli = Cli::try_parse_from([
            "slidewall",
            "--displacement",
            "maps/one.png",
            "--displacement",
            "maps/two.png",
            "--size",
            "800x600",
            "--antialias",
            "4",
            "--settle-delay",
            "900ms",
            "--no-gpu",
            "a.jpg",
            "b.jpg",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        let run = cli.run;
        assert_eq!(run.slides, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
        assert_eq!(run.displacements.len(), 2);
        assert_eq!(run.size, Some((800, 600)));
        assert_eq!(run.antialias, Some(AntialiasSetting::Samples4));
        assert_eq!(run.settle_delay, Some(Duration::from_millis(900)));
        assert!(run.no_gpu);
    }

    #[test]
    fn render_subcommand_takes_timer_and_output() {
        let cli = Cli::try_parse_from([
            "slidewall",
            "render",
            "--timer",
            "45",
            "--output",
            "frame.png",
            "--config",
            "show.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("show.toml")));
        match cli.command {
            Some(Command::Render(args)) => {
                assert_eq!(args.timer, 45.0);
                assert_eq!(args.direction, Direction::Next);
                assert_eq!(args.output, PathBuf::from("frame.png"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn render_direction_accepts_navigation_tokens() {
        let cli = Cli::try_parse_from([
            "slidewall", "render", "--timer", "0", "--direction", "Prev", "--output", "f.png",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Render(args)) => assert_eq!(args.direction, Direction::Previous),
            other => panic!("unexpected command {other:?}"),
        }

        let err = Cli::try_parse_from([
            "slidewall", "render", "--timer", "0", "--direction", "sideways", "--output", "f.png",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("invalid navigation direction"), "{err}");
    }

    #[test]
    fn rejects_malformed_size() {
        assert!(Cli::try_parse_from(["slidewall", "--size", "wide"]).is_err());
    }
}
