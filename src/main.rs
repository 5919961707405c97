//! fourier-circles: draw a chain of frequency circles as vectors.
//!
//! Usage:
//!   fourier-circles                             # the built-in five circles, as HTML
//!   fourier-circles -o circles.svg              # format follows the extension
//!   fourier-circles -c circles.toml --format png
//!   fourier-circles --time 0.5 --auto-limits

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use fourier_circles::config::Config;
use fourier_circles::epicycle::{self, AmplitudePolicy};
use fourier_circles::visualizer::{self, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "fourier-circles")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Draw frequency/amplitude/phase triples as a chain of circles and vectors", long_about = None)]
struct Cli {
    /// TOML file with the components and figure settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file. Defaults to the config's figure.output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format. Defaults to the output file's extension, then html.
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Advance every phase by frequency * time before drawing
    #[arg(long, allow_negative_numbers = true)]
    time: Option<f64>,

    /// What to do with negative amplitudes
    #[arg(long, value_enum)]
    amplitude_policy: Option<AmplitudePolicy>,

    /// Fit the axes around the chain instead of using fixed ranges
    #[arg(long)]
    auto_limits: bool,

    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Pick the output file and format from the flags and the configured path.
fn resolve_output(
    format: Option<OutputFormat>,
    output: Option<PathBuf>,
    configured: &Path,
) -> (OutputFormat, PathBuf) {
    match (format, output) {
        (Some(format), Some(output)) => (format, output),
        (None, Some(output)) => (OutputFormat::from_path(&output).unwrap_or(OutputFormat::Html), output),
        (Some(format), None) => {
            if OutputFormat::from_path(configured) == Some(format) {
                (format, configured.to_path_buf())
            } else {
                (format, configured.with_extension(format.extension()))
            }
        }
        (None, None) => (
            OutputFormat::from_path(configured).unwrap_or(OutputFormat::Html),
            configured.to_path_buf(),
        ),
    }
}

/// Fold the command line flags over the loaded configuration.
fn apply_cli(mut config: Config, cli: &Cli) -> Result<(Config, OutputFormat)> {
    if let Some(time) = cli.time {
        if !time.is_finite() {
            bail!("--time must be a finite number, got {time}");
        }
        config.time = time;
    }
    if let Some(policy) = cli.amplitude_policy {
        config.amplitude_policy = policy;
    }
    if cli.auto_limits {
        config.figure.auto_limits = true;
    }

    let (format, output) = resolve_output(cli.format, cli.output.clone(), &config.figure.output);
    config.figure.output = output;
    Ok((config, format))
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    let (config, format) = apply_cli(config, &cli)?;

    let components = config.components().context("invalid frequency components")?;
    info!(
        components = components.len(),
        policy = ?config.amplitude_policy,
        time = config.time,
        "Building epicycle chain"
    );

    let chain = epicycle::build_chain_at(&components, config.time);
    let tip = epicycle::tip(&chain);
    debug!(x = tip.x, y = tip.y, "chain tip");

    let mut surface = visualizer::surface_for(format, &config.figure);
    visualizer::draw_chain(surface.as_mut(), &chain, &config.figure).context("failed to draw chain")?;
    surface
        .show()
        .with_context(|| format!("failed to show figure {}", config.figure.output.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_output() {
        let configured = Path::new("frequency_circles.html");

        assert_eq!(
            resolve_output(None, None, configured),
            (OutputFormat::Html, PathBuf::from("frequency_circles.html"))
        );
        assert_eq!(
            resolve_output(Some(OutputFormat::Png), None, configured),
            (OutputFormat::Png, PathBuf::from("frequency_circles.png"))
        );
        assert_eq!(
            resolve_output(None, Some(PathBuf::from("out.svg")), configured),
            (OutputFormat::Svg, PathBuf::from("out.svg"))
        );
        assert_eq!(
            resolve_output(None, Some(PathBuf::from("out")), configured),
            (OutputFormat::Html, PathBuf::from("out"))
        );
        assert_eq!(
            resolve_output(Some(OutputFormat::Svg), Some(PathBuf::from("figure.txt")), configured),
            (OutputFormat::Svg, PathBuf::from("figure.txt"))
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "fourier-circles",
            "--time",
            "-1.5",
            "--amplitude-policy",
            "clamp",
            "--auto-limits",
            "-f",
            "svg",
        ]);
        let (config, format) = apply_cli(Config::default(), &cli).unwrap();
        assert_eq!(config.time, -1.5);
        assert_eq!(config.amplitude_policy, AmplitudePolicy::Clamp);
        assert!(config.figure.auto_limits);
        assert_eq!(format, OutputFormat::Svg);
        assert_eq!(config.figure.output, PathBuf::from("frequency_circles.svg"));
    }

    #[test]
    fn test_non_finite_time_rejected() {
        let cli = Cli::parse_from(["fourier-circles", "--time", "NaN"]);
        assert!(apply_cli(Config::default(), &cli).is_err());
    }

    #[test]
    fn test_run_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chain.svg");
        let cli = Cli::parse_from(["fourier-circles", "-o", output.to_str().unwrap()]);
        run(cli).unwrap();

        let svg = std::fs::read_to_string(&output).unwrap();
        assert_eq!(svg.matches("class=\"circle\"").count(), 5);
    }

    #[test]
    fn test_run_rejects_negative_amplitude_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("circles.toml");
        let output = dir.path().join("chain.html");
        std::fs::write(
            &config_path,
            "frequencies = [1, 2]\namplitudes = [3, -1]\nphases = [0, 0]\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "fourier-circles",
            "-c",
            config_path.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        let err = run(cli).unwrap_err();
        assert!(format!("{err:#}").contains("negative amplitude -1 at component 1"));
        assert!(!output.exists());
    }
}
