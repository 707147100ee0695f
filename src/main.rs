//! mw-combine - combine W-boson mass measurements and draw the comparison
//!
//! Reads a YAML measurement file, prints the combination and, when a
//! reference entry is present, its discrepancy; then writes an SVG figure.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use u_combine::combination::{combine, discrepancy_with};
use u_combine::loader;
use u_combine::render::{self, RenderConfig, TextStyle};

/// Publication figure axis, used unless a range is given or `--auto-range`.
const DEFAULT_X_RANGE: (f64, f64) = (80300.0, 80600.0);
const DEFAULT_X_TICKS: [f64; 4] = [80300.0, 80400.0, 80500.0, 80600.0];
const DEFAULT_FOOTNOTE: &str = "* Does not include 13.5 MeV shift in CDF 2002-2007 (2.2/fb)";

/// Combine measurements and render a comparison figure
#[derive(Parser)]
#[command(name = "mw-combine")]
#[command(about = "Combine W-boson mass measurements and render a comparison figure", long_about = None)]
#[command(version)]
struct Cli {
    /// Measurement file
    #[arg(default_value = "mw.yml")]
    input: PathBuf,

    /// Figure output path
    #[arg(short, long, default_value = "mw.svg")]
    output: PathBuf,

    /// Entry that receives the combination for display
    #[arg(long, default_value = "our_combination")]
    combination_entry: String,

    /// Entry to compare the combination against
    #[arg(long, default_value = "sm")]
    reference: String,

    /// Lower edge of the x axis
    #[arg(long, requires = "x_max", allow_negative_numbers = true)]
    x_min: Option<f64>,

    /// Upper edge of the x axis
    #[arg(long, requires = "x_min", allow_negative_numbers = true)]
    x_max: Option<f64>,

    /// Comma-separated tick positions
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    x_ticks: Option<Vec<f64>>,

    /// Derive the x range from the data instead of the publication axis
    #[arg(long, conflicts_with_all = ["x_min", "x_max"])]
    auto_range: bool,

    /// X-axis label
    #[arg(long, default_value = "M_W [MeV]")]
    x_label: String,

    /// Footnote under the labels (empty to omit)
    #[arg(long, default_value = DEFAULT_FOOTNOTE)]
    footnote: String,

    /// Use plain text even if a typesetting engine is available
    #[arg(long)]
    plain: bool,

    /// Log level
    #[arg(long, env = "UCOMBINE_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_env("UCOMBINE_LOG")
        .unwrap_or_else(|_| cli.log_level.clone().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut data = loader::load(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;
    info!(entries = data.len(), "loaded measurements");

    let combination = combine(&data).context("combination failed")?;
    println!("{combination}");

    if let Some(reference) = data.get(&cli.reference) {
        let pull = discrepancy_with(&combination, &cli.reference, reference)
            .with_context(|| format!("discrepancy against '{}' failed", cli.reference))?;
        println!("Discrepancy {}", pull.z);
        println!("Discrepancy after inflating error following PDG {}", pull.z_inflated);
    } else {
        info!(reference = %cli.reference, "no reference entry, skipping discrepancy");
    }

    data.merge_combination(&cli.combination_entry, &combination);

    let text_style = if cli.plain {
        TextStyle::Plain
    } else {
        TextStyle::detect()
    };
    let config = figure_config(&cli, text_style);
    render::render(&data, &config, &cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!(output = %cli.output.display(), "wrote figure");

    Ok(())
}

fn figure_config(cli: &Cli, text_style: TextStyle) -> RenderConfig {
    let mut config = RenderConfig::default()
        .with_x_label(cli.x_label.clone())
        .with_text_style(text_style);
    match (cli.x_min, cli.x_max) {
        (Some(min), Some(max)) => config = config.with_x_range(min, max),
        _ if !cli.auto_range => {
            config = config
                .with_x_range(DEFAULT_X_RANGE.0, DEFAULT_X_RANGE.1)
                .with_x_ticks(DEFAULT_X_TICKS.to_vec());
        }
        _ => {}
    }
    if let Some(ticks) = &cli.x_ticks {
        config = config.with_x_ticks(ticks.clone());
    }
    if !cli.footnote.is_empty() {
        config = config.with_footnote(cli.footnote.clone());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["mw-combine"]);
        assert_eq!(cli.input, PathBuf::from("mw.yml"));
        assert_eq!(cli.output, PathBuf::from("mw.svg"));
        assert_eq!(cli.reference, "sm");
        assert_eq!(cli.combination_entry, "our_combination");
        assert!(cli.x_min.is_none() && cli.x_max.is_none());
        assert_eq!(cli.footnote, DEFAULT_FOOTNOTE);
    }

    #[test]
    fn default_run_draws_publication_axis() {
        let cli = Cli::parse_from(["mw-combine"]);
        let config = figure_config(&cli, TextStyle::Plain);
        assert_eq!(config.x_range, Some(DEFAULT_X_RANGE));
        assert_eq!(config.x_ticks.as_deref(), Some(&DEFAULT_X_TICKS[..]));
        assert_eq!(config.footnote.as_deref(), Some(DEFAULT_FOOTNOTE));
    }

    #[test]
    fn explicit_and_automatic_axes() {
        let cli = Cli::parse_from(["mw-combine", "--x-min", "80000", "--x-max", "81000", "--footnote", ""]);
        let config = figure_config(&cli, TextStyle::Plain);
        assert_eq!(config.x_range, Some((80000.0, 81000.0)));
        assert!(config.x_ticks.is_none());
        assert!(config.footnote.is_none());

        let cli = Cli::parse_from(["mw-combine", "--auto-range", "--x-ticks", "80350,80400"]);
        let config = figure_config(&cli, TextStyle::Plain);
        assert!(config.x_range.is_none());
        assert_eq!(config.x_ticks, Some(vec![80350.0, 80400.0]));

        assert!(Cli::try_parse_from(["mw-combine", "--auto-range", "--x-min", "1", "--x-max", "2"]).is_err());
    }

    #[test]
    fn range_needs_both_edges() {
        assert!(Cli::try_parse_from(["mw-combine", "--x-min", "80300"]).is_err());
        let cli = Cli::try_parse_from(["mw-combine", "data.yml", "--x-min", "80300", "--x-max", "80600"])
            .expect("valid arguments");
        assert_eq!(cli.input, PathBuf::from("data.yml"));
        assert_eq!((cli.x_min, cli.x_max), (Some(80300.0), Some(80600.0)));
    }
}
