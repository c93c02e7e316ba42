use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use structured_logger::json::new_writer;
use structured_logger::Builder;

use road_map_svg::config::{self, GradientPreset, RenderConfig};
use road_map_svg::errors::{Error, Result};
use road_map_svg::etl::{Etl, OutputTarget, RoadMapEtl};
use road_map_svg::Rgb;

#[derive(Parser)]
#[command(name = "road-map-svg")]
#[command(about = "Render the road network of an OpenStreetMap export as SVG")]
struct Cli {
    /// Input OSM export (XML, optionally .xz compressed). The .xml/.osm extension may be left off
    map_file: Option<PathBuf>,

    /// Color for the least important roads, e.g. "#aaaaaa", "aaa" or "aa"
    from_color: Option<String>,

    /// Color for the most important roads, e.g. "#1a1a1a", "1a1" or "1a"
    to_color: Option<String>,

    /// Color for the least important roads (alternative to the positional argument)
    #[arg(long = "from", value_name = "COLOR")]
    from_hex: Option<String>,

    /// Color for the most important roads (alternative to the positional argument)
    #[arg(long = "to", value_name = "COLOR")]
    to_hex: Option<String>,

    /// White minor roads to black major roads
    #[arg(long, conflicts_with = "white_to_black")]
    black_to_white: bool,

    /// Black minor roads to white major roads
    #[arg(long)]
    white_to_black: bool,

    /// SVG width in pixels [default: 2000]
    #[arg(short, long)]
    width: Option<u32>,

    /// SVG height in pixels (derived from the map's aspect ratio if left out)
    #[arg(long)]
    height: Option<u32>,

    /// Background color (transparent if left out)
    #[arg(short, long, value_name = "COLOR")]
    background: Option<String>,

    /// Output SVG file, "-" for stdout [default: road_map_<input>.svg]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fit the canvas to the PERCENT..(100-PERCENT) percentile range of coordinates
    /// (2 if no value is given)
    #[arg(short, long, value_name = "PERCENT", num_args = 0..=1)]
    clip_outliers: Option<Option<f64>>,

    /// JSON job file with "input", "output" and "render" settings; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug details
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    Builder::with_level(if verbose { "debug" } else { "info" })
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn parse_color(token: &str) -> Result<Rgb> {
    token.parse()
}

fn apply_flags(cli: &Cli, render: &mut RenderConfig) -> Result<()> {
    if let Some(width) = cli.width {
        render.width = width;
    }
    if cli.height.is_some() {
        render.height = cli.height;
    }
    if let Some(background) = &cli.background {
        render.background = Some(parse_color(background)?);
    }
    if let Some(percentile) = cli.clip_outliers {
        render.clip_percentile = percentile.unwrap_or(config::DEFAULT_CLIP_PERCENTILE);
    }

    if cli.black_to_white {
        render.preset = Some(GradientPreset::BlackToWhite);
    } else if cli.white_to_black {
        render.preset = Some(GradientPreset::WhiteToBlack);
    } else {
        let from = cli.from_hex.as_ref().or(cli.from_color.as_ref());
        let to = cli.to_hex.as_ref().or(cli.to_color.as_ref());
        if let Some(from) = from {
            render.from_color = parse_color(from)?;
            render.preset = None;
        }
        if let Some(to) = to {
            render.to_color = parse_color(to)?;
            render.preset = None;
        }
    }
    Ok(())
}

fn build_job(cli: Cli) -> Result<RoadMapEtl> {
    let (input, output, mut render) = match &cli.config {
        Some(path) => {
            let user_config = config::load_user_config(path)?;
            (
                cli.map_file.clone().unwrap_or(user_config.input),
                cli.output.clone().or(user_config.output),
                user_config.render,
            )
        },
        None => (
            cli.map_file.clone().ok_or_else(|| Error::config("No map file given"))?,
            cli.output.clone(),
            RenderConfig::default(),
        ),
    };
    apply_flags(&cli, &mut render)?;
    render.validate()?;

    let input = config::resolve_input_path(&input)?;
    let output = output.unwrap_or_else(|| config::default_output_path(&input));
    let (from, to) = render.gradient_endpoints();
    let (from, to) = (from.to_string(), to.to_string());
    info!(from = from.as_str(), to = to.as_str(); "Using color gradient (minor to major)");

    Ok(RoadMapEtl::new(input, OutputTarget::from_path(&output), render))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut etl = match build_job(cli) {
        Ok(etl) => etl,
        Err(err) => {
            error!(err = err.message.as_str(); "Invalid arguments");
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        },
    };

    if let Err(err) = etl.process() {
        eprintln!("Error: {}", err);
        return ExitCode::FAILURE;
    }
    if let Some(report) = etl.report() {
        info!(
            paths = report.paths,
            dangling_ways = report.dangling_ways,
            degenerate_roads = report.degenerate_roads,
            width = report.width,
            height = report.height;
            "Conversion finished"
        );
    }
    ExitCode::SUCCESS
}
