use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ivm_map::models::{DataSource, LegendText};
use ivm_map::render::{self, RenderOptions};
use ivm_map::{Loader, MapConfig, MapContext, MapError, Method};
use ivm_map::{dataset, stats, storage};
use num_format::{Locale, ToFormattedString};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ivm-map",
    version,
    about = "Classify, colour & render choropleth maps of a health indicator"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the map (and optionally join data, select, render, export and print stats).
    Render(RenderArgs),
    /// Print the class breaks and colours of the loaded indicator.
    Classify(ClassifyArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Data source descriptor (JSON with geoFilePath, mapLegendFilePath, ...).
    #[arg(long, conflicts_with = "geo")]
    source: Option<PathBuf>,
    /// Geometry document (path or URL), when no descriptor is given.
    #[arg(long, required_unless_present = "source")]
    geo: Option<String>,
    /// Legend document (path or URL), when no descriptor is given.
    #[arg(long, requires = "geo")]
    legend: Option<String>,
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Indicator dataset to join (CSV, or JSON with a "values" object).
    #[arg(long)]
    data: Option<PathBuf>,
    /// Join-key column of a CSV dataset.
    #[arg(long, default_value = "gc")]
    key_col: String,
    /// Value column of a CSV dataset.
    #[arg(long, default_value = "indicator")]
    value_col: String,
    /// Number of classes (overrides configuration).
    #[arg(long)]
    classes: Option<usize>,
    /// Classification method: jenks, quantile or equal_interval.
    #[arg(long)]
    method: Option<Method>,
    /// ColorBrewer palette name (e.g. RdYlGn, YlOrRd, Blues).
    #[arg(long)]
    palette: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    src: SourceArgs,
    /// Select the feature with this join key.
    #[arg(long)]
    select: Option<String>,
    /// Zoom to the feature with this join key.
    #[arg(long)]
    zoom_to: Option<String>,
    /// Render the map to the given path (.svg or .png).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Fit the whole layer into the image instead of the default view.
    #[arg(long, default_value_t = false)]
    fit: bool,
    /// Width of the image (default from configuration).
    #[arg(long)]
    width: Option<u32>,
    /// Height of the image (default from configuration).
    #[arg(long)]
    height: Option<u32>,
    /// Title drawn on the map.
    #[arg(long)]
    title: Option<String>,
    /// Save the joined features to file (format inferred by --format or extension).
    #[arg(long)]
    export: Option<PathBuf>,
    /// Export format (csv or json). If omitted, inferred from --export extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Print indicator statistics to stdout.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    #[command(flatten)]
    src: SourceArgs,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Classify(args) => cmd_classify(args),
    }
}

fn load_config(src: &SourceArgs) -> Result<MapConfig> {
    let mut config = match &src.config {
        Some(path) => MapConfig::load_from_file(path)?,
        None => MapConfig::default(),
    };
    if let Some(classes) = src.classes {
        config.classifier.classes = classes;
    }
    if let Some(method) = src.method {
        config.classifier.method = method;
    }
    if let Some(palette) = &src.palette {
        config.classifier.palette = palette.clone();
    }
    Ok(config)
}

fn data_source(src: &SourceArgs) -> Result<DataSource> {
    match (&src.source, &src.geo) {
        (Some(path), _) => Ok(DataSource::from_path(path)?),
        (None, Some(geo)) => Ok(DataSource {
            geo_file_path: geo.clone(),
            map_legend_file_path: src.legend.clone().unwrap_or_default(),
            map_legend_txt: LegendText::default(),
            map_legend_img_path: None,
        }),
        (None, None) => anyhow::bail!("either --source or --geo is required"),
    }
}

/// Build the map and join the dataset, if any.
fn open_map(src: &SourceArgs, config: MapConfig) -> Result<MapContext> {
    let source = data_source(src)?;
    let mut map = MapContext::new(config);
    let ready = map
        .init(&Loader::default(), &source)
        .with_context(|| format!("failed to load {}", source.geo_file_path))?;
    match &ready.legend_error {
        Some(MapError::NoLegend) | None => {}
        Some(err) => eprintln!("Legend unavailable ({err}); using configured classifier"),
    }
    if let Some(err) = &ready.classify_error {
        eprintln!("Indicator values not classified ({err}); features drawn unstyled");
    }
    eprintln!("Loaded {} features", ready.features);

    if let Some(path) = &src.data {
        let data = dataset::read(path, &src.key_col, &src.value_col)?;
        let report = map.update_main_layer(&data)?;
        eprintln!(
            "Joined {}: {} matched, {} not numeric, {} missing",
            path.display(),
            report.matched,
            report.coerced,
            report.unmatched
        );
    }
    Ok(map)
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let mut config = load_config(&args.src)?;
    if let Some(w) = args.width {
        config.map.width = w;
    }
    if let Some(h) = args.height {
        config.map.height = h;
    }
    let mut map = open_map(&args.src, config)?;
    map.add_legend()?;

    if let Some(key) = &args.select {
        map.click(key)?;
    }
    if let Some(key) = &args.zoom_to {
        let size = map.canvas_size();
        map.zoom_to_feature(key, size)?;
    }

    if let Some(path) = args.out.as_ref() {
        let (width, height) = map.canvas_size();
        let opts = RenderOptions {
            width,
            height,
            title: args.title.clone(),
            fit: args.fit,
            ..Default::default()
        };
        render::render_map(&map, path, &opts)?;
        eprintln!("Wrote map to {}", path.display());
    }

    if let Some(path) = args.export.as_ref() {
        let geometry = map.geometry().context("geometry not loaded")?;
        let rows = storage::rows(geometry, map.classification());
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(&rows, path)?,
            "json" => storage::save_json(&rows, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", rows.len(), path.display());
    }

    if args.stats {
        let geometry = map.geometry().context("geometry not loaded")?;
        let s = stats::summary(geometry);
        println!(
            "count={} missing={}  min={} max={} mean={} median={}",
            s.count,
            s.missing,
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median)
        );
    }

    if let Some(selected) = map.view().and_then(|v| v.info.content()) {
        println!(
            "{} ({}): {}",
            selected.name,
            selected.join_key,
            fmt_opt(selected.indicator)
        );
    }
    Ok(())
}

fn cmd_classify(args: ClassifyArgs) -> Result<()> {
    let config = load_config(&args.src)?;
    let map = open_map(&args.src, config)?;
    let geometry = map.geometry().context("geometry not loaded")?;
    let Some(classification) = map.classification() else {
        println!("No indicator values; features are drawn unstyled");
        return Ok(());
    };

    println!(
        "{} classes, {} on {}",
        classification.classes(),
        classification.method,
        classification.palette
    );
    for c in stats::class_counts(geometry, classification) {
        println!(
            "{:>2}  {}  {} – {}  {} features",
            c.class + 1,
            c.color,
            fmt_opt(Some(c.from)),
            fmt_opt(Some(c.to)),
            c.count.to_formatted_string(&Locale::en)
        );
    }
    Ok(())
}
