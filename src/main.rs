use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crashboard::aggregate::{top_vehicles, victim_breakdown, TOP_VEHICLE_COUNT};
use crashboard::chart::{daily_profile, monthly_matrix, vehicle_map, yearly_trend};
use crashboard::filter::{BoroughFilter, FilterState, Selection};
use crashboard::geo::Centroids;
use crashboard::ingest::{load_tables, DatasetStore};
use crashboard::nav::{self, NavParams};
use crashboard::normalize::{normalize_all, Incident, Metric};
use crashboard::render;
use crashboard::RenderOptions;

#[derive(Parser, Debug)]
#[command(name = "crashboard")]
#[command(about = "Aggregate NYC collision CSV datasets into charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Yearly injury/fatality line chart by borough
    Lines(ViewArgs),
    /// Time-of-day radar profile under the active filter
    Radar(ViewArgs),
    /// Month-by-vehicle heat matrix under the active filter
    Matrix(ViewArgs),
    /// Victim-category pie for one matrix cell
    Pie(PieArgs),
    /// Symbol-map markers for a selected year and vehicle type (JSON)
    Map(MapArgs),
    /// Top vehicle types by collision count under the year selection
    Vehicles(VehiclesArgs),
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Collision dataset CSV files, merged in order
    #[arg(long = "data", required = true, num_args = 1..)]
    data: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Selected year: "All" or a 4-digit year
    #[arg(long, default_value = "All")]
    year: String,

    /// Metric to sum: "injured" or "killed"
    #[arg(long = "type", default_value = "injured")]
    metric: String,

    /// Borough selection; repeat the flag for a multi-select, omit for all
    #[arg(long = "borough")]
    boroughs: Vec<String>,

    /// Raw navigation query ("year=...&type=...&borough=...") from another
    /// view; overrides the individual flags
    #[arg(long = "from-query")]
    from_query: Option<String>,
}

impl FilterArgs {
    fn filter(&self) -> Result<FilterState> {
        if let Some(query) = &self.from_query {
            return Ok(NavParams::parse(query)?.into_filter());
        }

        let year = nav::parse_year(&self.year)?;
        let metric = Metric::parse(&self.metric)
            .ok_or_else(|| anyhow!("unrecognized type value '{}'", self.metric))?;
        let boroughs = if self.boroughs.is_empty() {
            BoroughFilter::All
        } else {
            let mut selected = Vec::with_capacity(self.boroughs.len());
            for raw in &self.boroughs {
                match nav::parse_borough(raw)? {
                    Selection::All => return Ok(filter_state(year, BoroughFilter::All, metric)),
                    Selection::Only(borough) => selected.push(borough),
                }
            }
            BoroughFilter::Any(selected)
        };
        Ok(filter_state(year, boroughs, metric))
    }
}

fn filter_state(year: Selection<u16>, boroughs: BoroughFilter, metric: Metric) -> FilterState {
    FilterState {
        year,
        boroughs,
        vehicle: None,
        metric,
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output file
    #[arg(long, short)]
    out: PathBuf,

    /// Emit the chart data as JSON instead of rendering a PNG
    #[arg(long)]
    json: bool,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,
}

impl OutputArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Args, Debug)]
struct ViewArgs {
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    filter: FilterArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct PieArgs {
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    filter: FilterArgs,
    #[command(flatten)]
    output: OutputArgs,

    /// Month of the selected cell (1-12)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
    month: u8,

    /// Vehicle type of the selected cell
    #[arg(long)]
    vehicle: String,
}

#[derive(Args, Debug)]
struct MapArgs {
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    filter: FilterArgs,

    /// Neighborhood centroid CSV (neighborhood, lat, lon)
    #[arg(long)]
    centroids: PathBuf,

    /// Vehicle type to map
    #[arg(long)]
    vehicle: String,

    /// Output JSON file
    #[arg(long, short)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct VehiclesArgs {
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    filter: FilterArgs,

    /// How many vehicle types to keep
    #[arg(long, default_value_t = TOP_VEHICLE_COUNT)]
    count: usize,

    /// Optional JSON output file; prints one label per line otherwise
    #[arg(long, short)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Lines(args) => run_lines(args),
        Command::Radar(args) => run_radar(args),
        Command::Matrix(args) => run_matrix(args),
        Command::Pie(args) => run_pie(args),
        Command::Map(args) => run_map(args),
        Command::Vehicles(args) => run_vehicles(args),
    }
}

/// Load all sources, normalize, and retain the rows for this invocation.
fn load_rows(data: &DataArgs) -> Result<Vec<Incident>> {
    let mut store = DatasetStore::new();
    let token = store.begin_load();

    let tables = load_tables(&data.data).context("Failed to load collision datasets")?;
    let normalized = normalize_all(&tables);
    if normalized.dropped > 0 {
        log::info!(
            "{} rows dropped during normalization (missing year or borough)",
            normalized.dropped
        );
    }

    store.complete_load(token, normalized.incidents);
    Ok(store.into_rows())
}

fn run_lines(args: ViewArgs) -> Result<()> {
    let rows = load_rows(&args.data)?;
    let filter = args.filter.filter()?;
    let chart = yearly_trend(&rows, filter.metric);
    if args.output.json {
        write_json(&args.output.out, &chart)
    } else {
        let png = render::render_line_chart(&chart, &args.output.options())?;
        write_bytes(&args.output.out, &png)
    }
}

fn run_radar(args: ViewArgs) -> Result<()> {
    let rows = load_rows(&args.data)?;
    let filter = args.filter.filter()?;
    let chart = daily_profile(&rows, &filter);
    if args.output.json {
        write_json(&args.output.out, &chart)
    } else {
        let png = render::render_radar(&chart, &args.output.options())?;
        write_bytes(&args.output.out, &png)
    }
}

fn run_matrix(args: ViewArgs) -> Result<()> {
    let rows = load_rows(&args.data)?;
    let filter = args.filter.filter()?;
    let table = monthly_matrix(&rows, &filter);
    if args.output.json {
        write_json(&args.output.out, &table)
    } else {
        let png = render::render_matrix(&table, &args.output.options())?;
        write_bytes(&args.output.out, &png)
    }
}

fn run_pie(args: PieArgs) -> Result<()> {
    let rows = load_rows(&args.data)?;
    let filter = args.filter.filter()?;
    let breakdown = victim_breakdown(&rows, &filter, args.month, &args.vehicle);

    if args.output.json {
        return write_json(&args.output.out, &breakdown);
    }
    if breakdown.is_empty() {
        // Nothing to draw for this cell; suppress the chart.
        println!(
            "no {} victims recorded for month {} / {}; chart suppressed",
            filter.metric, args.month, args.vehicle
        );
        return Ok(());
    }
    let png = render::render_pie(&breakdown, &args.output.options())?;
    write_bytes(&args.output.out, &png)
}

fn run_map(args: MapArgs) -> Result<()> {
    let filter = args.filter.filter()?;
    let Selection::Only(year) = filter.year else {
        bail!("the map needs a concrete --year before placing markers");
    };

    let rows = load_rows(&args.data)?;
    let centroids =
        Centroids::load(&args.centroids).context("Failed to load neighborhood centroids")?;
    let markers = vehicle_map(&rows, &centroids, year, &args.vehicle);
    write_json(&args.out, &markers)
}

fn run_vehicles(args: VehiclesArgs) -> Result<()> {
    let rows = load_rows(&args.data)?;
    let filter = args.filter.filter()?;
    let top = top_vehicles(&rows, &filter.year, args.count);

    match &args.out {
        Some(path) => write_json(path, &top),
        None => {
            for vehicle in top {
                println!("{vehicle}");
            }
            Ok(())
        }
    }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value).context("Failed to write JSON")?;
    Ok(())
}
