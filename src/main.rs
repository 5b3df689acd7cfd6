// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gapminder::chart::format_compact;
use gapminder::{filter_bubbles, Config, DataStore, MergedTable, Selection};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gapminder", version, about = "Life expectancy, income and population dashboard")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = gapminder::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory containing the metric CSV files (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive bubble chart (default)
    Ui,
    /// Print merged table statistics and the first rows
    Summary {
        /// Number of rows to print
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
    /// Print the chart rows for one year
    Show {
        #[arg(long)]
        year: i32,
        /// Country to include; repeat for more (defaults from config)
        #[arg(long = "country")]
        countries: Vec<String>,
    },
}

fn main() -> Result<()> {
    gapminder::logging::init_logging();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let mut store = DataStore::from_config(&config);
    let table = store.merged().with_context(|| {
        format!(
            "Failed to load metric files from {}",
            config.data_dir.display()
        )
    })?;
    info!(rows = table.len(), "Loaded merged table");

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => run_ui_mode(&config, table),
        Command::Summary { rows } => {
            run_summary(&table, rows);
            Ok(())
        }
        Command::Show { year, countries } => {
            let countries = if countries.is_empty() {
                config.default_countries.clone()
            } else {
                countries
            };
            run_show(&table, &Selection::new(year, countries));
            Ok(())
        }
    }
}

fn run_summary(table: &MergedTable, rows: usize) {
    println!("📊 Merged table");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Rows:      {}", table.len());
    println!("Countries: {}", table.countries().len());
    match table.year_range() {
        Some((min, max)) => println!("Years:     {} - {}", min, max),
        None => println!("Years:     (none)"),
    }

    let records = &table.records;
    println!("Missing lex:        {}", records.iter().filter(|r| r.lex.is_none()).count());
    println!("Missing GNI:        {}", records.iter().filter(|r| r.gni_per_capita.is_none()).count());
    println!("Missing population: {}", records.iter().filter(|r| r.population.is_none()).count());

    println!("\n{:<24} {:>6} {:>10} {:>12} {:>14}", "country", "year", "lex", "gni", "population");
    for record in table.records.iter().take(rows) {
        println!(
            "{:<24} {:>6} {:>10} {:>12} {:>14}",
            record.country,
            record.year,
            display_cell(record.lex.as_ref()),
            display_cell(record.gni_per_capita.as_ref()),
            display_cell(record.population.as_ref()),
        );
    }
}

fn run_show(table: &MergedTable, selection: &Selection) {
    let bubbles = filter_bubbles(table, selection);

    println!("🫧 Year {} ({} of {} countries)", selection.year, bubbles.len(), selection.countries.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for bubble in &bubbles {
        println!(
            "{:<24} gni={:>10} lex={:>6} pop={:>10}",
            bubble.country,
            bubble.gni_per_capita.map(format_compact).unwrap_or_else(|| "-".into()),
            bubble.lex.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".into()),
            bubble.population.map(format_compact).unwrap_or_else(|| "-".into()),
        );
    }
}

fn display_cell(cell: Option<&gapminder::CellValue>) -> String {
    match cell {
        Some(gapminder::CellValue::Number(n)) => format!("{}", n),
        Some(gapminder::CellValue::Text(s)) => s.clone(),
        None => "NaN".to_string(),
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config, table: std::sync::Arc<MergedTable>) -> Result<()> {
    use std::time::Duration;

    if table.is_empty() {
        anyhow::bail!("No data to display in {}", config.data_dir.display());
    }

    let defaults = gapminder::available_defaults(&table, &config.default_countries);
    let mut app = ui::App::new(table, defaults, config.size_max);
    ui::run_ui(&mut app, Duration::from_millis(config.play_interval_ms))?;

    println!("✅ Dashboard closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config, _table: std::sync::Arc<MergedTable>) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin gapminder-server --features server");
    std::process::exit(1);
}
