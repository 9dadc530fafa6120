//! Command implementations for the WXC CLI.
//!
//! Provides subcommands for fetching daily weather history from the
//! Open-Meteo archive, keeping it current incrementally, reporting stored
//! coverage, and comparing two locations month by month.

use clap::Subcommand;

pub mod compare;
pub mod coverage;
pub mod fetch;
pub mod incremental;

use wxc_data::engine::DEFAULT_WINDOW_YEARS;

#[derive(Subcommand)]
pub enum Command {
    /// Fetch daily history for every saved location
    Fetch {
        /// Saved locations CSV (name,lat,lon,timezone,region,country)
        #[arg(short = 'l', long)]
        locations_csv: String,

        /// Output path for the daily-records CSV
        #[arg(short = 'd', long)]
        daily_csv: String,

        /// Years of history to fetch
        #[arg(long, default_value_t = DEFAULT_WINDOW_YEARS, value_parser = clap::value_parser!(u32).range(1..=100))]
        years: u32,
    },

    /// Incrementally update existing CSV data (only fetch days since the last entry)
    IncrementalFetch {
        /// Saved locations CSV
        #[arg(short = 'l', long)]
        locations_csv: String,

        /// Path to existing daily-records CSV (appended in place)
        #[arg(short = 'd', long)]
        daily_csv: String,

        /// Years of history for locations not yet in the CSV
        #[arg(long, default_value_t = DEFAULT_WINDOW_YEARS, value_parser = clap::value_parser!(u32).range(1..=100))]
        years: u32,
    },

    /// Compare two locations month by month
    Compare(compare::CompareArgs),

    /// Report how much daily history is stored per saved location
    Coverage {
        /// Saved locations CSV
        #[arg(short = 'l', long)]
        locations_csv: String,

        /// Daily-records CSV
        #[arg(short = 'd', long)]
        daily_csv: String,

        /// Write the JSON here instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Fetch {
            locations_csv,
            daily_csv,
            years,
        } => fetch::run_fetch(&locations_csv, &daily_csv, years).await,
        Command::IncrementalFetch {
            locations_csv,
            daily_csv,
            years,
        } => incremental::run_incremental(&locations_csv, &daily_csv, years).await,
        Command::Compare(args) => compare::run_compare(&args),
        Command::Coverage {
            locations_csv,
            daily_csv,
            output,
        } => coverage::run_coverage(&locations_csv, &daily_csv, output.as_deref()),
    }
}
