mod feed;
mod submit;

use chalkboards_core::{CategoryTable, Radius, TimeOfDay, Weekday};
use chalkboards_feed::FeedMode;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "chalkboards-cli")]
#[command(about = "Nearby food and drink specials from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the current feed once
    Feed {
        #[command(flatten)]
        filters: FeedArgs,
    },
    /// Keep printing the top of the feed every time it refreshes
    Watch {
        #[command(flatten)]
        filters: FeedArgs,
        /// Seconds between refreshes (defaults to `CHALKBOARDS_REFRESH_INTERVAL_SECS`)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// List the category filter keys
    Categories,
    /// Post a flash special; it goes live immediately
    SubmitFlash {
        #[command(flatten)]
        listing: ListingArgs,
        /// Minutes until the special expires
        #[arg(long)]
        duration_minutes: Option<u32>,
    },
    /// Post a weekly special; it is held for moderation
    SubmitWeekly {
        #[command(flatten)]
        listing: ListingArgs,
        /// Day of the week, e.g. `tue` or `Tuesday`
        #[arg(long)]
        weekday: Weekday,
        /// Start time, `HH:MM` (24-hour)
        #[arg(long, value_parser = parse_time)]
        start: TimeOfDay,
        /// End time, `HH:MM` (24-hour); earlier than start runs past midnight
        #[arg(long, value_parser = parse_time)]
        end: TimeOfDay,
    },
}

#[derive(Debug, Clone, Args)]
pub(crate) struct FeedArgs {
    /// Origin latitude (defaults to `CHALKBOARDS_DEFAULT_LAT`)
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Origin longitude (defaults to `CHALKBOARDS_DEFAULT_LNG`)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,
    /// Radius in miles, or `any`
    #[arg(long)]
    pub radius: Option<Radius>,
    /// Match against business name, address and description
    #[arg(long, default_value = "")]
    pub search: String,
    /// Category key, or `all`
    #[arg(long)]
    pub category: Option<String>,
    /// `now` or `upcoming`
    #[arg(long, default_value = "now")]
    pub mode: FeedMode,
    /// Cards to print after the top strip
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct ListingArgs {
    #[arg(long)]
    pub business_name: String,
    #[arg(long)]
    pub street: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub zip: String,
    /// What the special is
    #[arg(long)]
    pub description: String,
}

fn parse_time(raw: &str) -> Result<TimeOfDay, String> {
    TimeOfDay::parse(raw).ok_or_else(|| format!("expected HH:MM, got '{raw}'"))
}

fn load_category_table(config: &chalkboards_core::AppConfig) -> anyhow::Result<CategoryTable> {
    Ok(match &config.categories_path {
        Some(path) => chalkboards_core::load_categories(path)?,
        None => CategoryTable::builtin(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("chalkboards-cli: pass a command, e.g. `feed` (see --help)");
        return Ok(());
    };

    let config = chalkboards_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let categories = load_category_table(&config)?;

    match command {
        Commands::Feed { filters } => feed::run_feed(&config, &categories, &filters).await,
        Commands::Watch {
            filters,
            interval_secs,
        } => feed::run_watch(&config, &categories, &filters, interval_secs).await,
        Commands::Categories => {
            feed::print_categories(&categories);
            Ok(())
        }
        Commands::SubmitFlash {
            listing,
            duration_minutes,
        } => submit::run_submit_flash(&config, listing, duration_minutes).await,
        Commands::SubmitWeekly {
            listing,
            weekday,
            start,
            end,
        } => submit::run_submit_weekly(&config, listing, weekday, start, end).await,
    }
}

#[cfg(test)]
mod tests;
