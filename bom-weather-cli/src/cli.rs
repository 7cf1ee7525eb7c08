use anyhow::Context;
use bom_weather_core::{
    Config, Coordinator, Granularity, JsonFileCollector, Published, StateLog, StateWriter,
    map_condition, setup_entry,
};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::Text;
use std::{path::PathBuf, sync::Arc};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "bom-weather", version, about = "Bureau of Meteorology weather entities")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the location name and collector snapshot file.
    Configure,

    /// Refresh from a collector snapshot and print the published entity states.
    Show {
        /// Collector snapshot JSON; defaults to the configured one.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Which entity to print.
        #[arg(long, value_enum, default_value_t = View::All)]
        view: View,
    },

    /// Map a BOM icon descriptor to its weather condition.
    Condition {
        /// Icon descriptor, e.g. "mostly_sunny".
        icon: String,

        /// Treat the descriptor as a night-time forecast.
        #[arg(long)]
        night: bool,
    },

    /// Print the location of the config file.
    ConfigPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Daily,
    Hourly,
    All,
}

impl View {
    fn includes(self, granularity: Granularity) -> bool {
        match self {
            View::All => true,
            View::Daily => granularity == Granularity::Daily,
            View::Hourly => granularity == Granularity::Hourly,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure()?,
            Command::Show { snapshot, view } => show(snapshot, view).await?,
            Command::Condition { icon, night } => {
                let condition = map_condition(&icon, night)?;
                println!("{condition}");
            }
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
            }
        }

        Ok(())
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let name = Text::new("Location name:")
        .with_default(cfg.location_name())
        .prompt()
        .context("Failed to read location name")?;

    let current_snapshot =
        cfg.snapshot_path.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
    let snapshot = Text::new("Collector snapshot file:")
        .with_initial_value(&current_snapshot)
        .prompt()
        .context("Failed to read snapshot path")?;

    cfg.set_weather_name(name.trim().to_string());
    if !snapshot.trim().is_empty() {
        cfg.snapshot_path = Some(PathBuf::from(snapshot.trim()));
    }

    cfg.save()?;
    tracing::info!(
        location = cfg.location_name(),
        snapshot = ?cfg.snapshot_path,
        "configuration updated"
    );
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn show(snapshot: Option<PathBuf>, view: View) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let path = match snapshot {
        Some(path) => path,
        None => cfg.snapshot_path()?.to_path_buf(),
    };

    let published = published_states(&cfg, path, view).await?;
    let json = serde_json::to_string_pretty(&published)
        .context("Failed to serialize published entity states")?;
    println!("{json}");

    Ok(())
}

/// Run one refresh against `path` and return the state each selected entity published.
async fn published_states(
    cfg: &Config,
    path: PathBuf,
    view: View,
) -> anyhow::Result<Vec<Published>> {
    tracing::debug!(snapshot = %path.display(), ?view, "loading collector snapshot");

    let collector = Arc::new(JsonFileCollector::new(path));
    let coordinator = Arc::new(Coordinator::new(cfg.location_name(), collector));
    let log = Arc::new(StateLog::default());
    let writer: Arc<dyn StateWriter> = log.clone();

    let entities = setup_entry(cfg, &coordinator, &writer);
    let selected: Vec<_> = entities.iter().filter(|e| view.includes(e.granularity())).collect();
    for entity in &selected {
        entity.attach();
    }

    coordinator.async_refresh().await?;

    let published: Vec<Published> =
        selected.iter().filter_map(|e| log.latest(&e.unique_id())).collect();
    tracing::info!(entities = published.len(), "published entity states");

    for entity in &selected {
        entity.detach();
    }

    Ok(published)
}
