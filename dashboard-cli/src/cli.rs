use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use dashboard_core::{
    Config, Dashboard, ExportFormat, LocationConfig, SearchForm, SearchUpdate, StaticGeolocator,
    backend_from_config,
};
use inquire::{Confirm, CustomType, Select, Text};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard in the terminal")]
pub struct Cli {
    /// Backend origin, e.g. http://localhost:8000. Overrides the config file.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Latitude of this device. Needs --lon.
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of this device. Needs --lat.
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Log requests and state changes to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the backend URL and an optional fixed location.
    Configure,

    /// Locate this device and show its weather.
    Show {
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Show weather for a named place; missing fields are prompted for.
    Search {
        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        country: Option<String>,

        /// Day to look up (YYYY-MM-DD); absent means "now".
        #[arg(long)]
        date: Option<String>,

        /// Skip the place fields and locate this device instead.
        #[arg(long, conflicts_with_all = ["city", "state", "country", "date"])]
        here: bool,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Browse and manage past searches.
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List stored searches, newest first.
    List,

    /// Show the weather stored with a search.
    View {
        id: String,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Search again, starting from a stored search's place.
    Edit { id: String },

    /// Delete one or more stored searches.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Change the place recorded for a stored search.
    Update {
        id: String,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        country: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Also save the shown weather as json or csv.
    #[arg(long, value_parser = parse_export_format)]
    pub export: Option<ExportFormat>,

    /// Directory for the export; defaults to the configured one.
    #[arg(long, requires = "export")]
    pub out: Option<PathBuf>,
}

fn parse_export_format(value: &str) -> Result<ExportFormat, String> {
    ExportFormat::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let Cli { backend, lat, lon, verbose: _, command } = self;

        let mut config = Config::load()?;
        if let Some(url) = backend.as_deref() {
            config.set_backend_url(url)?;
        }
        tracing::debug!(backend = %config.backend_url, "configuration loaded");

        match command {
            Command::Configure => {
                configure(config)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show { export } => {
                let mut dash = build_dashboard(&config, lat, lon)?;
                dash.mount().await;
                finish(&dash, &config, &export)
            }
            Command::Search { city, state, country, date, here, export } => {
                let mut dash = build_dashboard(&config, lat, lon)?;
                let no_fields =
                    city.is_none() && state.is_none() && country.is_none() && date.is_none();
                if here || (no_fields && choose_my_location()?) {
                    dash.open_search_dialog();
                    dash.use_my_location().await;
                    return finish(&dash, &config, &export);
                }

                let form = SearchForm {
                    city: prompt_if_missing("City", city)?,
                    state: prompt_if_missing("State", state)?,
                    country: prompt_if_missing("Country", country)?,
                    date: date.unwrap_or_default(),
                };
                submit(&mut dash, form).await?;
                finish(&dash, &config, &export)
            }
            Command::History { action } => {
                let mut dash = build_dashboard(&config, lat, lon)?;
                run_history(&mut dash, &config, action).await
            }
        }
    }
}

fn build_dashboard(config: &Config, lat: Option<f64>, lon: Option<f64>) -> anyhow::Result<Dashboard> {
    let position = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(LocationConfig::new(lat, lon)?.coordinates()),
        (None, None) => config.fixed_position(),
        _ => bail!("--lat and --lon must be given together"),
    };

    let backend = backend_from_config(config)?;
    let geolocator = StaticGeolocator::new(position);

    Ok(Dashboard::new(backend, Box::new(geolocator)).with_geo_options(config.geo_options()))
}

async fn run_history(
    dash: &mut Dashboard,
    config: &Config,
    action: HistoryCommand,
) -> anyhow::Result<ExitCode> {
    match action {
        HistoryCommand::List => {
            dash.open_history_panel();
            dash.refresh_history().await;
            println!("{}", render::history(dash.state().history()));
            Ok(ExitCode::SUCCESS)
        }
        HistoryCommand::View { id, export } => {
            dash.view_history_item(&id).await;
            finish(dash, config, &export)
        }
        HistoryCommand::Edit { id } => {
            dash.refresh_history().await;
            let entry = dash
                .state()
                .history()
                .iter()
                .find(|entry| entry.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("No search record with id '{id}'"))?;

            dash.edit_history_item(&entry);
            let prefilled = dash.state().search_form().clone();
            let form = SearchForm {
                city: Text::new("City:").with_initial_value(&prefilled.city).prompt()?,
                state: Text::new("State:").with_initial_value(&prefilled.state).prompt()?,
                country: Text::new("Country:").with_initial_value(&prefilled.country).prompt()?,
                date: Text::new("Date (YYYY-MM-DD, optional):").prompt()?,
            };
            submit(dash, form).await?;
            finish(dash, config, &ExportArgs { export: None, out: None })
        }
        HistoryCommand::Delete { ids, yes } => {
            let confirm = |prompt: &str| {
                yes || Confirm::new(prompt).with_default(false).prompt().unwrap_or(false)
            };

            let sent = match ids.as_slice() {
                [id] => dash.delete_history_item(id, confirm).await,
                _ => dash.delete_history_items(&ids, confirm).await,
            };
            if !sent {
                println!("Nothing deleted.");
            }
            println!("{}", render::history(dash.state().history()));
            Ok(ExitCode::SUCCESS)
        }
        HistoryCommand::Update { id, city, state, country } => {
            let update = SearchUpdate { city, state, country };
            let entry = dash
                .update_history_item(&id, &update)
                .await
                .map_err(|e| anyhow!(e.user_message("Failed to update search record")))?;
            println!("Updated {}: {}, {}, {}", entry.id, entry.city, entry.state, entry.country);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Submit the form, re-prompting while it fails validation.
async fn submit(dash: &mut Dashboard, mut form: SearchForm) -> anyhow::Result<()> {
    loop {
        dash.submit_search(form).await;

        let Some(message) = dash.state().form_error().map(str::to_string) else {
            return Ok(());
        };
        eprintln!("{message}");

        let current = dash.state().search_form().clone();
        form = SearchForm {
            city: Text::new("City:").with_initial_value(&current.city).prompt()?,
            state: Text::new("State:").with_initial_value(&current.state).prompt()?,
            country: Text::new("Country:").with_initial_value(&current.country).prompt()?,
            date: Text::new("Date (YYYY-MM-DD, optional):")
                .with_initial_value(&current.date)
                .prompt()?,
        };
    }
}

/// Print the screen, write the requested export and pick the exit code.
fn finish(dash: &Dashboard, config: &Config, export: &ExportArgs) -> anyhow::Result<ExitCode> {
    let state = dash.state();
    println!("{}", render::view(state));

    if state.error_message().is_some() {
        return Ok(ExitCode::FAILURE);
    }

    if let Some(format) = export.export {
        let file = dash
            .export(format)
            .map_err(|e| anyhow!(e.user_message("Failed to export weather data")))?
            .context("No weather data to export")?;
        let dir = export.out.clone().unwrap_or_else(|| config.export_dir());
        let path = file.write_to(&dir)?;
        println!("Saved {} export to {}", format, path.display());
    }

    Ok(ExitCode::SUCCESS)
}

const SEARCH_A_PLACE: &str = "Search a place";
const USE_MY_LOCATION: &str = "Use my location";

fn choose_my_location() -> anyhow::Result<bool> {
    let choice = Select::new("Find weather by:", vec![SEARCH_A_PLACE, USE_MY_LOCATION]).prompt()?;
    Ok(choice == USE_MY_LOCATION)
}

fn prompt_if_missing(label: &str, value: Option<String>) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Text::new(&format!("{label}:")).prompt()?),
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let url = Text::new("Backend URL:").with_initial_value(&config.backend_url).prompt()?;
    config.set_backend_url(&url)?;

    let use_fixed = Confirm::new("Use a fixed location for this device?")
        .with_default(config.location.is_some())
        .prompt()?;

    if use_fixed {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()?;
        config.set_location(latitude, longitude)?;
    } else {
        config.location = None;
    }

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
