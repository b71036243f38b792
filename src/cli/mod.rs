mod log;
mod report;
mod settings;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::services::auth::{clear_session, AuthService};
use crate::services::export::{default_export_name, write_csv};
use crate::services::{AppContext, Aggregator, Granularity, InsightService};
use crate::store::LocalStore;
use crate::types::MEDICATIONS;

use self::log::LogArgs;
use self::settings::SettingsCommand;

/// Recovery log for benzodiazepine doses, alcohol and mood
#[derive(Parser)]
#[command(name = "soberstats")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Data directory (default: ~/.soberstats, or SOBERSTATS_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default)
    Tui,

    /// Record or edit the log for a day
    Log(LogArgs),

    /// Delete a log by id or date
    Delete {
        /// Log id (see `soberstats list`)
        #[arg(required_unless_present = "date", conflicts_with = "date")]
        id: Option<String>,

        /// Delete the log for this date instead (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// List logs, newest first
    List {
        /// Show at most this many logs
        #[arg(long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Aggregated statistics per day, week, month or year
    Stats {
        /// Bucket size
        #[arg(long, value_enum, default_value_t = Granularity::Daily)]
        by: Granularity,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Highest single-day dose per medication
    Peaks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Last 7 logs compared with the 7 before
    Trend {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dashboard summary: streak, today, top medication, trends
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Narrative insight on the last 7 logs
    Insight {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export all logs as CSV
    Export {
        /// Output file (default: soberstats_export_YYYY-MM-DD.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Medication reference table
    Reference {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign in to cloud sync
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create a cloud sync account
    Register {
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out of cloud sync
    Logout,

    /// Erase all data stored on this device
    Reset {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },
}

/// Env var holding the tracing filter
const LOG_ENV: &str = "SOBERSTATS_LOG";
const DEFAULT_LOG_FILTER: &str = "soberstats=warn";

/// Log to stderr, or to `<data_dir>/soberstats.log` while the TUI owns the screen
fn init_logging(config: &Config, tui: bool) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let log_file = tui
        .then(|| {
            fs::create_dir_all(&config.data_dir).ok()?;
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(config.data_dir.join("soberstats.log"))
                .ok()
        })
        .flatten();

    // A second init (tests) is harmless
    let _ = match log_file {
        Some(file) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Cli {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = Config::from_env()?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(config)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.config()?;
        init_logging(&config, matches!(self.command, None | Some(Commands::Tui)));
        tracing::debug!(data_dir = %config.data_dir.display(), "starting");

        // Commands that do not need a store
        match &self.command {
            Some(Commands::Reference { json }) => {
                if *json {
                    return print_json(MEDICATIONS);
                }
                println!("{}", report::render_reference(MEDICATIONS));
                return Ok(());
            }
            Some(Commands::Login { email, password }) => {
                let auth = AuthService::new(config.require_firebase()?, &config.data_dir);
                let session = auth.sign_in(email, password).await?;
                println!("Signed in as {} ({})", email, session.uid);
                return Ok(());
            }
            Some(Commands::Register { email, password }) => {
                let auth = AuthService::new(config.require_firebase()?, &config.data_dir);
                let session = auth.sign_up(email, password).await?;
                println!("Account created for {} ({})", email, session.uid);
                return Ok(());
            }
            Some(Commands::Logout) => {
                if clear_session(&config.data_dir)? {
                    println!("Signed out.");
                } else {
                    println!("Not signed in.");
                }
                return Ok(());
            }
            Some(Commands::Reset { yes }) => {
                if !*yes {
                    anyhow::bail!("this erases every local log and setting; re-run with --yes");
                }
                LocalStore::new(config.data_dir.clone())?.reset()?;
                println!("Local data erased.");
                return Ok(());
            }
            _ => {}
        }

        let mut ctx = AppContext::init(&config)
            .await
            .context("failed to open the log store")?;
        let startup_warning = ctx.warning().map(str::to_string);
        if let Some(warning) = &startup_warning {
            eprintln!("[soberstats] Warning: {}", warning);
        }

        let today = Local::now().date_naive();
        let result = match self.command {
            None | Some(Commands::Tui) => crate::tui::run(&mut ctx, &config).await,
            Some(Commands::Log(args)) => Ok(args.run(&mut ctx).await?),
            Some(Commands::Delete { id, date }) => {
                let id = match (id, date) {
                    (Some(id), _) => id,
                    (None, Some(date)) => {
                        let date = crate::types::parse_date(&date)?;
                        ctx.logs()
                            .await?
                            .into_iter()
                            .find(|l| l.date == date)
                            .map(|l| l.id)
                            .with_context(|| format!("no log recorded for {}", date))?
                    }
                    (None, None) => anyhow::bail!("give a log id or --date"),
                };
                ctx.delete_log(&id).await?;
                println!("Deleted {}", id);
                Ok(())
            }
            Some(Commands::List { limit, json }) => {
                let mut logs = ctx.logs().await?;
                if let Some(limit) = limit {
                    logs.truncate(limit);
                }
                if json {
                    print_json(&logs)
                } else {
                    println!("{}", report::render_logs(&logs));
                    Ok(())
                }
            }
            Some(Commands::Stats { by, json }) => {
                let rows = Aggregator::aggregate(&ctx.logs().await?, by);
                if json {
                    print_json(&rows)
                } else {
                    println!("{}", report::render_buckets(&rows, by));
                    Ok(())
                }
            }
            Some(Commands::Peaks { json }) => {
                let peaks = Aggregator::peaks(&ctx.logs().await?);
                if json {
                    print_json(&peaks)
                } else {
                    println!("{}", report::render_peaks(&peaks));
                    Ok(())
                }
            }
            Some(Commands::Trend { json }) => {
                let trends = Aggregator::trend(&ctx.logs().await?);
                if json {
                    print_json(&trends)
                } else {
                    println!("{}", report::render_trends(&trends));
                    Ok(())
                }
            }
            Some(Commands::Summary { json }) => {
                let summary = Aggregator::dashboard(&ctx.logs().await?, today);
                if json {
                    print_json(&summary)
                } else {
                    println!("{}", report::render_summary(&ctx.settings().name, &summary));
                    Ok(())
                }
            }
            Some(Commands::Insight { json }) => {
                let insight = InsightService::from_config(&config)
                    .generate(&ctx.logs().await?)
                    .await;
                if json {
                    print_json(&insight)
                } else {
                    println!("{}", insight.text);
                    Ok(())
                }
            }
            Some(Commands::Export { output }) => {
                let logs = ctx.logs().await?;
                let path = output.unwrap_or_else(|| default_export_name(today));
                write_csv(&logs, &path)?;
                println!("Exported {} logs to {}", logs.len(), path.display());
                Ok(())
            }
            Some(Commands::Settings { action }) => Ok(action.run(&mut ctx).await?),
            Some(
                Commands::Reference { .. }
                | Commands::Login { .. }
                | Commands::Register { .. }
                | Commands::Logout
                | Commands::Reset { .. },
            ) => Ok(()),
        };

        // Raised while the command ran, e.g. a denied log read
        if let Some(warning) = ctx.warning().filter(|w| Some(*w) != startup_warning.as_deref()) {
            eprintln!("[soberstats] Warning: {}", warning);
        }

        ctx.shutdown();
        result
    }
}
