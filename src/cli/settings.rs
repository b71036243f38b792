//! `soberstats settings` subcommands

use clap::{Args, Subcommand};

use crate::services::AppContext;
use crate::types::{Result, ThemeName, UserSettings};

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one or more settings
    Set(SetArgs),
}

#[derive(Args, Debug, Default)]
pub struct SetArgs {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Read-only mode: refuse log edits while on
    #[arg(long, value_name = "BOOL")]
    pub family_mode: Option<bool>,

    /// Color theme
    #[arg(long, value_parser = parse_theme)]
    pub theme: Option<ThemeName>,

    /// Store a password (kept with the settings, not used as a lock)
    #[arg(long, conflicts_with = "clear_password")]
    pub password: Option<String>,

    /// Remove the stored password
    #[arg(long)]
    pub clear_password: bool,
}

fn parse_theme(s: &str) -> Result<ThemeName> {
    s.parse()
}

impl SetArgs {
    fn apply(self, mut settings: UserSettings) -> UserSettings {
        if let Some(name) = self.name {
            settings.name = name;
        }
        if let Some(family_mode) = self.family_mode {
            settings.family_mode = family_mode;
        }
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(password) = self.password {
            settings.password = Some(password);
        }
        if self.clear_password {
            settings.password = None;
        }
        settings
    }
}

fn render(settings: &UserSettings) -> String {
    format!(
        "Name:        {}\nFamily mode: {}\nTheme:       {}\nPassword:    {}",
        settings.name,
        if settings.family_mode { "on" } else { "off" },
        settings.theme,
        if settings.password.is_some() { "set" } else { "not set" }
    )
}

impl SettingsCommand {
    pub async fn run(self, ctx: &mut AppContext) -> Result<()> {
        match self {
            SettingsCommand::Show { json } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(ctx.settings())?);
                } else {
                    println!("{}", render(ctx.settings()));
                }
            }
            SettingsCommand::Set(args) => {
                let updated = args.apply(ctx.settings().clone());
                ctx.save_settings(updated).await?;
                println!("Settings saved.\n{}", render(ctx.settings()));
            }
        }
        Ok(())
    }
}
