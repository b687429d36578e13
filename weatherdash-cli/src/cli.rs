use std::io::BufRead;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tokio::sync::mpsc;
use weatherdash_core::{Config, Controller, Event, Theme, provider_from_config};

use crate::view;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Terminal weather dashboard")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional default city.
    Configure,

    /// Print the dashboard for a city once.
    Show {
        /// City name, e.g. "Athens".
        city: String,

        /// Use the light palette.
        #[arg(long)]
        light: bool,
    },

    /// Print the dashboard for the current location once.
    Locate {
        /// Use the light palette.
        #[arg(long)]
        light: bool,
    },

    /// Interactive dashboard with a live clock.
    ///
    /// Type a city and press Enter to search. Commands: `:locate`, `:theme`, `:quit`.
    Dashboard {
        /// City to load on start; defaults to `default_city` from the config.
        #[arg(long)]
        city: Option<String>,

        /// Start with the light palette.
        #[arg(long)]
        light: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, light } => {
                let mut controller = controller(&Config::load()?, light)?;
                controller.search(&city).await;
                print_once(controller.state())
            }
            Command::Locate { light } => {
                let mut controller = controller(&Config::load()?, light)?;
                controller.locate().await;
                print_once(controller.state())
            }
            Command::Dashboard { city, light } => {
                let config = Config::load()?;
                let city = city.or_else(|| config.default_city.clone());
                dashboard(controller(&config, light)?, city).await
            }
        }
    }
}

fn controller(config: &Config, light: bool) -> anyhow::Result<Controller> {
    let provider = provider_from_config(config)?;
    let geolocator = config.geolocator()?;
    let theme = if light { Theme::Light } else { config.theme };

    Ok(Controller::new(provider, geolocator).with_theme(theme))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let default_city = inquire::Text::new("Default city (optional):")
        .with_initial_value(config.default_city.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read default city")?;

    config.set_api_key(api_key.trim().to_string());
    let default_city = default_city.trim();
    config.default_city = (!default_city.is_empty()).then(|| default_city.to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_once(state: &weatherdash_core::DashboardState) -> anyhow::Result<()> {
    println!("{}", view::render(state, true));

    match &state.error {
        Some(message) => Err(anyhow::anyhow!("{message}")),
        None => Ok(()),
    }
}

async fn dashboard(controller: Controller, city: Option<String>) -> anyhow::Result<()> {
    let mut updates = controller.subscribe();
    let (events_tx, events) = mpsc::channel(16);

    if let Some(city) = city {
        events_tx.send(Event::Search(city)).await?;
    }

    // Interactive stdin blocks; it gets its own thread.
    let input_tx = events_tx.clone();
    std::thread::spawn(move || read_input(input_tx));
    drop(events_tx);

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    let driver = tokio::spawn(controller.run(events, shutdown));

    let mut out = std::io::stdout();
    view::draw(&mut out, &updates.borrow_and_update())?;
    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();
        view::draw(&mut out, &state)?;
    }

    driver.await.context("Dashboard loop failed")?;
    Ok(())
}

fn read_input(events: mpsc::Sender<Event>) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let event = parse_input(&line);
        let quit = event == Event::Quit;
        if events.blocking_send(event).is_err() || quit {
            return;
        }
    }
    let _ = events.blocking_send(Event::Quit);
}

/// One line typed at the prompt.
pub fn parse_input(line: &str) -> Event {
    match line.trim() {
        ":q" | ":quit" => Event::Quit,
        ":l" | ":locate" => Event::Locate,
        ":t" | ":theme" => Event::ToggleTheme,
        query => Event::Search(query.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_searches() {
        assert_eq!(parse_input(":quit"), Event::Quit);
        assert_eq!(parse_input(" :l "), Event::Locate);
        assert_eq!(parse_input(":theme"), Event::ToggleTheme);
        assert_eq!(parse_input("  New York "), Event::Search("New York".to_string()));
    }

    #[test]
    fn cli_parses_show() {
        let cli = Cli::try_parse_from(["weatherdash", "-vv", "show", "Athens", "--light"])
            .expect("valid args");
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Show { ref city, light: true } if city == "Athens"));
    }
}
