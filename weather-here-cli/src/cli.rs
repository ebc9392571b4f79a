use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, Select, Text};
use std::convert::TryFrom;

use weather_here_core::{
    AppEvent, Config, ConfigError, CredentialKind, ResolutionPhase, Services, Session,
    TemperatureUnit,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-here", version, about = "Current weather wherever you are")]
pub struct Cli {
    /// Initial temperature unit: "c" or "f". Defaults to the configured unit.
    #[arg(long, value_parser = parse_unit)]
    pub unit: Option<TemperatureUnit>,

    /// Log debug output to stderr.
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a credential in the config file.
    Configure {
        /// Credential short name: "openweather", "opencage" or "geonames".
        credential: String,
    },

    /// Print the config file location.
    ConfigPath,
}

fn parse_unit(s: &str) -> Result<TemperatureUnit, String> {
    TemperatureUnit::try_from(s).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ToggleUnit,
    EnterLocation,
    Wait,
    Refresh,
    RetryAutomatic,
    Quit,
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Action::ToggleUnit => "Switch °C / °F",
            Action::EnterLocation => "Enter a location",
            Action::Wait => "Wait for automatic location",
            Action::Refresh => "Refresh weather",
            Action::RetryAutomatic => "Detect my location again",
            Action::Quit => "Quit",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Command::Configure { credential }) => configure(&credential).await,
            Some(Command::ConfigPath) => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
            None => interactive(self.unit).await,
        }
    }
}

async fn configure(credential: &str) -> anyhow::Result<()> {
    let kind = CredentialKind::try_from(credential)?;

    let message = format!("Value for {} ({}):", kind, kind.as_str());
    let value = blocking_prompt(move || {
        Password::new(&message).without_confirmation().prompt()
    })
    .await?
    .ok_or_else(|| anyhow!("Configuration cancelled"))?;

    if value.trim().is_empty() {
        return Err(anyhow!("Empty value; nothing saved."));
    }

    let mut config = Config::load()?;
    config.set_credential(kind, value.trim().to_string());
    config.save()?;

    println!("Saved {} to {}", kind.as_str(), Config::config_file_path()?.display());
    Ok(())
}

async fn interactive(unit: Option<TemperatureUnit>) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    config.apply_process_env();

    let services = Services::from_config(&config).map_err(with_credentials_hint)?;
    let unit = unit.unwrap_or(config.display.unit);
    let mut session = Session::new(services, unit, config.debounce());

    // Detection runs in the background; the user may enter a location meanwhile.
    session.dispatch(AppEvent::Start);

    loop {
        session.drain();
        println!("{}", render::render(session.state()));

        let Some(action) = choose_action(session.state().phase()).await? else {
            break;
        };
        session.drain();

        match action {
            Action::ToggleUnit => session.dispatch(AppEvent::ToggleUnit),
            Action::EnterLocation => enter_location(&mut session).await?,
            Action::Wait => session.settle().await,
            Action::Refresh => {
                session.dispatch(AppEvent::Refresh);
                session.settle().await;
            }
            Action::RetryAutomatic => session.dispatch(AppEvent::RetryAutomatic),
            Action::Quit => break,
        }
    }

    Ok(())
}

fn actions_for(phase: ResolutionPhase) -> Vec<Action> {
    let mut actions = vec![Action::EnterLocation];
    match phase {
        ResolutionPhase::Resolved => actions.extend([Action::ToggleUnit, Action::Refresh]),
        ResolutionPhase::Failed => actions.push(Action::RetryAutomatic),
        ResolutionPhase::Resolving => actions.push(Action::Wait),
    }
    actions.push(Action::Quit);
    actions
}

async fn choose_action(phase: ResolutionPhase) -> anyhow::Result<Option<Action>> {
    let actions = actions_for(phase);
    blocking_prompt(move || Select::new("What next?", actions).prompt()).await
}

/// City prompt → suggestions → country prompt → submit.
async fn enter_location(session: &mut Session) -> anyhow::Result<()> {
    let draft = session.state().draft().clone();

    let Some(city) =
        blocking_prompt(move || Text::new("City:").with_initial_value(&draft.city).prompt()).await?
    else {
        return Ok(());
    };

    session.dispatch(AppEvent::CityInput(city.clone()));
    session.settle_suggestions().await;

    let suggestions = session.state().suggestions().to_vec();
    if !suggestions.is_empty() {
        let mut options: Vec<String> = suggestions.iter().map(ToString::to_string).collect();
        options.push(format!("Keep \"{city}\""));

        let picked = blocking_prompt(move || {
            Select::new("Did you mean:", options).raw_prompt().map(|choice| choice.index)
        })
        .await?;

        match picked {
            Some(index) if index < suggestions.len() => {
                session.dispatch(AppEvent::SelectSuggestion(index))
            }
            Some(_) => {}
            None => return Ok(()),
        }
    }

    let country_draft = session.state().draft().country.clone();
    let Some(country) = blocking_prompt(move || {
        Text::new("Country:").with_initial_value(&country_draft).prompt()
    })
    .await?
    else {
        return Ok(());
    };

    session.dispatch(AppEvent::CountryInput(country));
    session.dispatch(AppEvent::Submit);
    session.settle().await;
    Ok(())
}

/// Run a blocking inquire prompt off the async executor. Cancellation (Esc / Ctrl-C)
/// maps to `None`.
async fn blocking_prompt<T, F>(prompt: F) -> anyhow::Result<Option<T>>
where
    F: FnOnce() -> Result<T, InquireError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(prompt).await.context("Prompt task failed")? {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn with_credentials_hint(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::MissingCredentials(_)) => {
            let vars: Vec<String> = CredentialKind::all()
                .iter()
                .map(|k| {
                    format!(
                        "  weather-here configure {:<12} (or set {})",
                        k.short_name(),
                        k.env_var()
                    )
                })
                .collect();
            anyhow!("{err}\nHint: provide the missing credentials with:\n{}", vars.join("\n"))
        }
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unit_flag() {
        let cli = Cli::try_parse_from(["weather-here", "--unit", "f"]).expect("valid args");
        assert_eq!(cli.unit, Some(TemperatureUnit::Fahrenheit));
        assert!(cli.command.is_none());
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(Cli::try_parse_from(["weather-here", "--unit", "k"]).is_err());
    }

    #[test]
    fn parses_configure() {
        let cli =
            Cli::try_parse_from(["weather-here", "configure", "opencage"]).expect("valid args");
        assert!(matches!(
            cli.command,
            Some(Command::Configure { credential }) if credential == "opencage"
        ));
    }

    #[test]
    fn location_entry_offered_while_detecting() {
        assert_eq!(
            actions_for(ResolutionPhase::Resolving),
            vec![Action::EnterLocation, Action::Wait, Action::Quit]
        );
        assert!(!actions_for(ResolutionPhase::Resolved).contains(&Action::Wait));
        assert!(actions_for(ResolutionPhase::Failed).contains(&Action::RetryAutomatic));
    }

    #[test]
    fn missing_credentials_get_a_hint() {
        let err = anyhow::Error::new(ConfigError::MissingCredentials(vec!["geonames_username"]));
        let msg = with_credentials_hint(err).to_string();

        assert!(msg.contains("Missing required credentials: geonames_username"));
        assert!(msg.contains("weather-here configure geonames"));
        assert!(msg.contains("GEONAMES_USERNAME"));
    }

    #[test]
    fn other_errors_pass_through() {
        let msg = with_credentials_hint(anyhow!("disk full")).to_string();
        assert_eq!(msg, "disk full");
    }
}
