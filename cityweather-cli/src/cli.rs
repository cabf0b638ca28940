use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use cityweather_core::{
    Config, FetchOutcome, FetchService, Submission, Surface, SurfaceView, WeatherProvider,
    WeatherQuery, provider_from_config,
};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};

use crate::view::TerminalView;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather for a city")]
pub struct Cli {
    /// OpenWeather API key for this run; overrides config and CITYWEATHER_API_KEY.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Current-weather endpoint for this run.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key, endpoint and timeout.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, e.g. "London".
        city: String,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Prompt for cities until cancelled.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match &self.command {
            Command::Configure => {
                configure()?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show { city, json } => {
                show(TerminalView::new(*json), city, || self.provider()).await
            }
            Command::Interactive => {
                interactive(|| self.provider()).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    fn config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load()?.with_api_key_override(self.api_key.clone());
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        Ok(config)
    }

    fn provider(&self) -> anyhow::Result<Arc<dyn WeatherProvider>> {
        provider_from_config(&self.config()?)
    }
}

/// Single lookup. Blank input is rejected before any provider is built, so it
/// needs no API key.
async fn show<V, F>(mut view: V, city: &str, provider: F) -> anyhow::Result<ExitCode>
where
    V: SurfaceView,
    F: FnOnce() -> anyhow::Result<Arc<dyn WeatherProvider>>,
{
    if let Err(err) = WeatherQuery::new(city) {
        view.show_error(&err.to_string());
        return Ok(ExitCode::FAILURE);
    }

    let mut surface = Surface::new(FetchService::new(provider()?), view);
    if surface.submit(city) != Submission::Started {
        return Ok(ExitCode::FAILURE);
    }

    match resolve_with_interrupt(&mut surface).await {
        Some(outcome) if outcome.is_success() => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}

/// Prompt loop. The provider is built on the first non-blank city.
async fn interactive<F>(mut provider: F) -> anyhow::Result<()>
where
    F: FnMut() -> anyhow::Result<Arc<dyn WeatherProvider>>,
{
    let mut slot: Option<Surface<TerminalView>> = None;
    loop {
        let input = tokio::task::spawn_blocking(|| {
            Text::new("Enter city name:").with_help_message("Esc to quit").prompt()
        })
        .await
        .context("City prompt task failed")?;

        let city = match input {
            Ok(city) => city,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read city name"),
        };

        if let Err(err) = WeatherQuery::new(&city) {
            TerminalView::new(false).show_error(&err.to_string());
            continue;
        }

        let mut surface = match slot.take() {
            Some(surface) => surface,
            None => Surface::new(FetchService::new(provider()?), TerminalView::new(false)),
        };
        if surface.submit(&city) == Submission::Started {
            resolve_with_interrupt(&mut surface).await;
        }
        slot = Some(surface);
    }

    Ok(())
}

/// Resolve the pending lookup, cancelling it if Ctrl-C arrives first.
async fn resolve_with_interrupt<V: SurfaceView>(
    surface: &mut Surface<V>,
) -> Option<FetchOutcome> {
    let watcher = surface.cancellation_token().map(|token| {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("interrupt received, cancelling lookup");
                token.cancel();
            }
        })
    });

    let outcome = surface.resolve().await;

    if let Some(watcher) = watcher {
        watcher.abort();
    }
    outcome
}

fn configure() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    // Read the file directly so an environment override is never persisted.
    let mut config = Config::load_from(&path)?;

    let key_help = if config.api_key.is_some() {
        "Leave empty to keep the current key"
    } else {
        "Get one at https://openweathermap.org/api"
    };
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message(key_help)
        .without_confirmation()
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }
    config.api_key().context("An API key is required")?;

    config.endpoint = Text::new("Endpoint:").with_default(&config.endpoint).prompt()?;

    let current_timeout = config.timeout_secs.map(|t| t.to_string()).unwrap_or_default();
    let timeout = Text::new("Request timeout in seconds:")
        .with_default(&current_timeout)
        .with_help_message("Leave empty for no timeout")
        .prompt()?;
    config.timeout_secs = parse_timeout(&timeout)?;

    let saved = config.save()?;
    println!("Configuration saved to {}", saved.display());
    Ok(())
}

fn parse_timeout(input: &str) -> anyhow::Result<Option<u64>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    match input.parse::<u64>() {
        Ok(0) | Err(_) => Err(anyhow!(
            "Timeout must be a positive whole number of seconds, got '{input}'"
        )),
        Ok(secs) => Ok(Some(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityweather_core::{FetchError, WeatherSummary};
    use clap::CommandFactory;
    use std::sync::Mutex;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_show_with_global_overrides() {
        let cli = Cli::try_parse_from([
            "cityweather",
            "show",
            "New York",
            "--json",
            "--api-key",
            "KEY",
        ])
        .unwrap();

        assert_eq!(cli.api_key.as_deref(), Some("KEY"));
        match cli.command {
            Command::Show { city, json } => {
                assert_eq!(city, "New York");
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_requires_city() {
        assert!(Cli::try_parse_from(["cityweather", "show"]).is_err());
    }

    #[test]
    fn parse_timeout_accepts_blank_and_positive() {
        assert_eq!(parse_timeout("").unwrap(), None);
        assert_eq!(parse_timeout(" 15 ").unwrap(), Some(15));
    }

    #[test]
    fn parse_timeout_rejects_zero_and_garbage() {
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("ten").is_err());
    }

    #[derive(Debug)]
    struct FixedProvider {
        found: bool,
    }

    #[async_trait::async_trait]
    impl WeatherProvider for FixedProvider {
        async fn current(&self, query: &WeatherQuery) -> Result<WeatherSummary, FetchError> {
            if !self.found {
                return Err(FetchError::NotFound);
            }
            Ok(WeatherSummary {
                city: query.city().to_string(),
                description: "clear sky".into(),
                temperature_celsius: 15.2,
                humidity_percent: 70,
                wind_speed: 4.1,
            })
        }
    }

    fn fixed(found: bool) -> anyhow::Result<Arc<dyn WeatherProvider>> {
        Ok(Arc::new(FixedProvider { found }))
    }

    /// View that records summaries and errors into a shared log.
    #[derive(Debug, Default, Clone)]
    struct SharedView(Arc<Mutex<Vec<String>>>);

    impl SharedView {
        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl SurfaceView for SharedView {
        fn set_trigger_enabled(&mut self, _enabled: bool) {}

        fn set_loading(&mut self, _loading: bool) {}

        fn show_summary(&mut self, summary: &WeatherSummary) {
            self.0.lock().unwrap().push(format!("summary: {}", summary.city));
        }

        fn show_error(&mut self, message: &str) {
            self.0.lock().unwrap().push(format!("error: {message}"));
        }
    }

    #[tokio::test]
    async fn show_blank_city_fails_without_building_provider() {
        let view = SharedView::default();

        let code = show(view.clone(), "   ", || Err(anyhow!("No OpenWeather API key configured")))
            .await
            .unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(view.events(), vec!["error: City name cannot be empty!".to_string()]);
    }

    #[tokio::test]
    async fn show_success_exits_zero() {
        let view = SharedView::default();

        let code = show(view.clone(), "London", || fixed(true)).await.unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(view.events(), vec!["summary: London".to_string()]);
    }

    #[tokio::test]
    async fn show_failure_exits_one() {
        let view = SharedView::default();

        let code = show(view.clone(), "Atlantis", || fixed(false)).await.unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(view.events(), vec!["error: City not found.".to_string()]);
    }

    #[tokio::test]
    async fn show_reports_missing_config_for_valid_city() {
        let err = show(SharedView::default(), "London", || {
            Err(anyhow!("No OpenWeather API key configured"))
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }
}
