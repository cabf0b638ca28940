use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::Config,
    error::FetchError,
    model::{WeatherQuery, WeatherSummary},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl OpenWeatherProvider {
    /// Provider with a default client (no timeout).
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self {
            api_key,
            endpoint,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?.to_owned();

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            endpoint: config.endpoint.clone(),
            http,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, query: &WeatherQuery) -> Result<WeatherSummary, FetchError> {
        tracing::debug!(
            city = query.city(),
            endpoint = %self.endpoint,
            "requesting current weather"
        );

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", query.city()),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        tracing::debug!(%status, bytes = body.len(), "received OpenWeather response");

        parse_current(query.city(), status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

/// Turn a raw current-weather response into a summary for `city`.
///
/// A 404 status or a `cod` of `"404"`/`404` means the city is unknown.
/// Any other non-success status is reported with the API's `message` when
/// present. Success bodies must carry `main.temp`, `main.humidity`,
/// `wind.speed` and a non-empty `weather` array.
pub(crate) fn parse_current(
    city: &str,
    status: StatusCode,
    body: &str,
) -> Result<WeatherSummary, FetchError> {
    let doc: Value = match serde_json::from_str(body) {
        Ok(doc) => doc,
        Err(_) if status == StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
        Err(_) if !status.is_success() => {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: truncate_body(body),
            });
        }
        Err(err) => {
            return Err(FetchError::Malformed(format!("response is not valid JSON: {err}")));
        }
    };

    if status == StatusCode::NOT_FOUND || doc.get("cod").is_some_and(is_not_found_code) {
        return Err(FetchError::NotFound);
    }

    if !status.is_success() {
        let message = doc
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| truncate_body(body));
        return Err(FetchError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: OwCurrentResponse =
        serde_json::from_value(doc).map_err(|err| FetchError::Malformed(err.to_string()))?;

    let description = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| FetchError::Malformed("`weather` array is empty".to_string()))?;

    Ok(WeatherSummary {
        city: city.to_string(),
        description,
        temperature_celsius: parsed.main.temp,
        humidity_percent: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
    })
}

fn is_not_found_code(cod: &Value) -> bool {
    match cod {
        Value::String(s) => s == "404",
        Value::Number(n) => n.as_u64() == Some(404),
        _ => false,
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
