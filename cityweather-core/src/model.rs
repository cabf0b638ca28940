use serde::Serialize;

use crate::error::{FailureKind, FetchError};

/// A validated city lookup. The city is trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    city: String,
}

impl WeatherQuery {
    pub fn new(input: &str) -> Result<Self, FetchError> {
        let city = input.trim();
        if city.is_empty() {
            return Err(FetchError::InvalidInput);
        }

        Ok(Self {
            city: city.to_string(),
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSummary {
    pub city: String,
    pub description: String,
    pub temperature_celsius: f64,
    pub humidity_percent: u8,
    /// Metres per second (metric units).
    pub wind_speed: f64,
}

impl std::fmt::Display for WeatherSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "City: {}", self.city)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Temperature: {}°C", self.temperature_celsius)?;
        writeln!(f, "Humidity: {}%", self.humidity_percent)?;
        write!(f, "Wind Speed: {} m/s", self.wind_speed)
    }
}

/// Result of one lookup attempt, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(WeatherSummary),
    Failure { kind: FailureKind, message: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<FetchError> for FetchOutcome {
    fn from(err: FetchError) -> Self {
        FetchOutcome::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<Result<WeatherSummary, FetchError>> for FetchOutcome {
    fn from(res: Result<WeatherSummary, FetchError>) -> Self {
        match res {
            Ok(summary) => FetchOutcome::Success(summary),
            Err(err) => err.into(),
        }
    }
}
