//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider behind a provider trait
//! - The Fetch Service (cancellable background lookups)
//! - A presentation-agnostic Input/Display Surface
//!
//! It is used by `cityweather-cli`, but can also back other front ends.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;
pub mod surface;

pub use config::Config;
pub use error::{FailureKind, FetchError};
pub use model::{FetchOutcome, WeatherQuery, WeatherSummary};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use service::{FetchHandle, FetchService};
pub use surface::{Submission, Surface, SurfaceState, SurfaceView};
