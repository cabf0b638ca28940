use cityweather_core::{SurfaceView, WeatherSummary};

/// Terminal rendering of the surface: summaries on stdout, everything else on stderr.
#[derive(Debug, Default)]
pub struct TerminalView {
    json: bool,
}

impl TerminalView {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl SurfaceView for TerminalView {
    fn set_trigger_enabled(&mut self, enabled: bool) {
        tracing::trace!(enabled, "trigger toggled");
    }

    fn set_loading(&mut self, loading: bool) {
        if loading {
            eprintln!("Fetching data...");
        }
    }

    fn show_summary(&mut self, summary: &WeatherSummary) {
        if self.json {
            match serde_json::to_string_pretty(summary) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    tracing::warn!(%err, "failed to encode summary as JSON");
                    println!("{summary}");
                }
            }
        } else {
            println!("{summary}");
        }
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("Error: {message}");
    }
}
