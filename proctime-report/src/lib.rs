#![warn(missing_docs)]
//! proctime Report - Timing Output
//!
//! Renders a finished measurement as:
//! - Human (labeled `wall` / `user` / `kernel` lines)
//! - JSON (machine-readable)

mod human;
mod json;
mod report;

pub use human::{format_duration_line, format_human_output};
pub use json::generate_json_report;
pub use report::TimingReport;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    /// Render `report` in this format
    pub fn render(self, report: &TimingReport) -> Result<String, serde_json::Error> {
        match self {
            OutputFormat::Human => Ok(format_human_output(report)),
            OutputFormat::Json => {
                let mut json = generate_json_report(report)?;
                json.push('\n');
                Ok(json)
            }
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
