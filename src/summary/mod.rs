pub mod client;

use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{RaceSpaceError, analysis::ProblemPoint, config::SummaryConfig, telemetry::Sample};

pub use client::ChatCompletionsClient;

/// Prefix of the text returned in place of a summary when generation fails
pub const UNAVAILABLE_PREFIX: &str = "AI analysis unavailable: ";

const UNKNOWN: &str = "unknown";

/// Session identifiers supplied by the caller, passed through without validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    pub track: Option<String>,
    pub car_class: Option<String>,
    pub game: Option<String>,
}

/// Everything the text generator gets to see about one analysis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PromptRequest {
    pub subject_track: String,
    pub subject_car_class: String,
    pub subject_game: String,
    pub sample_excerpt: Vec<Sample>,
    pub total_sample_count: usize,
    pub problem_list: Vec<ProblemPoint>,
}

impl PromptRequest {
    pub fn new(
        context: &AnalysisContext,
        samples: &[Sample],
        problems: &[ProblemPoint],
        excerpt_len: usize,
    ) -> Self {
        let label = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            subject_track: label(&context.track),
            subject_car_class: label(&context.car_class),
            subject_game: label(&context.game),
            sample_excerpt: samples.iter().take(excerpt_len).cloned().collect(),
            total_sample_count: samples.len(),
            problem_list: problems.to_vec(),
        }
    }

    /// Natural-language prompt sent as the user message.
    pub fn render(&self) -> String {
        let excerpt = serde_json::to_string(&self.sample_excerpt).unwrap_or_else(|_| "[]".into());
        let problems = if self.problem_list.is_empty() {
            "none".to_string()
        } else {
            self.problem_list
                .iter()
                .map(|p| {
                    format!(
                        "- {} ({:?} severity) at ({:.1}, {:.1})",
                        p.description, p.severity, p.position.0, p.position.1
                    )
                })
                .join("\n")
        };
        format!(
            "I am driving at {track} ({game}, {car_class}). Here are my telemetry points and the problems detected in them:\n\
             {excerpt}... ({total} points in total)\n\
             Detected problems:\n{problems}\n\n\
             Give a detailed analysis of the drive, draw conclusions, suggest technique improvements and finish with a list of recommendations.",
            track = self.subject_track,
            game = self.subject_game,
            car_class = self.subject_car_class,
            excerpt = excerpt,
            total = self.total_sample_count,
            problems = problems,
        )
    }
}

/// External service that turns a prompt into coaching prose.
pub trait TextGenerator {
    fn generate(&self, request: &PromptRequest) -> Result<String, RaceSpaceError>;
}

/// Generator used when summaries are switched off.
pub struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    fn generate(&self, _request: &PromptRequest) -> Result<String, RaceSpaceError> {
        Err(RaceSpaceError::SummaryDisabled)
    }
}

/// Produces the narrative part of an analysis. Failures of the generator never
/// escape: they are folded into a placeholder text so the numeric results are
/// still delivered.
pub struct SummaryAdapter {
    generator: Box<dyn TextGenerator>,
    excerpt_len: usize,
}

impl SummaryAdapter {
    pub fn new(config: &SummaryConfig, generator: Box<dyn TextGenerator>) -> Self {
        Self {
            generator,
            excerpt_len: config.excerpt_len,
        }
    }

    /// Adapter backed by the chat completions service described by `config`.
    /// Falls back to the offline generator when the client cannot be built.
    pub fn from_config(config: &SummaryConfig) -> Self {
        Self::or_offline(
            config,
            ChatCompletionsClient::new(config.clone())
                .map(|client| Box::new(client) as Box<dyn TextGenerator>),
        )
    }

    fn or_offline(
        config: &SummaryConfig,
        generator: Result<Box<dyn TextGenerator>, RaceSpaceError>,
    ) -> Self {
        match generator {
            Ok(generator) => Self::new(config, generator),
            Err(e) => {
                warn!("Text generation client unavailable, summaries disabled: {}", e);
                Self::offline(config)
            }
        }
    }

    pub fn offline(config: &SummaryConfig) -> Self {
        Self::new(config, Box::new(OfflineGenerator))
    }

    pub fn summarize(
        &self,
        context: &AnalysisContext,
        samples: &[Sample],
        problems: &[ProblemPoint],
    ) -> String {
        let request = PromptRequest::new(context, samples, problems, self.excerpt_len);
        let reply = self.generator.generate(&request).and_then(|text| {
            if text.trim().is_empty() {
                Err(RaceSpaceError::EmptyTextGeneration)
            } else {
                Ok(text)
            }
        });
        match reply {
            Ok(text) => {
                info!("Received {} characters of AI analysis", text.len());
                text
            }
            Err(e) => {
                warn!("AI analysis unavailable: {}", e);
                format!("{}{}", UNAVAILABLE_PREFIX, e)
            }
        }
    }
}
