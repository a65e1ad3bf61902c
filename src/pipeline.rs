// Top-level analysis request: decode, detect, summarize.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    RaceSpaceError,
    analysis::{AnomalyDetector, ProblemPoint},
    config::AppConfig,
    summary::{AnalysisContext, SummaryAdapter},
    telemetry::{
        BinaryDecoder, FormatDispatcher, IbtDecoder, Sample, SourceFormat, TrackPoint,
    },
};

pub const STATUS_COMPLETED: &str = "completed";

/// What the caller gets back for one analyzed file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub track: Option<String>,
    pub car_class: Option<String>,
    pub game: Option<String>,
    pub status: String,
    pub track_points: Vec<TrackPoint>,
    pub data_points: Vec<Sample>,
    pub problem_areas: Vec<ProblemPoint>,
    pub analysis_text: String,
}

pub struct Analyzer<B: BinaryDecoder = IbtDecoder> {
    dispatcher: FormatDispatcher<B>,
    detector: AnomalyDetector,
    summary: SummaryAdapter,
}

impl Analyzer<IbtDecoder> {
    /// Analyzer for the given config talking to the configured text generation service.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            FormatDispatcher::new(IbtDecoder, config.track_points),
            SummaryAdapter::from_config(&config.summary),
        )
    }
}

impl<B: BinaryDecoder> Analyzer<B> {
    pub fn new(dispatcher: FormatDispatcher<B>, summary: SummaryAdapter) -> Self {
        Self {
            dispatcher,
            detector: AnomalyDetector::default(),
            summary,
        }
    }

    /// Analyzes a telemetry file. The extension is checked against the
    /// allow-list before the file is read.
    pub fn analyze_file(
        &self,
        path: &Path,
        context: &AnalysisContext,
    ) -> Result<AnalysisResult, RaceSpaceError> {
        let format = SourceFormat::from_path(path)?;
        let bytes = std::fs::read(path).map_err(|e| RaceSpaceError::InputFileError {
            path: format!("{:?}", path),
            source: e,
        })?;
        self.analyze_bytes(&bytes, format, context)
    }

    pub fn analyze_bytes(
        &self,
        bytes: &[u8],
        format: SourceFormat,
        context: &AnalysisContext,
    ) -> Result<AnalysisResult, RaceSpaceError> {
        let payload = self.dispatcher.decode(bytes, format)?;
        let problems = self.detector.detect(&payload.samples);
        info!(
            "Found {} problem areas in {} samples",
            problems.len(),
            payload.samples.len()
        );
        let analysis_text = self.summary.summarize(context, &payload.samples, &problems);

        Ok(AnalysisResult {
            track: context.track.clone(),
            car_class: context.car_class.clone(),
            game: context.game.clone(),
            status: STATUS_COMPLETED.to_string(),
            track_points: payload.track_points,
            data_points: payload.samples,
            problem_areas: problems,
            analysis_text,
        })
    }
}
