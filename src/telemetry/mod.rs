pub mod channels;
pub mod dispatcher;
pub mod downsample;
pub mod ibt;
pub mod normalize;
pub(crate) mod shapes;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::RaceSpaceError;

pub use channels::{BinaryDecoder, Channel, DecodedChannels, extract_samples};
pub use dispatcher::{FormatDispatcher, decode};
pub use downsample::{DEFAULT_TRACK_POINTS, downsample};
pub use ibt::IbtDecoder;
pub use normalize::{normalize_percent, problem_positions};

/// Gear number reported while in neutral
pub const NEUTRAL_GEAR: i32 = 0;

/// A 2D track coordinate pair in source units.
pub type TrackPoint = (f64, f64);

/// One telemetry reading. Every channel is optional because CSV and JSON
/// recordings carry whatever subset of channels the exporting tool chose.
///
/// The typed channels are a read-only view used by detection. Serialization
/// goes through `record`, the source row or object exactly as it was parsed.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Sample {
    /// World position, horizontal axis
    pub x: Option<f64>,
    /// World position, second axis (vertical in iRacing, elevation in most CSV exports)
    pub y: Option<f64>,
    /// World position, depth axis
    pub z: Option<f64>,
    /// Current speed, in whatever unit the source recorded
    pub speed: Option<f64>,
    /// Throttle use. 0=off throttle to 1=full throttle
    pub throttle: Option<f64>,
    /// Brake use. 0=brake released to 1=max pedal force
    pub brake: Option<f64>,
    /// Current gear
    pub gear: Option<i32>,
    /// Source fields, verbatim
    pub record: Map<String, Value>,
}

impl Sample {
    /// Builds a sample from a parsed row or JSON object. Known channels are
    /// matched by case-insensitive name and read when numeric. The record
    /// itself is kept untouched.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let mut sample = Sample {
            record: record.clone(),
            ..Default::default()
        };
        for (key, value) in record {
            let Some(number) = value.as_f64() else {
                continue;
            };
            match key.to_ascii_lowercase().as_str() {
                "x" => sample.x = Some(number),
                "y" => sample.y = Some(number),
                "z" => sample.z = Some(number),
                "speed" => sample.speed = Some(number),
                "throttle" => sample.throttle = Some(number),
                "brake" => sample.brake = Some(number),
                "gear" => sample.gear = Some(number.round() as i32),
                _ => {}
            }
        }
        sample
    }

    /// Builds a sample from a JSON value, non-object values become empty samples.
    pub fn from_value(value: &Value) -> Self {
        value.as_object().map(Sample::from_record).unwrap_or_default()
    }
}

impl From<Map<String, Value>> for Sample {
    fn from(record: Map<String, Value>) -> Self {
        Sample::from_record(&record)
    }
}

impl From<Sample> for Map<String, Value> {
    fn from(sample: Sample) -> Self {
        sample.record
    }
}

/// Reads an optional channel value, treating absent or non-finite values as zero.
pub fn value_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.)
}

/// Reads an optional gear, treating an absent gear as neutral.
pub fn gear_or_neutral(gear: Option<i32>) -> i32 {
    gear.unwrap_or(NEUTRAL_GEAR)
}

/// Output of the format dispatcher: the display polyline plus the full sample stream.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DecodedPayload {
    pub track_points: Vec<TrackPoint>,
    pub samples: Vec<Sample>,
}

/// Telemetry file formats accepted by the analyzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// iRacing binary disk telemetry (`.ibt`)
    Binary,
    Csv,
    Json,
}

impl SourceFormat {
    /// Maps a file extension to a format, `None` for anything outside the allow-list.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "ibt" => Some(Self::Binary),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, RaceSpaceError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| RaceSpaceError::UnsupportedFormat {
            extension: extension.to_string(),
        })
    }
}
