// Error types for racespace

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum RaceSpaceError {
    // Input routing errors
    #[snafu(display("Unsupported telemetry file type: {extension}"))]
    UnsupportedFormat { extension: String },
    #[snafu(display("Error reading telemetry file {path}"))]
    InputFileError { path: String, source: io::Error },

    // Text payload errors
    #[snafu(display("Telemetry file is not valid UTF-8 text"))]
    MalformedText { source: std::str::Utf8Error },
    #[snafu(display("Malformed JSON telemetry: {source}"))]
    MalformedJson { source: serde_json::Error },
    #[snafu(display("Malformed CSV telemetry: {source}"))]
    MalformedCsv { source: csv::Error },

    // Binary channel errors
    #[snafu(display("Invalid IBT telemetry file: {reason}"))]
    InvalidIbtFile { reason: String },
    #[snafu(display("Missing telemetry channel {name}"))]
    MissingChannel { name: String },
    #[snafu(display("Telemetry channel {name} has no entity slots"))]
    EmptyChannelSlot { name: String },
    #[snafu(display(
        "Telemetry channel {name} has {actual} samples, expected {expected}"
    ))]
    ChannelLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    // Text generation errors
    #[snafu(display("Missing API key for the text generation service"))]
    MissingApiKey,
    #[snafu(display("AI summary disabled"))]
    SummaryDisabled,
    #[snafu(display("Text generation request failed: {source}"))]
    TextGenerationTransport { source: reqwest::Error },
    #[snafu(display("Text generation service answered with status {status}"))]
    TextGenerationStatus { status: u16 },
    #[snafu(display("Text generation service returned an empty reply"))]
    EmptyTextGeneration,

    // Config management errors
    #[snafu(display("Could not find application config directory"))]
    NoConfigDir,
    #[snafu(display("Error accessing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error (de)serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Output errors
    #[snafu(display("Error writing output file {path}"))]
    OutputWriteError { path: String, source: io::Error },
    #[snafu(display("Error serializing analysis result"))]
    ResultSerializeError { source: serde_json::Error },
}
