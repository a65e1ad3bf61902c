// Library interface for racespace
// This allows integration tests and benches to access internal modules

pub mod analysis;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod summary;
pub mod telemetry;
pub mod track_map;

// Re-export commonly used types
pub use analysis::{AnomalyDetector, ProblemPoint, Severity};
pub use config::AppConfig;
pub use errors::RaceSpaceError;
pub use pipeline::{AnalysisResult, Analyzer};
pub use summary::{AnalysisContext, SummaryAdapter};
pub use telemetry::{DecodedPayload, FormatDispatcher, Sample, SourceFormat, TrackPoint};
pub use track_map::TrackMapRenderer;
