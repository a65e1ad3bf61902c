use log::{debug, info, warn};
use serde_json::{Map, Number, Value};

use crate::RaceSpaceError;

use super::{
    BinaryDecoder, DEFAULT_TRACK_POINTS, DecodedPayload, IbtDecoder, SourceFormat,
    extract_samples,
    shapes::{
        CsvPositionTable, CsvRows, CsvTable, JsonPointArray, JsonTelemetryRecords, ShapeDecoder,
        first_match, polyline,
    },
};

/// Routes raw telemetry bytes to the decoding path for their declared format.
pub struct FormatDispatcher<B: BinaryDecoder = IbtDecoder> {
    binary_decoder: B,
    track_points: usize,
    csv_decoders: Vec<Box<dyn ShapeDecoder<CsvTable>>>,
    json_decoders: Vec<Box<dyn ShapeDecoder<Value>>>,
}

impl Default for FormatDispatcher<IbtDecoder> {
    fn default() -> Self {
        Self::new(IbtDecoder, DEFAULT_TRACK_POINTS)
    }
}

impl<B: BinaryDecoder> FormatDispatcher<B> {
    pub fn new(binary_decoder: B, track_points: usize) -> Self {
        Self {
            binary_decoder,
            track_points,
            // priority order, first match wins
            csv_decoders: vec![Box::new(CsvPositionTable), Box::new(CsvRows)],
            json_decoders: vec![Box::new(JsonPointArray), Box::new(JsonTelemetryRecords)],
        }
    }

    pub fn decode(&self, bytes: &[u8], format: SourceFormat) -> Result<DecodedPayload, RaceSpaceError> {
        info!("Decoding {} bytes of {:?} telemetry", bytes.len(), format);
        let payload = match format {
            SourceFormat::Binary => self.decode_binary(bytes)?,
            SourceFormat::Csv => self.decode_csv(text(bytes)?)?,
            SourceFormat::Json => self.decode_json(text(bytes)?)?,
        };
        info!(
            "Decoded {} samples and {} track points",
            payload.samples.len(),
            payload.track_points.len()
        );
        Ok(payload)
    }

    fn decode_binary(&self, bytes: &[u8]) -> Result<DecodedPayload, RaceSpaceError> {
        let channels = self.binary_decoder.decode_channels(bytes)?;
        debug!("Binary decoder produced {} channels", channels.len());
        let samples = extract_samples(&channels)?;
        let pairs = samples
            .iter()
            .map(|s| Some((s.x?, s.y?)))
            .collect::<Vec<_>>();
        Ok(DecodedPayload {
            track_points: polyline(&pairs, self.track_points),
            samples,
        })
    }

    fn decode_csv(&self, text: &str) -> Result<DecodedPayload, RaceSpaceError> {
        let table = parse_csv_table(text)?;
        if table.rows.is_empty() {
            warn!("CSV telemetry has no data rows");
            return Ok(DecodedPayload::default());
        }
        Ok(first_match(&self.csv_decoders, &table, self.track_points).unwrap_or_default())
    }

    fn decode_json(&self, text: &str) -> Result<DecodedPayload, RaceSpaceError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RaceSpaceError::MalformedJson { source: e })?;
        Ok(
            first_match(&self.json_decoders, &value, self.track_points).unwrap_or_else(|| {
                warn!("JSON telemetry shape not recognized, no track data extracted");
                DecodedPayload::default()
            }),
        )
    }
}

/// Decodes with the default IBT binary decoder and track point limit.
pub fn decode(bytes: &[u8], format: SourceFormat) -> Result<DecodedPayload, RaceSpaceError> {
    FormatDispatcher::default().decode(bytes, format)
}

fn text(bytes: &[u8]) -> Result<&str, RaceSpaceError> {
    std::str::from_utf8(bytes).map_err(|e| RaceSpaceError::MalformedText { source: e })
}

/// Parses a header-having CSV document, inferring numbers and booleans from cell text.
pub(crate) fn parse_csv_table(text: &str) -> Result<CsvTable, RaceSpaceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| RaceSpaceError::MalformedCsv { source: e })?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| RaceSpaceError::MalformedCsv { source: e })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.clone(), infer_cell(cell)))
            .collect::<Map<_, _>>();
        rows.push(row);
    }
    debug!("Parsed CSV with {} columns and {} rows", headers.len(), rows.len());
    Ok(CsvTable { headers, rows })
}

fn infer_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match cell {
        "true" | "TRUE" | "True" => return Value::Bool(true),
        "false" | "FALSE" | "False" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = cell.trim().parse::<i64>() {
        return Value::Number(int.into());
    }
    cell.trim()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}
