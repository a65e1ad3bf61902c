// Shape decoders for text telemetry payloads. Each decoder recognizes one
// layout and the dispatcher tries them in priority order.

use log::debug;
use serde_json::{Map, Value};

use super::{DecodedPayload, Sample, TrackPoint, downsample};

const HORIZONTAL_COLUMN_HINTS: [&str; 3] = ["position_x", "x_pos", "worldpositionx"];
const DEPTH_COLUMN_HINTS: [&str; 3] = ["position_z", "z_pos", "worldpositionz"];

/// Parsed CSV table with typed cells.
#[derive(Clone, Debug, Default)]
pub(crate) struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

pub(crate) trait ShapeDecoder<P: ?Sized> {
    fn name(&self) -> &'static str;

    fn try_extract(&self, payload: &P, track_points: usize) -> Option<DecodedPayload>;
}

/// Runs the decoders in order and returns the first match.
pub(crate) fn first_match<P: ?Sized>(
    decoders: &[Box<dyn ShapeDecoder<P>>],
    payload: &P,
    track_points: usize,
) -> Option<DecodedPayload> {
    decoders.iter().find_map(|decoder| {
        let decoded = decoder.try_extract(payload, track_points)?;
        debug!(
            "Payload matched {} shape: {} samples, {} track points",
            decoder.name(),
            decoded.samples.len(),
            decoded.track_points.len()
        );
        Some(decoded)
    })
}

/// Decimates per-sample coordinate pairs, then drops samples without a position.
pub(crate) fn polyline(pairs: &[Option<TrackPoint>], track_points: usize) -> Vec<TrackPoint> {
    downsample(pairs, track_points).into_iter().flatten().collect()
}

fn number(record: &Map<String, Value>, key: &str) -> Option<f64> {
    record.get(key).and_then(Value::as_f64)
}

fn find_column<'h>(headers: &'h [String], exact: &str, hints: &[&str]) -> Option<&'h String> {
    headers.iter().find(|header| {
        let header = header.to_ascii_lowercase();
        header == exact || hints.iter().any(|hint| header.contains(hint))
    })
}

/// CSV exports with recognizable horizontal and depth position columns.
pub(crate) struct CsvPositionTable;

impl ShapeDecoder<CsvTable> for CsvPositionTable {
    fn name(&self) -> &'static str {
        "csv position table"
    }

    fn try_extract(&self, table: &CsvTable, track_points: usize) -> Option<DecodedPayload> {
        let horizontal = find_column(&table.headers, "x", &HORIZONTAL_COLUMN_HINTS)?;
        let depth = find_column(&table.headers, "z", &DEPTH_COLUMN_HINTS)?;

        let pairs = table
            .rows
            .iter()
            .map(|row| Some((number(row, horizontal)?, number(row, depth)?)))
            .collect::<Vec<_>>();
        let samples = table
            .rows
            .iter()
            .map(|row| {
                let mut sample = Sample::from_record(row);
                sample.x = sample.x.or_else(|| number(row, horizontal));
                sample.z = sample.z.or_else(|| number(row, depth));
                sample
            })
            .collect();
        Some(DecodedPayload {
            track_points: polyline(&pairs, track_points),
            samples,
        })
    }
}

/// Fallback for CSV exports without position columns: rows are kept as samples
/// but there is nothing to draw.
pub(crate) struct CsvRows;

impl ShapeDecoder<CsvTable> for CsvRows {
    fn name(&self) -> &'static str {
        "csv rows"
    }

    fn try_extract(&self, table: &CsvTable, _track_points: usize) -> Option<DecodedPayload> {
        Some(DecodedPayload {
            track_points: Vec::new(),
            samples: table.rows.iter().map(Sample::from_record).collect(),
        })
    }
}

/// Top-level JSON array of point objects with `x`/`z` fields. Every point
/// with both coordinates is kept, JSON polylines are not decimated.
pub(crate) struct JsonPointArray;

impl ShapeDecoder<Value> for JsonPointArray {
    fn name(&self) -> &'static str {
        "json point array"
    }

    fn try_extract(&self, payload: &Value, _track_points: usize) -> Option<DecodedPayload> {
        let points = payload.as_array()?;
        let track_points = points
            .iter()
            .filter_map(|point| Some((point.get("x")?.as_f64()?, point.get("z")?.as_f64()?)))
            .collect();
        Some(DecodedPayload {
            track_points,
            samples: points.iter().map(Sample::from_value).collect(),
        })
    }
}

/// JSON object with a `telemetry` list of records carrying a nested `position`.
pub(crate) struct JsonTelemetryRecords;

impl ShapeDecoder<Value> for JsonTelemetryRecords {
    fn name(&self) -> &'static str {
        "json telemetry records"
    }

    fn try_extract(&self, payload: &Value, _track_points: usize) -> Option<DecodedPayload> {
        let records = payload.get("telemetry")?.as_array()?;
        let position = |record: &Value, axis: &str| {
            record.get("position").and_then(|p| p.get(axis)).and_then(Value::as_f64)
        };
        let track_points = records
            .iter()
            .filter_map(|record| Some((position(record, "x")?, position(record, "z")?)))
            .collect();
        let samples = records
            .iter()
            .map(|record| {
                let mut sample = Sample::from_value(record);
                sample.x = sample.x.or_else(|| position(record, "x"));
                sample.y = sample.y.or_else(|| position(record, "y"));
                sample.z = sample.z.or_else(|| position(record, "z"));
                sample
            })
            .collect();
        Some(DecodedPayload {
            track_points,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::DEFAULT_TRACK_POINTS;
    use serde_json::json;

    fn table(headers: &[&str], rows: Vec<Value>) -> CsvTable {
        CsvTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.as_object().unwrap().clone())
                .collect(),
        }
    }

    #[test]
    fn test_csv_world_position_columns() {
        let table = table(
            &["WorldPositionX", "WorldPositionZ", "speed"],
            vec![
                json!({"WorldPositionX": 1.0, "WorldPositionZ": 2.0, "speed": 50}),
                json!({"WorldPositionX": 3.0, "WorldPositionZ": null, "speed": 60}),
            ],
        );
        let decoded = CsvPositionTable.try_extract(&table, DEFAULT_TRACK_POINTS).unwrap();
        assert_eq!(decoded.track_points, vec![(1., 2.)]);
        assert_eq!(decoded.samples.len(), 2);
        assert_eq!(decoded.samples[1].x, Some(3.));
        assert_eq!(decoded.samples[1].z, None);
        assert_eq!(decoded.samples[1].speed, Some(60.));
    }

    #[test]
    fn test_csv_exact_axis_headers() {
        let table = table(&["X", "Z"], vec![json!({"X": 4, "Z": 5})]);
        let decoded = CsvPositionTable.try_extract(&table, DEFAULT_TRACK_POINTS).unwrap();
        assert_eq!(decoded.track_points, vec![(4., 5.)]);
    }

    #[test]
    fn test_csv_without_depth_column_not_matched() {
        let table = table(&["position_x", "speed"], vec![json!({"position_x": 1, "speed": 3})]);
        assert!(CsvPositionTable.try_extract(&table, DEFAULT_TRACK_POINTS).is_none());

        let decoded = CsvRows.try_extract(&table, DEFAULT_TRACK_POINTS).unwrap();
        assert!(decoded.track_points.is_empty());
        assert_eq!(decoded.samples.len(), 1);
    }

    #[test]
    fn test_json_array_not_matched_by_records_decoder() {
        let payload = json!([{"x": 1, "z": 2}]);
        assert!(JsonTelemetryRecords.try_extract(&payload, DEFAULT_TRACK_POINTS).is_none());
        assert!(JsonPointArray.try_extract(&json!({"x": 1}), DEFAULT_TRACK_POINTS).is_none());
    }

    #[test]
    fn test_json_records_lift_nested_position() {
        let payload = json!({"telemetry": [
            {"position": {"x": 1, "y": 7, "z": 2}, "speed": 90},
            {"position": {"x": 3}, "speed": 80},
        ]});
        let decoded = JsonTelemetryRecords
            .try_extract(&payload, DEFAULT_TRACK_POINTS)
            .unwrap();
        assert_eq!(decoded.track_points, vec![(1., 2.)]);
        assert_eq!(decoded.samples.len(), 2);
        assert_eq!(decoded.samples[0].y, Some(7.));
        assert_eq!(decoded.samples[1].x, Some(3.));
        assert_eq!(decoded.samples[1].z, None);
        // the nested position is not copied to the top level of the record
        assert_eq!(
            serde_json::to_value(&decoded.samples[0]).unwrap(),
            json!({"position": {"x": 1, "y": 7, "z": 2}, "speed": 90})
        );
    }

    #[test]
    fn test_polyline_bounded() {
        let pairs = (0..1000).map(|i| Some((i as f64, 0.))).collect::<Vec<_>>();
        assert_eq!(polyline(&pairs, DEFAULT_TRACK_POINTS).len(), DEFAULT_TRACK_POINTS);
    }

    #[test]
    fn test_json_records_not_decimated() {
        let records = (0..250)
            .map(|i| json!({"position": {"x": i, "z": 2}}))
            .collect::<Vec<_>>();
        let decoded = JsonTelemetryRecords
            .try_extract(&json!({ "telemetry": records }), DEFAULT_TRACK_POINTS)
            .unwrap();
        assert_eq!(decoded.track_points.len(), 250);
        assert_eq!(decoded.track_points[249], (249., 2.));
    }

    #[test]
    fn test_json_point_array_not_decimated() {
        let points = (0..450).map(|i| json!({"x": i, "z": i * 2})).collect::<Vec<_>>();
        let decoded = JsonPointArray
            .try_extract(&Value::Array(points), DEFAULT_TRACK_POINTS)
            .unwrap();
        assert_eq!(decoded.track_points.len(), 450);
        assert_eq!(decoded.samples.len(), 450);
    }

    #[test]
    fn test_csv_rows_serialize_verbatim() {
        let rows = vec![json!({"Speed": 120, "Gear": 3, "lap": 1})];
        let table = table(&["Speed", "Gear", "lap"], rows.clone());
        let decoded = CsvRows.try_extract(&table, DEFAULT_TRACK_POINTS).unwrap();
        assert_eq!(decoded.samples[0].speed, Some(120.));
        assert_eq!(decoded.samples[0].gear, Some(3));
        assert_eq!(serde_json::to_value(&decoded.samples).unwrap(), Value::Array(rows));
    }
}
