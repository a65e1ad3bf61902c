// Reader for iRacing disk telemetry (.ibt) files.
//
// Layout: a fixed header with the variable table location and record size,
// a disk sub-header with the record count, one 144 byte header per variable
// and then `record_count` fixed size records starting at the first buffer offset.

use log::{debug, warn};

use crate::RaceSpaceError;

use super::{BinaryDecoder, Channel, DecodedChannels};

const HEADER_LEN: usize = 144;
const NUM_VARS_OFFSET: usize = 24;
const VAR_HEADER_OFFSET_OFFSET: usize = 28;
const BUF_LEN_OFFSET: usize = 36;
const FIRST_BUF_OFFSET_OFFSET: usize = 52;
const RECORD_COUNT_OFFSET: usize = 140;

const VAR_HEADER_LEN: usize = 144;
const VAR_NAME_OFFSET: usize = 16;
const VAR_NAME_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VarType {
    Char,
    Bool,
    Int,
    BitField,
    Float,
    Double,
}

impl VarType {
    fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Char),
            1 => Some(Self::Bool),
            2 => Some(Self::Int),
            3 => Some(Self::BitField),
            4 => Some(Self::Float),
            5 => Some(Self::Double),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::Char | Self::Bool => 1,
            Self::Int | Self::BitField | Self::Float => 4,
            Self::Double => 8,
        }
    }

    fn read(self, bytes: &[u8]) -> f64 {
        match self {
            Self::Char | Self::Bool => bytes[0] as f64,
            Self::Int => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::BitField => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::Float => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::Double => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }
}

#[derive(Debug)]
struct VarHeader {
    name: String,
    var_type: VarType,
    offset: usize,
    count: usize,
}

fn invalid(reason: impl Into<String>) -> RaceSpaceError {
    RaceSpaceError::InvalidIbtFile {
        reason: reason.into(),
    }
}

fn read_i32(bytes: &[u8], at: usize) -> Result<i32, RaceSpaceError> {
    bytes
        .get(at..at + 4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| invalid(format!("unexpected end of file at offset {}", at)))
}

fn read_len(bytes: &[u8], at: usize, field: &str) -> Result<usize, RaceSpaceError> {
    let value = read_i32(bytes, at)?;
    usize::try_from(value).map_err(|_| invalid(format!("negative {}: {}", field, value)))
}

/// Decodes iRacing `.ibt` recordings into named channels.
#[derive(Clone, Copy, Debug, Default)]
pub struct IbtDecoder;

impl IbtDecoder {
    fn var_headers(bytes: &[u8]) -> Result<Vec<VarHeader>, RaceSpaceError> {
        let num_vars = read_len(bytes, NUM_VARS_OFFSET, "variable count")?;
        let table_offset = read_len(bytes, VAR_HEADER_OFFSET_OFFSET, "variable table offset")?;

        let table_end = num_vars
            .checked_mul(VAR_HEADER_LEN)
            .and_then(|len| len.checked_add(table_offset))
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| {
                invalid(format!(
                    "variable table of {} headers at offset {} does not fit in {} bytes",
                    num_vars,
                    table_offset,
                    bytes.len()
                ))
            })?;
        debug!("IBT variable table spans bytes {}..{}", table_offset, table_end);

        let mut headers = Vec::with_capacity(num_vars);
        for var in 0..num_vars {
            let at = table_offset + var * VAR_HEADER_LEN;
            let raw = bytes
                .get(at..at + VAR_HEADER_LEN)
                .ok_or_else(|| invalid(format!("variable header {} is truncated", var)))?;
            let raw_type = read_i32(raw, 0)?;
            let var_type = VarType::from_raw(raw_type)
                .ok_or_else(|| invalid(format!("unknown variable type {}", raw_type)))?;
            let name_bytes = &raw[VAR_NAME_OFFSET..VAR_NAME_OFFSET + VAR_NAME_LEN];
            let name_len = name_bytes.iter().position(|b| *b == 0).unwrap_or(VAR_NAME_LEN);
            headers.push(VarHeader {
                name: String::from_utf8_lossy(&name_bytes[..name_len]).into_owned(),
                var_type,
                offset: read_len(raw, 4, "variable offset")?,
                count: read_len(raw, 8, "variable count")?,
            });
        }
        Ok(headers)
    }
}

impl BinaryDecoder for IbtDecoder {
    fn decode_channels(&self, bytes: &[u8]) -> Result<DecodedChannels, RaceSpaceError> {
        if bytes.len() < HEADER_LEN {
            return Err(invalid(format!(
                "file is {} bytes, shorter than the {} byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }
        let record_len = read_len(bytes, BUF_LEN_OFFSET, "record length")?;
        let data_offset = read_len(bytes, FIRST_BUF_OFFSET_OFFSET, "data offset")?;
        let declared_records = read_len(bytes, RECORD_COUNT_OFFSET, "record count")?;
        let headers = Self::var_headers(bytes)?;

        for header in &headers {
            if header.offset + header.count * header.var_type.size() > record_len {
                return Err(invalid(format!(
                    "variable {} does not fit in a {} byte record",
                    header.name, record_len
                )));
            }
        }

        let available_records = if record_len == 0 {
            0
        } else {
            bytes.len().saturating_sub(data_offset) / record_len
        };
        let record_count = if declared_records > available_records {
            warn!(
                "IBT file declares {} records but only {} are present",
                declared_records, available_records
            );
            available_records
        } else {
            declared_records
        };
        debug!(
            "IBT file has {} variables, {} records of {} bytes",
            headers.len(),
            record_count,
            record_len
        );

        let mut channels = DecodedChannels::with_capacity(headers.len());
        for header in headers {
            let size = header.var_type.size();
            let mut values = Vec::with_capacity(record_count * header.count);
            for record in 0..record_count {
                let start = data_offset + record * record_len + header.offset;
                for slot in 0..header.count {
                    let at = start + slot * size;
                    values.push(header.var_type.read(&bytes[at..at + size]));
                }
            }
            channels.insert(
                header.name,
                Channel {
                    width: header.count,
                    values,
                },
            );
        }
        Ok(channels)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) enum TestVar {
        Float(&'static str, usize),
        Int(&'static str, usize),
        Double(&'static str),
    }

    impl TestVar {
        fn name(&self) -> &'static str {
            match self {
                Self::Float(name, _) | Self::Int(name, _) | Self::Double(name) => name,
            }
        }

        fn raw_type(&self) -> i32 {
            match self {
                Self::Float(..) => 4,
                Self::Int(..) => 2,
                Self::Double(..) => 5,
            }
        }

        fn count(&self) -> usize {
            match self {
                Self::Float(_, count) | Self::Int(_, count) => *count,
                Self::Double(_) => 1,
            }
        }

        fn size(&self) -> usize {
            match self {
                Self::Double(_) => 8,
                _ => 4,
            }
        }

        fn encode(&self, value: f64) -> Vec<u8> {
            match self {
                Self::Float(..) => (value as f32).to_le_bytes().to_vec(),
                Self::Int(..) => (value as i32).to_le_bytes().to_vec(),
                Self::Double(..) => value.to_le_bytes().to_vec(),
            }
        }
    }

    /// Builds an IBT image. `value(var, record, slot)` supplies every value.
    pub(crate) fn build_ibt(
        vars: &[TestVar],
        records: usize,
        value: impl Fn(usize, usize, usize) -> f64,
    ) -> Vec<u8> {
        let var_table_offset = HEADER_LEN;
        let mut offsets = Vec::new();
        let mut record_len = 0;
        for var in vars {
            offsets.push(record_len);
            record_len += var.size() * var.count();
        }
        let data_offset = var_table_offset + vars.len() * VAR_HEADER_LEN;

        fn put(bytes: &mut [u8], at: usize, v: i32) {
            bytes[at..at + 4].copy_from_slice(&v.to_le_bytes());
        }

        let mut bytes = vec![0u8; data_offset];
        put(&mut bytes, 0, 2);
        put(&mut bytes, 8, 60);
        put(&mut bytes, NUM_VARS_OFFSET, vars.len() as i32);
        put(&mut bytes, VAR_HEADER_OFFSET_OFFSET, var_table_offset as i32);
        put(&mut bytes, 32, 1);
        put(&mut bytes, BUF_LEN_OFFSET, record_len as i32);
        put(&mut bytes, FIRST_BUF_OFFSET_OFFSET, data_offset as i32);
        put(&mut bytes, RECORD_COUNT_OFFSET, records as i32);

        for (i, var) in vars.iter().enumerate() {
            let at = var_table_offset + i * VAR_HEADER_LEN;
            put(&mut bytes, at, var.raw_type());
            put(&mut bytes, at + 4, offsets[i] as i32);
            put(&mut bytes, at + 8, var.count() as i32);
            let name = var.name().as_bytes();
            bytes[at + VAR_NAME_OFFSET..at + VAR_NAME_OFFSET + name.len()].copy_from_slice(name);
        }

        for record in 0..records {
            for (i, var) in vars.iter().enumerate() {
                for slot in 0..var.count() {
                    bytes.extend(var.encode(value(i, record, slot)));
                }
            }
        }
        bytes
    }

    #[test]
    fn test_decode_scalar_and_per_car_channels() {
        let vars = [
            TestVar::Float("Speed", 1),
            TestVar::Int("CarIdxGear", 3),
            TestVar::Double("SessionTime"),
        ];
        let bytes = build_ibt(&vars, 4, |var, record, slot| match var {
            0 => record as f64 * 1.5,
            1 => (record * 10 + slot) as f64,
            _ => record as f64 / 60.,
        });

        let channels = IbtDecoder.decode_channels(&bytes).unwrap();
        assert_eq!(channels.len(), 3);

        let speed = &channels["Speed"];
        assert_eq!(speed.len(), 4);
        assert_eq!(speed.value(3, 0), Some(4.5));

        let gear = &channels["CarIdxGear"];
        assert_eq!(gear.width, 3);
        assert_eq!(gear.value(2, 0), Some(20.));
        assert_eq!(gear.value(2, 2), Some(22.));

        assert_eq!(channels["SessionTime"].value(1, 0), Some(1. / 60.));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let result = IbtDecoder.decode_channels(&[0u8; 40]);
        assert!(matches!(result, Err(RaceSpaceError::InvalidIbtFile { .. })));
    }

    #[test]
    fn test_oversized_var_count_rejected() {
        let mut bytes = build_ibt(&[TestVar::Float("Speed", 1)], 2, |_, record, _| record as f64);
        bytes[NUM_VARS_OFFSET..NUM_VARS_OFFSET + 4].copy_from_slice(&i32::MAX.to_le_bytes());
        match IbtDecoder.decode_channels(&bytes) {
            Err(RaceSpaceError::InvalidIbtFile { reason }) => {
                assert!(reason.contains("does not fit"), "{}", reason)
            }
            other => panic!("Expected InvalidIbtFile error, got {:?}", other),
        }

        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[NUM_VARS_OFFSET..NUM_VARS_OFFSET + 4].copy_from_slice(&0x7fff_ffffi32.to_le_bytes());
        bytes[VAR_HEADER_OFFSET_OFFSET..VAR_HEADER_OFFSET_OFFSET + 4]
            .copy_from_slice(&i32::MAX.to_le_bytes());
        assert!(matches!(
            IbtDecoder.decode_channels(&bytes),
            Err(RaceSpaceError::InvalidIbtFile { .. })
        ));
    }

    #[test]
    fn test_truncated_var_table_rejected() {
        let bytes = build_ibt(&[TestVar::Float("Speed", 1)], 0, |_, _, _| 0.);
        let result = IbtDecoder.decode_channels(&bytes[..HEADER_LEN + 10]);
        assert!(matches!(result, Err(RaceSpaceError::InvalidIbtFile { .. })));
    }

    #[test]
    fn test_partial_trailing_record_dropped() {
        let bytes = build_ibt(&[TestVar::Float("Speed", 1)], 5, |_, record, _| record as f64);
        let channels = IbtDecoder.decode_channels(&bytes[..bytes.len() - 2]).unwrap();
        assert_eq!(channels["Speed"].len(), 4);
    }

    #[test]
    fn test_unknown_var_type_rejected() {
        let mut bytes = build_ibt(&[TestVar::Float("Speed", 1)], 1, |_, _, _| 0.);
        bytes[HEADER_LEN..HEADER_LEN + 4].copy_from_slice(&9i32.to_le_bytes());
        let result = IbtDecoder.decode_channels(&bytes);
        assert!(matches!(result, Err(RaceSpaceError::InvalidIbtFile { .. })));
    }
}
