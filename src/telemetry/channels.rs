use std::collections::HashMap;

use log::debug;
use serde_json::{Map, Number, Value};

use crate::RaceSpaceError;

use super::Sample;

pub const POS_X_CHANNEL: &str = "CarIdxPosX";
pub const POS_Y_CHANNEL: &str = "CarIdxPosY";
pub const POS_Z_CHANNEL: &str = "CarIdxPosZ";
pub const GEAR_CHANNEL: &str = "CarIdxGear";
pub const SPEED_CHANNEL: &str = "Speed";
pub const THROTTLE_CHANNEL: &str = "Throttle";
pub const BRAKE_CHANNEL: &str = "Brake";

/// Entity slot of the subject vehicle in per-car channels
pub const SUBJECT_CAR_SLOT: usize = 0;

/// One named channel. Per-car channels carry `width` values per sample,
/// scalar channels have a width of 1. Values are stored row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Channel {
    pub width: usize,
    pub values: Vec<f64>,
}

impl Channel {
    pub fn scalar(values: Vec<f64>) -> Self {
        Self { width: 1, values }
    }

    pub fn per_entity(width: usize, rows: Vec<Vec<f64>>) -> Self {
        Self {
            width,
            values: rows.into_iter().flat_map(|row| row.into_iter().take(width)).collect(),
        }
    }

    /// Number of samples in the channel
    pub fn len(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.values.len() / self.width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, sample: usize, slot: usize) -> Option<f64> {
        if slot >= self.width {
            return None;
        }
        self.values.get(sample * self.width + slot).copied()
    }
}

pub type DecodedChannels = HashMap<String, Channel>;

/// Decodes a binary telemetry recording into named parallel channels.
pub trait BinaryDecoder {
    fn decode_channels(&self, bytes: &[u8]) -> Result<DecodedChannels, RaceSpaceError>;
}

fn required<'c>(channels: &'c DecodedChannels, name: &str) -> Result<&'c Channel, RaceSpaceError> {
    let channel = channels
        .get(name)
        .ok_or_else(|| RaceSpaceError::MissingChannel {
            name: name.to_string(),
        })?;
    if channel.width <= SUBJECT_CAR_SLOT {
        return Err(RaceSpaceError::EmptyChannelSlot {
            name: name.to_string(),
        });
    }
    Ok(channel)
}

/// Zips the decoded channels into one sample per recorded tick.
pub fn extract_samples(channels: &DecodedChannels) -> Result<Vec<Sample>, RaceSpaceError> {
    let pos_x = required(channels, POS_X_CHANNEL)?;
    let pos_y = required(channels, POS_Y_CHANNEL)?;
    let pos_z = required(channels, POS_Z_CHANNEL)?;
    let speed = required(channels, SPEED_CHANNEL)?;
    let throttle = required(channels, THROTTLE_CHANNEL)?;
    let brake = required(channels, BRAKE_CHANNEL)?;
    let gear = required(channels, GEAR_CHANNEL)?;

    let sample_count = pos_x.len();
    for (name, channel) in [
        (POS_Y_CHANNEL, pos_y),
        (POS_Z_CHANNEL, pos_z),
        (SPEED_CHANNEL, speed),
        (THROTTLE_CHANNEL, throttle),
        (BRAKE_CHANNEL, brake),
        (GEAR_CHANNEL, gear),
    ] {
        if channel.len() != sample_count {
            return Err(RaceSpaceError::ChannelLengthMismatch {
                name: name.to_string(),
                expected: sample_count,
                actual: channel.len(),
            });
        }
    }

    let samples = (0..sample_count)
        .map(|i| {
            let mut record = Map::new();
            let mut put = |key: &str, value: Option<f64>| {
                if let Some(number) = value.and_then(Number::from_f64) {
                    record.insert(key.to_string(), Value::Number(number));
                }
            };
            put("x", pos_x.value(i, SUBJECT_CAR_SLOT));
            put("y", pos_y.value(i, SUBJECT_CAR_SLOT));
            put("z", pos_z.value(i, SUBJECT_CAR_SLOT));
            put("speed", speed.value(i, 0));
            put("throttle", throttle.value(i, 0));
            put("brake", brake.value(i, 0));
            if let Some(gear) = gear.value(i, SUBJECT_CAR_SLOT) {
                record.insert("gear".to_string(), Value::from(gear as i64));
            }
            Sample::from_record(&record)
        })
        .collect::<Vec<_>>();
    debug!("Extracted {} samples from binary channels", samples.len());
    Ok(samples)
}
