pub mod fault;
pub mod hardware;
pub mod reader;
pub mod reading;

use chrono::{
    DateTime, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
    Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub use fault::{describe_status, SensorFault};
pub use hardware::Hardware;
pub use reader::FrameReader;
pub use reading::Reading;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("invalid frame length: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("frame truncated while reading {field} at offset {offset}")]
    ShortRead { field: &'static str, offset: usize },
}

/// Wire layout versions of the node's sensor frame.
///
/// The two versions are told apart only by length; a payload is never
/// decoded as a format the caller did not select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// 39-byte frame from the first node firmware. Its clock runs in civil
    /// time and the voltage byte is in tenths of a volt.
    V1,
    /// 41-byte frame with GPS fix and satellite count. The clock is set from
    /// GPS (UTC) and the voltage byte is in hundredths of a volt.
    V2,
}

impl FrameFormat {
    pub const CURRENT: Self = Self::V2;

    /// Every known layout, current first.
    pub const ALL: [Self; 2] = [Self::V2, Self::V1];

    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::V1 => 39,
            Self::V2 => 41,
        }
    }

    #[must_use]
    pub const fn version(self) -> i16 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    #[must_use]
    pub const fn from_version(version: i16) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }

    #[must_use]
    pub const fn voltage_divisor(self) -> f32 {
        match self {
            Self::V1 => 10.0,
            Self::V2 => 100.0,
        }
    }

    const fn has_gps(self) -> bool {
        matches!(self, Self::V2)
    }

    const fn clock_is_utc(self) -> bool {
        matches!(self, Self::V2)
    }

    /// Pick the accepted format whose length matches `len`.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Length` naming the first accepted format's size
    /// when no accepted format has this length.
    pub fn select(len: usize, accepted: &[Self]) -> Result<Self, FrameError> {
        accepted
            .iter()
            .copied()
            .find(|format| format.size() == len)
            .ok_or(FrameError::Length {
                expected: accepted.first().copied().unwrap_or(Self::CURRENT).size(),
                actual: len,
            })
    }
}

impl std::fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.version())
    }
}

/// Decode a frame whose clock is UTC.
///
/// # Errors
///
/// See [`decode_with_zone`].
pub fn decode(payload: &[u8], format: FrameFormat) -> Result<Reading, FrameError> {
    decode_with_zone(payload, format, chrono_tz::UTC)
}

/// Decode a frame, resolving civil-time clocks (V1) in `zone`.
///
/// # Errors
///
/// - `FrameError::Length` if `payload` is not exactly `format.size()` bytes
/// - `FrameError::ShortRead` if a field runs past the end of the payload
pub fn decode_with_zone(
    payload: &[u8],
    format: FrameFormat,
    zone: Tz,
) -> Result<Reading, FrameError> {
    if payload.len() != format.size() {
        return Err(FrameError::Length {
            expected: format.size(),
            actual: payload.len(),
        });
    }

    let mut r = FrameReader::new(payload);

    let clock = Clock {
        year: r.u16("year")?,
        month: r.u8("month")?,
        day: r.u8("day")?,
        hour: r.u8("hour")?,
        minute: r.u8("minute")?,
        second: r.u8("second")?,
    };
    let hardware = Hardware::from_bits(r.u8("hardware")?);
    let uptime = r.u32("uptime")?;
    let temperature = r.f32("temperature")?;
    let temperature_calibration = r.f32("temperature_calibration")?;
    let humidity = r.f32("humidity")?;
    let pressure = r.f32("pressure")?;
    let co2 = r.i32("co2")?;
    let tvoc = r.i32("tvoc")?;
    let voltage = r.u8("voltage")?;
    let sensor_status = r.u8("ccs811_status")?;
    let temperature_calibrated = r.flag("temperature_calibrated")?;

    let (gps_fix, satellites) = if format.has_gps() {
        (r.flag("gps_fix")?, r.u8("satellites")?)
    } else {
        (false, 0)
    };

    let recorded_at = if format.clock_is_utc() {
        clock.resolve(&Utc)
    } else {
        clock.resolve(&zone)
    };

    Ok(Reading {
        uplink_id: None,
        format,
        recorded_at,
        hardware,
        uptime,
        temperature,
        temperature_calibration,
        temperature_calibrated,
        humidity,
        pressure,
        sensor_status,
        sensor_fault: SensorFault::from_status(sensor_status),
        co2,
        tvoc,
        voltage,
        gps_fix,
        satellites,
    })
}

struct Clock {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Clock {
    /// Out-of-range fields roll over into the next larger unit: month 13 is
    /// January of the following year, day 0 the last day of the previous month.
    fn normalized(&self) -> Option<NaiveDateTime> {
        let year_start = NaiveDate::from_ymd_opt(i32::from(self.year), 1, 1)?;
        let date = match u32::from(self.month) {
            0 => year_start.checked_sub_months(Months::new(1))?,
            month => year_start.checked_add_months(Months::new(month - 1))?,
        };

        date.and_time(NaiveTime::MIN)
            .checked_add_signed(TimeDelta::days(i64::from(self.day) - 1))?
            .checked_add_signed(TimeDelta::hours(i64::from(self.hour)))?
            .checked_add_signed(TimeDelta::minutes(i64::from(self.minute)))?
            .checked_add_signed(TimeDelta::seconds(i64::from(self.second)))
    }

    fn resolve<Z: TimeZone>(&self, zone: &Z) -> DateTime<Utc> {
        // A 16-bit year plus 8-bit offsets stays far inside chrono's range
        let Some(naive) = self.normalized() else {
            return DateTime::<Utc>::MIN_UTC;
        };

        match zone.from_local_datetime(&naive) {
            // Ambiguous local times (DST fall-back) take the earlier instant
            LocalResult::Single(local) | LocalResult::Ambiguous(local, _) => {
                local.with_timezone(&Utc)
            }
            // Spring-forward gap: read the clock with the offset in force a
            // day earlier, i.e. as if the transition had not happened yet
            LocalResult::None => {
                let day_before = naive.checked_sub_signed(TimeDelta::days(1)).unwrap_or(naive);
                let offset = zone.offset_from_utc_datetime(&day_before).fix();
                naive
                    .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
                    .unwrap_or(naive)
                    .and_utc()
            }
        }
    }
}
