use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt;
use uuid::Uuid;

use super::{describe_status, FrameFormat, Hardware, SensorFault};
use crate::common::time::format_civil;

/// Value the node writes for CO2/TVOC when the CCS811 produced no sample.
pub const NOT_RECORDED: i32 = -1;

/// One decoded sensor sample.
///
/// `uplink_id` stays `None` until the sample is persisted alongside the
/// envelope it arrived in.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub uplink_id: Option<Uuid>,
    pub format: FrameFormat,
    pub recorded_at: DateTime<Utc>,
    pub hardware: Hardware,
    /// Seconds since the node booted
    pub uptime: u32,
    /// °C
    pub temperature: f32,
    pub temperature_calibration: f32,
    pub temperature_calibrated: bool,
    /// % relative humidity
    pub humidity: f32,
    /// Pa
    pub pressure: f32,
    pub sensor_status: u8,
    pub sensor_fault: Option<SensorFault>,
    /// ppm, or [`NOT_RECORDED`]
    pub co2: i32,
    /// ppb, or [`NOT_RECORDED`]
    pub tvoc: i32,
    /// Battery voltage, scaled by the frame format's divisor
    pub voltage: u8,
    pub gps_fix: bool,
    pub satellites: u8,
}

impl Reading {
    #[must_use]
    pub fn voltage_volts(&self) -> f32 {
        f32::from(self.voltage) / self.format.voltage_divisor()
    }

    #[must_use]
    pub const fn co2_recorded(&self) -> Option<i32> {
        recorded(self.co2)
    }

    #[must_use]
    pub const fn tvoc_recorded(&self) -> Option<i32> {
        recorded(self.tvoc)
    }

    /// Multi-line, human-readable rendering with times in `zone`.
    #[must_use]
    pub const fn display(&self, zone: Tz) -> ReadingDisplay<'_> {
        ReadingDisplay {
            reading: self,
            zone,
        }
    }
}

const fn recorded(value: i32) -> Option<i32> {
    if value == NOT_RECORDED {
        None
    } else {
        Some(value)
    }
}

pub struct ReadingDisplay<'a> {
    reading: &'a Reading,
    zone: Tz,
}

impl fmt::Display for ReadingDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.reading;
        writeln!(f, "\tRecorded: {}", format_civil(r.recorded_at, self.zone))?;
        writeln!(f, "\tHardware: {}", r.hardware)?;
        writeln!(f, "\tUptime: {}", format_uptime(r.uptime))?;
        writeln!(f, "\tTemperature: {:.2}°C", r.temperature)?;
        writeln!(
            f,
            "\tTemperature calibration: {:.2}°C",
            r.temperature_calibration
        )?;
        writeln!(
            f,
            "\tTemperature calibrated? {}",
            yes_or_no(r.temperature_calibrated)
        )?;
        writeln!(f, "\tHumidity: {:.2}", r.humidity)?;
        writeln!(f, "\tBarometric pressure: {:.4} kPa", r.pressure / 1000.0)?;
        writeln!(f, "\tCCS811 status: {}", describe_status(r.sensor_status))?;
        writeln!(f, "\tCO2: {}", concentration(r.co2_recorded(), "ppm"))?;
        writeln!(f, "\tTVOC: {}", concentration(r.tvoc_recorded(), "ppb"))?;
        writeln!(f, "\tVoltage: {:.2}V", r.voltage_volts())?;
        if r.format == FrameFormat::V2 {
            writeln!(f, "\tSats: {} (fix? {})", r.satellites, yes_or_no(r.gps_fix))?;
        }
        Ok(())
    }
}

fn concentration(value: Option<i32>, unit: &str) -> String {
    value.map_or_else(|| "not recorded".to_string(), |v| format!("{v} {unit}"))
}

const fn yes_or_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// `2219` → `36m59s`, `3600` → `1h0m0s`.
#[must_use]
pub fn format_uptime(seconds: u32) -> String {
    let (h, m, s) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}s")
    }
}
