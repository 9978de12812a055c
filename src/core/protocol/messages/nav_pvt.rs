//! NAV-PVT: navigation position, velocity and time solution

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{DecodeError, Fields};
use crate::core::protocol::constants::MessageId;

/// Fixed payload length
pub const NAV_PVT_LEN: usize = 92;

// Raw integer units per physical unit
const DEG_1E7: f64 = 10_000_000.0;
const DEG_1E5: f64 = 100_000.0;
const MILLI: f64 = 1_000.0;

// valid
const VALID_DATE: u8 = 0x01;
const VALID_TIME: u8 = 0x02;
const FULLY_RESOLVED: u8 = 0x04;
// flags
const GNSS_FIX_OK: u8 = 0x01;
const HEAD_VEH_VALID: u8 = 0x20;

/// GNSS fix type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FixType {
    /// No fix
    #[default]
    NoFix,
    /// Dead reckoning only
    DeadReckoning,
    /// 2D fix
    Fix2D,
    /// 3D fix
    Fix3D,
    /// GNSS combined with dead reckoning
    GnssDeadReckoning,
    /// Time only fix
    TimeOnly,
    /// Reserved value
    Other(u8),
}

impl From<u8> for FixType {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::NoFix,
            1 => Self::DeadReckoning,
            2 => Self::Fix2D,
            3 => Self::Fix3D,
            4 => Self::GnssDeadReckoning,
            5 => Self::TimeOnly,
            other => Self::Other(other),
        }
    }
}

impl FixType {
    /// Raw wire value
    pub fn raw(&self) -> u8 {
        match self {
            Self::NoFix => 0,
            Self::DeadReckoning => 1,
            Self::Fix2D => 2,
            Self::Fix3D => 3,
            Self::GnssDeadReckoning => 4,
            Self::TimeOnly => 5,
            Self::Other(v) => *v,
        }
    }
}

/// UTC instant as epoch seconds plus nanosecond remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UtcTime {
    /// Seconds since 1970-01-01T00:00:00Z
    pub seconds: i64,
    /// Nanoseconds, always in `0..1_000_000_000`
    pub nanos: u32,
}

impl UtcTime {
    /// Combine calendar fields and a signed nanosecond correction.
    ///
    /// Leap-second naive: `sec == 60` rolls into the next minute. Returns
    /// `None` for impossible dates, such as the zeroed fields a receiver
    /// reports before it has a time solution.
    pub fn from_calendar(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        min: u8,
        sec: u8,
        nano: i32,
    ) -> Option<Self> {
        if sec > 60 {
            return None;
        }
        let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))?;
        let carry = i64::from(sec.saturating_sub(59));
        let datetime = date.and_hms_opt(u32::from(hour), u32::from(min), u32::from(sec.min(59)))?;

        let nano = i64::from(nano);
        let seconds = datetime.and_utc().timestamp() + carry + nano.div_euclid(1_000_000_000);
        let nanos = u32::try_from(nano.rem_euclid(1_000_000_000)).ok()?;
        Some(Self { seconds, nanos })
    }

    /// As a chrono timestamp
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

/// Decoded NAV-PVT
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct NavPvt {
    /// GPS time of week (ms)
    pub itow_ms: u32,
    /// UTC time, when the calendar fields form a valid date
    pub utc: Option<UtcTime>,
    /// Receiver reports a valid UTC date
    pub date_valid: bool,
    /// Receiver reports a valid UTC time of day
    pub time_valid: bool,
    /// Time of day fully resolved
    pub time_resolved: bool,
    /// Time accuracy estimate (ns)
    pub time_accuracy_ns: u32,
    /// Fix type
    pub fix_type: FixType,
    /// Valid fix (gnssFixOK, bit 0 of flags)
    pub fix_valid: bool,
    /// Vehicle heading valid (headVehValid, bit 5 of flags)
    pub heading_valid: bool,
    /// Raw flags byte
    pub flags: u8,
    /// Satellites used in the solution
    pub num_sv: u8,
    /// Longitude (deg)
    pub longitude: f64,
    /// Latitude (deg)
    pub latitude: f64,
    /// Height above ellipsoid (m)
    pub height_m: f64,
    /// Height above mean sea level (m)
    pub height_msl_m: f64,
    /// Horizontal accuracy estimate (m)
    pub horizontal_accuracy_m: f64,
    /// Vertical accuracy estimate (m)
    pub vertical_accuracy_m: f64,
    /// NED north velocity (m/s)
    pub vel_north_mps: f64,
    /// NED east velocity (m/s)
    pub vel_east_mps: f64,
    /// NED down velocity (m/s)
    pub vel_down_mps: f64,
    /// Ground speed, 2D (m/s)
    pub ground_speed_mps: f64,
    /// Heading of motion, 2D (deg)
    pub heading_of_motion_deg: f64,
    /// Speed accuracy estimate (m/s)
    pub speed_accuracy_mps: f64,
    /// Heading accuracy estimate (deg)
    pub heading_accuracy_deg: f64,
    /// Position DOP, raw (0.01 units)
    pub pdop: u16,
    /// Vehicle heading (deg)
    pub vehicle_heading_deg: f64,
}

impl NavPvt {
    /// Decode a NAV-PVT payload
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let p = Fields::new(MessageId::NAV_PVT, payload, NAV_PVT_LEN)?;

        let valid = p.u8(11)?;
        let flags = p.u8(21)?;
        let utc = UtcTime::from_calendar(
            p.u16(4)?,
            p.u8(6)?,
            p.u8(7)?,
            p.u8(8)?,
            p.u8(9)?,
            p.u8(10)?,
            p.i32(16)?,
        );

        Ok(Self {
            itow_ms: p.u32(0)?,
            utc,
            date_valid: valid & VALID_DATE != 0,
            time_valid: valid & VALID_TIME != 0,
            time_resolved: valid & FULLY_RESOLVED != 0,
            time_accuracy_ns: p.u32(12)?,
            fix_type: FixType::from(p.u8(20)?),
            fix_valid: flags & GNSS_FIX_OK != 0,
            heading_valid: flags & HEAD_VEH_VALID != 0,
            flags,
            num_sv: p.u8(23)?,
            longitude: f64::from(p.i32(24)?) / DEG_1E7,
            latitude: f64::from(p.i32(28)?) / DEG_1E7,
            height_m: f64::from(p.i32(32)?) / MILLI,
            height_msl_m: f64::from(p.i32(36)?) / MILLI,
            horizontal_accuracy_m: f64::from(p.u32(40)?) / MILLI,
            vertical_accuracy_m: f64::from(p.u32(44)?) / MILLI,
            vel_north_mps: f64::from(p.i32(48)?) / MILLI,
            vel_east_mps: f64::from(p.i32(52)?) / MILLI,
            vel_down_mps: f64::from(p.i32(56)?) / MILLI,
            ground_speed_mps: f64::from(p.i32(60)?) / MILLI,
            heading_of_motion_deg: f64::from(p.i32(64)?) / DEG_1E5,
            speed_accuracy_mps: f64::from(p.u32(68)?) / MILLI,
            heading_accuracy_deg: f64::from(p.u32(72)?) / DEG_1E5,
            pdop: p.u16(76)?,
            vehicle_heading_deg: f64::from(p.i32(84)?) / DEG_1E5,
        })
    }

    /// Position DOP as a unitless figure
    pub fn pdop_scaled(&self) -> f64 {
        f64::from(self.pdop) / 100.0
    }
}
