//! Decoded value types and protocol enumerations.

use std::fmt;

/// A decoded field value.
///
/// Numeric telemetry decodes to [`Value::Float`] after scaling, raw
/// diagnostic bytes and counters to [`Value::Uint`], bitmask flags to
/// [`Value::Bool`], categorical fields to [`Value::Symbol`], and formatted
/// values such as firmware versions to [`Value::Text`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Scaled numeric value.
    Float(f32),
    /// Raw integer value (counters, diagnostic bytes).
    Uint(u32),
    /// Boolean flag.
    Bool(bool),
    /// Categorical value with a fixed name set.
    Symbol(&'static str),
    /// Formatted text (e.g. a firmware version).
    Text(String),
}

impl Value {
    /// Numeric view of the value, if it has one. Flags map to 0/1.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Uint(v) => Some(*v as f32),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Symbol(_) | Value::Text(_) => None,
        }
    }

    /// Boolean view of the value, if it is a flag.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v:.1}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Unit of measure attached to a field spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Degrees Celsius.
    Celsius,
    /// Liters per minute.
    LitersPerMinute,
    /// Percent.
    Percent,
    /// Cubic meters.
    CubicMeters,
    /// British thermal units.
    Btu,
    /// Hours.
    Hours,
    /// Days.
    Days,
    /// Dimensionless counter or raw diagnostic byte.
    Raw,
    /// No unit (flags, categorical fields).
    None,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::Celsius => "°C",
            Unit::LitersPerMinute => "l/min",
            Unit::Percent => "%",
            Unit::CubicMeters => "m³",
            Unit::Btu => "BTU",
            Unit::Hours => "h",
            Unit::Days => "d",
            Unit::Raw => "",
            Unit::None => "",
        };
        write!(f, "{s}")
    }
}

/// Position of the three-way valve / current heating activity, from the
/// heating mode byte of the water message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatingMode {
    /// Nothing running.
    Idle,
    /// Recirculating domestic hot water (scheduled recirculation active).
    DhwRecirculating,
    /// Space heating (combi models).
    SpaceHeating,
    /// Domestic hot water demand.
    DhwDemand,
    /// Unrecognized mode byte.
    Unknown,
}

impl HeatingMode {
    /// Map the raw heating mode byte.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => HeatingMode::Idle,
            0x08 => HeatingMode::DhwRecirculating,
            0x10 => HeatingMode::SpaceHeating,
            0x20 => HeatingMode::DhwDemand,
            _ => HeatingMode::Unknown,
        }
    }

    /// Stable lowercase name, suitable for external bindings.
    pub fn name(&self) -> &'static str {
        match self {
            HeatingMode::Idle => "idle",
            HeatingMode::DhwRecirculating => "dhw_recirculating",
            HeatingMode::SpaceHeating => "space_heating",
            HeatingMode::DhwDemand => "dhw_demand",
            HeatingMode::Unknown => "unknown",
        }
    }
}

/// Device family reported in the gas/info message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Tankless water heater (NPE series).
    TanklessHeater,
    /// Combi boiler (NCB series).
    CombiBoiler,
    /// Unrecognized device type byte.
    Unknown,
}

impl DeviceType {
    /// Map the raw device type byte.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x01 => DeviceType::TanklessHeater,
            0x02 => DeviceType::CombiBoiler,
            _ => DeviceType::Unknown,
        }
    }

    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceType::TanklessHeater => "tankless_heater",
            DeviceType::CombiBoiler => "combi_boiler",
            DeviceType::Unknown => "unknown",
        }
    }
}

/// Recirculation scheduling mode, from the system status byte. When either
/// scheduled bit is set the unit cedes recirculation scheduling to an
/// attached NaviLink-class controller; otherwise recirculation is in hot
/// button mode or disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecircMode {
    /// Hot button mode (or recirculation disabled).
    HotButton,
    /// Internally scheduled recirculation.
    InternalSchedule,
    /// Externally scheduled recirculation (controller driven).
    ExternalSchedule,
}

impl RecircMode {
    /// Map the scheduled recirculation bits of the system status byte.
    pub fn from_status(status: u8) -> Self {
        use crate::constants::{SYS_STATUS_RECIRC_EXT_SCHED, SYS_STATUS_RECIRC_INT_SCHED};
        if status & SYS_STATUS_RECIRC_EXT_SCHED != 0 {
            RecircMode::ExternalSchedule
        } else if status & SYS_STATUS_RECIRC_INT_SCHED != 0 {
            RecircMode::InternalSchedule
        } else {
            RecircMode::HotButton
        }
    }

    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            RecircMode::HotButton => "hot_button",
            RecircMode::InternalSchedule => "internal_schedule",
            RecircMode::ExternalSchedule => "external_schedule",
        }
    }
}

/// Recirculation activity, from the recirculation status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecircStatus {
    /// Not recirculating.
    Off,
    /// Hot button recirculation triggered and active.
    HotButtonActive,
    /// Scheduled recirculation enabled.
    ScheduledEnabled,
}

impl RecircStatus {
    /// Map the raw recirculation status byte.
    pub fn from_raw(raw: u8) -> Self {
        use crate::constants::{RECIRC_STATUS_HOTBUTTON_ON, RECIRC_STATUS_SCHEDULED_ON};
        if raw & RECIRC_STATUS_HOTBUTTON_ON != 0 {
            RecircStatus::HotButtonActive
        } else if raw & RECIRC_STATUS_SCHEDULED_ON != 0 {
            RecircStatus::ScheduledEnabled
        } else {
            RecircStatus::Off
        }
    }

    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            RecircStatus::Off => "off",
            RecircStatus::HotButtonActive => "hot_button_active",
            RecircStatus::ScheduledEnabled => "scheduled_enabled",
        }
    }
}

/// Format a version word (`lo, hi` on the wire) the way the front panel
/// shows it: the low byte zero-padded to two decimal digits, split as
/// `major.minor` (`28` → `"2.8"`, `7` → `"0.7"`). The high byte is not
/// displayed.
pub fn format_version(word: u16) -> String {
    let digits = format!("{:02}", word & 0x00FF);
    format!("{}.{}", &digits[..1], &digits[1..2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heating_mode_mapping() {
        assert_eq!(HeatingMode::from_raw(0x00), HeatingMode::Idle);
        assert_eq!(HeatingMode::from_raw(0x08), HeatingMode::DhwRecirculating);
        assert_eq!(HeatingMode::from_raw(0x10), HeatingMode::SpaceHeating);
        assert_eq!(HeatingMode::from_raw(0x20), HeatingMode::DhwDemand);
        assert_eq!(HeatingMode::from_raw(0x42), HeatingMode::Unknown);
    }

    #[test]
    fn test_recirc_mode_prefers_external() {
        assert_eq!(RecircMode::from_status(0x03), RecircMode::ExternalSchedule);
        assert_eq!(RecircMode::from_status(0x01), RecircMode::InternalSchedule);
        assert_eq!(RecircMode::from_status(0x00), RecircMode::HotButton);
    }

    #[test]
    fn test_format_version() {
        assert_eq!(format_version(28), "2.8");
        assert_eq!(format_version(7), "0.7");
        assert_eq!(format_version(0), "0.0");
        // The high byte is not part of the displayed version.
        assert_eq!(format_version(0x0107), "0.7");
    }
}
