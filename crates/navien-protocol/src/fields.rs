//! Static field descriptors for each message type.
//!
//! Every value the protocol exposes is described by a [`FieldSpec`]: where
//! it sits in the payload, how to widen and scale it, its unit, and an
//! optional plausibility window used to reject corrupt-but-checksum-valid
//! frames. The decoder and the command encoder both consume these tables;
//! nothing about field layout lives anywhere else.
//!
//! Offsets are relative to the payload (byte 0 = first byte after the
//! 6-byte header). The `unk_*` fields carry the absolute packet offset in
//! their name, matching the convention used in protocol captures; their
//! meaning is unknown but their position is fixed, so they are decoded as
//! raw integers.

use std::fmt;

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::{
    format_version, DeviceType, HeatingMode, RecircMode, RecircStatus, Unit, Value,
};

/// Identifier of one exposed value. Closed set: every field the protocol
/// can produce is named here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    // Water message
    HeatingMode,
    RecircRunning,
    Power,
    OperatingState,
    DhwSetTemperature,
    OutletTemperature,
    InletTemperature,
    WaterUtilization,
    WaterFlow,
    RecircMode,
    DisplayMetric,
    OutdoorTemperature,
    BoilerActive,
    RecircStatus,
    UnkW06,
    UnkW07,
    UnkW14,
    UnkW15,
    UnkW16,
    UnkW19,
    UnkW20,
    UnkW21,
    UnkW22,
    UnkW23,
    UnkW26,
    UnkW28,
    UnkW30,
    UnkW32,
    UnkW34,
    UnkW35,
    UnkW36,
    UnkW37,
    UnkW38,
    UnkW39,

    // Gas/info message
    DeviceType,
    ControllerVersion,
    PanelVersion,
    ShOutletTemperature,
    ShReturnTemperature,
    ShSetTemperature,
    HeatCapacity,
    HotButtonEnabled,
    GasCurrent,
    GasTotal,
    DaysSinceInstall,
    TotalDhwUsage,
    TotalOperatingTime,
    TotalDhwUsageHours,
    TotalShUsageHours,
    UnkG06,
    UnkG07,
    UnkG09,
    UnkG26,
    UnkG27,
    UnkG32,
    UnkG33,
    UnkG35,
    UnkG42,
    UnkG43,
    UnkG44,
    UnkG45,
    UnkG46,
    UnkG47,
}

impl FieldId {
    /// Stable snake_case name, the identifier external bindings see.
    pub fn name(&self) -> &'static str {
        match self {
            FieldId::HeatingMode => "heating_mode",
            FieldId::RecircRunning => "recirc_running",
            FieldId::Power => "power",
            FieldId::OperatingState => "operating_state",
            FieldId::DhwSetTemperature => "dhw_set_temperature",
            FieldId::OutletTemperature => "outlet_temperature",
            FieldId::InletTemperature => "inlet_temperature",
            FieldId::WaterUtilization => "water_utilization",
            FieldId::WaterFlow => "water_flow",
            FieldId::RecircMode => "recirc_mode",
            FieldId::DisplayMetric => "display_metric",
            FieldId::OutdoorTemperature => "outdoor_temperature",
            FieldId::BoilerActive => "boiler_active",
            FieldId::RecircStatus => "recirc_status",
            FieldId::UnkW06 => "unk_w06",
            FieldId::UnkW07 => "unk_w07",
            FieldId::UnkW14 => "unk_w14",
            FieldId::UnkW15 => "unk_w15",
            FieldId::UnkW16 => "unk_w16",
            FieldId::UnkW19 => "unk_w19",
            FieldId::UnkW20 => "unk_w20",
            FieldId::UnkW21 => "unk_w21",
            FieldId::UnkW22 => "unk_w22",
            FieldId::UnkW23 => "unk_w23",
            FieldId::UnkW26 => "unk_w26",
            FieldId::UnkW28 => "unk_w28",
            FieldId::UnkW30 => "unk_w30",
            FieldId::UnkW32 => "unk_w32",
            FieldId::UnkW34 => "unk_w34",
            FieldId::UnkW35 => "unk_w35",
            FieldId::UnkW36 => "unk_w36",
            FieldId::UnkW37 => "unk_w37",
            FieldId::UnkW38 => "unk_w38",
            FieldId::UnkW39 => "unk_w39",
            FieldId::DeviceType => "device_type",
            FieldId::ControllerVersion => "controller_version",
            FieldId::PanelVersion => "panel_version",
            FieldId::ShOutletTemperature => "sh_outlet_temperature",
            FieldId::ShReturnTemperature => "sh_return_temperature",
            FieldId::ShSetTemperature => "sh_set_temperature",
            FieldId::HeatCapacity => "heat_capacity",
            FieldId::HotButtonEnabled => "hot_button_enabled",
            FieldId::GasCurrent => "gas_current",
            FieldId::GasTotal => "gas_total",
            FieldId::DaysSinceInstall => "days_since_install",
            FieldId::TotalDhwUsage => "total_dhw_usage",
            FieldId::TotalOperatingTime => "total_operating_time",
            FieldId::TotalDhwUsageHours => "total_dhw_usage_hours",
            FieldId::TotalShUsageHours => "total_sh_usage_hours",
            FieldId::UnkG06 => "unk_g06",
            FieldId::UnkG07 => "unk_g07",
            FieldId::UnkG09 => "unk_g09",
            FieldId::UnkG26 => "unk_g26",
            FieldId::UnkG27 => "unk_g27",
            FieldId::UnkG32 => "unk_g32",
            FieldId::UnkG33 => "unk_g33",
            FieldId::UnkG35 => "unk_g35",
            FieldId::UnkG42 => "unk_g42",
            FieldId::UnkG43 => "unk_g43",
            FieldId::UnkG44 => "unk_g44",
            FieldId::UnkG45 => "unk_g45",
            FieldId::UnkG46 => "unk_g46",
            FieldId::UnkG47 => "unk_g47",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the raw bytes at a field's offset become a [`Value`].
#[derive(Debug, Clone, Copy)]
pub enum Encoding {
    /// One raw byte, exposed as an integer.
    Raw8,
    /// Two raw bytes, little-endian, exposed as an integer.
    Raw16,
    /// One byte multiplied by a scale factor.
    Scaled8 {
        /// Scale applied to the raw byte.
        scale: f32,
    },
    /// Two bytes, little-endian, multiplied by a scale factor.
    Scaled16 {
        /// Scale applied to the raw word.
        scale: f32,
    },
    /// One byte tested against a bitmask.
    Flag {
        /// Mask selecting the flag bit(s).
        mask: u8,
    },
    /// One byte mapped through a function (categorical fields).
    Map8(fn(u8) -> Value),
    /// Two bytes, little-endian, mapped through a function.
    Map16(fn(u16) -> Value),
}

impl Encoding {
    /// Number of payload bytes this encoding consumes.
    pub fn width(&self) -> usize {
        match self {
            Encoding::Raw8 | Encoding::Scaled8 { .. } | Encoding::Flag { .. } | Encoding::Map8(_) => 1,
            Encoding::Raw16 | Encoding::Scaled16 { .. } | Encoding::Map16(_) => 2,
        }
    }
}

/// Static descriptor of one exposed value within a message payload.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field this spec produces.
    pub field: FieldId,
    /// Byte offset within the payload.
    pub offset: usize,
    /// Raw-to-value conversion.
    pub encoding: Encoding,
    /// Unit of the produced value.
    pub unit: Unit,
    /// Plausibility window applied after scaling. A numeric value outside
    /// it rejects the frame.
    pub plausible: Option<(f32, f32)>,
}

impl FieldSpec {
    /// Decode this field from a message payload. The caller has already
    /// checked that the payload is long enough for the whole table.
    pub fn decode(&self, payload: &[u8]) -> Result<Value, ProtocolError> {
        let value = match self.encoding {
            Encoding::Raw8 => Value::Uint(payload[self.offset] as u32),
            Encoding::Raw16 => Value::Uint(self.word(payload) as u32),
            Encoding::Scaled8 { scale } => Value::Float(payload[self.offset] as f32 * scale),
            Encoding::Scaled16 { scale } => Value::Float(self.word(payload) as f32 * scale),
            Encoding::Flag { mask } => Value::Bool(payload[self.offset] & mask != 0),
            Encoding::Map8(map) => map(payload[self.offset]),
            Encoding::Map16(map) => map(self.word(payload)),
        };

        if let (Some((min, max)), Some(v)) = (self.plausible, value.as_f32()) {
            if v < min || v > max {
                return Err(ProtocolError::FieldOutOfRange {
                    field: self.field,
                    value: v,
                    min,
                    max,
                });
            }
        }
        Ok(value)
    }

    fn word(&self, payload: &[u8]) -> u16 {
        u16::from_le_bytes([payload[self.offset], payload[self.offset + 1]])
    }
}

// Map functions for categorical fields. These must be named functions, not
// closures, so the tables can be const.

fn map_heating_mode(raw: u8) -> Value {
    Value::Symbol(HeatingMode::from_raw(raw).name())
}

fn map_device_type(raw: u8) -> Value {
    Value::Symbol(DeviceType::from_raw(raw).name())
}

fn map_recirc_mode(raw: u8) -> Value {
    Value::Symbol(RecircMode::from_status(raw).name())
}

fn map_recirc_status(raw: u8) -> Value {
    Value::Symbol(RecircStatus::from_raw(raw).name())
}

fn map_version(word: u16) -> Value {
    Value::Text(format_version(word))
}

// Display units: the water message sets a bit for metric, the gas message
// sets a bit for imperial. Both decode to the same field.
fn map_metric_from_sys_status_2(raw: u8) -> Value {
    Value::Bool(raw & SYS_STATUS_2_IMPERIAL_MASK == 0)
}

/// Field table of the water telemetry message (34-byte payload).
pub const WATER_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: FieldId::UnkW06, offset: 0, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW07, offset: 1, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::HeatingMode, offset: 2, encoding: Encoding::Map8(map_heating_mode), unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::RecircRunning, offset: 2, encoding: Encoding::Flag { mask: HEATING_MODE_RECIRC_MASK }, unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::Power, offset: 3, encoding: Encoding::Flag { mask: POWER_ON_MASK }, unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::OperatingState, offset: 4, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::DhwSetTemperature, offset: 5, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: Some((0.0, 90.0)) },
    FieldSpec { field: FieldId::OutletTemperature, offset: 6, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: Some((0.0, 99.0)) },
    FieldSpec { field: FieldId::InletTemperature, offset: 7, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: Some((0.0, 99.0)) },
    FieldSpec { field: FieldId::UnkW14, offset: 8, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW15, offset: 9, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW16, offset: 10, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::WaterUtilization, offset: 11, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Percent, plausible: Some((0.0, 100.0)) },
    FieldSpec { field: FieldId::WaterFlow, offset: 12, encoding: Encoding::Scaled8 { scale: 0.1 }, unit: Unit::LitersPerMinute, plausible: None },
    FieldSpec { field: FieldId::UnkW19, offset: 13, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW20, offset: 14, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW21, offset: 15, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW22, offset: 16, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW23, offset: 17, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::RecircMode, offset: 18, encoding: Encoding::Map8(map_recirc_mode), unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::DisplayMetric, offset: 18, encoding: Encoding::Flag { mask: SYS_STATUS_UNITS_MASK }, unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::OutdoorTemperature, offset: 19, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: None },
    FieldSpec { field: FieldId::UnkW26, offset: 20, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::BoilerActive, offset: 21, encoding: Encoding::Flag { mask: BOILER_ACTIVE_MASK }, unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::UnkW28, offset: 22, encoding: Encoding::Raw16, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW30, offset: 24, encoding: Encoding::Raw16, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW32, offset: 26, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::RecircStatus, offset: 27, encoding: Encoding::Map8(map_recirc_status), unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::UnkW34, offset: 28, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW35, offset: 29, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW36, offset: 30, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW37, offset: 31, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW38, offset: 32, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkW39, offset: 33, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
];

/// Field table of the gas/info message (42-byte payload).
pub const GAS_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: FieldId::UnkG06, offset: 0, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG07, offset: 1, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::DeviceType, offset: 2, encoding: Encoding::Map8(map_device_type), unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::UnkG09, offset: 3, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::ControllerVersion, offset: 4, encoding: Encoding::Map16(map_version), unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::PanelVersion, offset: 6, encoding: Encoding::Map16(map_version), unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::DhwSetTemperature, offset: 8, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: Some((0.0, 90.0)) },
    FieldSpec { field: FieldId::OutletTemperature, offset: 9, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: Some((0.0, 99.0)) },
    FieldSpec { field: FieldId::InletTemperature, offset: 10, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: Some((0.0, 99.0)) },
    FieldSpec { field: FieldId::ShOutletTemperature, offset: 11, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: Some((0.0, 99.0)) },
    FieldSpec { field: FieldId::ShReturnTemperature, offset: 12, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: Some((0.0, 99.0)) },
    FieldSpec { field: FieldId::ShSetTemperature, offset: 13, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Celsius, plausible: Some((0.0, 99.0)) },
    FieldSpec { field: FieldId::HeatCapacity, offset: 14, encoding: Encoding::Scaled8 { scale: 0.5 }, unit: Unit::Percent, plausible: Some((0.0, 100.0)) },
    FieldSpec { field: FieldId::DisplayMetric, offset: 15, encoding: Encoding::Map8(map_metric_from_sys_status_2), unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::HotButtonEnabled, offset: 15, encoding: Encoding::Flag { mask: SYS_STATUS_2_HOTBUTTON_MASK }, unit: Unit::None, plausible: None },
    FieldSpec { field: FieldId::GasCurrent, offset: 16, encoding: Encoding::Scaled16 { scale: 0.1 }, unit: Unit::Btu, plausible: None },
    FieldSpec { field: FieldId::GasTotal, offset: 18, encoding: Encoding::Scaled16 { scale: 0.1 }, unit: Unit::CubicMeters, plausible: None },
    FieldSpec { field: FieldId::UnkG26, offset: 20, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG27, offset: 21, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::DaysSinceInstall, offset: 22, encoding: Encoding::Raw16, unit: Unit::Days, plausible: None },
    FieldSpec { field: FieldId::TotalDhwUsage, offset: 24, encoding: Encoding::Raw16, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG32, offset: 26, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG33, offset: 27, encoding: Encoding::Raw16, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG35, offset: 29, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::TotalOperatingTime, offset: 30, encoding: Encoding::Raw16, unit: Unit::Hours, plausible: None },
    FieldSpec { field: FieldId::TotalDhwUsageHours, offset: 32, encoding: Encoding::Raw16, unit: Unit::Hours, plausible: None },
    FieldSpec { field: FieldId::TotalShUsageHours, offset: 34, encoding: Encoding::Raw16, unit: Unit::Hours, plausible: None },
    FieldSpec { field: FieldId::UnkG42, offset: 36, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG43, offset: 37, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG44, offset: 38, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG45, offset: 39, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG46, offset: 40, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
    FieldSpec { field: FieldId::UnkG47, offset: 41, encoding: Encoding::Raw8, unit: Unit::Raw, plausible: None },
];

/// Look up a field's spec in either table. Fields present in both messages
/// (temperatures) resolve to the water entry.
pub fn spec_for(field: FieldId) -> Option<&'static FieldSpec> {
    WATER_FIELDS
        .iter()
        .chain(GAS_FIELDS.iter())
        .find(|s| s.field == field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_table_fits_payload() {
        for spec in WATER_FIELDS {
            assert!(
                spec.offset + spec.encoding.width() <= WATER_PAYLOAD_SIZE,
                "{} exceeds water payload",
                spec.field
            );
        }
    }

    #[test]
    fn test_gas_table_fits_payload() {
        for spec in GAS_FIELDS {
            assert!(
                spec.offset + spec.encoding.width() <= GAS_PAYLOAD_SIZE,
                "{} exceeds gas payload",
                spec.field
            );
        }
    }

    #[test]
    fn test_scaled_decode() {
        let mut payload = vec![0u8; WATER_PAYLOAD_SIZE];
        payload[7] = 47; // 23.5 °C
        payload[12] = 85; // 8.5 l/min
        let inlet = spec_for(FieldId::InletTemperature).unwrap();
        let flow = WATER_FIELDS.iter().find(|s| s.field == FieldId::WaterFlow).unwrap();
        assert_eq!(inlet.decode(&payload), Ok(Value::Float(23.5)));
        assert_eq!(flow.decode(&payload), Ok(Value::Float(8.5)));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut payload = vec![0u8; WATER_PAYLOAD_SIZE];
        payload[7] = 0xFF; // 127.5 °C, outside the plausible window
        let inlet = spec_for(FieldId::InletTemperature).unwrap();
        assert!(matches!(
            inlet.decode(&payload),
            Err(ProtocolError::FieldOutOfRange { field: FieldId::InletTemperature, .. })
        ));
    }

    #[test]
    fn test_version_decode() {
        let mut payload = vec![0u8; GAS_PAYLOAD_SIZE];
        payload[4] = 28; // controller 2.8
        payload[6] = 7; // panel 0.7
        let ctrl = GAS_FIELDS.iter().find(|s| s.field == FieldId::ControllerVersion).unwrap();
        let panel = GAS_FIELDS.iter().find(|s| s.field == FieldId::PanelVersion).unwrap();
        assert_eq!(ctrl.decode(&payload), Ok(Value::Text("2.8".into())));
        assert_eq!(panel.decode(&payload), Ok(Value::Text("0.7".into())));
    }

    #[test]
    fn test_flag_decode() {
        let mut payload = vec![0u8; WATER_PAYLOAD_SIZE];
        payload[3] = 0x25;
        let power = WATER_FIELDS.iter().find(|s| s.field == FieldId::Power).unwrap();
        assert_eq!(power.decode(&payload), Ok(Value::Bool(true)));
        payload[3] = 0x20;
        assert_eq!(power.decode(&payload), Ok(Value::Bool(false)));
    }
}
