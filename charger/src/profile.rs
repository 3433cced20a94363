use core::fmt;

/// Battery chemistry. The numeric values are the ones used on the serial protocol.
#[repr(u8)]
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive,
)]
pub enum BatteryType {
    /// Nothing selected, regulation is disabled.
    None = 0,
    LiIon = 1,
    Agm = 2,
}

impl BatteryType {
    pub fn profile(self) -> Option<&'static BatteryProfile> {
        match self {
            BatteryType::None => None,
            BatteryType::LiIon => Some(&LI_ION),
            BatteryType::Agm => Some(&AGM),
        }
    }
}

impl Default for BatteryType {
    fn default() -> Self {
        BatteryType::None
    }
}

impl fmt::Display for BatteryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatteryType::None => "None",
            BatteryType::LiIon => "LiIon",
            BatteryType::Agm => "AGM",
        })
    }
}

/// Voltage breakpoints (V) and currents (A) of one chemistry.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BatteryProfile {
    /// Below this the battery counts as empty.
    pub discharge_voltage: f32,
    /// Constant current charging with the full current up to here.
    pub min_voltage: f32,
    /// Constant voltage phase starts here.
    pub max_voltage: f32,
    /// Default charging current.
    pub nominal_current: f32,
    /// Charging current at which the constant voltage phase counts as done.
    pub full_current: f32,
}

pub const LI_ION: BatteryProfile = BatteryProfile {
    discharge_voltage: 9.5,
    min_voltage: 12.2,
    max_voltage: 12.6,
    nominal_current: 12.0,
    full_current: 2.0,
};

pub const AGM: BatteryProfile = BatteryProfile {
    discharge_voltage: 12.5,
    min_voltage: 13.5,
    max_voltage: 14.0,
    nominal_current: 2.0,
    full_current: 0.5,
};
