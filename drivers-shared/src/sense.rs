/// Full scale of the 10 bit sense ADC.
pub const ADC_MAX: u16 = 1023;

pub const VOLTS_PER_COUNT: f32 = 0.0195669;

/// Raw reading of the current sensor at zero current.
pub const CURRENT_ZERO_OFFSET: i32 = 432;
pub const AMPS_PER_COUNT: f32 = 0.088;

#[derive(Copy, Clone, Debug, PartialEq, Eq, defmt::Format)]
pub struct VoltageReading {
    pub raw: u16,
}

impl VoltageReading {
    pub fn volts(&self) -> f32 {
        self.raw as f32 * VOLTS_PER_COUNT
    }

    /// Closest raw reading for `volts`, saturating at the ADC range.
    pub fn from_volts(volts: f32) -> Self {
        let raw = (volts / VOLTS_PER_COUNT + 0.5).max(0.0).min(ADC_MAX as f32);
        Self { raw: raw as u16 }
    }
}

/// Signed current through the battery, positive while charging.
#[derive(Copy, Clone, Debug, PartialEq, Eq, defmt::Format)]
pub struct CurrentReading {
    pub raw: u16,
}

impl CurrentReading {
    pub fn amps(&self) -> f32 {
        (self.raw as i32 - CURRENT_ZERO_OFFSET) as f32 * AMPS_PER_COUNT
    }

    pub fn from_amps(amps: f32) -> Self {
        let raw = (amps / AMPS_PER_COUNT + CURRENT_ZERO_OFFSET as f32 + 0.5)
            .max(0.0)
            .min(ADC_MAX as f32);
        Self { raw: raw as u16 }
    }
}

/// Board access needed by the charge controller.
pub trait ChargerHardware {
    fn read_voltage(&mut self) -> VoltageReading;
    fn read_current(&mut self) -> CurrentReading;
    /// Duty cycle of the charging output, 0 is off and 255 is fully on.
    fn write_pwm_duty(&mut self, duty: u8);
    fn now_millis(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{} != {}", a, b);
    }

    #[test]
    fn test_voltage_conversion() {
        assert_close(VoltageReading { raw: 0 }.volts(), 0.0);
        assert_close(VoltageReading { raw: 613 }.volts(), 11.9945);
        assert_close(VoltageReading { raw: 646 }.volts(), 12.6402);
        assert_eq!(VoltageReading::from_volts(12.0).raw, 613);
        assert_eq!(VoltageReading::from_volts(12.64).raw, 646);
        assert_eq!(VoltageReading::from_volts(-1.0).raw, 0);
        assert_eq!(VoltageReading::from_volts(100.0).raw, ADC_MAX);
    }

    #[test]
    fn test_current_conversion() {
        assert_close(CurrentReading { raw: 432 }.amps(), 0.0);
        assert_close(CurrentReading { raw: 546 }.amps(), 10.032);
        assert_close(CurrentReading { raw: 400 }.amps(), -2.816);
        assert_eq!(CurrentReading::from_amps(0.0).raw, 432);
        assert_eq!(CurrentReading::from_amps(30.0).raw, 773);
        assert_eq!(CurrentReading::from_amps(10.0).raw, 546);
        assert_eq!(CurrentReading::from_amps(-100.0).raw, 0);
    }
}
