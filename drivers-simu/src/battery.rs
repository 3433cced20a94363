use drivers_shared::sense::{ChargerHardware, CurrentReading, VoltageReading};

/// EMF of the charging source at full duty.
const SOURCE_VOLTAGE: f32 = 16.0;
const SOURCE_RESISTANCE: f32 = 0.2;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Chemistry {
    /// Open circuit voltage when empty.
    pub empty_voltage: f32,
    /// Open circuit voltage when full.
    pub full_voltage: f32,
    pub internal_resistance: f32,
    pub capacity_ah: f32,
}

/// 3S lithium-ion pack
pub const LI_ION: Chemistry = Chemistry {
    empty_voltage: 9.6,
    full_voltage: 12.5,
    internal_resistance: 0.1,
    capacity_ah: 20.0,
};

/// 12V absorbent glass mat lead-acid battery
pub const AGM: Chemistry = Chemistry {
    empty_voltage: 12.0,
    full_voltage: 13.9,
    internal_resistance: 0.1,
    capacity_ah: 10.0,
};

/// A battery on a PWM controlled charging source. Open circuit voltage rises linearly with the
/// state of charge.
#[derive(Clone, Debug)]
pub struct SimBattery {
    chemistry: Chemistry,
    soc: f32,
}

impl SimBattery {
    pub fn new(chemistry: Chemistry, soc: f32) -> Self {
        Self {
            chemistry,
            soc: soc.max(0.0).min(1.0),
        }
    }

    pub fn soc(&self) -> f32 {
        self.soc
    }

    pub fn open_circuit_voltage(&self) -> f32 {
        let c = &self.chemistry;
        c.empty_voltage + (c.full_voltage - c.empty_voltage) * self.soc
    }

    /// Charging current in A. The source only ever pushes current into the battery.
    pub fn current(&self, duty: u8) -> f32 {
        let source = duty as f32 / 255.0 * SOURCE_VOLTAGE;
        let r = SOURCE_RESISTANCE + self.chemistry.internal_resistance;
        ((source - self.open_circuit_voltage()) / r).max(0.0)
    }

    pub fn terminal_voltage(&self, duty: u8) -> f32 {
        self.open_circuit_voltage() + self.current(duty) * self.chemistry.internal_resistance
    }

    /// Charges for `seconds` at the given duty cycle.
    pub fn step(&mut self, duty: u8, seconds: f32) {
        let ah = self.current(duty) * seconds / 3600.0;
        self.soc = (self.soc + ah / self.chemistry.capacity_ah).min(1.0);
    }
}

/// Sense and PWM lines of the simulated board.
pub struct ChargerIo {
    battery: SimBattery,
    duty: u8,
    last_step_ms: u64,
    clock: fn() -> u64,
}

impl ChargerIo {
    pub fn new(battery: SimBattery) -> Self {
        Self::with_clock(battery, crate::time::sim_millis)
    }

    pub(crate) fn with_clock(battery: SimBattery, clock: fn() -> u64) -> Self {
        Self {
            battery,
            duty: 0,
            last_step_ms: clock(),
            clock,
        }
    }

    pub fn battery(&self) -> &SimBattery {
        &self.battery
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    fn advance(&mut self) {
        let now = (self.clock)();
        let dt = now.saturating_sub(self.last_step_ms);
        if dt > 0 {
            self.battery.step(self.duty, dt as f32 / 1000.0);
            self.last_step_ms = now;
        }
    }
}

impl ChargerHardware for ChargerIo {
    fn read_voltage(&mut self) -> VoltageReading {
        self.advance();
        VoltageReading::from_volts(self.battery.terminal_voltage(self.duty))
    }

    fn read_current(&mut self) -> CurrentReading {
        self.advance();
        CurrentReading::from_amps(self.battery.current(self.duty))
    }

    fn write_pwm_duty(&mut self, duty: u8) {
        self.advance();
        if duty != self.duty {
            log::trace!("PWM duty {} -> {}", self.duty, duty);
        }
        self.duty = duty;
    }

    fn now_millis(&self) -> u64 {
        (self.clock)()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[track_caller]
    fn assert_close(a: f32, b: f32, tolerance: f32) {
        assert!((a - b).abs() <= tolerance, "{} != {}", a, b);
    }

    #[test]
    fn test_no_current_below_open_circuit_voltage() {
        let b = SimBattery::new(LI_ION, 0.5);
        assert_close(b.open_circuit_voltage(), 11.05, 1e-4);
        assert_eq!(b.current(0), 0.0);
        assert_eq!(b.current(50), 0.0);
        assert_close(b.terminal_voltage(0), 11.05, 1e-4);
    }

    #[test]
    fn test_current_rises_with_duty() {
        let b = SimBattery::new(LI_ION, 0.5);
        let mut last = 0.0;
        for duty in (180..=255).step_by(5) {
            let i = b.current(duty);
            assert!(i >= last);
            last = i;
        }
        // 16V source against 11.05V over 0.3 ohm
        assert_close(b.current(255), 16.5, 1e-3);
        assert_close(b.terminal_voltage(255), 12.7, 1e-3);
    }

    #[test]
    fn test_step_charges() {
        let mut b = SimBattery::new(AGM, 0.0);
        let i = b.current(255);
        b.step(255, 360.0);
        assert_close(b.soc(), i * 0.1 / AGM.capacity_ah, 1e-4);
        b.step(255, 100.0 * 3600.0);
        assert_eq!(b.soc(), 1.0);
        assert_eq!(SimBattery::new(AGM, 7.0).soc(), 1.0);
    }

    static NOW: AtomicU64 = AtomicU64::new(0);
    fn fake_clock() -> u64 {
        NOW.load(Ordering::Relaxed)
    }

    #[test]
    fn test_charger_io() {
        let mut io = ChargerIo::with_clock(SimBattery::new(LI_ION, 0.5), fake_clock);
        assert_eq!(io.read_current().raw, 432);
        assert_eq!(io.read_voltage(), VoltageReading::from_volts(11.05));

        io.write_pwm_duty(255);
        assert_close(io.read_current().amps(), 16.5, 0.1);

        NOW.store(3_600_000, Ordering::Relaxed);
        io.read_voltage();
        assert!(io.battery().soc() > 0.5);
        assert_eq!(io.now_millis(), 3_600_000);
        assert_eq!(io.duty(), 255);
    }
}
