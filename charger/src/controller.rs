use core::fmt;

use drivers_shared::sense::ChargerHardware;
use libm::fabsf;
use util::{LinearMap, Range};

use crate::config::Limits;
use crate::profile::{BatteryProfile, BatteryType};

#[repr(u8)]
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive,
)]
pub enum BatteryState {
    Charging = 0,
    Idle = 1,
    /// Terminal until `set_type` or `reset`.
    Full = 2,
    /// Terminal until `reset`.
    Error = 3,
}

impl fmt::Display for BatteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatteryState::Charging => "Charging",
            BatteryState::Idle => "Idle",
            BatteryState::Full => "Full",
            BatteryState::Error => "Error",
        })
    }
}

/// Safety violation that ended a charge cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    MaxSafeCurrent,
    MaxSafeVoltage,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Fault::MaxSafeCurrent => "max safe current exceeded",
            Fault::MaxSafeVoltage => "max safe voltage exceeded",
        })
    }
}

/// Rejected request. The charger state is left untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChargerError {
    UnsupportedType(BatteryType),
    CurrentOutOfRange,
    /// A fault is pending and has to be cleared with `reset` first.
    Faulted,
}

impl fmt::Display for ChargerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargerError::UnsupportedType(t) => write!(f, "unsupported battery type {}", t),
            ChargerError::CurrentOutOfRange => f.write_str("needed current out of range"),
            ChargerError::Faulted => f.write_str("charger is faulted, reset first"),
        }
    }
}

/// Snapshot of the charger together with fresh sensor readings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Status {
    pub current: f32,
    pub voltage: f32,
    /// Current the regulation is aiming for right now, half of the needed current once the
    /// battery is above its min voltage breakpoint.
    pub needed_current: f32,
    pub percent: f32,
    pub pwm_duty: u8,
    pub battery_type: BatteryType,
    pub state: BatteryState,
}

/// Closed loop charge controller driving one battery through `H`.
///
/// `tick` is meant to be called from the main loop as often as possible. Safety and full
/// detection run on every call, regulation at most once per `Limits::adjust_interval_ms`.
pub struct Charger<H> {
    hw: H,
    limits: Limits,
    battery_type: BatteryType,
    state: BatteryState,
    pwm_duty: u8,
    needed_current: f32,
    reached_max_voltage: bool,
    percent: f32,
    last_adjust_ms: u64,
    fault: Option<Fault>,
}

impl<H: ChargerHardware> Charger<H> {
    pub fn new(hw: H) -> Self {
        Self::with_limits(hw, Limits::DEFAULT)
    }

    pub fn with_limits(hw: H, limits: Limits) -> Self {
        Self {
            hw,
            limits,
            battery_type: BatteryType::None,
            state: BatteryState::Idle,
            pwm_duty: 0,
            needed_current: 0.0,
            reached_max_voltage: false,
            percent: 0.0,
            last_adjust_ms: 0,
            fault: None,
        }
    }

    /// Brings the output into a known off state. Called once after boot.
    pub fn start(&mut self) {
        self.reset();
        log::info!("Charger started.");
    }

    pub fn set_type(&mut self, battery_type: BatteryType) -> Result<(), ChargerError> {
        if self.state == BatteryState::Error {
            return Err(ChargerError::Faulted);
        }
        let profile = battery_type
            .profile()
            .ok_or(ChargerError::UnsupportedType(battery_type))?;

        self.battery_type = battery_type;
        self.needed_current = profile.nominal_current;
        self.pwm_duty = self.limits.start_duty;
        self.reached_max_voltage = false;
        self.percent = 0.0;
        self.state = BatteryState::Charging;
        self.hw.write_pwm_duty(self.pwm_duty);

        log::info!("Battery type changed to {}", battery_type);
        Ok(())
    }

    pub fn set_needed_current(&mut self, current: f32) -> Result<(), ChargerError> {
        if !(0.0..=self.limits.max_needed_current).contains(&current) {
            return Err(ChargerError::CurrentOutOfRange);
        }
        self.needed_current = current;
        log::info!("Needed current set to {}A", current);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.switch_off();
        self.battery_type = BatteryType::None;
        self.reached_max_voltage = false;
        self.state = BatteryState::Idle;
        self.fault = None;
        log::info!("Charger reset.");
    }

    /// Switches the output off. Type and state are kept.
    pub fn stop(&mut self, reason: Option<&str>) {
        self.switch_off();
        match reason {
            Some(reason) => log::info!("Charging stopped: {}", reason),
            None => log::info!("Charging stopped."),
        }
    }

    pub fn error(&mut self, fault: Fault) {
        self.switch_off();
        self.state = BatteryState::Error;
        self.fault = Some(fault);
        log::error!("Charging stopped: {}", fault);
    }

    pub fn set_battery_is_full(&mut self) {
        self.switch_off();
        self.state = BatteryState::Full;
        log::info!("Battery full.");
    }

    pub fn tick(&mut self) {
        if self.state == BatteryState::Error {
            return;
        }

        let voltage = self.hw.read_voltage().volts();
        let signed_current = self.hw.read_current().amps();
        let current = fabsf(signed_current);

        if current > self.limits.max_safe_current {
            self.error(Fault::MaxSafeCurrent);
        }
        if voltage > self.limits.max_safe_voltage {
            self.error(Fault::MaxSafeVoltage);
        }
        if self.state == BatteryState::Error {
            return;
        }

        let Some(profile) = self.battery_type.profile() else {
            return;
        };

        if self.state != BatteryState::Full
            && voltage > profile.max_voltage
            && current < self.limits.full_current
        {
            log::info!("No current left at {}V", voltage);
            self.set_battery_is_full();
        }
        if self.state == BatteryState::Full {
            return;
        }

        let now = self.hw.now_millis();
        if now.wrapping_sub(self.last_adjust_ms) < self.limits.adjust_interval_ms {
            return;
        }
        self.last_adjust_ms = now;

        log::trace!(
            "V={} I={} duty={} state={}",
            voltage,
            signed_current,
            self.pwm_duty,
            self.state
        );

        self.adjust_state(signed_current);
        if self.adjust_percentage(profile, voltage, current) {
            return;
        }
        self.adjust_pwm(profile, voltage, current);
    }

    fn switch_off(&mut self) {
        self.pwm_duty = 0;
        self.needed_current = 0.0;
        self.hw.write_pwm_duty(0);
    }

    /// Only current flowing into the battery counts as charging.
    fn adjust_state(&mut self, current: f32) {
        self.state = if current > self.limits.charging_current {
            BatteryState::Charging
        } else {
            BatteryState::Idle
        };
    }

    /// Returns true if the estimate reached 100% and the charge was finished.
    fn adjust_percentage(&mut self, profile: &BatteryProfile, voltage: f32, current: f32) -> bool {
        if self.state != BatteryState::Charging {
            return false;
        }

        let cc_band = Range::new(profile.min_voltage, profile.max_voltage);
        let discharge_band = Range::new(profile.discharge_voltage, profile.min_voltage);

        let estimate = if self.reached_max_voltage {
            // Current tapers off from half the nominal current to the full current
            let taper = Range::new(profile.full_current, profile.nominal_current / 2.0);
            90.0 + LinearMap::new(taper, Range::new(10.0, 0.0)).map_bounded(current)
        } else if cc_band.contains_open(voltage) {
            80.0 + LinearMap::new(cc_band, Range::new(0.0, 10.0)).map_bounded(voltage)
        } else if discharge_band.contains_open(voltage) {
            LinearMap::new(discharge_band, Range::new(0.0, 80.0)).map_bounded(voltage)
        } else {
            return false;
        };

        self.percent = self.percent.max(estimate.max(0.0).min(100.0));

        if self.percent >= 100.0 {
            log::info!("Charge estimate reached 100%");
            self.set_battery_is_full();
            return true;
        }
        false
    }

    fn adjust_pwm(&mut self, profile: &BatteryProfile, voltage: f32, current: f32) {
        if voltage >= profile.max_voltage {
            if !self.reached_max_voltage {
                log::info!("Reached max voltage, holding {}V", profile.max_voltage);
            }
            self.pwm_duty = self.pwm_duty.saturating_sub(1);
            self.reached_max_voltage = true;
            log::debug!("Reached max voltage. PWM={}", self.pwm_duty);
            self.hw.write_pwm_duty(self.pwm_duty);
            return;
        }

        if self.reached_max_voltage {
            return;
        }

        let target = if voltage < profile.min_voltage {
            self.needed_current
        } else {
            self.needed_current / 2.0
        };

        if current - target > self.limits.current_error {
            self.pwm_duty = self.pwm_duty.saturating_sub(1);
        } else if target - current > self.limits.current_error {
            self.pwm_duty = self.pwm_duty.saturating_add(1);
        }

        self.hw.write_pwm_duty(self.pwm_duty);
    }

    pub fn battery_type(&self) -> BatteryType {
        self.battery_type
    }

    pub fn state(&self) -> BatteryState {
        self.state
    }

    pub fn pwm_duty(&self) -> u8 {
        self.pwm_duty
    }

    pub fn needed_current(&self) -> f32 {
        self.needed_current
    }

    pub fn reached_max_voltage(&self) -> bool {
        self.reached_max_voltage
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn voltage(&mut self) -> f32 {
        self.hw.read_voltage().volts()
    }

    pub fn current(&mut self) -> f32 {
        self.hw.read_current().amps()
    }

    pub fn status(&mut self) -> Status {
        let voltage = self.voltage();
        let current = self.current();
        let needed_current = match self.battery_type.profile() {
            Some(p) if voltage > p.min_voltage => self.needed_current / 2.0,
            _ => self.needed_current,
        };
        Status {
            current,
            voltage,
            needed_current,
            percent: self.percent,
            pwm_duty: self.pwm_duty,
            battery_type: self.battery_type,
            state: self.state,
        }
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }
}
