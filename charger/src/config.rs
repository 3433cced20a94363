/// Fixed thresholds of the control loop. Currents in A, voltages in V.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Limits {
    /// Hard cutoff on the magnitude of the measured current.
    pub max_safe_current: f32,
    /// Hard cutoff on the measured voltage.
    pub max_safe_voltage: f32,
    /// Dead band around the target current in which the duty cycle is held.
    pub current_error: f32,
    /// Above the max voltage breakpoint, a current below this means full.
    pub full_current: f32,
    /// More current than this counts as charging, otherwise idle.
    pub charging_current: f32,
    /// Upper bound accepted for the needed current.
    pub max_needed_current: f32,
    /// Minimum time between two regulation passes.
    pub adjust_interval_ms: u64,
    /// Duty cycle a new charge starts out with.
    pub start_duty: u8,
}

impl Limits {
    pub const DEFAULT: Limits = Limits {
        max_safe_current: 25.0,
        max_safe_voltage: 15.0,
        current_error: 0.5,
        full_current: 0.1,
        charging_current: 0.2,
        max_needed_current: 20.0,
        adjust_interval_ms: 1000,
        start_duty: 50,
    };
}

impl Default for Limits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
