use core::sync::atomic::{AtomicU16, Ordering};

use drivers_shared::sense::{
    ChargerHardware, CurrentReading, VoltageReading, ADC_MAX, CURRENT_ZERO_OFFSET,
};
use embassy_nrf::{
    peripherals::SAADC,
    pwm::SimplePwm,
    saadc::{self, Saadc},
};
use embassy_time::{Duration, Ticker};
use util::RingBuffer;

use super::hardware::{pwm as pwm_hw, sense as hw};

const SAMPLE_PERIOD: Duration = Duration::from_millis(5);
/// Readings are averaged over this many samples.
const NUM_SAMPLES: usize = 8;
const MAX_DUTY: u16 = 255;

static LAST_VOLTAGE: AtomicU16 = AtomicU16::new(0);
static LAST_CURRENT: AtomicU16 = AtomicU16::new(CURRENT_ZERO_OFFSET as u16);

fn to_raw(sample: i16) -> u16 {
    (sample.max(0) as u16).min(ADC_MAX)
}

#[embassy_executor::task]
async fn sense_task(mut saadc: Saadc<'static, 2>) {
    saadc.calibrate().await;

    let mut voltage = RingBuffer::<NUM_SAMPLES, u16>::default();
    let mut current = RingBuffer::<NUM_SAMPLES, u16>::default();
    let mut ticker = Ticker::every(SAMPLE_PERIOD);
    loop {
        let mut buf = [0; 2];
        saadc.sample(&mut buf).await;
        voltage.add(to_raw(buf[0]));
        current.add(to_raw(buf[1]));

        if let Some(v) = voltage.mean() {
            LAST_VOLTAGE.store(v, Ordering::Relaxed);
        }
        if let Some(i) = current.mean() {
            LAST_CURRENT.store(i, Ordering::Relaxed);
        }
        ticker.next().await;
    }
}

/// Sense inputs and charging output of the board.
///
/// Both sense channels are sampled continuously in the background, reads return the latest
/// averaged value without waiting.
pub struct ChargerIo {
    pwm: SimplePwm<'static, pwm_hw::INSTANCE>,
}

impl ChargerIo {
    pub(crate) fn new(
        spawner: &embassy_executor::Spawner,
        saadc: SAADC,
        voltage_pin: hw::VOLTAGE,
        current_pin: hw::CURRENT,
        pwm: pwm_hw::INSTANCE,
        pwm_pin: pwm_hw::OUT,
    ) -> Self {
        let mut config = saadc::Config::default();
        config.resolution = saadc::Resolution::_10BIT;
        config.oversample = saadc::Oversample::OVER16X;

        let voltage_config = saadc::ChannelConfig::single_ended(voltage_pin);
        let current_config = saadc::ChannelConfig::single_ended(current_pin);
        let saadc = Saadc::new(saadc, crate::Irqs, config, [voltage_config, current_config]);
        spawner.spawn(sense_task(saadc)).unwrap();

        let mut pwm = SimplePwm::new_1ch(pwm, pwm_pin);
        pwm.set_max_duty(MAX_DUTY);
        let mut ret = Self { pwm };
        ret.write_pwm_duty(0);
        ret
    }
}

impl ChargerHardware for ChargerIo {
    fn read_voltage(&mut self) -> VoltageReading {
        VoltageReading {
            raw: LAST_VOLTAGE.load(Ordering::Relaxed),
        }
    }

    fn read_current(&mut self) -> CurrentReading {
        CurrentReading {
            raw: LAST_CURRENT.load(Ordering::Relaxed),
        }
    }

    fn write_pwm_duty(&mut self, duty: u8) {
        // Compare value counts the low part of the period
        self.pwm.set_duty(0, MAX_DUTY - duty as u16);
    }

    fn now_millis(&self) -> u64 {
        crate::time::now_millis()
    }
}
