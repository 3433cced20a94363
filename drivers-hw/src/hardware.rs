#![allow(non_camel_case_types)]
#![allow(unused)]

pub mod sense {
    use embassy_nrf::peripherals::*;
    pub type VOLTAGE = P0_03; // AIN1
    pub type CURRENT = P0_04; // AIN2
}

pub mod pwm {
    use embassy_nrf::peripherals::*;
    pub type OUT = P0_13;
    pub type INSTANCE = PWM0;
}

pub mod uart {
    use embassy_nrf::peripherals::*;
    pub type RX = P0_08;
    pub type TX = P0_06;
    pub const BAUDRATE: embassy_nrf::uarte::Baudrate = embassy_nrf::uarte::Baudrate::BAUD9600;
}
