#![no_std]
//! Board support for the charger: the nRF52840 drivers on arm, the simulator everywhere else.

#[cfg(target_arch = "arm")]
pub use drivers_hw::{charger_io, run, serial, time, ChargerHardware, Context, Main, Never};
#[cfg(not(target_arch = "arm"))]
pub use drivers_simu::{
    battery as charger_io, run, serial, time, ChargerHardware, Context, Main, Never,
};
