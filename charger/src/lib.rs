#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod config;
pub mod controller;
pub mod profile;

pub use controller::{BatteryState, Charger, ChargerError, Fault, Status};
pub use profile::{BatteryProfile, BatteryType};
