#![cfg_attr(target_arch = "arm", no_std)]

pub mod sense;
pub mod serial;
