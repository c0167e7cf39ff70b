//! Windows instrumentation backends: WMI classes, the ASUS ATK interface,
//! `powercfg` and the per-user Run key.
//!
//! Every function compiles on other hosts and fails there with an error, so
//! the providers built on top report `Unavailable` instead of panicking.

pub mod atk;
pub mod autostart;
pub mod core;
pub mod cpu;
pub mod machine;
pub mod power;
pub mod thermal;
