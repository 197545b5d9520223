//! Constants used throughout the detector

pub mod programs;
pub mod system;
pub mod logs;
