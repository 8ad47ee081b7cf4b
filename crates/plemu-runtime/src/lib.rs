#![doc = "Pulse scheduling engine for the power loss emulator."]

pub mod emulator;
pub mod hal;
pub mod operator;
pub mod scheduler;
pub mod settings;
pub mod waveform;

pub use emulator::*;
pub use hal::*;
pub use operator::*;
pub use scheduler::*;
pub use settings::{current_settings, setup, SettingsReport, SetupOutcome};
pub use waveform::Ramp;
