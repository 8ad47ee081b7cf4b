//! Integration tests for power loss emulator acceptance testing.

mod common;
mod config_test;
mod waveform_test;
mod workload_test;
