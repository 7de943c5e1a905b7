#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core clock logic (transport-agnostic).
//!
//! Time sources are reached only through `clockwall_traits::TimeSource`, and
//! presentation only through `runner::Display`.
//!
//! ## Architecture
//!
//! - **Calibration**: latency-compensated offset estimation (`calibration`),
//!   run on a background thread (`calibrator`)
//! - **Rendering**: digit patterns (`digits`), forward-only hand rotation
//!   (`angle`), the 6 × 24 face grid (`grid`)
//! - **Scheduling**: second-aligned ticks (`scheduler`)
//! - **Glue**: the event loop (`runner`) and its builder (`builder`)
//!
//! ## Threading
//!
//! Rendering and scheduling share one thread. The only cross-thread state is
//! `CalibrationState`, a pair of atomics with a single writer.

pub mod angle;
pub mod builder;
pub mod calibration;
pub mod calibrator;
pub mod config;
pub mod conversions;
pub mod digits;
pub mod error;
pub mod grid;
pub mod mocks;
pub mod runner;
pub mod scheduler;
pub mod source_error;
pub mod util;

pub use builder::ClockRunnerBuilder;
pub use calibration::{
    CalibrationEngine, CalibrationOutcome, CalibrationState, TimeSample, sample_source,
    select_offset,
};
pub use calibrator::{CalibrationReason, CalibrationTrigger, Calibrator};
pub use config::CalibrationPolicy;
pub use error::{BuildError, ClockError, Result, SourceFailureKind};
pub use grid::{Frame, Meridiem, RenderGrid, TimeDigits, TimeFormat, time_digits};
pub use runner::{ClockRunner, ControlEvent, Display, Flow, RunStats};
pub use scheduler::{AlignedScheduler, Tick, first_delay_ms};
