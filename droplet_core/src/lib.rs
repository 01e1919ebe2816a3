#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Closed-loop droplet positioning (hardware-agnostic).
//!
//! All hardware interactions go through `droplet_traits::Camera` and
//! `droplet_traits::Actuator`.
//!
//! ## Architecture
//!
//! - **Estimator**: frame → droplet x position (`estimator` module)
//! - **Calibration**: distance → motion profile table with interpolation (`calibration`)
//! - **Commands**: line encoding and delivery (`command`, `link`)
//! - **Control**: one sense/actuate/settle/verify cycle (`controller`)
//! - **Lifecycle**: builder, session with guaranteed release, retries (`builder`, `session`, `runner`)
//!
//! One cycle at a time. The settle phase blocks on the injected clock and can
//! be cut short through a `CancelToken`.

pub mod builder;
pub mod calibration;
pub mod command;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod estimator;
pub mod hw_error;
pub mod link;
pub mod mocks;
pub mod profile;
pub mod runner;
pub mod session;
pub mod settle;
pub mod util;

pub use builder::{Missing, Positioner, PositionerBuilder, Set};
pub use calibration::{CalibrationEntry, CalibrationTable};
pub use command::Command;
pub use config::{Anchor, ControlCfg, EstimatorCfg, LinkCfg};
pub use controller::{ControlResult, Controller, FailureReason, Phase, Plan, judge, plan};
pub use estimator::{Estimator, PositionSample, Region};
pub use link::{CommandLink, LineLink};
pub use profile::{Direction, MotionProfile};
pub use runner::{RetryPolicy, RunReport, move_with_retries};
pub use session::Session;
pub use settle::{CancelToken, SettleTimer, WaitOutcome};
