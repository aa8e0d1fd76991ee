//! # stagehand-core
//!
//! Core types and primitives for the Stagehand scene engine.
//! This crate contains foundational types shared across all Stagehand crates:
//! handles, colors, points, durations, easing functions, configuration and
//! error types.

pub mod color;
pub mod config;
pub mod error;
pub mod hash;
pub mod math;
pub mod time;
pub mod types;

pub use config::*;

pub use color::Color;
pub use error::{StageError, StageResult};
pub use math::{Direction, Point3};
pub use time::{Duration, Timestamp};
pub use types::{Easing, Handle, ObjectKind};
