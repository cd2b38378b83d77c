//! Random directions: turn-by-turn guidance toward a randomly chosen heading.
//!
//! This crate defines:
//! - [`fusion::SensorFusion`]: turns gravity + magnetometer samples into a horizontal heading.
//! - [`target::TargetStore`]: the persisted target direction.
//! - [`selector`]: scores turn actions against the target and picks one at random.
//! - [`navigator::Navigator`]: the scheduler driving action cycles, operator commands
//!   and highway mode.
//! - [`server::SensorServer`]: the TCP listener the phone streams sensor samples to.

pub mod action;
pub mod config;
pub mod error;
pub mod fusion;
pub mod geometry;
pub mod messages;
pub mod navigator;
pub mod output;
pub mod selector;
pub mod server;
pub mod target;

pub use action::Action;
pub use config::Config;
pub use error::{DirectionsError, Result};
pub use geometry::Direction;
pub use navigator::Navigator;
