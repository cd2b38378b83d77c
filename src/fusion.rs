//! Sensor fusion: gravity + magnetic field readings into a horizontal heading.
//!
//! [`SensorFusion`] is the only writer of the current heading. Consumers hold a
//! [`HeadingReader`] and copy the latest value out of it.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::config::SensorNames;
use crate::error::{DirectionsError, Result};
use crate::geometry::{normalized, Direction, Orientation, Vector};

/// Canonical "down" the measured gravity is rotated onto.
pub fn reference_gravity() -> Vector {
    Vector::new(0.0, 0.0, 1.0)
}

/// Why a sample did not produce a heading.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("no gravity data")]
    NoGravity,
    #[error("no magnetometer data")]
    NoMagnetometer,
    #[error("zero-length gravity vector")]
    ZeroLengthGravity,
    #[error("zero-length fixed magnetism")]
    ZeroLengthFixedMagnetism,
}

/// One decoded sample; either reading may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSample {
    pub gravity: Option<Vector>,
    pub magnetometer: Option<Vector>,
}

#[derive(Debug, Deserialize)]
struct Reading {
    #[serde(default)]
    values: Vec<f64>,
}

impl Reading {
    fn vector(&self) -> Option<Vector> {
        match self.values.as_slice() {
            [x, y, z] => Some(Vector::new(*x, *y, *z)),
            _ => None,
        }
    }
}

impl SensorSample {
    /// Decodes one JSON object keyed by sensor name, each entry carrying `values`.
    pub fn from_json(chunk: &str, names: &SensorNames) -> Result<Self> {
        let readings: HashMap<String, Reading> = serde_json::from_str(chunk)?;
        Ok(Self {
            gravity: readings.get(&names.gravity).and_then(Reading::vector),
            magnetometer: readings.get(&names.magnetometer).and_then(Reading::vector),
        })
    }
}

/// Computes the heading for one gravity/magnetometer pair.
pub fn fuse(
    gravity: Option<Vector>,
    magnetometer: Option<Vector>,
) -> std::result::Result<Direction, Rejection> {
    let gravity = gravity.ok_or(Rejection::NoGravity)?;
    let gravity = normalized(&gravity).ok_or(Rejection::ZeroLengthGravity)?;
    let magnetometer = magnetometer.ok_or(Rejection::NoMagnetometer)?;

    let leveling = Orientation::vec_to_vec(&gravity, &reference_gravity());
    let fixed = leveling * magnetometer;
    Direction::from_horizontal(&fixed).ok_or(Rejection::ZeroLengthFixedMagnetism)
}

/// Owns the heading cell and feeds samples through [`fuse`].
#[derive(Debug)]
pub struct SensorFusion {
    heading: watch::Sender<Option<Direction>>,
    accepted: u64,
    rejected: u64,
}

impl SensorFusion {
    pub fn new() -> (Self, HeadingReader) {
        let (tx, rx) = watch::channel(None);
        let fusion = Self {
            heading: tx,
            accepted: 0,
            rejected: 0,
        };
        (fusion, HeadingReader { rx })
    }

    /// Fuses `sample` and publishes the heading; rejections are logged and leave the
    /// published heading untouched.
    pub fn process(&mut self, sample: &SensorSample) -> std::result::Result<Direction, Rejection> {
        match fuse(sample.gravity, sample.magnetometer) {
            Ok(heading) => {
                let first = self.accepted == 0;
                self.accepted += 1;
                self.heading.send_replace(Some(heading));
                if first {
                    tracing::info!(%heading, "Sensors ready");
                }
                Ok(heading)
            }
            Err(rejection) => {
                self.rejected += 1;
                tracing::warn!(%rejection, rejected = self.rejected, "sample rejected");
                Err(rejection)
            }
        }
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

/// Read side of the heading cell.
#[derive(Debug, Clone)]
pub struct HeadingReader {
    rx: watch::Receiver<Option<Direction>>,
}

impl HeadingReader {
    /// The latest heading, if any sample has been fused yet.
    pub fn current(&self) -> Option<Direction> {
        *self.rx.borrow()
    }

    /// Waits for the first fused heading.
    pub async fn wait_ready(&mut self) -> Result<Direction> {
        let heading = self
            .rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| DirectionsError::SensorsClosed)?;
        (*heading).ok_or(DirectionsError::SensorsClosed)
    }
}
