//! The persisted target direction.
//!
//! The store holds exactly one direction. A new value only becomes current after it
//! has been written to disk, so the file and memory never disagree.

use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{DirectionsError, Result};
use crate::geometry::Direction;

#[derive(Debug)]
pub struct TargetStore {
    path: PathBuf,
    resume: bool,
    current: Direction,
    rng: StdRng,
}

impl TargetStore {
    /// Opens the store at `path`, resuming the persisted target if allowed.
    pub fn open(path: impl Into<PathBuf>, resume: bool) -> Result<Self> {
        Self::with_rng(path, resume, StdRng::from_entropy())
    }

    pub fn with_rng(path: impl Into<PathBuf>, resume: bool, rng: StdRng) -> Result<Self> {
        let mut store = Self {
            path: path.into(),
            resume,
            current: Direction::from_angle(0.0),
            rng,
        };
        store.load()?;
        Ok(store)
    }

    pub fn current(&self) -> Direction {
        self.current
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the persisted target, drawing a fresh one if resuming is disabled or
    /// the file is missing or unreadable.
    pub fn load(&mut self) -> Result<Direction> {
        if self.resume {
            match read_target(&self.path) {
                Ok(direction) => {
                    tracing::info!(
                        %direction,
                        path = %self.path.display(),
                        "Resumed target direction"
                    );
                    self.current = direction;
                    return Ok(direction);
                }
                Err(e) => tracing::debug!(error = %e, "persisted target unusable"),
            }
        }
        self.change()
    }

    /// Draws a uniformly random direction, persists it, then makes it current.
    pub fn change(&mut self) -> Result<Direction> {
        let direction = random_direction(&mut self.rng);
        write_target(&self.path, &direction)?;
        self.current = direction;
        tracing::info!(%direction, "Target direction");
        Ok(direction)
    }
}

fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    Direction::from_angle(rng.gen_range(0.0..TAU))
}

fn read_target(path: &Path) -> Result<Direction> {
    let text = fs::read_to_string(path)?;
    parse_target(&text)
}

/// Parses `x,y` into a direction.
pub fn parse_target(text: &str) -> Result<Direction> {
    let invalid = || DirectionsError::InvalidTarget(text.trim().to_string());

    let mut parts = text.trim().split(',');
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    Direction::new(x, y).ok_or_else(invalid)
}

fn write_target(path: &Path, direction: &Direction) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{},{}\n", direction.x(), direction.y()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1.0e-12;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    fn assert_same(a: Direction, b: Direction) {
        assert!((a.x() - b.x()).abs() < EPS && (a.y() - b.y()).abs() < EPS, "{a} != {b}");
    }

    #[test]
    fn change_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("directions.vec");

        let mut store = TargetStore::with_rng(&path, true, rng(1)).expect("store opens");
        let written = store.change().expect("change persists");
        let loaded = store.load().expect("load succeeds");

        assert_same(written, loaded);
        assert_eq!(store.current(), loaded);
    }

    #[test]
    fn file_holds_a_single_line() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("directions.vec");

        let mut store = TargetStore::with_rng(&path, true, rng(2)).expect("store opens");
        store.change().expect("change persists");
        let latest = store.change().expect("change persists");

        let text = fs::read_to_string(&path).expect("file exists");
        assert_eq!(text.lines().count(), 1);
        assert_same(parse_target(&text).expect("valid file"), latest);
    }

    #[test]
    fn resumes_existing_target() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("directions.vec");
        fs::write(&path, "0.6,0.8\n").expect("write fixture");

        let store = TargetStore::with_rng(&path, true, rng(3)).expect("store opens");
        assert!((store.current().x() - 0.6).abs() < EPS);
        assert!((store.current().y() - 0.8).abs() < EPS);
    }

    #[test]
    fn resume_disabled_ignores_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("directions.vec");
        fs::write(&path, "0.6,0.8\n").expect("write fixture");

        let store = TargetStore::with_rng(&path, false, rng(4)).expect("store opens");
        let on_disk = read_target(&path).expect("fresh target persisted");
        assert_same(store.current(), on_disk);
        assert!((store.current().x() - 0.6).abs() > EPS || (store.current().y() - 0.8).abs() > EPS);
    }

    #[test]
    fn corrupt_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");

        let missing = dir.path().join("nested").join("directions.vec");
        let store = TargetStore::with_rng(&missing, true, rng(5)).expect("store opens");
        assert!(missing.exists());
        assert_same(read_target(&missing).expect("persisted"), store.current());

        let corrupt = dir.path().join("corrupt.vec");
        fs::write(&corrupt, "north-ish").expect("write fixture");
        let store = TargetStore::with_rng(&corrupt, true, rng(6)).expect("store opens");
        assert_same(read_target(&corrupt).expect("rewritten"), store.current());
    }

    #[test]
    fn failed_write_keeps_previous_target() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("directions.vec");
        let mut store = TargetStore::with_rng(&path, true, rng(7)).expect("store opens");
        let before = store.current();

        fs::remove_file(&path).expect("remove target file");
        fs::create_dir(&path).expect("directory in its place");

        assert!(store.change().is_err());
        assert_eq!(store.current(), before);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for text in ["", "1.0", "1.0,2.0,3.0", "a,b", "0,0"] {
            assert!(parse_target(text).is_err(), "{text:?} accepted");
        }
        let d = parse_target(" 3 , 4 \n").expect("valid");
        assert!((d.x() - 0.6).abs() < EPS);
    }
}
