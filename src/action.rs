//! The fixed set of turn actions.

use std::f64::consts::PI;
use std::fmt;

/// A turn the user can be asked to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Back,
    Forward,
}

/// Candidates for background action cycles.
pub const ALL_ACTIONS: [Action; 4] = [Action::Left, Action::Right, Action::Back, Action::Forward];

/// Candidates for immediate, operator-requested directions.
pub const IMMEDIATE_ACTIONS: [Action; 2] = [Action::Left, Action::Right];

impl Action {
    /// Frame rotation (see [`Orientation::rot_z`](crate::geometry::Orientation::rot_z))
    /// the heading undergoes when the user performs this action.
    pub fn angle(self) -> f64 {
        match self {
            Action::Left => -PI / 2.0,
            Action::Right => PI / 2.0,
            Action::Back => PI,
            Action::Forward => 0.0,
        }
    }

    /// Scales the selection weight; back and forward are offered less often.
    pub fn weight_multiplier(self) -> f64 {
        match self {
            Action::Left | Action::Right => 1.0,
            Action::Back => 0.25,
            Action::Forward => 0.8,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Left => "left",
            Action::Right => "right",
            Action::Back => "back",
            Action::Forward => "forward",
        };
        f.write_str(name)
    }
}
