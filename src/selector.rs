//! Scoring turn actions against the target and picking one at random.
//!
//! An action's weight grows with its *helpfulness*: how much closer to the target
//! the heading would point if the user made that turn right now.

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::action::Action;
use crate::geometry::{Direction, Orientation, Vector};

const BASE_WEIGHT: f64 = 0.0;
const HELPFULNESS_OFFSET: f64 = 1.0;
const HELPFULNESS_POWER: i32 = 2;

/// Alignment of `direction` with `target`, in `[-1, 1]` for unit vectors.
pub fn quality(target: &Direction, direction: &Vector) -> f64 {
    target.dot(direction)
}

/// Marginal change in [`quality`] if `action` were performed at `heading`.
pub fn helpfulness(action: Action, heading: &Direction, target: &Direction) -> f64 {
    let turned = Orientation::rot_z(action.angle()) * *heading.as_vector();
    (quality(target, &turned) - quality(target, heading.as_vector())) / 2.0
}

/// Selection weight of `action`; never negative.
pub fn weight(action: Action, heading: &Direction, target: &Direction) -> f64 {
    let shifted = (helpfulness(action, heading, target) + HELPFULNESS_OFFSET).max(0.0);
    (BASE_WEIGHT + shifted.powi(HELPFULNESS_POWER)) * action.weight_multiplier()
}

/// Draws one item with probability proportional to `weight_of(item)`.
///
/// Zero-weight items are never drawn unless every weight is zero (or a weight is
/// unusable), in which case the draw falls back to uniform. Returns `None` only for
/// an empty slice.
pub fn weighted_choice<'a, T, R, F>(rng: &mut R, items: &'a [T], weight_of: F) -> Option<&'a T>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> f64,
{
    match WeightedIndex::new(items.iter().map(weight_of)) {
        Ok(dist) => items.get(dist.sample(rng)),
        Err(WeightedError::NoItem) => None,
        Err(err) => {
            tracing::debug!(%err, "weights unusable, choosing uniformly");
            items.choose(rng)
        }
    }
}

/// Picks an action from `candidates`, weighted by [`weight`].
pub fn choose_action<R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &[Action],
    heading: &Direction,
    target: &Direction,
) -> Option<Action> {
    weighted_choice(rng, candidates, |action| weight(*action, heading, target)).copied()
}
