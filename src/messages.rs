//! User-facing phrasing of actions.

use rand::Rng;

use crate::action::Action;
use crate::selector::weighted_choice;

/// A phrase and its relative weight.
pub type Phrase = (&'static str, f64);

const LEFT: &[Phrase] = &[
    ("Turn left.", 4.0),
    ("You should turn left.", 2.0),
    ("Please turn left as soon as possible.", 0.5),
    ("Left is the way to go.", 0.5),
    ("Left left left left left!", 0.2),
    ("Make an l-turn.", 0.1),
];

const RIGHT: &[Phrase] = &[
    ("Turn right.", 4.0),
    ("You should turn right.", 2.0),
    ("Please turn right as soon as possible.", 0.5),
    ("Right is the way to go.", 0.5),
    ("Right right right right right!", 0.2),
    ("Make an r-turn.", 0.1),
];

const BACK: &[Phrase] = &[
    ("Turn around.", 1.0),
    ("Make a u-turn.", 2.0),
    ("Make a v-turn.", 0.2),
    ("You’re going the wrong way. Turn around.", 0.5),
    ("Drive in the opposite direction.", 0.5),
];

const FORWARD: &[Phrase] = &[
    ("Continue straight.", 1.0),
    ("Keep driving.", 1.0),
    ("You’re on your way.", 0.35),
    ("Your destination is somewhere.", 0.1),
    ("I’m lost, but just keep going.", 0.1),
    ("Do not turn left.", 0.08),
    ("Do not turn right.", 0.08),
    (
        "Turn around 180 degrees, put the car in reverse, and drive backwards. Or just continue straight.",
        0.1,
    ),
];

pub const START: &[&str] = &[
    "Start driving. Press enter at any time if you need an immediate direction.",
    "Type “highway” to start highway mode.",
];

pub const HIGHWAY_STARTED: &[&str] = &[
    "Highway mode started. Type “exit” when you exit, or “new” if you merge onto a new highway.",
    "Press enter for an immediate direction.",
];

pub const HIGHWAY_EXIT_PROMPT: &str = "Exit the highway. Type exit when you exit.";
pub const HIGHWAY_STOPPED: &str = "Highway mode stopped.";
pub const UNKNOWN_COMMAND: &str = "Unknown command.";

/// The weighted phrase table for `action`.
pub fn phrases(action: Action) -> &'static [Phrase] {
    match action {
        Action::Left => LEFT,
        Action::Right => RIGHT,
        Action::Back => BACK,
        Action::Forward => FORWARD,
    }
}

/// Picks a phrasing for a background action.
pub fn render<R: Rng + ?Sized>(rng: &mut R, action: Action) -> &'static str {
    let table = phrases(action);
    weighted_choice(rng, table, |(_, weight)| *weight)
        .or_else(|| table.first())
        .map_or("", |(text, _)| *text)
}

/// The short phrasing used for immediate requests.
pub fn render_immediate(action: Action) -> &'static str {
    match action {
        Action::Left => "Go left.",
        Action::Right => "Go right.",
        Action::Back => "Turn around.",
        Action::Forward => "Continue straight.",
    }
}
