//! Toss the dice
//!
//! An animated dice tray: drops a handful of fate dice into a tray sized to the
//! viewport, lets them tumble under rigid-body physics, reads the face pointing
//! at the viewer once everything has come to rest, and fades the dice away.

pub mod tray;
