//! Chord-engine core for the NaN-15 15-key chording keypad.
//!
//! This crate is the hardware-independent half of the firmware: matrix
//! debouncing, chord classification, the modifier/emission engine, the
//! swap editor, the macro recorder, the cooperative printer, the secondary
//! (non-chord) layers and the LED scheduler. Everything that actually
//! touches silicon — GPIO, USB, a monotonic timer, non-volatile storage —
//! is reached through the traits in [`hal`] so the core can be driven from
//! unit tests on the host exactly as it is from a real board.
#![cfg_attr(not(test), no_std)]

pub mod action;
pub mod chord;
pub mod core;
pub mod error;
pub mod hal;
pub mod keypair;
pub mod layer;
pub mod leds;
pub mod macro_engine;
pub mod matrix;
pub mod mods;
pub mod printer;
pub mod swap;
pub mod tables;

pub use crate::core::KeyboardCore;
pub use crate::error::CoreError;

/// Re-exported so downstream boards don't need a direct `keyberon`
/// dependency just to spell keycodes.
pub use keyberon::key_code::{KbHidReport, KeyCode};
