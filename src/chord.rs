//! Chord collection and classification: the default (chord) layer's
//! press/release accumulator, the finger-chord->function-chord squeeze
//! projection, and the classification rules that turn a completed chord
//! into a single resolved [`Action`].
//!
//! Dispatching the resolved `Action` (emitting HID reports, running chord
//! functions, feeding the macro engine and swap editor) is
//! [`crate::core::KeyboardCore`]'s job; this module only decides *what*
//! the chord means.

use crate::action::{Action, ChordFnId};
use crate::tables::{keypair_mods, ChordTables, THUMB_CHORD_TABLE};

/// Reconstructs the 7-bit function-chord index from an 8-bit finger
/// chord: two bits per column collapse to one "is this column pressed"
/// bit each for the low/high half of the 2-bit row code, and the single
/// row actually pressed is recovered by ORing all three possible
/// positions together. Chords spanning more than one row squeeze to 0.
pub const fn squeeze(fng_chord: u8) -> u8 {
    let even = collapse_even(fng_chord);
    let odd = collapse_even((fng_chord & 0xAA) >> 1);
    let row = (fng_chord >> 6 | fng_chord >> 4 | fng_chord >> 2 | fng_chord) & 3;
    if even != 0 && odd != 0 && even != odd {
        0
    } else {
        (even | odd) | (row << 4)
    }
}

/// Compresses the bits at positions 0,2,4,6 down to positions 0,1,2,3.
const fn collapse_even(x: u8) -> u8 {
    let x = x & 0x55;
    let x = (x | (x >> 1)) & 0x33;
    (x | (x >> 2)) & 0x0F
}

/// Resolves a completed chord (finger + thumb accumulators) against the
/// thumb-chord table and, where it names a function chord, the
/// finger/function-chord tables. Implements classification rules 1-5:
/// lower-level keypair, upper-level keypair (thumb shift held alone),
/// direct thumb-mods chord, thumb-dispatched chord function, or a
/// squeezed function-chord lookup.
pub fn classify(fng_chord: u8, thb_chord: u8, tables: &ChordTables) -> Action {
    let thb_state = THUMB_CHORD_TABLE[(thb_chord & 0x7) as usize];
    match thb_state {
        Action::None => {
            let kp = tables.chord[fng_chord as usize];
            Action::Mods {
                mods: keypair_mods(kp.mods_lo.into()),
                code: kp.code_lo,
            }
        }
        Action::ThumbShift => {
            let kp = tables.chord[fng_chord as usize];
            Action::Mods {
                mods: keypair_mods(kp.mods_up.into()),
                code: kp.code_up,
            }
        }
        Action::Function {
            func_id: ChordFnId::FngChrd,
            opt,
        } => {
            let idx = squeeze(fng_chord) | ((opt & 1) << 6);
            tables.fn_action(idx as usize)
        }
        other => other,
    }
}

/// The default (chord) layer's press/release accumulator.
///
/// Owns exactly the state described by the spec's chord-collector
/// invariants: `keys_down` never goes negative, `ready` is true exactly
/// when no key is down and the last chord (if any) has been dispatched,
/// and the finger/thumb accumulators only matter while `ready` was true
/// at the start of the current press burst.
#[derive(Debug, Default)]
pub struct ChordCollector {
    keys_down: u16,
    ready: bool,
    fng_chord: u8,
    thb_chord: u8,
}

/// What happened on a [`ChordCollector::release`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// `Some((fng_chord, thb_chord))` exactly on the first release of a
    /// chord: classify and dispatch this snapshot.
    pub dispatch: Option<(u8, u8)>,
    /// True exactly on the release that brought `keys_down` back to
    /// zero: accumulators have been reset and a pending layer change (if
    /// any) should now take effect.
    pub settled: bool,
}

impl ChordCollector {
    /// A fresh collector, ready to accumulate the first chord.
    pub fn new() -> Self {
        ChordCollector {
            keys_down: 0,
            ready: true,
            fng_chord: 0,
            thb_chord: 0,
        }
    }

    /// Is the collector ready to start accumulating a new chord (no key
    /// down, previous chord already dispatched)?
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// A finger key (one of the upper `finger_rows` rows) was pressed at
    /// `(row, col)`. `row` is overwritten into the 2-bit slot for `col`,
    /// so the most recent press on a column wins.
    pub fn press_finger(&mut self, row: usize, col: usize) {
        self.keys_down += 1;
        if self.ready {
            let shift = 2 * col;
            self.fng_chord &= !(0b11 << shift);
            self.fng_chord |= (((row + 1) as u8) & 0b11) << shift;
        }
    }

    /// A thumb key was pressed at thumb-row column `col` (0 = left
    /// function, 1 = center shift, 2 = right function).
    pub fn press_thumb(&mut self, col: usize) {
        self.keys_down += 1;
        if self.ready && col < 3 {
            self.thb_chord |= 1 << col;
        }
    }

    /// A key of this chord was released. Returns whether to classify and
    /// dispatch now, and whether the accumulators just reset.
    pub fn release(&mut self) -> ReleaseOutcome {
        let dispatch = if self.ready {
            self.ready = false;
            Some((self.fng_chord, self.thb_chord))
        } else {
            None
        };
        self.keys_down = self.keys_down.saturating_sub(1);
        let settled = self.keys_down == 0;
        if settled {
            self.fng_chord = 0;
            self.thb_chord = 0;
            self.ready = true;
        }
        ReleaseOutcome { dispatch, settled }
    }
}
