//! The chord-remapping editor: a small state machine that walks the user
//! through picking two same-kind chords and exchanges their mappings.

use crate::error::CoreError;
use crate::hal::NvStore;
use crate::keypair::Keypair;

/// Which half of a [`Keypair`] a swap targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// The default (`_lo`) mapping.
    Lower,
    /// The thumb-shifted (`_up`) mapping.
    Upper,
}

/// What kind of chord the editor is tracking, and its table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChordRef {
    /// A finger chord: an index into `chrdmap` plus the selected level.
    Finger { index: u8, level: Level },
    /// A function chord: an index into `fn_chrdmap`.
    Function { index: u8 },
}

/// The editor's state, named directly after the spec's transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwapState {
    Idle,
    ExpectFirst,
    ExpectFng,
    ExpectFn,
}

/// What the caller should do in response to [`SwapEditor::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwapEvent {
    /// First chord recorded; waiting on the second of the same kind.
    AwaitingSecond,
    /// Exchange the given halves of the finger-chord table.
    PerformFingerSwap {
        chord1: u8,
        level1: Level,
        chord2: u8,
        level2: Level,
    },
    /// Exchange the two function-chord table cells.
    PerformFunctionSwap { chord1: u8, chord2: u8 },
    /// The second chord didn't match the first's kind; swap cancelled.
    Rejected,
}

/// The swap editor. Owns nothing but its own transition state; the
/// caller owns the tables being swapped.
#[derive(Debug, Default)]
pub struct SwapEditor {
    state: SwapStateInner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwapStateInner {
    Idle,
    ExpectFirst,
    ExpectFng(ChordRef),
    ExpectFn(ChordRef),
}

impl Default for SwapStateInner {
    fn default() -> Self {
        SwapStateInner::Idle
    }
}

impl SwapEditor {
    /// A fresh, idle editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// The public-facing state, collapsing the two "waiting on second
    /// chord" variants' payload away.
    pub fn state(&self) -> SwapState {
        match self.state {
            SwapStateInner::Idle => SwapState::Idle,
            SwapStateInner::ExpectFirst => SwapState::ExpectFirst,
            SwapStateInner::ExpectFng(_) => SwapState::ExpectFng,
            SwapStateInner::ExpectFn(_) => SwapState::ExpectFn,
        }
    }

    /// Invoked by the `SWAP_CHRDS` chord function: arms the editor for
    /// the first of two chords to select.
    pub fn begin(&mut self) {
        self.state = SwapStateInner::ExpectFirst;
    }

    /// Feeds the next dispatched chord into the editor. No-op (and
    /// `None`) when the editor isn't active.
    pub fn feed(&mut self, chord: ChordRef) -> Option<SwapEvent> {
        let (next, event) = match self.state {
            SwapStateInner::Idle => return None,
            SwapStateInner::ExpectFirst => match chord {
                ChordRef::Finger { .. } => (SwapStateInner::ExpectFng(chord), SwapEvent::AwaitingSecond),
                ChordRef::Function { .. } => (SwapStateInner::ExpectFn(chord), SwapEvent::AwaitingSecond),
            },
            SwapStateInner::ExpectFng(first) => match (first, chord) {
                (
                    ChordRef::Finger {
                        index: chord1,
                        level: level1,
                    },
                    ChordRef::Finger {
                        index: chord2,
                        level: level2,
                    },
                ) => (
                    SwapStateInner::Idle,
                    SwapEvent::PerformFingerSwap {
                        chord1,
                        level1,
                        chord2,
                        level2,
                    },
                ),
                _ => (SwapStateInner::Idle, SwapEvent::Rejected),
            },
            SwapStateInner::ExpectFn(first) => match (first, chord) {
                (ChordRef::Function { index: chord1 }, ChordRef::Function { index: chord2 }) => {
                    (SwapStateInner::Idle, SwapEvent::PerformFunctionSwap { chord1, chord2 })
                }
                _ => (SwapStateInner::Idle, SwapEvent::Rejected),
            },
        };
        self.state = next;
        Some(event)
    }

    /// Cancels an in-progress swap unconditionally (called by `RESET`).
    pub fn cancel(&mut self) {
        self.state = SwapStateInner::Idle;
    }
}

fn half(kp: Keypair, level: Level) -> (u8, u8) {
    match level {
        Level::Lower => (kp.code_lo, kp.mods_lo.into()),
        Level::Upper => (kp.code_up, kp.mods_up.into()),
    }
}

fn set_half(kp: &mut Keypair, level: Level, value: (u8, u8)) {
    match level {
        Level::Lower => {
            kp.code_lo = value.0;
            kp.mods_lo = (value.1 & 0xf).into();
        }
        Level::Upper => {
            kp.code_up = value.0;
            kp.mods_up = (value.1 & 0xf).into();
        }
    }
}

/// Exchanges `(chord1, level1)` with `(chord2, level2)` in the
/// finger-chord table and writes both touched cells back to `store`.
/// Covers every case in the spec's swap-rule table: same level (exchanges
/// the named half between two entries), same chord (exchanges the two
/// halves of one entry), or both different (a general cross-move) — all
/// are the same operation.
pub fn perform_finger_swap<S: NvStore>(
    table: &mut [Keypair; 256],
    store: &mut S,
    chord1: u8,
    level1: Level,
    chord2: u8,
    level2: Level,
) -> Result<(), CoreError> {
    let v1 = half(table[chord1 as usize], level1);
    let v2 = half(table[chord2 as usize], level2);
    set_half(&mut table[chord1 as usize], level1, v2);
    set_half(&mut table[chord2 as usize], level2, v1);
    store.update_block(&table[chord1 as usize].to_bytes(), chord1 as u16 * 3)?;
    store.update_block(&table[chord2 as usize].to_bytes(), chord2 as u16 * 3)?;
    Ok(())
}

/// Exchanges two function-chord table cells (raw packed `Action` words)
/// and writes both back to `store`.
pub fn perform_function_swap<S: NvStore>(
    table: &mut [u16; 128],
    store: &mut S,
    chord1: u8,
    chord2: u8,
) -> Result<(), CoreError> {
    table.swap(chord1 as usize, chord2 as usize);
    store.update_word(chord1 as u16, table[chord1 as usize])?;
    store.update_word(chord2 as u16, table[chord2 as usize])?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keypair::Keypair;

    #[derive(Default)]
    struct MockNv {
        writes: heapless::Vec<(u16, u16), 16>,
    }

    impl NvStore for MockNv {
        fn read_word(&mut self, _addr: u16) -> Result<u16, CoreError> {
            Ok(0)
        }
        fn update_word(&mut self, addr: u16, value: u16) -> Result<(), CoreError> {
            let _ = self.writes.push((addr, value));
            Ok(())
        }
        fn read_block(&mut self, _dst: &mut [u8], _addr: u16) -> Result<(), CoreError> {
            Ok(())
        }
        fn update_block(&mut self, _src: &[u8], _addr: u16) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[test]
    fn finger_swap_is_involutive() {
        let mut table = [Keypair::none(); 256];
        let mut store = MockNv::default();
        table[5].code_lo = 0xaa;
        table[9].code_up = 0xbb;
        let before = table;
        perform_finger_swap(&mut table, &mut store, 5, Level::Lower, 9, Level::Upper).unwrap();
        perform_finger_swap(&mut table, &mut store, 5, Level::Lower, 9, Level::Upper).unwrap();
        assert_eq!(table, before);
    }

    #[test]
    fn same_chord_swap_exchanges_its_own_halves() {
        let mut table = [Keypair::none(); 256];
        let mut store = MockNv::default();
        table[3].code_lo = 1;
        table[3].code_up = 2;
        perform_finger_swap(&mut table, &mut store, 3, Level::Lower, 3, Level::Upper).unwrap();
        assert_eq!(table[3].code_lo, 2);
        assert_eq!(table[3].code_up, 1);
    }

    #[test]
    fn function_swap_persists_both_cells() {
        let mut table = [0u16; 128];
        let mut store = MockNv::default();
        table[4] = 0xabcd;
        table[7] = 0x1234;
        perform_function_swap(&mut table, &mut store, 4, 7).unwrap();
        assert_eq!(table[4], 0x1234);
        assert_eq!(table[7], 0xabcd);
        assert!(store.writes.contains(&(4, 0x1234)));
        assert!(store.writes.contains(&(7, 0xabcd)));
    }

    #[test]
    fn editor_walks_finger_swap_to_completion() {
        let mut editor = SwapEditor::new();
        editor.begin();
        assert_eq!(editor.state(), SwapState::ExpectFirst);
        assert_eq!(
            editor.feed(ChordRef::Finger {
                index: 5,
                level: Level::Lower
            }),
            Some(SwapEvent::AwaitingSecond)
        );
        assert_eq!(editor.state(), SwapState::ExpectFng);
        let event = editor.feed(ChordRef::Finger {
            index: 9,
            level: Level::Upper,
        });
        assert_eq!(
            event,
            Some(SwapEvent::PerformFingerSwap {
                chord1: 5,
                level1: Level::Lower,
                chord2: 9,
                level2: Level::Upper,
            })
        );
        assert_eq!(editor.state(), SwapState::Idle);
    }

    #[test]
    fn mismatched_second_chord_is_rejected() {
        let mut editor = SwapEditor::new();
        editor.begin();
        editor.feed(ChordRef::Finger {
            index: 1,
            level: Level::Lower,
        });
        let event = editor.feed(ChordRef::Function { index: 2 });
        assert_eq!(event, Some(SwapEvent::Rejected));
        assert_eq!(editor.state(), SwapState::Idle);
    }
}
