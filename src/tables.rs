//! Static layer tables and constants, and the chord-table holes repurposed
//! by the macro engine.
//!
//! The finger-chord table (256 [`Keypair`]s) and the function-chord table
//! (128 packed [`Action`]s) are *not* `const` here: both are persistent,
//! swap-editor- and macro-recorder-mutable state mirrored from
//! [`crate::hal::NvStore`], so they live as owned arrays inside
//! [`ChordTables`] rather than as program-memory statics. The thumb-chord
//! table and the secondary-layer action maps are genuinely read-only and
//! stay `const`.

use crate::action::{Action, ChordFnId, Tap};
use crate::keypair::{hid_mod, Keypair, AG, AL, CO, SH};
use keyberon::key_code::KeyCode;

/// The default (chord) layer. All other layers are direct-action,
/// non-chording layers.
pub const L_DFLT: u8 = 0;
/// Numpad layer.
pub const L_NUM: u8 = 1;
/// Navigation layer (arrows, paging, edit keys).
pub const L_NAV: u8 = 2;
/// Mouse layer.
pub const L_MSE: u8 = 3;
/// Macro-pad layer.
pub const L_MCR: u8 = 4;
/// Momentary sublayer reached by holding a key on [`L_NUM`].
pub const L_NUM_FN: u8 = 5;
/// Number of secondary (non-chord) layers, [`L_NUM`] through [`L_NUM_FN`].
pub const NUM_LAYERS: usize = 6;

/// Macro chord length: chords per recorded macro.
pub const MCR_LEN: usize = 6;
/// Macro count: number of macro slots.
pub const MCR_MAX: usize = 8;
/// First macro-play key code id (`FN0`): `emit_keycode` treats
/// `[FN0, FN0 + MCR_MAX)` as "play macro `code - FN0`" instead of a real
/// key code.
pub const FN0: u8 = 0xF0;

/// Function-chord table indices no finger chord ever squeezes to: 36
/// cells, repurposed to store the macro engine's persistent buffers.
/// `MCR_LEN * MCR_MAX * 12 bits == 576 bits == FN_CHORD_HOLES.len() * 16
/// bits`, exactly filling the available space.
pub const FN_CHORD_HOLES: [u8; 36] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    0x10, 0x20, 0x30, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4a, 0x4b, 0x4c,
    0x4d, 0x4e, 0x4f, 0x50, 0x60, 0x70,
];

const _: () = assert!(MCR_LEN * MCR_MAX * 12 <= FN_CHORD_HOLES.len() * 16);

/// The thumb-chord table: indexed by the 3-bit thumb mask (`bit0` = left
/// thumb function, `bit1` = center thumb shift, `bit2` = right thumb
/// function). Program-memory, immutable.
pub const THUMB_CHORD_TABLE: [Action; 8] = [
    Action::None,
    Action::Function {
        func_id: ChordFnId::FngChrd,
        opt: 0,
    },
    Action::ThumbShift,
    Action::None,
    Action::Function {
        func_id: ChordFnId::FngChrd,
        opt: 1,
    },
    Action::None,
    Action::None,
    Action::None,
];

/// A persistent chord-table pair: the finger-chord table and the
/// function-chord table, seeded with a representative default mapping
/// (per the design note that only the *structure*, not the specific
/// mappings, is part of the contract).
pub struct ChordTables {
    /// 256-entry finger-chord table (`chrdmap`).
    pub chord: [Keypair; 256],
    /// 128-entry function-chord table (`fn_chrdmap`), packed `Action`s.
    /// Cells named by [`FN_CHORD_HOLES`] double as macro storage.
    pub fn_chord: [u16; 128],
}

fn keypair(code_lo: KeyCode, mods_lo: u8, code_up: KeyCode, mods_up: u8) -> Keypair {
    Keypair {
        code_lo: code_lo as u8,
        mods_lo: (mods_lo & 0xf).into(),
        code_up: code_up as u8,
        mods_up: (mods_up & 0xf).into(),
    }
}

impl ChordTables {
    /// Builds the default table set: index 0 is the reserved sentinel,
    /// a handful of finger chords map to letters (enough to exercise the
    /// engine end to end), a few function chords map to chord functions,
    /// and every hole is zeroed and ready for the macro engine.
    pub fn new() -> Self {
        let mut chord = [Keypair::none(); 256];
        chord[0x05] = keypair(KeyCode::E, 0, KeyCode::E, SH);
        chord[0x09] = keypair(KeyCode::A, 0, KeyCode::A, SH);
        chord[0x11] = keypair(KeyCode::B, 0, KeyCode::B, SH);
        chord[0x41] = keypair(KeyCode::C, 0, KeyCode::C, SH);
        chord[0x44] = keypair(KeyCode::D, 0, KeyCode::D, SH);
        chord[0x55] = keypair(KeyCode::Space, 0, KeyCode::Enter, 0);

        let mut fn_chord = [0u16; 128];
        // squeeze(fng=single column, row 0) | left-thumb-fn bit -> SWAP_CHRDS
        fn_chord[0x11] = Action::Function {
            func_id: ChordFnId::SwapChrds,
            opt: 0,
        }
        .to_u16();
        fn_chord[0x12] = Action::Function {
            func_id: ChordFnId::McrRecord,
            opt: 0,
        }
        .to_u16();
        fn_chord[0x14] = Action::Function {
            func_id: ChordFnId::Print,
            opt: 0,
        }
        .to_u16();
        fn_chord[0x18] = Action::Function {
            func_id: ChordFnId::Reset,
            opt: 0,
        }
        .to_u16();
        fn_chord[0x21] = Action::ModsTap {
            right: false,
            mods: CO,
            tap: Tap::OneShot,
        }
        .to_u16();
        fn_chord[0x22] = Action::ModsTap {
            right: false,
            mods: SH | AL,
            tap: Tap::Toggle,
        }
        .to_u16();
        fn_chord[0x24] = Action::ModsTap {
            right: true,
            mods: AG,
            tap: Tap::OneShot,
        }
        .to_u16();
        fn_chord[0x28] = Action::Function {
            func_id: ChordFnId::ChgLayer,
            opt: L_NUM,
        }
        .to_u16();

        ChordTables { chord, fn_chord }
    }

    /// Looks up `fn_chrdmap[idx]` as a packed action.
    pub fn fn_action(&self, idx: usize) -> Action {
        Action::from_u16(self.fn_chord[idx])
    }

    /// Is `idx` one of the reserved hole cells?
    pub fn is_hole(idx: u8) -> bool {
        FN_CHORD_HOLES.contains(&idx)
    }
}

impl Default for ChordTables {
    fn default() -> Self {
        Self::new()
    }
}

const fn mods_key(mods: u8, code: KeyCode) -> Action {
    Action::Mods {
        mods,
        code: code as u8,
    }
}

const N: Action = Action::None;

/// The numpad layer: digits on the upper rows, navigation-adjacent keys
/// on the bottom row, a momentary sublayer key at (3, 3).
pub const NUM_LAYER: [[Action; 4]; 4] = [
    [
        mods_key(0, KeyCode::Kp7),
        mods_key(0, KeyCode::Kp8),
        mods_key(0, KeyCode::Kp9),
        mods_key(0, KeyCode::KpSlash),
    ],
    [
        mods_key(0, KeyCode::Kp4),
        mods_key(0, KeyCode::Kp5),
        mods_key(0, KeyCode::Kp6),
        mods_key(0, KeyCode::KpAsterisk),
    ],
    [
        mods_key(0, KeyCode::Kp1),
        mods_key(0, KeyCode::Kp2),
        mods_key(0, KeyCode::Kp3),
        mods_key(0, KeyCode::KpMinus),
    ],
    [
        mods_key(0, KeyCode::Kp0),
        mods_key(0, KeyCode::KpDot),
        mods_key(0, KeyCode::KpEnter),
        Action::LayerMomentary { layer: L_NUM_FN },
    ],
];

/// The momentary sublayer reached by holding (3, 3) on [`NUM_LAYER`]:
/// `KpPlus` and a way back to the default layer.
pub const NUM_FN_LAYER: [[Action; 4]; 4] = [
    [N, N, N, N],
    [N, N, N, N],
    [N, N, N, mods_key(0, KeyCode::KpPlus)],
    [
        N,
        N,
        N,
        Action::Function {
            func_id: ChordFnId::ChgLayer,
            opt: L_DFLT,
        },
    ],
];

/// The navigation layer: arrows, paging and edit keys, matching the
/// original's `actionmaps[L_NAV]`.
pub const NAV_LAYER: [[Action; 4]; 4] = [
    [
        mods_key(0, KeyCode::Home),
        mods_key(0, KeyCode::Up),
        mods_key(0, KeyCode::PgUp),
        mods_key(0, KeyCode::Insert),
    ],
    [
        mods_key(0, KeyCode::Left),
        N,
        mods_key(0, KeyCode::Right),
        mods_key(0, KeyCode::Delete),
    ],
    [
        mods_key(0, KeyCode::End),
        mods_key(0, KeyCode::Down),
        mods_key(0, KeyCode::PgDown),
        N,
    ],
    [
        N,
        N,
        N,
        Action::Function {
            func_id: ChordFnId::ChgLayer,
            opt: L_DFLT,
        },
    ],
];

/// The mouse layer. HID mouse reports are outside this crate's interface
/// surface (only keyboard reports are named in the external interfaces),
/// so movement and buttons are represented with the nearest keyboard
/// equivalents, matching the original's directional-key feel rather than
/// its literal mouse report.
pub const MSE_LAYER: [[Action; 4]; 4] = [
    [N, mods_key(0, KeyCode::Up), N, N],
    [
        mods_key(0, KeyCode::Left),
        mods_key(0, KeyCode::Enter),
        mods_key(0, KeyCode::Right),
        N,
    ],
    [N, mods_key(0, KeyCode::Down), N, N],
    [
        N,
        N,
        N,
        Action::Function {
            func_id: ChordFnId::ChgLayer,
            opt: L_DFLT,
        },
    ],
];

/// The macro-pad layer: eight `MCR_PLAY` keys plus a way back.
pub const MCR_LAYER: [[Action; 4]; 4] = [
    [
        Action::Function {
            func_id: ChordFnId::McrPlay,
            opt: 0,
        },
        Action::Function {
            func_id: ChordFnId::McrPlay,
            opt: 1,
        },
        Action::Function {
            func_id: ChordFnId::McrPlay,
            opt: 2,
        },
        Action::Function {
            func_id: ChordFnId::McrPlay,
            opt: 3,
        },
    ],
    [
        Action::Function {
            func_id: ChordFnId::McrPlay,
            opt: 4,
        },
        Action::Function {
            func_id: ChordFnId::McrPlay,
            opt: 5,
        },
        Action::Function {
            func_id: ChordFnId::McrPlay,
            opt: 6,
        },
        Action::Function {
            func_id: ChordFnId::McrPlay,
            opt: 7,
        },
    ],
    [N, N, N, N],
    [
        N,
        N,
        N,
        Action::Function {
            func_id: ChordFnId::ChgLayer,
            opt: L_DFLT,
        },
    ],
];

/// Looks up a secondary (non-chord) layer's action at `(row, col)`.
/// Returns `Action::None` for the default layer or an out-of-range
/// layer id; the default layer is handled by the chord collector
/// instead.
pub fn secondary_layer_action(layer: u8, row: usize, col: usize) -> Action {
    if row >= 4 || col >= 4 {
        return Action::None;
    }
    match layer {
        l if l == L_NUM => NUM_LAYER[row][col],
        l if l == L_NUM_FN => NUM_FN_LAYER[row][col],
        l if l == L_NAV => NAV_LAYER[row][col],
        l if l == L_MSE => MSE_LAYER[row][col],
        l if l == L_MCR => MCR_LAYER[row][col],
        _ => Action::None,
    }
}

/// Translates a keypair-mods nibble plus raw key code into a standard
/// HID `(mods, code)` pair for emission, applying the AltGr -> RightAlt
/// translation.
pub fn keypair_mods(m: u8) -> u8 {
    crate::keypair::keypair_mods_to_mods(m)
}

/// Right-alt's standard HID bit, re-exported for callers that need to
/// test for it without importing [`crate::keypair::hid_mod`] directly.
pub const R_ALT: u8 = hid_mod::R_ALT;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn holes_are_disjoint_from_populated_function_chords() {
        let tables = ChordTables::new();
        for &h in FN_CHORD_HOLES.iter() {
            assert_eq!(tables.fn_chord[h as usize], 0);
        }
    }

    #[test]
    fn sentinel_is_reserved() {
        let tables = ChordTables::new();
        assert_eq!(tables.chord[0], Keypair::none());
    }

    #[test]
    fn macro_space_fits_in_holes() {
        assert!(MCR_LEN * MCR_MAX * 12 <= FN_CHORD_HOLES.len() * 16);
    }
}
