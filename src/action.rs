//! The 16-bit tagged action, looked up per `(layer, row, col)` and, for
//! function chords, straight out of [`crate::tables::FnChordTable`].
//!
//! The original firmware represents this as a C union with a 2-bit kind
//! discriminant; here it's a proper sum type so invalid payload/kind
//! combinations can't exist. [`Action::to_u16`]/[`Action::from_u16`] are
//! the packed representation stored in the chord tables.

/// Whether a modifier-tap chord is one-shot (cleared after the next
/// report) or toggled (XORed into the persistent mods until pressed
/// again).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tap {
    /// Applied to exactly the next emitted key code.
    OneShot,
    /// XORed into the persistent modifier bitfield until toggled again.
    Toggle,
}

/// The function dispatched by `Action::Function`, matching the
/// `func_id` enum of the external `action_function` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChordFnId {
    /// Cancel print/macro-record, clear the keyboard, blink `RESET`.
    Reset,
    /// Advance the chord-swap editor's state machine.
    SwapChrds,
    /// Begin recording a macro.
    McrRecord,
    /// Start the cooperative chord-table printer.
    Print,
    /// Leave chord mode for the layer named by `opt`, once this chord's
    /// keys are all released.
    ChgLayer,
    /// Play back the macro named by `opt` (non-chord layers only).
    McrPlay,
    /// Tags a default-layer key as a finger-chord contributor (collector
    /// dispatch only; never produced by a lookup).
    FngChrd,
    /// Tags a default-layer key as a thumb-chord contributor (collector
    /// dispatch only; never produced by a lookup).
    ThbChrd,
}

impl ChordFnId {
    const fn from_bits(v: u8) -> Self {
        match v & 0x7 {
            0 => ChordFnId::Reset,
            1 => ChordFnId::SwapChrds,
            2 => ChordFnId::McrRecord,
            3 => ChordFnId::Print,
            4 => ChordFnId::ChgLayer,
            5 => ChordFnId::McrPlay,
            6 => ChordFnId::FngChrd,
            _ => ChordFnId::ThbChrd,
        }
    }

    const fn to_bits(self) -> u8 {
        match self {
            ChordFnId::Reset => 0,
            ChordFnId::SwapChrds => 1,
            ChordFnId::McrRecord => 2,
            ChordFnId::Print => 3,
            ChordFnId::ChgLayer => 4,
            ChordFnId::McrPlay => 5,
            ChordFnId::FngChrd => 6,
            ChordFnId::ThbChrd => 7,
        }
    }
}

/// A 16-bit packed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Do nothing. The zero value, matching `KC_NO`/`AC_NO`.
    None,
    /// Emit `code` with `mods` applied directly: plain thumb chords and
    /// ordinary secondary-layer keys.
    Mods {
        /// HID modifier byte.
        mods: u8,
        /// HID key code.
        code: u8,
    },
    /// A modifier-only chord from the function table: `right` selects
    /// whether `mods` is shifted to the right-hand modifier bits.
    ModsTap {
        /// Applies to the right-hand modifier bits when true.
        right: bool,
        /// HID modifier bits (left-hand encoding; shifted if `right`).
        mods: u8,
        /// One-shot or toggled.
        tap: Tap,
    },
    /// Dispatch a chord function; never emits a key code directly.
    Function {
        /// Which function to run.
        func_id: ChordFnId,
        /// The function's parameter (layer id, macro id, ...).
        opt: u8,
    },
    /// Hold to activate `layer` for as long as this key is held
    /// (secondary layers only).
    LayerMomentary {
        /// The layer to activate while held.
        layer: u8,
    },
    /// The thumb-chord table's entry for "center thumb key held alone":
    /// selects the upper level of the finger-chord lookup instead of
    /// naming a key code directly. Never produced by any other table.
    ThumbShift,
}

const TAG_NONE: u16 = 0;
const TAG_MODS: u16 = 1;
const TAG_MODS_TAP: u16 = 2;
const TAG_FUNCTION: u16 = 3;
const TAG_LAYER_MOMENTARY: u16 = 4;
const TAG_THUMB_SHIFT: u16 = 5;

impl Action {
    /// Packs this action into its 16-bit table representation: the top 3
    /// bits are the kind tag, the low 13 bits are the kind-specific
    /// payload.
    pub const fn to_u16(self) -> u16 {
        match self {
            Action::None => TAG_NONE << 13,
            Action::Mods { mods, code } => {
                (TAG_MODS << 13) | ((mods as u16) << 8) | code as u16
            }
            Action::ModsTap { right, mods, tap } => {
                let tap_bit = matches!(tap, Tap::Toggle) as u16;
                (TAG_MODS_TAP << 13)
                    | ((right as u16) << 9)
                    | ((mods as u16 & 0xf) << 5)
                    | (tap_bit << 4)
            }
            Action::Function { func_id, opt } => {
                (TAG_FUNCTION << 13) | ((func_id.to_bits() as u16) << 8) | opt as u16
            }
            Action::LayerMomentary { layer } => {
                (TAG_LAYER_MOMENTARY << 13) | layer as u16
            }
            Action::ThumbShift => TAG_THUMB_SHIFT << 13,
        }
    }

    /// Unpacks a 16-bit table cell into an `Action`. Unrecognized tag
    /// bits decode to `Action::None`, matching the original's behavior of
    /// never producing an unmapped entry outside the documented holes.
    pub const fn from_u16(v: u16) -> Self {
        let tag = v >> 13;
        match tag {
            _ if tag == TAG_MODS => Action::Mods {
                mods: ((v >> 8) & 0xf) as u8,
                code: (v & 0xff) as u8,
            },
            _ if tag == TAG_MODS_TAP => Action::ModsTap {
                right: (v >> 9) & 1 != 0,
                mods: ((v >> 5) & 0xf) as u8,
                tap: if (v >> 4) & 1 != 0 {
                    Tap::Toggle
                } else {
                    Tap::OneShot
                },
            },
            _ if tag == TAG_FUNCTION => Action::Function {
                func_id: ChordFnId::from_bits((v >> 8) as u8),
                opt: (v & 0xff) as u8,
            },
            _ if tag == TAG_LAYER_MOMENTARY => Action::LayerMomentary {
                layer: (v & 0xff) as u8,
            },
            _ if tag == TAG_THUMB_SHIFT => Action::ThumbShift,
            _ => Action::None,
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pack_round_trip() {
        let samples = [
            Action::None,
            Action::Mods { mods: 0b0110, code: 0x1c },
            Action::ModsTap {
                right: true,
                mods: 0b0011,
                tap: Tap::Toggle,
            },
            Action::ModsTap {
                right: false,
                mods: 0b1000,
                tap: Tap::OneShot,
            },
            Action::Function {
                func_id: ChordFnId::SwapChrds,
                opt: 0,
            },
            Action::Function {
                func_id: ChordFnId::ChgLayer,
                opt: 2,
            },
            Action::LayerMomentary { layer: 3 },
            Action::ThumbShift,
        ];
        for a in samples {
            assert_eq!(Action::from_u16(a.to_u16()), a);
        }
    }

    #[test]
    fn none_is_zero() {
        assert_eq!(Action::None.to_u16(), 0);
    }
}
