//! External interfaces the core is driven through.
//!
//! Everything in this module is a trait: the matrix GPIO layer, the LED
//! GPIO layer, the HID transport, non-volatile storage and the monotonic
//! clock are all out of scope for this crate (see the crate-level
//! documentation) and are supplied by the board crate that owns real
//! hardware. Mock implementations live under `#[cfg(test)]` in each
//! consuming module so the core can be exercised without any of them.

use crate::action::ChordFnId;
use crate::error::CoreError;
use crate::keypair::KeyCode;

/// Column-strobe, row-sample access to the key matrix.
///
/// Pressed is low: `read_rows()` returns a bit set for every row that is
/// presently pulled low on the strobed column.
pub trait MatrixPins<const C: usize> {
    /// One-time GPIO setup for the row inputs.
    fn init_rows(&mut self);
    /// Release all columns (set them high / high-Z).
    fn unselect_cols(&mut self);
    /// Drive column `c` low.
    fn select_col(&mut self, c: usize);
    /// Sample all rows; bit `r` is set iff row `r` reads low.
    fn read_rows(&mut self) -> u8;
}

/// The 12 status LEDs, addressed by index.
pub trait LedPins {
    /// One-time GPIO setup.
    fn init(&mut self);
    /// Turn LED `i` on.
    fn on(&mut self, i: usize);
    /// Turn LED `i` off.
    fn off(&mut self, i: usize);
    /// Is LED `i` presently lit?
    fn state(&self, i: usize) -> bool;
}

/// The HID keyboard-report transport.
///
/// Mirrors the external interface named in the spec: mods are tracked as
/// two independent bitfields (persistent and "weak"/one-shot) that are
/// OR'd together when a report is actually sent.
pub trait HidSink {
    /// Queue a key code into the next report.
    fn add_key(&mut self, code: KeyCode);
    /// OR `mods` into the persistent modifier bitfield.
    fn add_mods(&mut self, mods: u8);
    /// OR `mods` into the one-shot ("weak") modifier bitfield.
    fn add_weak_mods(&mut self, mods: u8);
    /// Clear bits in the persistent modifier bitfield.
    fn del_mods(&mut self, mods: u8);
    /// Clear all queued key codes and both modifier bitfields.
    fn clear_keyboard(&mut self);
    /// Clear queued key codes but keep the persistent modifier bitfield.
    fn clear_keyboard_but_mods(&mut self);
    /// Flush the current report to the host.
    fn send_keyboard_report(&mut self);
    /// The persistent modifier bitfield.
    fn get_mods(&self) -> u8;
    /// The one-shot modifier bitfield.
    fn get_weak_mods(&self) -> u8;
    /// Replace the persistent modifier bitfield.
    fn set_mods(&mut self, mods: u8);
    /// Replace the one-shot modifier bitfield.
    fn set_weak_mods(&mut self, mods: u8);
    /// The host-reported LED byte: `bit0` NumLock, `bit1` CapsLock,
    /// `bit2` ScrollLock.
    fn host_keyboard_leds(&self) -> u8;
    /// Tell the host which keyboard LEDs should be lit (boot-protocol
    /// devices only; usually a no-op).
    fn keyboard_set_leds(&mut self, leds: u8);
}

/// Word/block access to persistent storage: every chord-table, function-
/// chord-table and macro write the core makes is routed through here, so
/// a swap or a recorded macro survives a reboot the way the original's
/// `eeprom_update_word`/`eeprom_update_block` calls do.
///
/// Addresses are cell indices, not byte offsets: `read_word`/`update_word`
/// address one storage cell (see [`crate::tables`] for cell sizing).
/// Returns [`CoreError::NvStoreFault`] on a rejected read/write so a test
/// double can inject a fault without the core ever panicking.
pub trait NvStore {
    /// Read the word at cell `addr`.
    fn read_word(&mut self, addr: u16) -> Result<u16, CoreError>;
    /// Write the word at cell `addr`.
    fn update_word(&mut self, addr: u16, value: u16) -> Result<(), CoreError>;
    /// Read `dst.len()` bytes starting at byte address `addr`.
    fn read_block(&mut self, dst: &mut [u8], addr: u16) -> Result<(), CoreError>;
    /// Write `src` starting at byte address `addr`.
    fn update_block(&mut self, src: &[u8], addr: u16) -> Result<(), CoreError>;
}

/// A free-running millisecond counter.
///
/// `now()` wraps; callers compare elapsed time with
/// `now().wrapping_sub(since)`, the way the LED scheduler and the matrix
/// debouncer do.
pub trait MonotonicClock {
    /// The current tick, in milliseconds, wrapping at `u16::MAX`.
    fn now(&self) -> u16;
}

/// Host-firmware hooks the core calls at well-defined points.
///
/// A board that doesn't need a hook can use the blanket no-op
/// implementation on `()`.
pub trait Hooks {
    /// Called once, before any peripheral is brought up.
    fn early_init(&mut self) {}
    /// Called once, after peripherals are initialized but before the main
    /// loop starts.
    fn late_init(&mut self) {}
    /// Called once per main-loop iteration, after LEDs and the printer
    /// have been ticked.
    fn keyboard_loop(&mut self) {}
    /// Called whenever the debounced matrix changes.
    fn matrix_change(&mut self, row: u8, col: u8, pressed: bool) {
        let _ = (row, col, pressed);
    }
    /// Called whenever the host-reported keyboard LED byte changes.
    fn keyboard_leds_change(&mut self, status: u8) {
        let _ = status;
    }
}

impl Hooks for () {}

/// Human-readable name strings for the printer, kept external to the core
/// the way the program-memory `code_name[]`/`chrdfunc_name[]`/`layer_name[]`
/// tables are named as external interfaces: a board can ship its own
/// compact name table instead of this crate carrying the full keycode name
/// ROM.
pub trait NameTables {
    /// A short mnemonic for a HID key code (e.g. `"A"`, `"Enter"`).
    /// Codes with no name return `"?"`.
    fn code_name(&self, code: u8) -> &'static str;
    /// A short mnemonic for a chord function id.
    fn chrdfunc_name(&self, func_id: ChordFnId) -> &'static str;
    /// A short mnemonic for a layer id. Unknown ids return `"?"`.
    fn layer_name(&self, layer: u8) -> &'static str;
}

/// A minimal name table covering this crate's own layer and function ids;
/// key-code names fall back to `"?"` since the full name ROM is a board
/// concern, not a core one.
impl NameTables for () {
    fn code_name(&self, _code: u8) -> &'static str {
        "?"
    }

    fn chrdfunc_name(&self, func_id: ChordFnId) -> &'static str {
        match func_id {
            ChordFnId::Reset => "RESET",
            ChordFnId::SwapChrds => "SWAP",
            ChordFnId::McrRecord => "MCR_REC",
            ChordFnId::Print => "PRINT",
            ChordFnId::ChgLayer => "CHG_LYR",
            ChordFnId::McrPlay => "MCR_PLAY",
            ChordFnId::FngChrd => "FNG_CHRD",
            ChordFnId::ThbChrd => "THB_CHRD",
        }
    }

    fn layer_name(&self, layer: u8) -> &'static str {
        match layer {
            crate::tables::L_DFLT => "DFLT",
            crate::tables::L_NUM => "NUM",
            crate::tables::L_NAV => "NAV",
            crate::tables::L_MSE => "MSE",
            crate::tables::L_MCR => "MCR",
            crate::tables::L_NUM_FN => "NUM_FN",
            _ => "?",
        }
    }
}
