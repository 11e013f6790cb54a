//! The one-shot/toggle modifier tracker and the final emission step
//! sitting between a chord classification and the HID transport.
//!
//! The two bitfields this module decides between — persistent and
//! "weak" (one-shot) mods — already live on [`crate::hal::HidSink`];
//! this module only decides which one a given [`crate::action::Tap`]
//! touches and reproduces `emit_keycode`'s report-assembly order.

use crate::action::Tap;
use crate::hal::HidSink;
use crate::keypair::{code_to_keycode, keypair_mods_to_mods, KeyCode};

/// Applies a modifier-tap action: `right` shifts the nibble to the
/// right-hand HID bits before combining, `tap` selects one-shot (weak
/// mods, cleared by the next emitted report) or toggle (XORed into the
/// persistent mods until toggled again).
pub fn apply_tap<H: HidSink>(hid: &mut H, keypair_mods: u8, right: bool, tap: Tap) {
    let mut mods = keypair_mods_to_mods(keypair_mods);
    if right {
        mods = shift_to_right_hand(mods);
    }
    match tap {
        Tap::OneShot => hid.add_weak_mods(mods),
        Tap::Toggle => {
            let cur = hid.get_mods();
            hid.set_mods(cur ^ mods);
        }
    }
}

/// Moves a left-hand-encoded modifier nibble's bits up to their
/// right-hand HID positions (`LCtrl..LGui` -> `RCtrl..RGui`, 4 bits up).
pub const fn shift_to_right_hand(mods: u8) -> u8 {
    (mods & 0x0f) << 4
}

/// Emits one key code through the HID transport, following the
/// original's `emit_keycode`: queue the weak mods, add the key (unless
/// it's `KC_NO`), flush, then clear the report back down to the
/// persistent mods — consuming the one-shot state whether or not a key
/// was actually sent.
///
/// Returns `false` exactly when nothing worth sending happened: no key,
/// no mods (persistent or weak), the caller isn't mid-recording, and
/// `also_reports_success` wasn't forced. The caller uses that to decide
/// whether to blink the `NO_KEYCODE` warning.
pub fn emit_keycode<H: HidSink>(
    hid: &mut H,
    weak_mods: u8,
    code: u8,
    collecting_mcr: bool,
    also_reports_success: bool,
) -> bool {
    hid.add_weak_mods(weak_mods);
    if code != 0 {
        hid.add_key(code_to_keycode(code));
    }
    let sent = code != 0
        || hid.get_mods() != 0
        || hid.get_weak_mods() != 0
        || collecting_mcr
        || also_reports_success;
    hid.send_keyboard_report();
    hid.clear_keyboard_but_mods();
    sent
}

/// `true` iff `code` names one of the `MCR_MAX` macro-play codes
/// starting at `FN0`, i.e. `emit_keycode` should play a macro instead of
/// emitting a real key.
pub fn is_macro_play_code(code: u8) -> bool {
    (crate::tables::FN0..crate::tables::FN0 + crate::tables::MCR_MAX as u8).contains(&code)
}

/// The macro id named by a macro-play code, if it is one.
pub fn macro_id_of(code: u8) -> Option<u8> {
    is_macro_play_code(code).then(|| code - crate::tables::FN0)
}

/// `KC_NO`, handy for call sites that want to spell out "no key" in the
/// same vocabulary the emission path uses.
pub const NO_KEY: KeyCode = KeyCode::No;

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::HidSink;

    #[derive(Default)]
    struct MockHid {
        keys: heapless::Vec<KeyCode, 6>,
        mods: u8,
        weak_mods: u8,
        sent: u32,
    }

    impl HidSink for MockHid {
        fn add_key(&mut self, code: KeyCode) {
            let _ = self.keys.push(code);
        }
        fn add_mods(&mut self, mods: u8) {
            self.mods |= mods;
        }
        fn add_weak_mods(&mut self, mods: u8) {
            self.weak_mods |= mods;
        }
        fn del_mods(&mut self, mods: u8) {
            self.mods &= !mods;
        }
        fn clear_keyboard(&mut self) {
            self.keys.clear();
            self.mods = 0;
            self.weak_mods = 0;
        }
        fn clear_keyboard_but_mods(&mut self) {
            self.keys.clear();
            self.weak_mods = 0;
        }
        fn send_keyboard_report(&mut self) {
            self.sent += 1;
        }
        fn get_mods(&self) -> u8 {
            self.mods
        }
        fn get_weak_mods(&self) -> u8 {
            self.weak_mods
        }
        fn set_mods(&mut self, mods: u8) {
            self.mods = mods;
        }
        fn set_weak_mods(&mut self, mods: u8) {
            self.weak_mods = mods;
        }
        fn host_keyboard_leds(&self) -> u8 {
            0
        }
        fn keyboard_set_leds(&mut self, _leds: u8) {}
    }

    #[test]
    fn right_hand_shift_moves_nibble_up() {
        assert_eq!(shift_to_right_hand(0b0001), 0b0001_0000);
    }

    #[test]
    fn toggle_xors_persistent_mods() {
        let mut hid = MockHid::default();
        apply_tap(&mut hid, crate::keypair::SH, false, Tap::Toggle);
        assert_eq!(hid.get_mods(), crate::keypair::hid_mod::L_SHIFT);
        apply_tap(&mut hid, crate::keypair::SH, false, Tap::Toggle);
        assert_eq!(hid.get_mods(), 0);
    }

    #[test]
    fn one_shot_sets_weak_mods_only() {
        let mut hid = MockHid::default();
        apply_tap(&mut hid, crate::keypair::CO, false, Tap::OneShot);
        assert_eq!(hid.get_mods(), 0);
        assert_eq!(hid.get_weak_mods(), crate::keypair::hid_mod::L_CTRL);
    }

    #[test]
    fn empty_chord_reports_unsent() {
        let mut hid = MockHid::default();
        assert!(!emit_keycode(&mut hid, 0, 0, false, false));
    }

    #[test]
    fn real_code_reports_sent_and_clears_after() {
        let mut hid = MockHid::default();
        assert!(emit_keycode(&mut hid, 0, KeyCode::E as u8, false, false));
        assert!(hid.keys.is_empty());
        assert_eq!(hid.sent, 1);
    }

    #[test]
    fn empty_chord_while_recording_reports_sent() {
        let mut hid = MockHid::default();
        assert!(emit_keycode(&mut hid, 0, 0, true, false));
    }

    #[test]
    fn macro_play_range() {
        assert!(is_macro_play_code(crate::tables::FN0));
        assert_eq!(macro_id_of(crate::tables::FN0 + 2), Some(2));
        assert_eq!(macro_id_of(crate::tables::FN0 - 1), None);
    }
}
