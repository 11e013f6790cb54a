//! The 12-LED blink scheduler: named LED sets, named blink patterns, and
//! the per-tick state machine that drives each LED independently.
//!
//! LED "lit" state is tracked here rather than read back from
//! [`crate::hal::LedPins::state`] (an open question in the design notes
//! left this an implementation choice) — the scheduler is the single
//! source of truth for what each LED is doing, and `LedPins` is used
//! purely as a write-only actuator.

use crate::hal::{HidSink, LedPins};
use crate::keypair::hid_mod;

/// `cycles == FOREVER` blinks indefinitely.
pub const FOREVER: u8 = u8::MAX;

/// `(on_ms, off_ms, cycles)`.
pub type BlinkPattern = (u8, u8, u8);

pub const BLINK_WAITING: BlinkPattern = (50, 50, FOREVER);
pub const BLINK_STOP: BlinkPattern = (0, 0, 0);
pub const BLINK_WARNING: BlinkPattern = (10, 40, 3);
pub const BLINK_MCR_WARNING: BlinkPattern = (10, 40, FOREVER);
pub const BLINK_ERROR: BlinkPattern = (10, 40, 10);
pub const BLINK_OK: BlinkPattern = (200, 0, 2);
pub const BLINK_RESET: BlinkPattern = (10, 0, 1);
pub const BLINK_STEADY: BlinkPattern = (250, 0, FOREVER);
pub const BLINK_ONESHOT_MODS: BlinkPattern = (200, 20, FOREVER);
pub const BLINK_REVERSE_ONESHOT_MODS: BlinkPattern = (20, 200, FOREVER);
pub const BLINK_TOGGLED_MODS: BlinkPattern = BLINK_STEADY;
pub const BLINK_CHG_LAYER: BlinkPattern = (250, 0, 1);

const ALL_12: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

pub const LEDS_NO_KEYCODE: &[u8] = &[0, 1, 8];
pub const LEDS_NUM_LOCK: &[u8] = &[6];
pub const LEDS_SCROLL_LOCK: &[u8] = &[7];
pub const LEDS_SFT: &[u8] = &[5];
pub const LEDS_CTL: &[u8] = &[4, 9];
pub const LEDS_ALT: &[u8] = &[3, 10];
pub const LEDS_GUI: &[u8] = &[2, 11];
pub const LEDS_ALL_MODS: &[u8] = &[2, 3, 4, 5, 9, 10, 11];
pub const LEDS_CHG_LAYER: &[u8] = &ALL_12;
pub const LEDS_SWAP_FIRST: &[u8] = &[4, 9];
pub const LEDS_SWAP_SECOND: &[u8] = &[2, 11];
pub const LEDS_RECORD_MCR: &[u8] = &[0, 1, 8];
pub const LEDS_PRINT: &[u8] = &ALL_12;
pub const LEDS_RESET: &[u8] = &ALL_12;

#[derive(Debug, Clone, Copy, Default)]
struct LedRecord {
    on_ms: u8,
    off_ms: u8,
    last_tick: u16,
    cycles: u8,
    lit: bool,
}

/// Drives all 12 LEDs' independent blink state machines.
pub struct LedScheduler {
    records: [LedRecord; 12],
}

impl LedScheduler {
    /// All LEDs off, inactive.
    pub fn new() -> Self {
        LedScheduler {
            records: [LedRecord::default(); 12],
        }
    }

    /// Writes `pattern` into every LED named by `set`. Matches the
    /// original's `blink()`: only `on_ms`/`off_ms`/`cycles` are touched,
    /// `last_tick` and the current lit state are left alone so a
    /// pattern change takes effect on the very next tick.
    pub fn apply(&mut self, set: &[u8], pattern: BlinkPattern) {
        for &i in set {
            let r = &mut self.records[i as usize];
            r.on_ms = pattern.0;
            r.off_ms = pattern.1;
            r.cycles = pattern.2;
        }
    }

    /// Advances every LED's state machine by one tick at time `now`
    /// (milliseconds, wrapping).
    pub fn tick<P: LedPins>(&mut self, pins: &mut P, now: u16) {
        for i in 0..12 {
            let r = &mut self.records[i];
            if r.lit {
                if now.wrapping_sub(r.last_tick) > r.on_ms as u16 {
                    pins.off(i);
                    r.lit = false;
                    r.last_tick = now;
                }
            } else if now.wrapping_sub(r.last_tick) > r.off_ms as u16 && r.cycles > 0 {
                pins.on(i);
                r.lit = true;
                r.last_tick = now;
                if r.cycles != FOREVER {
                    r.cycles -= 1;
                }
            }
        }
    }

    /// Reads the host's persistent + weak mods and LED byte, and applies
    /// the pattern distinguishing toggled (steady), one-shot (pulsed)
    /// and reversed-one-shot (inverted pulse, shift only, while
    /// caps-lock is active) for each modifier family.
    pub fn blink_mods<H: HidSink>(&mut self, hid: &mut H) {
        let hkbl = hid.host_keyboard_leds();
        hid.keyboard_set_leds(hkbl);

        let raw_m = hid.get_mods();
        let raw_wm = hid.get_weak_mods() & !raw_m;
        // Fold right-hand bits down onto the left-hand family bit so a
        // single mask test covers "either hand".
        let m = (raw_m >> 4) | (raw_m & 0xf);
        let wm = (raw_wm >> 4) | (raw_wm & 0xf);

        let alt = hid_mod::L_ALT;
        let sft = hid_mod::L_SHIFT;
        let gui = hid_mod::L_GUI;
        let ctl = hid_mod::L_CTRL;

        if m & alt != 0 {
            self.apply(LEDS_ALT, BLINK_TOGGLED_MODS);
        } else {
            self.apply(LEDS_ALT, BLINK_STOP);
        }
        if wm & alt != 0 {
            self.apply(LEDS_ALT, BLINK_ONESHOT_MODS);
        }

        if m & gui != 0 {
            self.apply(LEDS_GUI, BLINK_TOGGLED_MODS);
        } else {
            self.apply(LEDS_GUI, BLINK_STOP);
        }
        if wm & gui != 0 {
            self.apply(LEDS_GUI, BLINK_ONESHOT_MODS);
        }

        if m & ctl != 0 {
            self.apply(LEDS_CTL, BLINK_TOGGLED_MODS);
        } else {
            self.apply(LEDS_CTL, BLINK_STOP);
        }
        if wm & ctl != 0 {
            self.apply(LEDS_CTL, BLINK_ONESHOT_MODS);
        }

        let caps_lock = hkbl & 0b010 != 0;
        if (m & sft != 0 && caps_lock) || (m & sft == 0 && !caps_lock) {
            if wm & sft != 0 {
                self.apply(LEDS_SFT, BLINK_ONESHOT_MODS);
            } else {
                self.apply(LEDS_SFT, BLINK_STOP);
            }
        } else if m & sft != 0 && !caps_lock {
            self.apply(LEDS_SFT, BLINK_TOGGLED_MODS);
        } else if m & sft == 0 && caps_lock {
            if wm & sft != 0 {
                self.apply(LEDS_SFT, BLINK_REVERSE_ONESHOT_MODS);
            } else {
                self.apply(LEDS_SFT, BLINK_TOGGLED_MODS);
            }
        }

        if hkbl & 0b001 != 0 {
            self.apply(LEDS_NUM_LOCK, BLINK_STEADY);
        } else {
            self.apply(LEDS_NUM_LOCK, BLINK_STOP);
        }
        if hkbl & 0b100 != 0 {
            self.apply(LEDS_SCROLL_LOCK, BLINK_STEADY);
        } else {
            self.apply(LEDS_SCROLL_LOCK, BLINK_STOP);
        }
    }
}

impl Default for LedScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct MockPins {
        lit: [bool; 12],
    }
    impl LedPins for MockPins {
        fn init(&mut self) {}
        fn on(&mut self, i: usize) {
            self.lit[i] = true;
        }
        fn off(&mut self, i: usize) {
            self.lit[i] = false;
        }
        fn state(&self, i: usize) -> bool {
            self.lit[i]
        }
    }

    #[test]
    fn forever_blinks_indefinitely() {
        let mut sched = LedScheduler::new();
        let mut pins = MockPins { lit: [false; 12] };
        sched.apply(&[0], (10, 10, FOREVER));
        let mut now: u16 = 0;
        let mut toggles = 0;
        for _ in 0..200 {
            now = now.wrapping_add(1);
            let before = pins.lit[0];
            sched.tick(&mut pins, now);
            if pins.lit[0] != before {
                toggles += 1;
            }
        }
        assert!(toggles > 10, "expected repeated blinking, saw {toggles} toggles");
    }

    #[test]
    fn finite_cycles_stop_after_n_on_periods() {
        let mut sched = LedScheduler::new();
        let mut pins = MockPins { lit: [false; 12] };
        sched.apply(&[0], (5, 5, 2));
        let mut now: u16 = 0;
        let mut on_periods = 0;
        let mut was_lit = false;
        for _ in 0..500 {
            now = now.wrapping_add(1);
            sched.tick(&mut pins, now);
            if pins.lit[0] && !was_lit {
                on_periods += 1;
            }
            was_lit = pins.lit[0];
        }
        assert_eq!(on_periods, 2);
        assert!(!pins.lit[0]);
    }
}
