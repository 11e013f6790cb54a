//! The top-level orchestrator: wires the matrix, chord collector,
//! secondary-layer runtime, macro engine, swap editor, LED scheduler and
//! printer into the main-loop order a board crate drives: scan the
//! matrix, dispatch whatever changed, tick the LEDs and the printer, then
//! let the board's own hooks run.

use crate::chord::{self, ChordCollector};
use crate::hal::{HidSink, LedPins, MatrixPins, MonotonicClock, NameTables, NvStore};
use crate::layer::{LayerEvent, LayerState};
use crate::leds::{self, LedScheduler};
use crate::macro_engine::MacroEngine;
use crate::matrix::Matrix;
use crate::swap::{ChordRef, Level, SwapEditor, SwapEvent, SwapState};
use crate::tables::{self, ChordTables, THUMB_CHORD_TABLE};
use crate::{action::Action, action::ChordFnId};

/// Owns every piece of engine state. `R`/`C` are the matrix's row/column
/// counts; the thumb row is always the last row (`R - 1`).
pub struct KeyboardCore<const R: usize, const C: usize> {
    matrix: Matrix<R, C>,
    prev_rows: [u8; R],
    tables: ChordTables,
    collector: ChordCollector,
    layer: LayerState,
    macros: MacroEngine,
    swap: SwapEditor,
    leds: LedScheduler,
    printer: crate::printer::Printer,
    pending_layer: Option<u8>,
}

impl<const R: usize, const C: usize> KeyboardCore<R, C> {
    /// A freshly reset core: default chord layer, idle macro/swap/printer
    /// state, all LEDs off.
    pub fn new() -> Self {
        KeyboardCore {
            matrix: Matrix::new(),
            prev_rows: [0; R],
            tables: ChordTables::new(),
            collector: ChordCollector::new(),
            layer: LayerState::new(),
            macros: MacroEngine::new(),
            swap: SwapEditor::new(),
            leds: LedScheduler::new(),
            printer: crate::printer::Printer::new(),
            pending_layer: None,
        }
    }

    /// Scans the matrix and dispatches every row that changed. `delay_us`
    /// busy-waits the column settle time, the same callback
    /// [`Matrix::scan`] takes. `store` is the non-volatile backing for
    /// any swap or macro commit the burst's release triggers.
    pub fn matrix_task<P: MatrixPins<C>, H: HidSink, S: NvStore>(
        &mut self,
        pins: &mut P,
        delay_us: impl FnMut(u32),
        hid: &mut H,
        store: &mut S,
    ) {
        if !self.matrix.scan(pins, delay_us) {
            return;
        }
        for r in 0..R {
            let now = self.matrix.get_row(r);
            let was = self.prev_rows[r];
            if now == was {
                continue;
            }
            for c in 0..C {
                let bit = 1u8 << c;
                let now_on = now & bit != 0;
                let was_on = was & bit != 0;
                if now_on != was_on {
                    if now_on {
                        self.key_press(r, c, hid, store);
                    } else {
                        self.key_release(r, c, hid, store);
                    }
                }
            }
            self.prev_rows[r] = now;
        }
    }

    fn key_press<H: HidSink, S: NvStore>(&mut self, row: usize, col: usize, hid: &mut H, store: &mut S) {
        if self.layer.is_default() {
            if row == R - 1 {
                self.collector.press_thumb(col);
            } else {
                self.collector.press_finger(row, col);
            }
            return;
        }
        match self.layer.press(row, col) {
            LayerEvent::Emit { mods, code } => self.emit(mods, code, hid, store),
            LayerEvent::PlayMacro(id) => self.play_macro(id, hid),
            LayerEvent::None | LayerEvent::ChangedLayer(_) => {}
        }
    }

    fn key_release<H: HidSink, S: NvStore>(&mut self, row: usize, col: usize, hid: &mut H, store: &mut S) {
        if self.layer.is_default() {
            let outcome = self.collector.release();
            if let Some((fng_chord, thb_chord)) = outcome.dispatch {
                self.dispatch_chord(fng_chord, thb_chord, hid, store);
            }
            if outcome.settled {
                if let Some(layer) = self.pending_layer.take() {
                    self.layer.enter(layer);
                    self.leds.apply(leds::LEDS_CHG_LAYER, leds::BLINK_CHG_LAYER);
                }
            }
            return;
        }
        if let LayerEvent::ChangedLayer(_) = self.layer.release(row, col) {
            self.leds.apply(leds::LEDS_CHG_LAYER, leds::BLINK_CHG_LAYER);
        }
    }

    /// A completed chord burst: either feeds the swap editor (when a swap
    /// is in progress) or classifies and dispatches it normally.
    fn dispatch_chord<H: HidSink, S: NvStore>(&mut self, fng_chord: u8, thb_chord: u8, hid: &mut H, store: &mut S) {
        if self.swap.state() != SwapState::Idle {
            self.feed_swap(fng_chord, thb_chord, store);
            return;
        }
        let action = chord::classify(fng_chord, thb_chord, &self.tables);
        self.dispatch_action(action, hid, store);
    }

    /// While a swap is in progress, this chord is selecting a table cell
    /// rather than doing what it normally does: work out which cell it
    /// names straight from the thumb-chord table, the same lookup
    /// `classify` would start from.
    fn feed_swap<S: NvStore>(&mut self, fng_chord: u8, thb_chord: u8, store: &mut S) {
        let thb_state = THUMB_CHORD_TABLE[(thb_chord & 0x7) as usize];
        let chord_ref = match thb_state {
            Action::None => Some(ChordRef::Finger {
                index: fng_chord,
                level: Level::Lower,
            }),
            Action::ThumbShift => Some(ChordRef::Finger {
                index: fng_chord,
                level: Level::Upper,
            }),
            Action::Function {
                func_id: ChordFnId::FngChrd,
                opt,
            } => {
                let idx = chord::squeeze(fng_chord) | ((opt & 1) << 6);
                Some(ChordRef::Function { index: idx })
            }
            _ => None,
        };
        match chord_ref {
            Some(cref) => {
                if let Some(event) = self.swap.feed(cref) {
                    self.handle_swap_event(event, store);
                }
            }
            None => {
                self.swap.cancel();
                self.leds.apply(leds::LEDS_SWAP_SECOND, leds::BLINK_ERROR);
            }
        }
    }

    fn handle_swap_event<S: NvStore>(&mut self, event: SwapEvent, store: &mut S) {
        match event {
            SwapEvent::AwaitingSecond => {
                self.leds.apply(leds::LEDS_SWAP_SECOND, leds::BLINK_WAITING);
            }
            SwapEvent::PerformFingerSwap {
                chord1,
                level1,
                chord2,
                level2,
            } => {
                let result =
                    crate::swap::perform_finger_swap(&mut self.tables.chord, store, chord1, level1, chord2, level2);
                let pattern = if result.is_ok() { leds::BLINK_OK } else { leds::BLINK_ERROR };
                self.leds.apply(leds::LEDS_SWAP_SECOND, pattern);
            }
            SwapEvent::PerformFunctionSwap { chord1, chord2 } => {
                let result = crate::swap::perform_function_swap(&mut self.tables.fn_chord, store, chord1, chord2);
                let pattern = if result.is_ok() { leds::BLINK_OK } else { leds::BLINK_ERROR };
                self.leds.apply(leds::LEDS_SWAP_SECOND, pattern);
            }
            SwapEvent::Rejected => {
                self.leds.apply(leds::LEDS_SWAP_SECOND, leds::BLINK_ERROR);
            }
        }
    }

    /// Dispatches a resolved [`Action`]: emits a key code, applies a
    /// modifier tap, or runs the named chord function.
    fn dispatch_action<H: HidSink, S: NvStore>(&mut self, action: Action, hid: &mut H, store: &mut S) {
        match action {
            Action::None | Action::LayerMomentary { .. } | Action::ThumbShift => {}
            Action::Mods { mods, code } => self.emit(mods, code, hid, store),
            Action::ModsTap { right, mods, tap } => crate::mods::apply_tap(hid, mods, right, tap),
            Action::Function { func_id, opt } => self.dispatch_function(func_id, opt, hid),
        }
    }

    fn dispatch_function<H: HidSink>(&mut self, func_id: ChordFnId, opt: u8, hid: &mut H) {
        match func_id {
            ChordFnId::Reset => {
                self.printer.cancel();
                self.macros.cancel();
                self.swap.cancel();
                hid.clear_keyboard();
                self.leds.apply(leds::LEDS_RESET, leds::BLINK_RESET);
            }
            ChordFnId::SwapChrds => {
                self.swap.begin();
                self.leds.apply(leds::LEDS_SWAP_FIRST, leds::BLINK_WAITING);
            }
            ChordFnId::McrRecord => {
                self.macros.start_record();
                self.leds.apply(leds::LEDS_RECORD_MCR, leds::BLINK_WAITING);
            }
            ChordFnId::Print => {
                self.printer.start();
            }
            ChordFnId::ChgLayer => {
                self.pending_layer = Some(opt);
            }
            ChordFnId::McrPlay => {
                self.play_macro(opt, hid);
            }
            ChordFnId::FngChrd | ChordFnId::ThbChrd => {}
        }
    }

    /// Emits one resolved `(mods, code)` pair: a macro-play code
    /// dispatches to the macro engine instead of the HID transport (which
    /// commits a recording in progress to `store`, or plays the macro
    /// back), a real code goes through [`crate::mods::emit_keycode`] and,
    /// while recording, is also collected into the macro buffer.
    fn emit<H: HidSink, S: NvStore>(&mut self, mods: u8, code: u8, hid: &mut H, store: &mut S) {
        if crate::mods::is_macro_play_code(code) {
            let id = code - tables::FN0;
            if self.macros.is_recording() {
                match self.macros.commit(&mut self.tables, store, id) {
                    Ok(()) => self.leds.apply(leds::LEDS_RECORD_MCR, leds::BLINK_OK),
                    Err(_) => self.leds.apply(leds::LEDS_RECORD_MCR, leds::BLINK_ERROR),
                }
            } else {
                self.play_macro(id, hid);
            }
            return;
        }
        let recording = self.macros.is_recording();
        let sent = crate::mods::emit_keycode(hid, mods, code, recording, false);
        if !sent {
            self.leds.apply(leds::LEDS_NO_KEYCODE, leds::BLINK_WARNING);
        }
        if recording && self.macros.collect(mods, code).is_err() {
            self.leds.apply(leds::LEDS_RECORD_MCR, leds::BLINK_MCR_WARNING);
        }
    }

    /// Plays macro `id` back: the engine's callback only knows how to
    /// build the list of chords, so they're collected first and emitted
    /// afterward to avoid borrowing `self.tables` and `self.macros`
    /// mutably at once.
    fn play_macro<H: HidSink>(&mut self, id: u8, hid: &mut H) {
        let mut buf: heapless::Vec<(u8, u8), { tables::MCR_LEN }> = heapless::Vec::new();
        let _ = MacroEngine::play(&self.tables, id, |mods, code| {
            let _ = buf.push((mods, code));
        });
        for (mods, code) in buf {
            crate::mods::emit_keycode(hid, mods, code, false, false);
        }
    }

    /// Ticks the LED scheduler and, if a dump is running, the printer.
    /// Call once per main-loop iteration after `matrix_task`. `clock`
    /// supplies the millisecond tick the LED scheduler times its on/off
    /// periods against.
    pub fn tick<P: LedPins, H: HidSink, N: NameTables, M: MonotonicClock>(
        &mut self,
        led_pins: &mut P,
        hid: &mut H,
        names: &N,
        clock: &M,
    ) {
        self.leds.blink_mods(hid);
        self.leds.tick(led_pins, clock.now());
        if self.printer.is_active() {
            self.printer.tick(hid, names, &self.tables);
        }
    }

    /// Is the chord collector idle (no key down, no chord pending
    /// dispatch)? Exposed for hooks/tests that want to know when it's
    /// safe to, say, start a firmware update.
    pub fn is_idle(&self) -> bool {
        self.collector.is_ready() && self.layer.is_default()
    }
}

impl<const R: usize, const C: usize> Default for KeyboardCore<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keypair::KeyCode;

    /// Unlike a real transport, `send_keyboard_report` here archives a
    /// snapshot into `reports` instead of handing the bytes off anywhere:
    /// `keys`/`weak_mods` themselves get cleared by `clear_keyboard_but_mods`
    /// right after every send (by design — see `emit_keycode`), so tests
    /// assert against the archived reports, not the live buffer.
    #[derive(Default)]
    struct MockHid {
        keys: heapless::Vec<KeyCode, 6>,
        mods: u8,
        weak_mods: u8,
        reports: heapless::Vec<(u8, heapless::Vec<KeyCode, 6>), 32>,
    }

    impl MockHid {
        fn sent_key(&self, code: KeyCode) -> bool {
            self.reports.iter().any(|(_, keys)| keys.contains(&code))
        }
        fn sent_mods(&self, mods: u8) -> bool {
            self.reports.iter().any(|(m, _)| *m == mods)
        }
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
            let combined = self.mods | self.weak_mods;
            let _ = self.reports.push((combined, self.keys.clone()));
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

    // `MatrixPins` is column-strobed: `cols[c]` is the row bitmask
    // sampled while column `c` is selected, bit `r` set iff row `r` is
    // held down on that column this tick.
    struct Snapshot {
        cols: [u8; 4],
        col: usize,
    }

    impl MatrixPins<4> for Snapshot {
        fn init_rows(&mut self) {}
        fn unselect_cols(&mut self) {}
        fn select_col(&mut self, c: usize) {
            self.col = c;
        }
        fn read_rows(&mut self) -> u8 {
            self.cols[self.col]
        }
    }

    #[derive(Default)]
    struct MockNv {
        words: heapless::Vec<(u16, u16), 64>,
        blocks: heapless::Vec<(u16, [u8; 3]), 64>,
    }

    impl NvStore for MockNv {
        fn read_word(&mut self, addr: u16) -> Result<u16, crate::error::CoreError> {
            Ok(self.words.iter().rev().find(|(a, _)| *a == addr).map(|(_, v)| *v).unwrap_or(0))
        }
        fn update_word(&mut self, addr: u16, value: u16) -> Result<(), crate::error::CoreError> {
            let _ = self.words.push((addr, value));
            Ok(())
        }
        fn read_block(&mut self, _dst: &mut [u8], _addr: u16) -> Result<(), crate::error::CoreError> {
            Ok(())
        }
        fn update_block(&mut self, src: &[u8], addr: u16) -> Result<(), crate::error::CoreError> {
            let mut buf = [0u8; 3];
            buf.copy_from_slice(src);
            let _ = self.blocks.push((addr, buf));
            Ok(())
        }
    }

    fn hold(core: &mut KeyboardCore<4, 4>, cols: [u8; 4], hid: &mut MockHid, store: &mut MockNv) {
        let mut pins = Snapshot { cols, col: 0 };
        for _ in 0..crate::matrix::DEBOUNCE {
            core.matrix_task(&mut pins, |_| {}, hid, store);
        }
    }

    fn release_all(core: &mut KeyboardCore<4, 4>, hid: &mut MockHid, store: &mut MockNv) {
        hold(core, [0, 0, 0, 0], hid, store);
    }

    #[test]
    fn plain_chord_emits_letter() {
        let mut core: KeyboardCore<4, 4> = KeyboardCore::new();
        let mut hid = MockHid::default();
        let mut store = MockNv::default();
        // chord[0x05] is 'E' lower level: row0 col0 + row0 col1 pressed
        // together (no thumb key), squeezed into fng_chord byte 0x05.
        hold(&mut core, [0b0001, 0b0001, 0, 0], &mut hid, &mut store);
        release_all(&mut core, &mut hid, &mut store);
        assert!(hid.sent_key(KeyCode::E));
        assert!(core.is_idle());
    }

    #[test]
    fn thumb_shift_resolves_upper_level() {
        let mut core: KeyboardCore<4, 4> = KeyboardCore::new();
        let mut hid = MockHid::default();
        let mut store = MockNv::default();
        // Same finger chord as above, plus the center thumb key (row 3,
        // col 1) held down: selects the upper-level mapping, 'E' shifted.
        hold(&mut core, [0b0001, 0b0001 | 0b1000, 0, 0], &mut hid, &mut store);
        release_all(&mut core, &mut hid, &mut store);
        assert!(hid.sent_key(KeyCode::E));
        assert!(hid.sent_mods(crate::keypair::hid_mod::L_SHIFT));
    }

    #[test]
    fn reset_chord_clears_recording_and_blinks_reset() {
        let mut core: KeyboardCore<4, 4> = KeyboardCore::new();
        let mut hid = MockHid::default();
        let mut store = MockNv::default();
        core.macros.start_record();
        // fn_chord[0x18] is RESET: squeeze(fng)=0x18 (row0 alone, col3)
        // with the left thumb function key (row3, col0) held alone.
        hold(&mut core, [0b1000, 0, 0, 0b0001], &mut hid, &mut store);
        release_all(&mut core, &mut hid, &mut store);
        assert!(!core.macros.is_recording());
        assert!(hid.keys.is_empty());
    }

    #[test]
    fn macro_record_then_play_round_trips_through_core() {
        let mut core: KeyboardCore<4, 4> = KeyboardCore::new();
        let mut hid = MockHid::default();
        let mut store = MockNv::default();
        // fn_chord[0x12] is MCR_RECORD: squeeze(fng)=0x12 (row0 alone,
        // col1) with the left thumb function key (row3, col0) held alone.
        hold(&mut core, [0b1000, 0b0001, 0, 0], &mut hid, &mut store);
        release_all(&mut core, &mut hid, &mut store);
        assert!(core.macros.is_recording());

        // Record one chord: the same 'E' chord as the first test.
        hold(&mut core, [0b0001, 0b0001, 0, 0], &mut hid, &mut store);
        release_all(&mut core, &mut hid, &mut store);

        // Commit via a macro-play code for slot 0 (FN0 + 0): emitted
        // directly here rather than through the matrix, mirroring how a
        // macro-pad key would.
        core.emit(0, tables::FN0, &mut hid, &mut store);
        assert!(!core.macros.is_recording());
        assert!(!store.words.is_empty());

        hid.reports.clear();
        core.play_macro(0, &mut hid);
        assert!(hid.sent_key(KeyCode::E));
    }

    struct FixedClock(u16);

    impl MonotonicClock for FixedClock {
        fn now(&self) -> u16 {
            self.0
        }
    }

    struct MockLeds {
        lit: [bool; 12],
    }

    impl LedPins for MockLeds {
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
    fn tick_drives_leds_from_the_supplied_clock() {
        let mut core: KeyboardCore<4, 4> = KeyboardCore::new();
        let mut hid = MockHid::default();
        let mut leds = MockLeds { lit: [false; 12] };
        core.leds.apply(leds::LEDS_RESET, (5, 5, leds::FOREVER));
        core.tick(&mut leds, &mut hid, &(), &FixedClock(0));
        core.tick(&mut leds, &mut hid, &(), &FixedClock(10));
        assert!(leds.lit[0]);
    }
}
