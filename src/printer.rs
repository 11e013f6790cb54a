//! The cooperative chord-table printer: a one-character-per-tick typist
//! that dumps the finger-chord, function-chord and thumb-chord tables as
//! readable text through the HID transport, exactly the way a human
//! typing the dump by hand would look to the host.
//!
//! Each line is built once (hex index, mods flags, keycode, short name)
//! then drained one character per [`Printer::tick`] call so the host
//! sees a natural typing stream rather than a single oversized report.

use core::fmt::Write as _;

use crate::action::Action;
use crate::hal::{HidSink, NameTables};
use crate::keypair::{code_to_keycode, hid_mod, Keypair, AG, AL, CO, SH};
use crate::tables::{ChordTables, THUMB_CHORD_TABLE};

const LINE_LEN: usize = 48;
type Line = heapless::String<LINE_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Section {
    KeypairHdr,
    Keypair,
    FnActHdr,
    FnAct,
    ThbActHdr,
    ThbAct,
    Done,
}

/// The printer's own state: which section/index it's on, and how much
/// of the current line has been typed.
pub struct Printer {
    section: Section,
    index: u16,
    line: Line,
    pos: usize,
}

impl Printer {
    /// Idle; call [`Printer::start`] to begin a dump.
    pub fn new() -> Self {
        Printer {
            section: Section::Done,
            index: 0,
            line: Line::new(),
            pos: 0,
        }
    }

    /// Is a dump in progress?
    pub fn is_active(&self) -> bool {
        self.section != Section::Done
    }

    /// `PRINT`: begins dumping `KEYPAIR_HDR` through `THB_ACT`.
    pub fn start(&mut self) {
        self.section = Section::KeypairHdr;
        self.index = 0;
        self.pos = 0;
        self.line.clear();
    }

    /// `RESET`: cancels any in-progress dump immediately, without
    /// flushing a partial line.
    pub fn cancel(&mut self) {
        self.section = Section::Done;
        self.index = 0;
        self.pos = 0;
        self.line.clear();
    }

    /// Advances the printer by one character (or one line-to-line
    /// transition) and types it through `hid` if a character was sent.
    /// Returns `true` if the printer is still active afterward.
    pub fn tick<H: HidSink, N: NameTables>(
        &mut self,
        hid: &mut H,
        names: &N,
        tables: &ChordTables,
    ) -> bool {
        if self.section == Section::Done {
            return false;
        }
        if self.pos < self.line.len() {
            let ch = self.line.as_bytes()[self.pos];
            let (mods, code) = ascii_to_hid(ch);
            hid.add_weak_mods(mods);
            if code != 0 {
                hid.add_key(code_to_keycode(code));
            }
            hid.send_keyboard_report();
            hid.clear_keyboard_but_mods();
            self.pos += 1;
            return true;
        }
        self.advance(names, tables);
        self.is_active()
    }

    fn advance<N: NameTables>(&mut self, names: &N, tables: &ChordTables) {
        self.pos = 0;
        self.line.clear();
        loop {
            match self.section {
                Section::KeypairHdr => {
                    let _ = self.line.push_str("== KEYPAIR ==");
                    self.section = Section::Keypair;
                    self.index = 0;
                    return;
                }
                Section::Keypair => {
                    if self.index as usize >= tables.chord.len() {
                        self.section = Section::FnActHdr;
                        continue;
                    }
                    self.line = fmt_keypair(self.index, tables.chord[self.index as usize], names);
                    self.index += 1;
                    return;
                }
                Section::FnActHdr => {
                    let _ = self.line.push_str("== FN_ACT ==");
                    self.section = Section::FnAct;
                    self.index = 0;
                    return;
                }
                Section::FnAct => {
                    if self.index as usize >= tables.fn_chord.len() {
                        self.section = Section::ThbActHdr;
                        continue;
                    }
                    self.line = fmt_action(self.index, tables.fn_action(self.index as usize), names);
                    self.index += 1;
                    return;
                }
                Section::ThbActHdr => {
                    let _ = self.line.push_str("== THB_ACT ==");
                    self.section = Section::ThbAct;
                    self.index = 0;
                    return;
                }
                Section::ThbAct => {
                    if self.index as usize >= THUMB_CHORD_TABLE.len() {
                        self.section = Section::Done;
                        return;
                    }
                    self.line = fmt_action(self.index, THUMB_CHORD_TABLE[self.index as usize], names);
                    self.index += 1;
                    return;
                }
                Section::Done => return,
            }
        }
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

fn mods_flags(m: u8) -> [u8; 4] {
    [
        if m & CO != 0 { b'c' } else { b'-' },
        if m & SH != 0 { b's' } else { b'-' },
        if m & AL != 0 { b'a' } else { b'-' },
        if m & AG != 0 { b'g' } else { b'-' },
    ]
}

fn fmt_keypair(idx: u16, kp: Keypair, names: &impl NameTables) -> Line {
    let mut s = Line::new();
    let lo = mods_flags(kp.mods_lo.into());
    let up = mods_flags(kp.mods_up.into());
    let _ = write!(
        s,
        "{:02x} {}{}{}{} {} {}{}{}{} {}",
        idx,
        lo[0] as char,
        lo[1] as char,
        lo[2] as char,
        lo[3] as char,
        names.code_name(kp.code_lo),
        up[0] as char,
        up[1] as char,
        up[2] as char,
        up[3] as char,
        names.code_name(kp.code_up),
    );
    s
}

fn fmt_action(idx: u16, action: Action, names: &impl NameTables) -> Line {
    let mut s = Line::new();
    match action {
        Action::None => {
            let _ = write!(s, "{:02x} NONE", idx);
        }
        Action::Mods { mods, code } => {
            let _ = write!(s, "{:02x} MODS {:02x} {}", idx, mods, names.code_name(code));
        }
        Action::ModsTap { right, mods, tap } => {
            let side = if right { "R" } else { "L" };
            let _ = write!(s, "{:02x} {}MODS {:01x} {:?}", idx, side, mods, tap);
        }
        Action::Function { func_id, opt } => {
            let _ = write!(s, "{:02x} FN {} {:02x}", idx, names.chrdfunc_name(func_id), opt);
        }
        Action::LayerMomentary { layer } => {
            let _ = write!(s, "{:02x} MOMENT {}", idx, names.layer_name(layer));
        }
        Action::ThumbShift => {
            let _ = write!(s, "{:02x} THB_UP", idx);
        }
    }
    s
}

fn letter_keycode(i: u8) -> u8 {
    crate::keypair::KeyCode::A as u8 + i
}

fn digit_keycode(d: u8) -> u8 {
    if d == 0 {
        crate::keypair::KeyCode::Kb0 as u8
    } else {
        crate::keypair::KeyCode::Kb1 as u8 + (d - 1)
    }
}

/// Translates one ASCII byte from a printer line into the `(mods, code)`
/// needed to type it. Bytes with no mapping type nothing (`KC_NO`).
fn ascii_to_hid(ch: u8) -> (u8, u8) {
    match ch {
        b' ' => (0, crate::keypair::KeyCode::Space as u8),
        b'0'..=b'9' => (0, digit_keycode(ch - b'0')),
        b'a'..=b'z' => (0, letter_keycode(ch - b'a')),
        b'A'..=b'Z' => (hid_mod::L_SHIFT, letter_keycode(ch - b'A')),
        b'-' => (0, crate::keypair::KeyCode::Minus as u8),
        b'=' => (0, crate::keypair::KeyCode::Equal as u8),
        b':' => (hid_mod::L_SHIFT, crate::keypair::KeyCode::SColon as u8),
        _ => (0, 0),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keypair::KeyCode;

    #[derive(Default)]
    struct MockHid {
        reports: heapless::Vec<(u8, KeyCode), 64>,
    }

    impl HidSink for MockHid {
        fn add_key(&mut self, code: KeyCode) {
            let _ = self.reports.push((0, code));
        }
        fn add_mods(&mut self, _mods: u8) {}
        fn add_weak_mods(&mut self, _mods: u8) {}
        fn del_mods(&mut self, _mods: u8) {}
        fn clear_keyboard(&mut self) {}
        fn clear_keyboard_but_mods(&mut self) {}
        fn send_keyboard_report(&mut self) {}
        fn get_mods(&self) -> u8 {
            0
        }
        fn get_weak_mods(&self) -> u8 {
            0
        }
        fn set_mods(&mut self, _mods: u8) {}
        fn set_weak_mods(&mut self, _mods: u8) {}
        fn host_keyboard_leds(&self) -> u8 {
            0
        }
        fn keyboard_set_leds(&mut self, _leds: u8) {}
    }

    #[test]
    fn dump_walks_every_section_to_done() {
        let tables = ChordTables::new();
        let mut printer = Printer::new();
        let mut hid = MockHid::default();
        printer.start();
        assert!(printer.is_active());
        let mut ticks = 0;
        while printer.tick(&mut hid, &(), &tables) {
            ticks += 1;
            assert!(ticks < 200_000, "printer never reached Done");
        }
        assert!(!printer.is_active());
    }

    #[test]
    fn reset_cancels_without_flushing_rest_of_line() {
        let tables = ChordTables::new();
        let mut printer = Printer::new();
        let mut hid = MockHid::default();
        printer.start();
        printer.tick(&mut hid, &(), &tables);
        printer.tick(&mut hid, &(), &tables);
        printer.cancel();
        assert!(!printer.is_active());
        assert!(!printer.tick(&mut hid, &(), &tables));
    }
}
