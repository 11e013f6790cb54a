//! The in-device macro recorder/player.
//!
//! Recorded macros are stored in the function-chord table's unreachable
//! "hole" cells (see [`crate::tables::FN_CHORD_HOLES`]) rather than in
//! their own region: the first 12 holes pack four 4-bit mods nibbles per
//! 16-bit word, the remaining 24 pack two 8-bit key codes per word —
//! `MCR_LEN * MCR_MAX` entries of each, exactly filling the available
//! 36 words.

use crate::error::CoreError;
use crate::hal::NvStore;
use crate::keypair::mods_to_keypair_mods;
use crate::tables::{ChordTables, FN_CHORD_HOLES, MCR_LEN, MCR_MAX};

const MODS_WORDS: usize = (MCR_LEN * MCR_MAX).div_ceil(4);

fn entry_index(m: usize, c: usize) -> usize {
    m * MCR_LEN + c
}

/// Reads the `(mods, code)` pair stored for macro `m`, chord `c`.
fn get(fn_chord: &[u16; 128], m: usize, c: usize) -> (u8, u8) {
    let idx = entry_index(m, c);
    let mods_word = FN_CHORD_HOLES[idx / 4] as usize;
    let mods_shift = (idx % 4) * 4;
    let mods = ((fn_chord[mods_word] >> mods_shift) & 0xf) as u8;

    let code_word = FN_CHORD_HOLES[MODS_WORDS + idx / 2] as usize;
    let code = if idx % 2 == 0 {
        (fn_chord[code_word] & 0xff) as u8
    } else {
        (fn_chord[code_word] >> 8) as u8
    };
    (mods, code)
}

/// Writes the `(mods, code)` pair for macro `m`, chord `c`.
fn put(fn_chord: &mut [u16; 128], m: usize, c: usize, mods: u8, code: u8) {
    let idx = entry_index(m, c);
    let mods_word = FN_CHORD_HOLES[idx / 4] as usize;
    let mods_shift = (idx % 4) * 4;
    fn_chord[mods_word] =
        (fn_chord[mods_word] & !(0xfu16 << mods_shift)) | (((mods & 0xf) as u16) << mods_shift);

    let code_word = FN_CHORD_HOLES[MODS_WORDS + idx / 2] as usize;
    fn_chord[code_word] = if idx % 2 == 0 {
        (fn_chord[code_word] & 0xff00) | code as u16
    } else {
        (fn_chord[code_word] & 0x00ff) | ((code as u16) << 8)
    };
}

/// The macro recorder's own state; separate from whatever secondary
/// layer or printer state happens to be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum State {
    Idle,
    Recording,
}

/// Records up to [`MCR_LEN`] `(mods, code)` pairs, then commits them
/// into persistent storage for later playback.
pub struct MacroEngine {
    state: State,
    buffer: [(u8, u8); MCR_LEN],
    idx: usize,
}

impl MacroEngine {
    /// A fresh, idle recorder.
    pub fn new() -> Self {
        MacroEngine {
            state: State::Idle,
            buffer: [(0, 0); MCR_LEN],
            idx: 0,
        }
    }

    /// Is a recording in progress?
    pub fn is_recording(&self) -> bool {
        self.state == State::Recording
    }

    /// `MCR_RECORD`: clears the buffer and starts collecting.
    pub fn start_record(&mut self) {
        self.state = State::Recording;
        self.idx = 0;
        self.buffer = [(0, 0); MCR_LEN];
    }

    /// Called by the emission path for every emitted `(mods, code)`
    /// whose keycode or mods are nonzero. A no-op when not recording.
    /// Errs (without losing the recording) once the buffer is full.
    pub fn collect(&mut self, mods: u8, code: u8) -> Result<(), CoreError> {
        if !self.is_recording() || (mods == 0 && code == 0) {
            return Ok(());
        }
        if self.idx >= MCR_LEN {
            return Err(CoreError::MacroBufferFull);
        }
        self.buffer[self.idx] = (mods_to_keypair_mods(mods), code);
        self.idx += 1;
        Ok(())
    }

    /// Commits the buffer (zero-padded) into macro `id`'s persistent
    /// slots, writes every touched word back to `store`, and returns to
    /// idle. A no-op (not an error) when not currently recording,
    /// matching `EXEC`'s dual role of "stop recording" only while
    /// actually recording.
    pub fn commit<S: NvStore>(&mut self, tables: &mut ChordTables, store: &mut S, id: u8) -> Result<(), CoreError> {
        if !self.is_recording() {
            return Ok(());
        }
        if id as usize >= MCR_MAX {
            return Err(CoreError::MacroIdOutOfRange);
        }
        for c in 0..MCR_LEN {
            let (mods, code) = self.buffer[c];
            put(&mut tables.fn_chord, id as usize, c, mods, code);
        }
        for c in 0..MCR_LEN {
            let idx = entry_index(id as usize, c);
            let mods_word = FN_CHORD_HOLES[idx / 4] as u16;
            store.update_word(mods_word, tables.fn_chord[mods_word as usize])?;
            let code_word = FN_CHORD_HOLES[MODS_WORDS + idx / 2] as u16;
            store.update_word(code_word, tables.fn_chord[code_word as usize])?;
        }
        self.state = State::Idle;
        Ok(())
    }

    /// Cancels an in-progress recording without committing it.
    pub fn cancel(&mut self) {
        self.state = State::Idle;
    }

    /// Plays macro `id` back, calling `emit(mods, code)` for each stored
    /// chord up to the first all-zero slot.
    pub fn play(
        tables: &ChordTables,
        id: u8,
        mut emit: impl FnMut(u8, u8),
    ) -> Result<(), CoreError> {
        if id as usize >= MCR_MAX {
            return Err(CoreError::MacroIdOutOfRange);
        }
        for c in 0..MCR_LEN {
            let (mods, code) = get(&tables.fn_chord, id as usize, c);
            if mods == 0 && code == 0 {
                break;
            }
            emit(crate::keypair::keypair_mods_to_mods(mods), code);
        }
        Ok(())
    }
}

impl Default for MacroEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct MockNv;

    impl crate::hal::NvStore for MockNv {
        fn read_word(&mut self, _addr: u16) -> Result<u16, CoreError> {
            Ok(0)
        }
        fn update_word(&mut self, _addr: u16, _value: u16) -> Result<(), CoreError> {
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
    fn packing_round_trip_across_full_space() {
        let mut fn_chord = [0u16; 128];
        for m in 0..MCR_MAX {
            for c in 0..MCR_LEN {
                let mods = ((m * MCR_LEN + c) % 16) as u8;
                let code = ((m * 7 + c * 3) % 256) as u8;
                put(&mut fn_chord, m, c, mods, code);
            }
        }
        for m in 0..MCR_MAX {
            for c in 0..MCR_LEN {
                let mods = ((m * MCR_LEN + c) % 16) as u8;
                let code = ((m * 7 + c * 3) % 256) as u8;
                assert_eq!(get(&fn_chord, m, c), (mods, code));
            }
        }
    }

    #[test]
    fn record_commit_and_play_round_trip() {
        let mut tables = ChordTables::new();
        let mut engine = MacroEngine::new();
        let mut store = MockNv;
        engine.start_record();
        engine.collect(0, crate::keypair::KeyCode::A as u8).ok();
        engine.collect(0, crate::keypair::KeyCode::B as u8).ok();
        engine.commit(&mut tables, &mut store, 3).unwrap();
        assert!(!engine.is_recording());

        let mut played = heapless::Vec::<(u8, u8), 8>::new();
        MacroEngine::play(&tables, 3, |mods, code| {
            played.push((mods, code)).ok();
        })
        .unwrap();
        assert_eq!(
            played.as_slice(),
            &[
                (0, crate::keypair::KeyCode::A as u8),
                (0, crate::keypair::KeyCode::B as u8)
            ]
        );
    }

    #[test]
    fn buffer_full_drops_extra_keystrokes() {
        let mut engine = MacroEngine::new();
        engine.start_record();
        for i in 0..MCR_LEN {
            engine.collect(0, i as u8 + 1).unwrap();
        }
        assert_eq!(engine.collect(0, 0xaa), Err(CoreError::MacroBufferFull));
    }

    #[test]
    fn macro_id_out_of_range_is_rejected() {
        let mut tables = ChordTables::new();
        let mut engine = MacroEngine::new();
        let mut store = MockNv;
        engine.start_record();
        assert_eq!(
            engine.commit(&mut tables, &mut store, MCR_MAX as u8),
            Err(CoreError::MacroIdOutOfRange)
        );
        assert_eq!(
            MacroEngine::play(&tables, MCR_MAX as u8, |_, _| {}),
            Err(CoreError::MacroIdOutOfRange)
        );
    }
}
