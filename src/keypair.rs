//! The finger-chord table entry: a packed `(lower, upper)` pair of
//! `(mods, code)`, and the 4-bit "keypair mods" nibble used to encode
//! modifiers inside it.

use packed_struct::prelude::*;

pub use keyberon::key_code::KeyCode;

/// `Co` — left control, bit 0 of a keypair-mods nibble.
pub const CO: u8 = 1 << 0;
/// `Sh` — left shift, bit 1 of a keypair-mods nibble.
pub const SH: u8 = 1 << 1;
/// `Al` — left alt, bit 2 of a keypair-mods nibble.
pub const AL: u8 = 1 << 2;
/// `Ag` — AltGr, bit 3 of a keypair-mods nibble. Translated to right-alt
/// on the HID modifier byte.
pub const AG: u8 = 1 << 3;

/// Standard USB HID modifier-byte bit positions.
pub mod hid_mod {
    pub const L_CTRL: u8 = 1 << 0;
    pub const L_SHIFT: u8 = 1 << 1;
    pub const L_ALT: u8 = 1 << 2;
    pub const L_GUI: u8 = 1 << 3;
    pub const R_CTRL: u8 = 1 << 4;
    pub const R_SHIFT: u8 = 1 << 5;
    pub const R_ALT: u8 = 1 << 6;
    pub const R_GUI: u8 = 1 << 7;
}

/// Translates a 4-bit keypair-mods nibble (`Co,Sh,Al,Ag`) into a standard
/// 8-bit HID modifier byte, moving `Ag` to the right-alt bit.
pub const fn keypair_mods_to_mods(m: u8) -> u8 {
    (m & !AG) | ((m & AG) << 3)
}

/// The inverse of [`keypair_mods_to_mods`], used by the macro recorder to
/// pack a live HID modifier byte back into a keypair-mods nibble.
pub const fn mods_to_keypair_mods(m: u8) -> u8 {
    (m & !hid_mod::R_ALT) | ((m & hid_mod::R_ALT) >> 3)
}

/// A finger-chord table entry: the lower-level and upper-level
/// `(mods, code)` pairs, packed into 24 bits.
#[derive(PackedStruct, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "3")]
pub struct Keypair {
    /// Lower-level (default case) key code.
    #[packed_field(bits = "0..=7")]
    pub code_lo: u8,
    /// Lower-level keypair-mods nibble.
    #[packed_field(bits = "8..=11")]
    pub mods_lo: Integer<u8, packed_bits::Bits<4>>,
    /// Upper-level (thumb-shift held) key code.
    #[packed_field(bits = "12..=19")]
    pub code_up: u8,
    /// Upper-level keypair-mods nibble.
    #[packed_field(bits = "20..=23")]
    pub mods_up: Integer<u8, packed_bits::Bits<4>>,
}

/// Maps a raw HID code byte to a `KeyCode`. Bytes in `0xA5..0xE0` (the
/// gap between the generic usage codes and the modifier codes, unused by
/// the HID keyboard usage table) and bytes past `0xFB` decode to
/// `KeyCode::No` rather than an invalid enum value.
pub fn code_to_keycode(code: u8) -> KeyCode {
    match code {
        0x00 => KeyCode::No, 0x01 => KeyCode::ErrorRollOver, 0x02 => KeyCode::PostFail,
        0x03 => KeyCode::ErrorUndefined, 0x04 => KeyCode::A, 0x05 => KeyCode::B,
        0x06 => KeyCode::C, 0x07 => KeyCode::D, 0x08 => KeyCode::E,
        0x09 => KeyCode::F, 0x0a => KeyCode::G, 0x0b => KeyCode::H,
        0x0c => KeyCode::I, 0x0d => KeyCode::J, 0x0e => KeyCode::K,
        0x0f => KeyCode::L, 0x10 => KeyCode::M, 0x11 => KeyCode::N,
        0x12 => KeyCode::O, 0x13 => KeyCode::P, 0x14 => KeyCode::Q,
        0x15 => KeyCode::R, 0x16 => KeyCode::S, 0x17 => KeyCode::T,
        0x18 => KeyCode::U, 0x19 => KeyCode::V, 0x1a => KeyCode::W,
        0x1b => KeyCode::X, 0x1c => KeyCode::Y, 0x1d => KeyCode::Z,
        0x1e => KeyCode::Kb1, 0x1f => KeyCode::Kb2, 0x20 => KeyCode::Kb3,
        0x21 => KeyCode::Kb4, 0x22 => KeyCode::Kb5, 0x23 => KeyCode::Kb6,
        0x24 => KeyCode::Kb7, 0x25 => KeyCode::Kb8, 0x26 => KeyCode::Kb9,
        0x27 => KeyCode::Kb0, 0x28 => KeyCode::Enter, 0x29 => KeyCode::Escape,
        0x2a => KeyCode::BSpace, 0x2b => KeyCode::Tab, 0x2c => KeyCode::Space,
        0x2d => KeyCode::Minus, 0x2e => KeyCode::Equal, 0x2f => KeyCode::LBracket,
        0x30 => KeyCode::RBracket, 0x31 => KeyCode::Bslash, 0x32 => KeyCode::NonUsHash,
        0x33 => KeyCode::SColon, 0x34 => KeyCode::Quote, 0x35 => KeyCode::Grave,
        0x36 => KeyCode::Comma, 0x37 => KeyCode::Dot, 0x38 => KeyCode::Slash,
        0x39 => KeyCode::CapsLock, 0x3a => KeyCode::F1, 0x3b => KeyCode::F2,
        0x3c => KeyCode::F3, 0x3d => KeyCode::F4, 0x3e => KeyCode::F5,
        0x3f => KeyCode::F6, 0x40 => KeyCode::F7, 0x41 => KeyCode::F8,
        0x42 => KeyCode::F9, 0x43 => KeyCode::F10, 0x44 => KeyCode::F11,
        0x45 => KeyCode::F12, 0x46 => KeyCode::PScreen, 0x47 => KeyCode::ScrollLock,
        0x48 => KeyCode::Pause, 0x49 => KeyCode::Insert, 0x4a => KeyCode::Home,
        0x4b => KeyCode::PgUp, 0x4c => KeyCode::Delete, 0x4d => KeyCode::End,
        0x4e => KeyCode::PgDown, 0x4f => KeyCode::Right, 0x50 => KeyCode::Left,
        0x51 => KeyCode::Down, 0x52 => KeyCode::Up, 0x53 => KeyCode::NumLock,
        0x54 => KeyCode::KpSlash, 0x55 => KeyCode::KpAsterisk, 0x56 => KeyCode::KpMinus,
        0x57 => KeyCode::KpPlus, 0x58 => KeyCode::KpEnter, 0x59 => KeyCode::Kp1,
        0x5a => KeyCode::Kp2, 0x5b => KeyCode::Kp3, 0x5c => KeyCode::Kp4,
        0x5d => KeyCode::Kp5, 0x5e => KeyCode::Kp6, 0x5f => KeyCode::Kp7,
        0x60 => KeyCode::Kp8, 0x61 => KeyCode::Kp9, 0x62 => KeyCode::Kp0,
        0x63 => KeyCode::KpDot, 0x64 => KeyCode::NonUsBslash, 0x65 => KeyCode::Application,
        0x66 => KeyCode::Power, 0x67 => KeyCode::KpEqual, 0x68 => KeyCode::F13,
        0x69 => KeyCode::F14, 0x6a => KeyCode::F15, 0x6b => KeyCode::F16,
        0x6c => KeyCode::F17, 0x6d => KeyCode::F18, 0x6e => KeyCode::F19,
        0x6f => KeyCode::F20, 0x70 => KeyCode::F21, 0x71 => KeyCode::F22,
        0x72 => KeyCode::F23, 0x73 => KeyCode::F24, 0x74 => KeyCode::Execute,
        0x75 => KeyCode::Help, 0x76 => KeyCode::Menu, 0x77 => KeyCode::Select,
        0x78 => KeyCode::Stop, 0x79 => KeyCode::Again, 0x7a => KeyCode::Undo,
        0x7b => KeyCode::Cut, 0x7c => KeyCode::Copy, 0x7d => KeyCode::Paste,
        0x7e => KeyCode::Find, 0x7f => KeyCode::Mute, 0x80 => KeyCode::VolUp,
        0x81 => KeyCode::VolDown, 0x82 => KeyCode::LockingCapsLock, 0x83 => KeyCode::LockingNumLock,
        0x84 => KeyCode::LockingScrollLock, 0x85 => KeyCode::KpComma, 0x86 => KeyCode::KpEqualSign,
        0x87 => KeyCode::Intl1, 0x88 => KeyCode::Intl2, 0x89 => KeyCode::Intl3,
        0x8a => KeyCode::Intl4, 0x8b => KeyCode::Intl5, 0x8c => KeyCode::Intl6,
        0x8d => KeyCode::Intl7, 0x8e => KeyCode::Intl8, 0x8f => KeyCode::Intl9,
        0x90 => KeyCode::Lang1, 0x91 => KeyCode::Lang2, 0x92 => KeyCode::Lang3,
        0x93 => KeyCode::Lang4, 0x94 => KeyCode::Lang5, 0x95 => KeyCode::Lang6,
        0x96 => KeyCode::Lang7, 0x97 => KeyCode::Lang8, 0x98 => KeyCode::Lang9,
        0x99 => KeyCode::AltErase, 0x9a => KeyCode::SysReq, 0x9b => KeyCode::Cancel,
        0x9c => KeyCode::Clear, 0x9d => KeyCode::Prior, 0x9e => KeyCode::Return,
        0x9f => KeyCode::Separator, 0xa0 => KeyCode::Out, 0xa1 => KeyCode::Oper,
        0xa2 => KeyCode::ClearAgain, 0xa3 => KeyCode::CrSel, 0xa4 => KeyCode::ExSel,
        0xe0 => KeyCode::LCtrl, 0xe1 => KeyCode::LShift, 0xe2 => KeyCode::LAlt,
        0xe3 => KeyCode::LGui, 0xe4 => KeyCode::RCtrl, 0xe5 => KeyCode::RShift,
        0xe6 => KeyCode::RAlt, 0xe7 => KeyCode::RGui, 0xe8 => KeyCode::MediaPlayPause,
        0xe9 => KeyCode::MediaStopCD, 0xea => KeyCode::MediaPreviousSong, 0xeb => KeyCode::MediaNextSong,
        0xec => KeyCode::MediaEjectCD, 0xed => KeyCode::MediaVolUp, 0xee => KeyCode::MediaVolDown,
        0xef => KeyCode::MediaMute, 0xf0 => KeyCode::MediaWWW, 0xf1 => KeyCode::MediaBack,
        0xf2 => KeyCode::MediaForward, 0xf3 => KeyCode::MediaStop, 0xf4 => KeyCode::MediaFind,
        0xf5 => KeyCode::MediaScrollUp, 0xf6 => KeyCode::MediaScrollDown, 0xf7 => KeyCode::MediaEdit,
        0xf8 => KeyCode::MediaSleep, 0xf9 => KeyCode::MeidaCoffee, 0xfa => KeyCode::MediaRefresh,
        0xfb => KeyCode::MediaCalc,
        _ => KeyCode::No,
    }
}

impl Keypair {
    /// The reserved sentinel: an all-zero entry. `chrdmap[0]` must equal
    /// this and its `code_lo` must never be reported.
    pub fn none() -> Keypair {
        Keypair::default()
    }

    /// Packs this entry into its 3-byte NV-store cell representation.
    pub fn to_bytes(self) -> [u8; 3] {
        self.pack().expect("Keypair always fits in 3 bytes")
    }

    /// Unpacks a 3-byte NV-store cell into a `Keypair`.
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Keypair::unpack(&bytes).expect("Keypair always fits in 3 bytes")
    }
}
