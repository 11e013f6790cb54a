//! The non-default (secondary) layer runtime: numpad, navigation, mouse,
//! macro-pad, and the momentary sublayer reached from numpad.
//!
//! Unlike the default chord layer, these layers dispatch directly: each
//! key names one [`Action`] looked up from [`crate::tables`], no
//! accumulation across a press burst.

use crate::action::{Action, ChordFnId};
use crate::tables::{secondary_layer_action, L_DFLT};

/// What a secondary-layer key press/release should cause the caller to
/// do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerEvent {
    /// Nothing to do (an unmapped cell, or a momentary/change-layer key
    /// whose effect is purely internal bookkeeping).
    None,
    /// Emit this `(mods, code)` pair through the same emission path the
    /// chord engine uses.
    Emit { mods: u8, code: u8 },
    /// Play back macro `id` immediately; does not wait for release.
    PlayMacro(u8),
    /// This layer's `CHG_LAYER` key was released: the active layer is
    /// now `layer` (already applied; informational for hooks/LEDs).
    ChangedLayer(u8),
}

/// Tracks which secondary layer is active and whether a momentary
/// sublayer is currently held over it.
#[derive(Debug)]
pub struct LayerState {
    active: u8,
    momentary: Option<u8>,
}

impl LayerState {
    /// Starts on the default (chord) layer; secondary-layer dispatch is
    /// a no-op until [`LayerState::enter`] is called.
    pub fn new() -> Self {
        LayerState {
            active: L_DFLT,
            momentary: None,
        }
    }

    /// The layer actions are currently looked up against: the momentary
    /// sublayer if one is held, else the active layer.
    pub fn current(&self) -> u8 {
        self.momentary.unwrap_or(self.active)
    }

    /// Is the default chord layer active (i.e. this module is idle)?
    pub fn is_default(&self) -> bool {
        self.current() == L_DFLT
    }

    /// Enters secondary-layer mode on `layer`, called once a chord
    /// function's `CHG_LAYER` has resolved (the chord engine defers
    /// this until the triggering chord is fully released).
    pub fn enter(&mut self, layer: u8) {
        self.active = layer;
        self.momentary = None;
    }

    /// A key was pressed on the current secondary layer.
    pub fn press(&mut self, row: usize, col: usize) -> LayerEvent {
        match secondary_layer_action(self.current(), row, col) {
            Action::Function {
                func_id: ChordFnId::McrPlay,
                opt,
            } => LayerEvent::PlayMacro(opt),
            Action::LayerMomentary { layer } => {
                self.momentary = Some(layer);
                LayerEvent::None
            }
            Action::Mods { mods, code } => LayerEvent::Emit { mods, code },
            _ => LayerEvent::None,
        }
    }

    /// The same key was released: pops a held momentary sublayer, or
    /// completes a `CHG_LAYER` key's transition back to its target
    /// layer.
    ///
    /// The momentary check looks the key up in `active`'s table (the
    /// layer it was pressed on), not `current()`'s: once a momentary
    /// sublayer is live, `current()` points at the sublayer's own table,
    /// which may happen to name something else entirely at the same
    /// `(row, col)`.
    pub fn release(&mut self, row: usize, col: usize) -> LayerEvent {
        if let Some(momentary) = self.momentary {
            if let Action::LayerMomentary { layer } = secondary_layer_action(self.active, row, col) {
                if layer == momentary {
                    self.momentary = None;
                    return LayerEvent::None;
                }
            }
        }
        match secondary_layer_action(self.current(), row, col) {
            Action::Function {
                func_id: ChordFnId::ChgLayer,
                opt,
            } => {
                self.active = opt;
                self.momentary = None;
                LayerEvent::ChangedLayer(opt)
            }
            _ => LayerEvent::None,
        }
    }
}

impl Default for LayerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::{L_NUM, L_NUM_FN};

    #[test]
    fn numpad_digit_emits_directly() {
        let mut layer = LayerState::new();
        layer.enter(L_NUM);
        let event = layer.press(0, 0);
        assert_eq!(
            event,
            LayerEvent::Emit {
                mods: 0,
                code: crate::keypair::KeyCode::Kp7 as u8
            }
        );
    }

    #[test]
    fn momentary_sublayer_activates_while_held() {
        let mut layer = LayerState::new();
        layer.enter(L_NUM);
        assert_eq!(layer.press(3, 3), LayerEvent::None);
        assert_eq!(layer.current(), L_NUM_FN);
        assert_eq!(layer.release(3, 3), LayerEvent::None);
        assert_eq!(layer.current(), L_NUM);
    }

    #[test]
    fn macro_pad_key_plays_macro_on_press() {
        let mut layer = LayerState::new();
        layer.enter(crate::tables::L_MCR);
        assert_eq!(layer.press(0, 2), LayerEvent::PlayMacro(2));
    }

    #[test]
    fn chg_layer_returns_to_default_on_release() {
        let mut layer = LayerState::new();
        layer.enter(crate::tables::L_NAV);
        assert_eq!(layer.press(3, 3), LayerEvent::None);
        assert_eq!(layer.release(3, 3), LayerEvent::ChangedLayer(L_DFLT));
        assert!(layer.is_default());
    }
}
