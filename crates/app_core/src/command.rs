//! Key dispatch: raw key code + active layer -> action

use crate::{KeyMap, KeyRole, ModifierLayer};

/// Action produced for one key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// File the current image into this slot
    SelectSlot(usize),
    Skip,
    Trash,
    /// Informational only; the UI switches its visible label set
    LayerChange(ModifierLayer),
    Noop,
}

/// Pure mapping from `(code, layer)` to `PendingAction`
#[derive(Debug, Clone)]
pub struct KeyDispatcher {
    keymap: KeyMap,
    slots_per_layer: usize,
}

impl KeyDispatcher {
    pub fn new(keymap: KeyMap, slots_per_layer: usize) -> Self {
        Self {
            keymap,
            slots_per_layer,
        }
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    /// First slot index addressed under `layer`
    pub fn layer_base_index(&self, layer: ModifierLayer) -> usize {
        layer.ordinal() * self.slots_per_layer
    }

    pub fn resolve(&self, code: u32, layer: ModifierLayer) -> PendingAction {
        match self.keymap.role(code) {
            Some(KeyRole::Digit(digit)) if usize::from(digit) <= self.slots_per_layer => {
                PendingAction::SelectSlot(self.layer_base_index(layer) + usize::from(digit) - 1)
            }
            Some(KeyRole::Digit(_)) => PendingAction::Noop,
            Some(KeyRole::Skip) => PendingAction::Skip,
            Some(KeyRole::Trash) => PendingAction::Trash,
            Some(KeyRole::Modifier(layer)) => PendingAction::LayerChange(layer),
            None => PendingAction::Noop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyConfig;

    fn dispatcher(slots_per_layer: usize) -> KeyDispatcher {
        let keymap = KeyMap::from_config(&KeyConfig::qt(), 4).unwrap();
        KeyDispatcher::new(keymap, slots_per_layer)
    }

    #[test]
    fn test_digit_slots_for_every_layer() {
        let d = dispatcher(9);
        let layers = [
            ModifierLayer::None,
            ModifierLayer::Shift,
            ModifierLayer::Ctrl,
            ModifierLayer::Alt,
        ];

        for layer in layers {
            for digit in 1..=9u32 {
                let expected = layer.ordinal() * 9 + digit as usize - 1;
                let action = d.resolve(KeyConfig::QT_KEY_1 + digit - 1, layer);
                assert_eq!(action, PendingAction::SelectSlot(expected));
                // Pure: same input, same output
                assert_eq!(d.resolve(KeyConfig::QT_KEY_1 + digit - 1, layer), action);
            }
        }
    }

    #[test]
    fn test_shifted_symbols_reach_shift_layer() {
        let d = dispatcher(9);
        for (i, code) in KeyConfig::QT_SHIFTED_DIGITS.into_iter().enumerate() {
            assert_eq!(
                d.resolve(code, ModifierLayer::Shift),
                PendingAction::SelectSlot(9 + i),
                "code {:#x}",
                code
            );
        }
        assert_eq!(
            d.resolve(KeyConfig::QT_KEY_PARENRIGHT, ModifierLayer::Shift),
            PendingAction::Skip
        );
        assert_eq!(
            d.resolve(KeyConfig::QT_KEY_GREATER, ModifierLayer::Shift),
            PendingAction::Trash
        );
    }

    #[test]
    fn test_utility_keys() {
        let d = dispatcher(9);
        let cases = [
            (KeyConfig::QT_KEY_0, PendingAction::Skip),
            (KeyConfig::QT_KEY_PERIOD, PendingAction::Trash),
            (
                KeyConfig::QT_KEY_SHIFT,
                PendingAction::LayerChange(ModifierLayer::Shift),
            ),
            (
                KeyConfig::QT_KEY_ALT,
                PendingAction::LayerChange(ModifierLayer::Alt),
            ),
            (0x41, PendingAction::Noop),
        ];

        for (code, expected) in cases {
            assert_eq!(d.resolve(code, ModifierLayer::Ctrl), expected, "code {:#x}", code);
        }
    }

    #[test]
    fn test_digit_beyond_layer_width_is_noop() {
        let d = dispatcher(5);
        assert_eq!(
            d.resolve(KeyConfig::QT_KEY_1 + 4, ModifierLayer::Shift),
            PendingAction::SelectSlot(9)
        );
        assert_eq!(
            d.resolve(KeyConfig::QT_KEY_1 + 5, ModifierLayer::Shift),
            PendingAction::Noop
        );
    }
}
