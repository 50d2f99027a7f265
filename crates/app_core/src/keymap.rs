//! Raw key code normalization

use crate::config::KeyConfig;
use crate::{AppError, ModifierLayer, ModifierLayerTracker};
use std::collections::HashMap;

/// What a raw key code means to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Digit 1-9
    Digit(u8),
    Skip,
    Trash,
    Modifier(ModifierLayer),
}

impl KeyRole {
    /// Does pressing this key act on the current image?
    pub fn is_action(self) -> bool {
        !matches!(self, KeyRole::Modifier(_))
    }
}

/// Validated lookup table from raw platform codes to key roles
#[derive(Debug, Clone)]
pub struct KeyMap {
    roles: HashMap<u32, KeyRole>,
}

impl KeyMap {
    /// Build from configuration. Modifiers may only select one of the first
    /// `layer_count` layers, and no code may have two roles.
    pub fn from_config(config: &KeyConfig, layer_count: usize) -> Result<Self, AppError> {
        let mut map = Self {
            roles: HashMap::new(),
        };

        let digit_ranges = std::iter::once(Some(config.digit_base))
            .chain(std::iter::once(config.keypad_digit_base))
            .flatten();
        for base in digit_ranges {
            for digit in 1..=9u8 {
                let code = base.checked_add(u32::from(digit) - 1).ok_or_else(|| {
                    AppError::Config(format!("Digit key range starting at {} overflows", base))
                })?;
                map.bind(code, KeyRole::Digit(digit))?;
            }
        }

        for binding in &config.digits {
            if !(1..=9).contains(&binding.digit) {
                return Err(AppError::Config(format!(
                    "Key {} is bound to digit {}, digits run from 1 to 9",
                    binding.code, binding.digit
                )));
            }
            map.bind(binding.code, KeyRole::Digit(binding.digit))?;
        }

        for &code in &config.skip {
            map.bind(code, KeyRole::Skip)?;
        }

        for &code in &config.trash {
            map.bind(code, KeyRole::Trash)?;
        }

        for binding in &config.modifiers {
            if binding.layer == ModifierLayer::None {
                return Err(AppError::Config(format!(
                    "Key {} cannot be bound to the base layer",
                    binding.code
                )));
            }
            if binding.layer.ordinal() >= layer_count {
                return Err(AppError::Config(format!(
                    "Key {} selects layer {:?}, but only {} layers are configured",
                    binding.code, binding.layer, layer_count
                )));
            }
            map.bind(binding.code, KeyRole::Modifier(binding.layer))?;
        }

        Ok(map)
    }

    fn bind(&mut self, code: u32, role: KeyRole) -> Result<(), AppError> {
        if let Some(existing) = self.roles.insert(code, role) {
            return Err(AppError::Config(format!(
                "Key {} is bound to both {:?} and {:?}",
                code, existing, role
            )));
        }
        Ok(())
    }

    pub fn role(&self, code: u32) -> Option<KeyRole> {
        self.roles.get(&code).copied()
    }

    /// Tracker seeded with this map's modifier codes
    pub fn tracker(&self) -> ModifierLayerTracker {
        let modifiers = self
            .roles
            .iter()
            .filter_map(|(&code, role)| match role {
                KeyRole::Modifier(layer) => Some((code, *layer)),
                _ => None,
            })
            .collect();
        ModifierLayerTracker::new(modifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DigitBinding, ModifierBinding};

    #[test]
    fn test_qt_roles() {
        let map = KeyMap::from_config(&KeyConfig::qt(), 4).unwrap();
        assert_eq!(map.role(0x31), Some(KeyRole::Digit(1)));
        assert_eq!(map.role(0x39), Some(KeyRole::Digit(9)));
        assert_eq!(map.role(0x30), Some(KeyRole::Skip));
        assert_eq!(map.role(0x2e), Some(KeyRole::Trash));
        assert_eq!(
            map.role(KeyConfig::QT_KEY_CONTROL),
            Some(KeyRole::Modifier(ModifierLayer::Ctrl))
        );
        assert_eq!(map.role(0x41), None);
    }

    #[test]
    fn test_keypad_range() {
        let config = KeyConfig {
            keypad_digit_base: Some(0xffb1),
            ..KeyConfig::qt()
        };
        let map = KeyMap::from_config(&config, 4).unwrap();
        assert_eq!(map.role(0xffb1), Some(KeyRole::Digit(1)));
        assert_eq!(map.role(0xffb9), Some(KeyRole::Digit(9)));
    }

    #[test]
    fn test_explicit_digit_bindings() {
        let map = KeyMap::from_config(&KeyConfig::qt(), 4).unwrap();
        assert_eq!(map.role(0x21), Some(KeyRole::Digit(1)));
        assert_eq!(map.role(0x40), Some(KeyRole::Digit(2)));
        assert_eq!(map.role(0x28), Some(KeyRole::Digit(9)));
        assert_eq!(map.role(KeyConfig::QT_KEY_PARENRIGHT), Some(KeyRole::Skip));

        let config = KeyConfig {
            digits: vec![DigitBinding::new(0xa1, 0)],
            ..KeyConfig::qt()
        };
        assert!(matches!(
            KeyMap::from_config(&config, 4),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let config = KeyConfig {
            skip: vec![0x30, 0x35],
            ..KeyConfig::qt()
        };
        assert!(matches!(
            KeyMap::from_config(&config, 4),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_modifier_beyond_layer_count_rejected() {
        let mut config = KeyConfig::qt();
        config
            .modifiers
            .push(ModifierBinding::new(0x0100_1103, ModifierLayer::GroupSwitch));

        assert!(KeyMap::from_config(&config, 4).is_err());
        assert!(KeyMap::from_config(&config, 5).is_ok());
    }

    #[test]
    fn test_tracker_sees_modifiers_only() {
        let map = KeyMap::from_config(&KeyConfig::qt_macos(), 4).unwrap();
        let tracker = map.tracker();
        assert_eq!(
            tracker.layer_for(KeyConfig::QT_KEY_META),
            Some(ModifierLayer::Ctrl)
        );
        assert_eq!(tracker.layer_for(0x31), None);
    }
}
