//! Modifier layers and the tracker that normalizes platform modifier codes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Modifier context selecting which block of slots the digit keys address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModifierLayer {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "shift")]
    Shift,
    #[serde(rename = "ctrl")]
    Ctrl,
    #[serde(rename = "alt")]
    Alt,
    #[serde(rename = "group_switch")]
    GroupSwitch,
}

impl ModifierLayer {
    /// All layers in ordinal order
    pub const ALL: [ModifierLayer; 5] = [
        ModifierLayer::None,
        ModifierLayer::Shift,
        ModifierLayer::Ctrl,
        ModifierLayer::Alt,
        ModifierLayer::GroupSwitch,
    ];

    /// Position of this layer's slot block
    pub fn ordinal(self) -> usize {
        match self {
            ModifierLayer::None => 0,
            ModifierLayer::Shift => 1,
            ModifierLayer::Ctrl => 2,
            ModifierLayer::Alt => 3,
            ModifierLayer::GroupSwitch => 4,
        }
    }

    /// Label shown above the layer's slot list
    pub fn label(self) -> &'static str {
        match self {
            ModifierLayer::None => "",
            ModifierLayer::Shift => "Shift",
            ModifierLayer::Ctrl => "Ctrl",
            ModifierLayer::Alt => "Alt",
            ModifierLayer::GroupSwitch => "AltGr",
        }
    }
}

/// Tracks the single active modifier layer from raw key-down/key-up codes
#[derive(Debug, Clone)]
pub struct ModifierLayerTracker {
    /// Raw platform code -> logical layer
    modifiers: HashMap<u32, ModifierLayer>,
    active: ModifierLayer,
    /// Code that activated the current layer
    held: Option<u32>,
}

impl ModifierLayerTracker {
    pub fn new(modifiers: HashMap<u32, ModifierLayer>) -> Self {
        Self {
            modifiers,
            active: ModifierLayer::None,
            held: None,
        }
    }

    pub fn active(&self) -> ModifierLayer {
        self.active
    }

    /// Layer bound to a raw code, if it is a modifier
    pub fn layer_for(&self, code: u32) -> Option<ModifierLayer> {
        self.modifiers.get(&code).copied()
    }

    /// Returns the newly active layer, or `None` if the state did not change.
    /// A second modifier pressed while another is held is ignored.
    pub fn on_key_down(&mut self, code: u32) -> Option<ModifierLayer> {
        let layer = self.layer_for(code)?;

        if self.active != ModifierLayer::None || layer == ModifierLayer::None {
            return None;
        }

        self.active = layer;
        self.held = Some(code);
        tracing::debug!("Layer active: {:?}", layer);
        Some(layer)
    }

    /// Returns true if releasing `code` dropped back to the base layer.
    /// Only the key that activated the layer releases it.
    pub fn on_key_up(&mut self, code: u32) -> bool {
        if self.held != Some(code) {
            return false;
        }

        tracing::debug!("Layer released: {:?}", self.active);
        self.reset();
        true
    }

    /// Drop back to the base layer without a key-up (focus loss)
    pub fn reset(&mut self) {
        self.active = ModifierLayer::None;
        self.held = None;
    }
}
