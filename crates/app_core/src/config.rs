//! Application configuration

use crate::{AppError, ModifierLayer};
use app_fs::{TrashTarget, VerifyMode};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Digit keys 1-9 address at most nine slots per layer
pub const MAX_SLOTS_PER_LAYER: usize = 9;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub keys: KeyConfig,
}

/// Everything needed to open a dispatch session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Folder holding the images to file
    pub source_directory: PathBuf,
    /// Folder whose subfolders are the albums; defaults to the source folder
    pub album_directory: Option<PathBuf>,
    pub trash: TrashTarget,
    pub max_slots: usize,
    pub slots_per_layer: usize,
    /// Image extension allowlist, matched case-insensitively
    pub extensions: Vec<String>,
    /// Check applied to cross-volume copies
    pub verify: VerifyMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("."),
            album_directory: None,
            trash: TrashTarget::None,
            max_slots: 36, // no mod, shift, ctrl, alt * 9
            slots_per_layer: MAX_SLOTS_PER_LAYER,
            extensions: [
                ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tif", ".tiff", ".webp", ".svg",
            ]
            .iter()
            .map(|e| e.to_string())
            .collect(),
            verify: VerifyMode::Size,
        }
    }
}

impl SessionConfig {
    /// Session over `source`, with albums taken from `albums`
    pub fn new(source: impl Into<PathBuf>, albums: impl Into<PathBuf>) -> Self {
        Self {
            source_directory: source.into(),
            album_directory: Some(albums.into()),
            ..Default::default()
        }
    }

    pub fn album_directory(&self) -> &Path {
        self.album_directory
            .as_deref()
            .unwrap_or(&self.source_directory)
    }

    /// Number of modifier layers the slot geometry needs
    pub fn layer_count(&self) -> usize {
        if self.slots_per_layer == 0 {
            return 0;
        }
        self.max_slots / self.slots_per_layer
    }

    /// Check slot geometry
    pub fn validate(&self) -> Result<(), AppError> {
        validate_geometry(self.max_slots, self.slots_per_layer)?;

        if self.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return Err(AppError::Config("Image extension list is empty".to_string()));
        }

        Ok(())
    }
}

pub(crate) fn validate_geometry(max_slots: usize, slots_per_layer: usize) -> Result<(), AppError> {
    if max_slots == 0 {
        return Err(AppError::Config("max_slots must be greater than 0".to_string()));
    }

    if slots_per_layer == 0 || slots_per_layer > MAX_SLOTS_PER_LAYER {
        return Err(AppError::Config(format!(
            "slots_per_layer must be between 1 and {}, got {}",
            MAX_SLOTS_PER_LAYER, slots_per_layer
        )));
    }

    if max_slots % slots_per_layer != 0 {
        return Err(AppError::Config(format!(
            "max_slots ({}) is not a multiple of slots_per_layer ({})",
            max_slots, slots_per_layer
        )));
    }

    let layers = max_slots / slots_per_layer;
    if layers > ModifierLayer::ALL.len() {
        return Err(AppError::Config(format!(
            "{} slots need {} modifier layers, only {} exist",
            max_slots,
            layers,
            ModifierLayer::ALL.len()
        )));
    }

    Ok(())
}

/// Raw platform key codes. The host passes codes through unmodified; this
/// table is the only place they are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyConfig {
    /// Code of the "1" key; "2".."9" follow contiguously
    pub digit_base: u32,
    /// Code of keypad "1" when the platform reports keypad digits separately
    pub keypad_digit_base: Option<u32>,
    /// Digit codes outside the contiguous ranges, such as the symbols a
    /// layout reports for the digit row while Shift is held
    pub digits: Vec<DigitBinding>,
    pub skip: Vec<u32>,
    pub trash: Vec<u32>,
    pub modifiers: Vec<ModifierBinding>,
}

/// One raw code that stands for digit 1-9
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DigitBinding {
    pub code: u32,
    pub digit: u8,
}

impl DigitBinding {
    pub const fn new(code: u32, digit: u8) -> Self {
        Self { code, digit }
    }
}

/// One raw modifier code and the layer it selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModifierBinding {
    pub code: u32,
    pub layer: ModifierLayer,
}

impl ModifierBinding {
    pub const fn new(code: u32, layer: ModifierLayer) -> Self {
        Self { code, layer }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::qt_macos()
        } else {
            Self::qt()
        }
    }
}

impl KeyConfig {
    pub const QT_KEY_0: u32 = 0x30;
    pub const QT_KEY_1: u32 = 0x31;
    pub const QT_KEY_PERIOD: u32 = 0x2e;
    pub const QT_KEY_SHIFT: u32 = 0x0100_0020;
    pub const QT_KEY_CONTROL: u32 = 0x0100_0021;
    pub const QT_KEY_META: u32 = 0x0100_0022;
    pub const QT_KEY_ALT: u32 = 0x0100_0023;
    /// Key_Exclam .. Key_ParenLeft: Shift+1..9 on a US layout
    pub const QT_SHIFTED_DIGITS: [u32; 9] =
        [0x21, 0x40, 0x23, 0x24, 0x25, 0x5e, 0x26, 0x2a, 0x28];
    /// Key_ParenRight: Shift+0
    pub const QT_KEY_PARENRIGHT: u32 = 0x29;
    /// Key_Greater: Shift+.
    pub const QT_KEY_GREATER: u32 = 0x3e;

    /// Qt key codes. Keypad digits share the main digit codes. Qt reports
    /// the shifted symbol rather than the digit while Shift is held, so the
    /// US layout symbols are bound as well.
    pub fn qt() -> Self {
        let digits = (1u8..)
            .zip(Self::QT_SHIFTED_DIGITS)
            .map(|(digit, code)| DigitBinding::new(code, digit))
            .collect();

        Self {
            digit_base: Self::QT_KEY_1,
            keypad_digit_base: None,
            digits,
            skip: vec![Self::QT_KEY_0, Self::QT_KEY_PARENRIGHT],
            trash: vec![Self::QT_KEY_PERIOD, Self::QT_KEY_GREATER],
            modifiers: vec![
                ModifierBinding::new(Self::QT_KEY_SHIFT, ModifierLayer::Shift),
                ModifierBinding::new(Self::QT_KEY_CONTROL, ModifierLayer::Ctrl),
                ModifierBinding::new(Self::QT_KEY_ALT, ModifierLayer::Alt),
            ],
        }
    }

    /// Qt on macOS reports the physical Control key as Meta
    pub fn qt_macos() -> Self {
        Self {
            modifiers: vec![
                ModifierBinding::new(Self::QT_KEY_SHIFT, ModifierLayer::Shift),
                ModifierBinding::new(Self::QT_KEY_META, ModifierLayer::Ctrl),
                ModifierBinding::new(Self::QT_KEY_ALT, ModifierLayer::Alt),
            ],
            ..Self::qt()
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, falling back to defaults if it is absent
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "ImageSack", "ImageSack")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}
