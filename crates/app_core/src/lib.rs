//! ImageSack Core Domain Logic
//!
//! This crate contains:
//! - Album slot table construction
//! - Modifier layer tracking and key dispatch
//! - The dispatch engine state machine and its worker thread
//! - Configuration
//! - Error types

pub mod album;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod keymap;
pub mod layer;
pub mod observer;
pub mod queue;
pub mod worker;

pub use album::{Album, AlbumSlotTable};
pub use command::{KeyDispatcher, PendingAction};
pub use config::{AppConfig, DigitBinding, KeyConfig, ModifierBinding, SessionConfig};
pub use engine::{DispatchEngine, EngineState, KeyEvent, KeyKind, KeyResponse};
pub use error::AppError;
pub use keymap::{KeyMap, KeyRole};
pub use layer::{ModifierLayer, ModifierLayerTracker};
pub use observer::{ActionOutcome, ActionReport, DispatchObserver, ImageAction, LogObserver};
pub use queue::ImageQueue;
pub use worker::{DispatchWorker, Submission};
