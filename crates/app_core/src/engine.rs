//! Dispatch engine: owns all session state and turns key events into file actions

use crate::config::{AppConfig, KeyConfig, SessionConfig};
use crate::{
    ActionOutcome, ActionReport, AlbumSlotTable, AppError, DispatchObserver, ImageAction,
    ImageQueue, KeyDispatcher, KeyMap, ModifierLayer, ModifierLayerTracker, PendingAction,
};
use app_fs::{DefaultFileMover, FileMover};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Engine state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Suspended by the host (e.g. window lost focus); key events are ignored
    Idle,
    AwaitingKey,
    /// A file action is executing
    Processing,
    /// Every image has been filed or skipped; terminal
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Down,
    Up,
}

/// Raw key event, code passed through from the platform unmodified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: u32,
    pub kind: KeyKind,
    pub timestamp: DateTime<Utc>,
}

impl KeyEvent {
    pub fn down(code: u32) -> Self {
        Self {
            code,
            kind: KeyKind::Down,
            timestamp: Utc::now(),
        }
    }

    pub fn up(code: u32) -> Self {
        Self {
            code,
            kind: KeyKind::Up,
            timestamp: Utc::now(),
        }
    }
}

/// Result of feeding one key event to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResponse {
    /// Nothing happened
    Ignored,
    /// Active layer changed; the UI should show `visible_slots()`
    LayerChanged(ModifierLayer),
    /// Digit pointed at a slot with no album
    EmptySlot(usize),
    /// A Move/Skip/Trash was resolved; the observer saw the same report
    Action(ActionReport),
}

/// One dispatch session over a fixed snapshot of the source directory
pub struct DispatchEngine {
    slots: AlbumSlotTable,
    queue: ImageQueue,
    tracker: ModifierLayerTracker,
    dispatcher: KeyDispatcher,
    mover: Box<dyn FileMover>,
    observer: Box<dyn DispatchObserver>,
    state: EngineState,
}

impl DispatchEngine {
    /// Build the slot table and image queue. Any error aborts the session.
    pub fn open(
        config: &SessionConfig,
        keys: &KeyConfig,
        mover: Box<dyn FileMover>,
        observer: Box<dyn DispatchObserver>,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let keymap = KeyMap::from_config(keys, config.layer_count())?;
        let slots = AlbumSlotTable::build(
            config.album_directory(),
            config.max_slots,
            config.slots_per_layer,
        )?;
        let queue = ImageQueue::scan(&config.source_directory, &config.extensions)?;

        Ok(Self::from_parts(slots, queue, keymap, mover, observer))
    }

    /// Open a session using the default file mover
    pub fn from_app_config(
        config: &AppConfig,
        observer: Box<dyn DispatchObserver>,
    ) -> Result<Self, AppError> {
        let session = &config.session;
        let mover = DefaultFileMover::new(session.trash.clone(), session.verify);
        Self::open(session, &config.keys, Box::new(mover), observer)
    }

    pub fn from_parts(
        slots: AlbumSlotTable,
        queue: ImageQueue,
        keymap: KeyMap,
        mover: Box<dyn FileMover>,
        observer: Box<dyn DispatchObserver>,
    ) -> Self {
        let state = if queue.is_exhausted() {
            tracing::info!("No images to file");
            EngineState::Exhausted
        } else {
            EngineState::AwaitingKey
        };

        let tracker = keymap.tracker();
        let dispatcher = KeyDispatcher::new(keymap, slots.slots_per_layer());

        Self {
            slots,
            queue,
            tracker,
            dispatcher,
            mover,
            observer,
            state,
        }
    }

    pub fn handle(&mut self, event: &KeyEvent) -> KeyResponse {
        match event.kind {
            KeyKind::Down => self.key_down(event.code, event.timestamp),
            KeyKind::Up => self.key_up(event.code, event.timestamp),
        }
    }

    pub fn key_down(&mut self, code: u32, timestamp: DateTime<Utc>) -> KeyResponse {
        if self.state != EngineState::AwaitingKey {
            tracing::trace!("Key {} ignored in state {:?}", code, self.state);
            return KeyResponse::Ignored;
        }

        match self.dispatcher.resolve(code, self.tracker.active()) {
            PendingAction::LayerChange(_) => match self.tracker.on_key_down(code) {
                Some(layer) => KeyResponse::LayerChanged(layer),
                None => KeyResponse::Ignored,
            },
            PendingAction::Noop => KeyResponse::Ignored,
            PendingAction::SelectSlot(index) => match self.slots.lookup(index).cloned() {
                Some(album) => self.execute(ImageAction::Move { album }, timestamp),
                None => {
                    tracing::info!("Slot {} has no album", index);
                    KeyResponse::EmptySlot(index)
                }
            },
            PendingAction::Skip => self.execute(ImageAction::Skip, timestamp),
            PendingAction::Trash => self.execute(ImageAction::Trash, timestamp),
        }
    }

    pub fn key_up(&mut self, code: u32, _timestamp: DateTime<Utc>) -> KeyResponse {
        if self.state != EngineState::AwaitingKey {
            return KeyResponse::Ignored;
        }

        if self.tracker.on_key_up(code) {
            KeyResponse::LayerChanged(ModifierLayer::None)
        } else {
            KeyResponse::Ignored
        }
    }

    /// Run one file action on the current image to completion
    fn execute(&mut self, action: ImageAction, timestamp: DateTime<Utc>) -> KeyResponse {
        let image = match self.queue.current() {
            Some(image) => image.to_path_buf(),
            None => {
                self.state = EngineState::Exhausted;
                return KeyResponse::Ignored;
            }
        };

        self.state = EngineState::Processing;

        let result = match &action {
            ImageAction::Move { album } => self.mover.move_to(&image, &album.path).map(Some),
            ImageAction::Skip => {
                self.mover.skip(&image);
                Ok(None)
            }
            ImageAction::Trash => self.mover.trash(&image),
        };

        let outcome = match result {
            Ok(destination) => {
                self.queue.advance();
                ActionOutcome::Success { destination }
            }
            Err(e) => {
                // The image stays current so the user can retry or skip it
                tracing::warn!("{:?} failed for {}: {}", action, image.display(), e);
                ActionOutcome::from(&e)
            }
        };

        self.state = if self.queue.is_exhausted() {
            tracing::info!("All {} images processed", self.queue.len());
            EngineState::Exhausted
        } else {
            EngineState::AwaitingKey
        };

        let report = ActionReport {
            image,
            action,
            outcome,
            remaining: self.queue.remaining(),
            timestamp,
        };
        self.observer.on_action(&report);

        KeyResponse::Action(report)
    }

    /// Stop reacting to keys. Held modifiers are forgotten because their
    /// key-up may never arrive.
    pub fn suspend(&mut self) {
        if self.state == EngineState::AwaitingKey {
            self.tracker.reset();
            self.state = EngineState::Idle;
        }
    }

    pub fn resume(&mut self) {
        if self.state == EngineState::Idle {
            self.state = EngineState::AwaitingKey;
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn current_image(&self) -> Option<&Path> {
        self.queue.current()
    }

    pub fn remaining(&self) -> usize {
        self.queue.remaining()
    }

    pub fn active_layer(&self) -> ModifierLayer {
        self.tracker.active()
    }

    /// Slot labels for the active layer
    pub fn visible_slots(&self) -> Vec<(usize, Option<String>)> {
        self.slots.layer_snapshot(self.tracker.active())
    }

    pub fn slot_table(&self) -> &AlbumSlotTable {
        &self.slots
    }

    pub fn keymap(&self) -> &KeyMap {
        self.dispatcher.keymap()
    }
}
