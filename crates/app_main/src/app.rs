//! Host loop: line protocol over stdin/stdout
//!
//! Input, one per line:
//!   down <code> | up <code>     raw platform key code, decimal or 0x-hex
//!   focus-out | focus-in        host window lost / regained keyboard focus
//!   slots                       print the visible slot labels
//!   quit
//!
//! Output is one JSON object per line.

use anyhow::Result;
use app_core::{ActionReport, DispatchEngine, EngineState, KeyResponse, ModifierLayer};
use chrono::Utc;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostCommand {
    KeyDown(u32),
    KeyUp(u32),
    FocusOut,
    FocusIn,
    Slots,
    Quit,
}

#[derive(Debug, Serialize)]
struct SlotLabel {
    slot: usize,
    /// Digit key that selects the slot under the active layer
    key: usize,
    album: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum HostMessage {
    Session {
        current: Option<PathBuf>,
        remaining: usize,
        albums: usize,
        dropped_albums: usize,
    },
    Slots {
        layer: ModifierLayer,
        /// Caption for the label set, empty for the base layer
        label: &'static str,
        slots: Vec<SlotLabel>,
    },
    Action(ActionReport),
    EmptySlot {
        slot: usize,
    },
    Exhausted,
    Error {
        message: String,
    },
}

/// Run the host loop until stdin closes or `quit`
pub fn run(mut engine: DispatchEngine) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    emit(&mut out, &session_message(&engine))?;
    emit(&mut out, &slots_message(&engine))?;
    if engine.state() == EngineState::Exhausted {
        emit(&mut out, &HostMessage::Exhausted)?;
    }

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(c) => c,
            Err(message) => {
                emit(&mut out, &HostMessage::Error { message })?;
                continue;
            }
        };

        if command == HostCommand::Quit {
            break;
        }

        for message in apply(&mut engine, command) {
            emit(&mut out, &message)?;
        }
    }

    tracing::info!("Session ended with {} images remaining", engine.remaining());
    Ok(())
}

fn apply(engine: &mut DispatchEngine, command: HostCommand) -> Vec<HostMessage> {
    let was_exhausted = engine.state() == EngineState::Exhausted;

    let response = match command {
        HostCommand::KeyDown(code) => engine.key_down(code, Utc::now()),
        HostCommand::KeyUp(code) => engine.key_up(code, Utc::now()),
        HostCommand::FocusOut => {
            let layer = engine.active_layer();
            engine.suspend();
            if layer != engine.active_layer() {
                KeyResponse::LayerChanged(engine.active_layer())
            } else {
                KeyResponse::Ignored
            }
        }
        HostCommand::FocusIn => {
            engine.resume();
            KeyResponse::Ignored
        }
        HostCommand::Slots => return vec![slots_message(engine)],
        HostCommand::Quit => return Vec::new(),
    };

    let mut messages = match response {
        KeyResponse::Ignored => Vec::new(),
        KeyResponse::LayerChanged(_) => vec![slots_message(engine)],
        KeyResponse::EmptySlot(slot) => vec![HostMessage::EmptySlot { slot }],
        KeyResponse::Action(report) => vec![HostMessage::Action(report)],
    };

    if !was_exhausted && engine.state() == EngineState::Exhausted {
        messages.push(HostMessage::Exhausted);
    }

    messages
}

fn parse_command(line: &str) -> Result<HostCommand, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default();

    let command = match verb {
        "down" | "up" => {
            let raw = parts
                .next()
                .ok_or_else(|| format!("'{}' needs a key code", verb))?;
            let code = parse_code(raw)?;
            if verb == "down" {
                HostCommand::KeyDown(code)
            } else {
                HostCommand::KeyUp(code)
            }
        }
        "focus-out" => HostCommand::FocusOut,
        "focus-in" => HostCommand::FocusIn,
        "slots" => HostCommand::Slots,
        "quit" => HostCommand::Quit,
        other => return Err(format!("Unknown command: {}", other)),
    };

    if let Some(extra) = parts.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }

    Ok(command)
}

fn parse_code(raw: &str) -> Result<u32, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| format!("Invalid key code '{}': {}", raw, e))
}

fn session_message(engine: &DispatchEngine) -> HostMessage {
    let table = engine.slot_table();
    HostMessage::Session {
        current: engine.current_image().map(PathBuf::from),
        remaining: engine.remaining(),
        albums: table.populated(),
        dropped_albums: table.dropped(),
    }
}

fn slots_message(engine: &DispatchEngine) -> HostMessage {
    let slots = engine
        .visible_slots()
        .into_iter()
        .enumerate()
        .map(|(i, (slot, album))| SlotLabel {
            slot,
            key: i + 1,
            album,
        })
        .collect();

    let layer = engine.active_layer();
    HostMessage::Slots {
        layer,
        label: layer.label(),
        slots,
    }
}

fn emit(out: &mut impl Write, message: &HostMessage) -> Result<()> {
    serde_json::to_writer(&mut *out, message)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
