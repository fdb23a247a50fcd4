//! Deterministic decoder backend
//!
//! Records every open request and leaves it pending until the caller resolves
//! it with [`ScriptedBackend::complete_open`], so open completions can be
//! delivered late or out of order. Live handles are counted to check that the
//! session never holds more than one.

use super::{BoxedHandle, DecoderBackend, DecoderHandle, EventSender, OpenRequest, SessionEvent};
use crate::error::EngineError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Control call made on a scripted handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleCall {
    Start { generation: u64 },
    Pause { generation: u64 },
    Seek { generation: u64, position_ms: u64 },
    Release { generation: u64 },
}

#[derive(Default)]
struct Script {
    requests: Vec<OpenRequest>,
    durations: HashMap<PathBuf, u64>,
    default_duration_ms: u64,
    failing: HashSet<PathBuf>,
    auto_open: Option<EventSender>,
    live_handles: usize,
    calls: Vec<HandleCall>,
    positions: HashMap<u64, u64>,
}

#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every open request immediately through `events`
    pub fn auto_open(events: EventSender) -> Self {
        let backend = Self::new();
        backend.lock().auto_open = Some(events);
        backend
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_default_duration(self, duration_ms: u64) -> Self {
        self.lock().default_duration_ms = duration_ms;
        self
    }

    pub fn set_duration(&self, file: impl Into<PathBuf>, duration_ms: u64) {
        self.lock().durations.insert(file.into(), duration_ms);
    }

    /// Opens of `file` will fail
    pub fn fail_file(&self, file: impl Into<PathBuf>) {
        self.lock().failing.insert(file.into());
    }

    pub fn requests(&self) -> Vec<OpenRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<OpenRequest> {
        self.lock().requests.last().cloned()
    }

    pub fn live_handles(&self) -> usize {
        self.lock().live_handles
    }

    pub fn calls(&self) -> Vec<HandleCall> {
        self.lock().calls.clone()
    }

    /// Moves the playhead of the handle opened for `generation`
    pub fn set_position(&self, generation: u64, position_ms: u64) {
        self.lock().positions.insert(generation, position_ms);
    }

    /// Builds the open completion for the request with `generation`
    pub fn complete_open(&self, generation: u64) -> SessionEvent {
        SessionEvent::Opened {
            generation,
            result: self.open_result(generation),
        }
    }

    fn open_result(&self, generation: u64) -> Result<BoxedHandle, EngineError> {
        let mut script = self.lock();

        let file = script
            .requests
            .iter()
            .find(|r| r.generation == generation)
            .map(|r| r.file.clone())
            .ok_or_else(|| {
                EngineError::InvalidState(format!("no open request for generation {}", generation))
            })?;

        if script.failing.contains(&file) {
            return Err(EngineError::DecodeError(format!(
                "cannot decode {}",
                file.display()
            )));
        }

        let duration_ms = duration_for(&script, &file);
        script.live_handles += 1;
        script.positions.insert(generation, 0);

        Ok(Box::new(ScriptedHandle {
            script: Arc::clone(&self.script),
            generation,
            duration_ms,
        }))
    }
}

fn duration_for(script: &Script, file: &Path) -> u64 {
    script
        .durations
        .get(file)
        .copied()
        .unwrap_or(script.default_duration_ms)
}

impl DecoderBackend for ScriptedBackend {
    fn open(&mut self, request: OpenRequest) {
        let generation = request.generation;
        let auto_open = {
            let mut script = self.lock();
            script.requests.push(request);
            script.auto_open.clone()
        };

        if let Some(events) = auto_open {
            let _ = events.send(self.complete_open(generation));
        }
    }
}

struct ScriptedHandle {
    script: Arc<Mutex<Script>>,
    generation: u64,
    duration_ms: u64,
}

impl ScriptedHandle {
    fn record(&self, call: HandleCall) {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .calls
            .push(call);
    }
}

impl DecoderHandle for ScriptedHandle {
    fn start(&mut self) -> Result<(), EngineError> {
        self.record(HandleCall::Start {
            generation: self.generation,
        });
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.record(HandleCall::Pause {
            generation: self.generation,
        });
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), EngineError> {
        self.record(HandleCall::Seek {
            generation: self.generation,
            position_ms,
        });
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .positions
            .insert(self.generation, position_ms);
        Ok(())
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn position_ms(&self) -> u64 {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .positions
            .get(&self.generation)
            .copied()
            .unwrap_or(0)
    }

    fn release(self: Box<Self>) {
        self.record(HandleCall::Release {
            generation: self.generation,
        });
    }
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        script.live_handles = script.live_handles.saturating_sub(1);
    }
}
