//! Decoder backend on symphonia and cpal

use super::decoder::AudioDecoder;
use super::playback_thread::{PlaybackCommand, PlaybackThread};
use super::{DecoderBackend, DecoderHandle, EventSender, OpenRequest, SessionEvent};
use crate::error::EngineError;
use std::thread;

/// Opens chapters from local files and plays them on the default device
pub struct SymphoniaBackend {
    events: EventSender,
}

impl SymphoniaBackend {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl DecoderBackend for SymphoniaBackend {
    fn open(&mut self, request: OpenRequest) {
        let events = self.events.clone();
        let generation = request.generation;

        let spawned = thread::Builder::new()
            .name(format!("probe-{}", generation))
            .spawn(move || {
                let result = open_handle(&request, events.clone());
                if let Err(e) = &result {
                    log::warn!("Could not open {}: {}", request.file.display(), e);
                }
                let _ = events.send(SessionEvent::Opened { generation, result });
            });

        if let Err(e) = spawned {
            let _ = self.events.send(SessionEvent::Opened {
                generation,
                result: Err(EngineError::IoError(e)),
            });
        }
    }
}

fn open_handle(
    request: &OpenRequest,
    events: EventSender,
) -> Result<super::BoxedHandle, EngineError> {
    let decoder = AudioDecoder::open(&request.file)?;
    let duration_ms = decoder.duration_ms();
    let thread = PlaybackThread::spawn(decoder, request.generation, events)?;
    log::debug!(
        "Opened {} ({} ms)",
        request.file.display(),
        duration_ms
    );
    Ok(Box::new(SymphoniaHandle {
        thread,
        duration_ms,
    }))
}

struct SymphoniaHandle {
    thread: PlaybackThread,
    duration_ms: u64,
}

impl SymphoniaHandle {
    fn command(&self, cmd: PlaybackCommand) -> Result<(), EngineError> {
        if !self.thread.is_running() {
            return Err(EngineError::InvalidState(
                "playback thread has stopped".to_string(),
            ));
        }
        self.thread.send_command(cmd)
    }
}

impl DecoderHandle for SymphoniaHandle {
    fn start(&mut self) -> Result<(), EngineError> {
        self.command(PlaybackCommand::Play)
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.command(PlaybackCommand::Pause)
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), EngineError> {
        self.command(PlaybackCommand::Seek(position_ms))
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn position_ms(&self) -> u64 {
        self.thread.position_ms()
    }

    fn release(self: Box<Self>) {
        let mut handle = *self;
        handle.thread.stop();
    }
}
