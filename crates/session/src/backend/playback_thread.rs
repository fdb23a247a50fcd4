// FILE: crates/session/src/backend/playback_thread.rs

use super::decoder::AudioDecoder;
use super::output::{AudioOutput, PlaybackClock};
use super::{EventSender, SessionEvent};
use crate::error::{EngineError, EngineResult};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

/// Decoded packets buffered ahead of the device
const AUDIO_QUEUE_DEPTH: usize = 4;
/// How long the loop blocks on commands or a full queue before re-checking `running`
const POLL_INTERVAL: StdDuration = StdDuration::from_millis(20);

/// Commands sent to the playback thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// Start or continue feeding the device
    Play,
    /// Suspend the device stream and stop decoding
    Pause,
    /// Jump to a position in milliseconds, dropping queued audio
    Seek(u64),
    /// Leave the loop and release the device
    Stop,
}

/// Owns the thread that decodes one chapter and feeds the output device
pub struct PlaybackThread {
    handle: Option<thread::JoinHandle<()>>,
    command_tx: Sender<PlaybackCommand>,
    running: Arc<AtomicBool>,
    clock: Arc<PlaybackClock>,
}

impl PlaybackThread {
    /// Moves an opened decoder onto its own thread, initially paused
    ///
    /// `Completed` and `Failed` events are tagged with `generation`.
    pub fn spawn(decoder: AudioDecoder, generation: u64, events: EventSender) -> EngineResult<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let spec = *decoder.spec();
        let clock = Arc::new(PlaybackClock::new(
            spec.rate,
            spec.channels.count() as u16,
        ));
        let (command_tx, command_rx) = bounded(16);

        let running_clone = Arc::clone(&running);
        let clock_clone = Arc::clone(&clock);

        let handle = thread::Builder::new()
            .name(format!("playback-{}", generation))
            .spawn(move || {
                let outcome =
                    playback_loop(decoder, &command_rx, &running_clone, &clock_clone, || {
                        let _ = events.send(SessionEvent::Completed { generation });
                    });

                if let Err(e) = outcome {
                    log::error!("Playback thread error: {}", e);
                    let _ = events.send(SessionEvent::Failed {
                        generation,
                        message: e.to_string(),
                    });
                }
            })?;

        Ok(Self {
            handle: Some(handle),
            command_tx,
            running,
            clock,
        })
    }

    /// Queues a command for the thread
    pub fn send_command(&self, cmd: PlaybackCommand) -> EngineResult<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| EngineError::InvalidState(format!("Failed to send command: {}", e)))
    }

    /// Position of the audio the device has played so far
    pub fn position_ms(&self) -> u64 {
        self.clock.position_ms()
    }

    /// False once the thread has stopped or the output hung up
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stops the thread and waits for it to release the device
    pub fn stop(&mut self) {
        let _ = self.command_tx.try_send(PlaybackCommand::Stop);
        self.running.store(false, Ordering::Relaxed);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PlaybackThread {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decodes into the output queue until end of stream, `Stop`, or an error
///
/// At end of stream the loop waits for the queue to drain before calling
/// `on_complete`, so the event fires once the last packet reached the device.
fn playback_loop(
    mut decoder: AudioDecoder,
    command_rx: &Receiver<PlaybackCommand>,
    running: &Arc<AtomicBool>,
    clock: &Arc<PlaybackClock>,
    on_complete: impl Fn(),
) -> EngineResult<()> {
    let spec = *decoder.spec();

    let (audio_tx, audio_rx) = bounded::<Vec<f32>>(AUDIO_QUEUE_DEPTH);
    let mut output = AudioOutput::new(spec.rate, spec.channels.count() as u16)?;
    let flush_rx = audio_rx.clone();
    output.play(audio_rx, Arc::clone(running), Arc::clone(clock))?;
    output.pause();

    let mut playing = false;
    let mut draining = false;
    let mut format_warned = false;

    while running.load(Ordering::Relaxed) {
        let command = if playing {
            command_rx.try_recv().ok()
        } else {
            match command_rx.recv_timeout(POLL_INTERVAL) {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        };

        match command {
            Some(PlaybackCommand::Play) => {
                playing = true;
                output.resume();
            }
            Some(PlaybackCommand::Pause) => {
                playing = false;
                output.pause();
            }
            Some(PlaybackCommand::Seek(ms)) => {
                decoder.seek(ms)?;
                // drop audio decoded before the seek point
                while flush_rx.try_recv().is_ok() {}
                draining = false;
                clock.reset(ms);
            }
            Some(PlaybackCommand::Stop) => break,
            None => {}
        }

        if !playing {
            continue;
        }

        if draining {
            if audio_tx.is_empty() {
                draining = false;
                playing = false;
                log::debug!("Chapter finished");
                on_complete();
            } else {
                thread::sleep(POLL_INTERVAL);
            }
            continue;
        }

        match decoder.decode_next()? {
            Some(decoded) => {
                if decoded.spec != spec && !format_warned {
                    format_warned = true;
                    log::warn!(
                        "Stream format changed to {} Hz / {} channels; output stays at {} Hz",
                        decoded.spec.rate,
                        decoded.spec.channels.count(),
                        spec.rate
                    );
                }
                let mut chunk = decoded.samples;
                loop {
                    match audio_tx.send_timeout(chunk, POLL_INTERVAL) {
                        Ok(()) => break,
                        Err(SendTimeoutError::Timeout(back)) => {
                            if !running.load(Ordering::Relaxed) {
                                return Ok(());
                            }
                            chunk = back;
                        }
                        Err(SendTimeoutError::Disconnected(_)) => {
                            return Err(EngineError::OutputError(
                                "Audio output disconnected".to_string(),
                            ));
                        }
                    }
                }
            }
            None => draining = true,
        }
    }

    output.stop();
    Ok(())
}
