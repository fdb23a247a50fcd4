// FILE: crates/session/src/backend/output.rs

use crate::error::{EngineError, EngineResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use crossbeam_channel::{Receiver, TryRecvError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Position of what the device has actually played
///
/// The output callback advances it by the samples it copies to the device,
/// so audio still queued between decoder and device is not counted.
#[derive(Debug)]
pub struct PlaybackClock {
    base_ms: AtomicU64,
    played_samples: AtomicU64,
    epoch: AtomicU64,
    samples_per_second: u64,
}

impl PlaybackClock {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            base_ms: AtomicU64::new(0),
            played_samples: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
            samples_per_second: u64::from(sample_rate) * u64::from(channels),
        }
    }

    pub fn position_ms(&self) -> u64 {
        let base = self.base_ms.load(Ordering::Relaxed);
        if self.samples_per_second == 0 {
            return base;
        }
        let played = self.played_samples.load(Ordering::Relaxed);
        base.saturating_add(played.saturating_mul(1000) / self.samples_per_second)
    }

    /// Restarts the clock at `position_ms`
    ///
    /// Bumps the epoch so the callback drops the buffer it is halfway through.
    pub fn reset(&self, position_ms: u64) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.played_samples.store(0, Ordering::Relaxed);
        self.base_ms.store(position_ms, Ordering::Relaxed);
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn advance(&self, samples: u64) {
        if samples > 0 {
            self.played_samples.fetch_add(samples, Ordering::Relaxed);
        }
    }
}

/// Audio output on the host's default device
pub struct AudioOutput {
    device: Device,
    device_name: String,
    config: StreamConfig,
    stream: Option<Stream>,
}

impl AudioOutput {
    /// Prepares the default output device for interleaved f32 at the given format
    pub fn new(sample_rate: u32, channels: u16) -> EngineResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::OutputError("No output device available".to_string()))?;

        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self {
            device,
            device_name,
            config,
            stream: None,
        })
    }

    /// Starts pulling interleaved samples from `rx`
    ///
    /// Underruns are filled with silence. `running` is cleared once the
    /// sending side hangs up. Every sample handed to the device advances
    /// `clock`.
    pub fn play(
        &mut self,
        rx: Receiver<Vec<f32>>,
        running: Arc<AtomicBool>,
        clock: Arc<PlaybackClock>,
    ) -> EngineResult<()> {
        let mut buffer: Vec<f32> = Vec::new();
        let mut position = 0;
        let mut epoch = clock.epoch();

        let device_name = self.device_name.clone();

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let current = clock.epoch();
                    if current != epoch {
                        buffer.clear();
                        position = 0;
                        epoch = current;
                    }

                    let mut played = 0u64;
                    for sample in data.iter_mut() {
                        while position >= buffer.len() {
                            match rx.try_recv() {
                                Ok(new_data) => {
                                    buffer = new_data;
                                    position = 0;
                                }
                                Err(TryRecvError::Empty) => {
                                    *sample = 0.0;
                                    break;
                                }
                                Err(TryRecvError::Disconnected) => {
                                    running.store(false, Ordering::Relaxed);
                                    *sample = 0.0;
                                    break;
                                }
                            }
                        }

                        if position < buffer.len() {
                            *sample = buffer[position];
                            position += 1;
                            played += 1;
                        }
                    }
                    clock.advance(played);
                },
                move |err| {
                    log::error!("Audio output error on device '{}': {}", device_name, err);
                },
                None,
            )
            .map_err(|e| EngineError::OutputError(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| EngineError::OutputError(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        log::debug!("Audio output started on device: {}", self.device_name);
        Ok(())
    }

    /// Suspends the device stream without dropping it
    pub fn pause(&self) {
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.pause() {
                log::warn!("Could not pause output stream: {}", e);
            }
        }
    }

    /// Restarts a paused stream
    pub fn resume(&self) {
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.play() {
                log::warn!("Could not resume output stream: {}", e);
            }
        }
    }

    /// Drops the device stream
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("Audio output stopped on device: {}", self.device_name);
        }
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
