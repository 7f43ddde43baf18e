//! Audio capture from microphone

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::config::CaptureParams;
use crate::{Error, Result};

use super::{AudioFrame, f32_to_i16};

/// Poll interval while waiting for the device to fill a frame
const READ_POLL: Duration = Duration::from_millis(10);

/// Opens capture streams
///
/// Abstracted so recording sessions can run against fakes in tests.
pub trait CaptureSource: Send + Sync {
    /// Open the device and start capturing
    ///
    /// # Errors
    ///
    /// Returns `CaptureUnavailable` if the device cannot be opened. No
    /// other resources are acquired on failure.
    fn open(&self, params: &CaptureParams) -> Result<Box<dyn CaptureStream>>;
}

/// A live capture stream producing fixed-size frames
#[async_trait]
pub trait CaptureStream: Send {
    /// Read the next frame, waiting until the device has produced enough
    /// audio to fill it
    async fn read_frame(&mut self) -> Result<AudioFrame>;

    /// Stop capturing and release the device
    fn close(&mut self);
}

/// Captures audio from the default input device
///
/// The cpal stream is owned by a dedicated thread (cpal streams are not
/// `Send`); the returned [`CaptureStream`] reads PCM bytes from a shared
/// ring buffer filled by the stream callback.
pub struct MicSource;

impl CaptureSource for MicSource {
    fn open(&self, params: &CaptureParams) -> Result<Box<dyn CaptureStream>> {
        let buffer: Arc<Mutex<VecDeque<u8>>> = Arc::new(Mutex::new(VecDeque::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();
        let thread_buffer = Arc::clone(&buffer);
        let thread_stop = Arc::clone(&stop);
        let sample_rate = params.sample_rate;

        std::thread::spawn(move || {
            run_capture_thread(sample_rate, &thread_buffer, &thread_stop, &ready_tx);
        });

        ready_rx
            .recv()
            .map_err(|_| Error::CaptureUnavailable("capture thread exited".to_string()))??;

        tracing::debug!(sample_rate, frame_bytes = params.frame_bytes, "audio capture started");

        Ok(Box::new(MicStream {
            buffer,
            stop,
            frame_bytes: params.frame_bytes,
        }))
    }
}

/// Build and run the cpal input stream until stopped
fn run_capture_thread(
    sample_rate: u32,
    buffer: &Arc<Mutex<VecDeque<u8>>>,
    stop: &Arc<AtomicBool>,
    ready_tx: &std::sync::mpsc::Sender<Result<()>>,
) {
    let stream = match build_input_stream(sample_rate, Arc::clone(buffer)) {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(Error::CaptureUnavailable(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(50));
    }

    drop(stream);
    tracing::debug!("audio capture stopped");
}

/// Open the default input device and build a mono stream at the given rate
fn build_input_stream(
    sample_rate: u32,
    buffer: Arc<Mutex<VecDeque<u8>>>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();

    let device = host
        .default_input_device()
        .ok_or_else(|| Error::CaptureUnavailable("no input device available".to_string()))?;

    let supported_config = device
        .supported_input_configs()
        .map_err(|e| Error::CaptureUnavailable(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(sample_rate)
                && c.max_sample_rate() >= SampleRate(sample_rate)
        })
        .ok_or_else(|| Error::CaptureUnavailable("no suitable audio config found".to_string()))?;

    let config: StreamConfig = supported_config.with_sample_rate(SampleRate(sample_rate)).config();

    tracing::debug!(
        device = device.name().unwrap_or_default(),
        sample_rate,
        channels = config.channels,
        "audio capture initialized"
    );

    device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    for &sample in data {
                        buf.extend(f32_to_i16(sample).to_le_bytes());
                    }
                }
            },
            |err| {
                tracing::error!(error = %err, "audio capture error");
            },
            None,
        )
        .map_err(|e| Error::CaptureUnavailable(e.to_string()))
}

/// Frame reader over the capture ring buffer
struct MicStream {
    buffer: Arc<Mutex<VecDeque<u8>>>,
    stop: Arc<AtomicBool>,
    frame_bytes: usize,
}

#[async_trait]
impl CaptureStream for MicStream {
    async fn read_frame(&mut self) -> Result<AudioFrame> {
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return Err(Error::Audio("capture stream closed".to_string()));
            }

            {
                let mut buf = self
                    .buffer
                    .lock()
                    .map_err(|_| Error::Audio("capture buffer poisoned".to_string()))?;
                if buf.len() >= self.frame_bytes {
                    let bytes: Vec<u8> = buf.drain(..self.frame_bytes).collect();
                    return Ok(AudioFrame { bytes });
                }
            }

            tokio::time::sleep(READ_POLL).await;
        }
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for MicStream {
    fn drop(&mut self) {
        self.close();
    }
}
