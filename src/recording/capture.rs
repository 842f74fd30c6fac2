//! Microphone capture.
//!
//! Defines the chunk sink shared between the capture callback and the
//! session state machine, the `CaptureSource` trait that abstracts the
//! device, and the cpal-backed implementation. Multi-channel input is
//! downmixed to mono by averaging channels.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// One delivery unit of captured audio: mono i16 PCM samples.
pub type Chunk = Vec<i16>;

/// Shared, gated sink the capture callback appends chunks into.
///
/// Chunks arrive in delivery order and are only accepted while the gate is
/// open. The session state machine opens the gate on start/resume and closes
/// it on pause/stop, so a paused or stopped session never accumulates audio
/// even if the device keeps delivering.
#[derive(Clone, Default)]
pub struct ChunkSink {
    chunks: Arc<Mutex<Vec<Chunk>>>,
    accepting: Arc<AtomicBool>,
}

impl ChunkSink {
    pub fn new() -> Self {
        Self {
            chunks: Arc::new(Mutex::new(Vec::new())),
            accepting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Appends a chunk if the gate is open. Empty chunks are ignored.
    pub fn push(&self, chunk: Chunk) {
        if chunk.is_empty() || !self.accepting.load(Ordering::Relaxed) {
            return;
        }
        self.chunks.lock().unwrap().push(chunk);
    }

    /// Opens or closes the gate.
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::Relaxed);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Relaxed)
    }

    /// Discards all accumulated chunks.
    pub fn clear(&self) {
        self.chunks.lock().unwrap().clear();
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    /// Returns all accumulated samples flattened into one buffer.
    pub fn samples(&self) -> Vec<i16> {
        self.chunks.lock().unwrap().iter().flatten().copied().collect()
    }

    /// Returns up to the last `max` samples, for visualization.
    pub fn recent_samples(&self, max: usize) -> Vec<i16> {
        let chunks = self.chunks.lock().unwrap();
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        let skip = total.saturating_sub(max);
        chunks.iter().flatten().copied().skip(skip).collect()
    }
}

/// A source of audio chunks.
///
/// The production implementation wraps a cpal input stream; tests drive the
/// session with a scripted source instead of a device.
pub trait CaptureSource {
    /// Opens the device and begins delivering chunks into the sink.
    /// Returns the actual capture sample rate.
    fn open(&mut self, sink: ChunkSink) -> Result<u32>;

    /// Stops delivery and releases the device. Must be safe to call on every
    /// exit path, including after a failed `open`.
    fn close(&mut self);
}

/// Captures mono PCM from a cpal input device.
pub struct CpalCapture {
    /// Device name, numeric index, or "default"
    device_name: String,
    /// Requested sample rate (device native rate wins)
    requested_sample_rate: u32,
    /// Active input stream, kept alive while capturing
    stream: Option<cpal::Stream>,
}

impl CpalCapture {
    pub fn new(requested_sample_rate: u32, device_name: String) -> Self {
        Self {
            device_name,
            requested_sample_rate,
            stream: None,
        }
    }
}

impl CaptureSource for CpalCapture {
    fn open(&mut self, sink: ChunkSink) -> Result<u32> {
        // Acquire the device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if sample_rate != self.requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Capturing at device rate.",
                self.requested_sample_rate,
                sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            sample_rate,
            num_channels
        );

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                sink.push(downmix_to_mono(data, num_channels));
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(sample_rate)
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Audio stream released");
        }
    }
}

/// Converts an interleaved buffer to mono by averaging channels.
fn downmix_to_mono(data: &[i16], num_channels: usize) -> Chunk {
    match num_channels {
        0 | 1 => data.to_vec(),
        2 => data
            .chunks_exact(2)
            .map(|pair| ((pair[0] as i32 + pair[1] as i32) / 2) as i16)
            .collect(),
        n => data
            .chunks_exact(n)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / n as i32) as i16
            })
            .collect(),
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
pub fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    // Numeric index first
    if let Ok(index) = device_spec.parse::<usize>() {
        let mut devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return Ok(devices.swap_remove(index));
        }
        return Err(anyhow!(
            "Device index {} is out of range (0-{})",
            index,
            devices.len().saturating_sub(1)
        ));
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'vrec list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_rejects_chunks_while_gate_closed() {
        let sink = ChunkSink::new();
        sink.push(vec![1, 2, 3]);
        assert_eq!(sink.chunk_count(), 0);

        sink.set_accepting(true);
        sink.push(vec![1, 2, 3]);
        assert_eq!(sink.chunk_count(), 1);

        sink.set_accepting(false);
        sink.push(vec![4, 5]);
        assert_eq!(sink.chunk_count(), 1);
    }

    #[test]
    fn sink_preserves_delivery_order() {
        let sink = ChunkSink::new();
        sink.set_accepting(true);
        sink.push(vec![1, 2]);
        sink.push(vec![3]);
        sink.push(vec![4, 5, 6]);
        assert_eq!(sink.samples(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(sink.recent_samples(2), vec![5, 6]);
    }

    #[test]
    fn downmix_averages_stereo_pairs() {
        assert_eq!(downmix_to_mono(&[100, 200, -50, 50], 2), vec![150, 0]);
        assert_eq!(downmix_to_mono(&[7, 8, 9], 1), vec![7, 8, 9]);
        assert_eq!(downmix_to_mono(&[30, 60, 90], 3), vec![60]);
    }
}
