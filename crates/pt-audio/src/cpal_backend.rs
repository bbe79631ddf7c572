//! CPAL-based audio output backend.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use pt_engine::VoiceRenderer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::traits::{AudioError, AudioOutput};

/// CPAL-based audio output.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl CpalOutput {
    /// Open the default output device.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // The callback writes interleaved stereo
        config.channels = 2;

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            "audio device opened"
        );

        Ok(Self {
            device,
            config,
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build the stream around a voice renderer and start it.
    pub fn build_stream(&mut self, mut renderer: VoiceRenderer, gain: f32) -> Result<(), AudioError> {
        let running = self.running.clone();
        let channels = self.config.channels as usize;
        running.store(true, Ordering::Relaxed);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    #[cfg(feature = "alloc_check")]
                    assert_no_alloc::assert_no_alloc(|| fill_interleaved(&mut renderer, data, channels, gain));
                    #[cfg(not(feature = "alloc_check"))]
                    fill_interleaved(&mut renderer, data, channels, gain);
                },
                |err| tracing::error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }
}

/// Render one callback's worth of interleaved output.
///
/// Queued commands are applied first, then each device frame gets one
/// mixed stereo frame; channels past the second are zero-filled.
pub fn fill_interleaved(renderer: &mut VoiceRenderer, data: &mut [f32], channels: usize, gain: f32) {
    renderer.begin_block();
    for chunk in data.chunks_mut(channels.max(1)) {
        let frame = renderer.render_frame().mix(gain);
        for (i, sample) in chunk.iter_mut().enumerate() {
            *sample = match i {
                0 => frame.left,
                1 => frame.right,
                _ => 0.0,
            };
        }
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.running.store(true, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running.store(false, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}
