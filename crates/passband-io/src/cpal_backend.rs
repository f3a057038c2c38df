//! cpal-based audio backend implementation.
//!
//! This module provides [`CpalBackend`], the default [`AudioBackend`]
//! implementation wrapping [cpal](https://crates.io/crates/cpal). It supports
//! ALSA (Linux), CoreAudio (macOS), and WASAPI (Windows).
//!
//! Device ids are positions in `host.devices()`, so a device that offers both
//! directions has a single id. Channel capabilities are the maxima over the
//! device's supported configurations.
//!
//! A duplex stream is two cpal streams joined by the ring in
//! [`duplex`](crate::duplex): capture pushes channel 0, playback runs the
//! [`AudioCallback`] and writes the mono result to every output channel.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};

use crate::backend::{AudioBackend, BackendStream, DefaultDevices, ErrorCallback, StreamConfig};
use crate::catalog::{DeviceId, DeviceInfo};
use crate::duplex::duplex_pair;
use crate::processor::AudioCallback;
use crate::{Error, Result};

/// Sample rate reported for devices that expose no default configuration.
const FALLBACK_SAMPLE_RATE: u32 = 48000;

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

fn max_input_channels(device: &Device) -> u16 {
    device
        .supported_input_configs()
        .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

fn max_output_channels(device: &Device) -> u16 {
    device
        .supported_output_configs()
        .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

fn default_sample_rate(device: &Device) -> u32 {
    device
        .default_output_config()
        .or_else(|_| device.default_input_config())
        .map(|c| c.sample_rate())
        .unwrap_or(FALLBACK_SAMPLE_RATE)
}

/// cpal-based audio backend.
///
/// Holds a cpal [`Host`], the connection to the platform's audio system.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a new cpal backend using the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    fn devices(&self) -> Result<Vec<Device>> {
        self.host
            .devices()
            .map(|devices| devices.collect())
            .map_err(|e| Error::DeviceEnumeration(e.to_string()))
    }

    fn device(devices: &[Device], id: DeviceId) -> Result<&Device> {
        devices.get(id).ok_or(Error::DeviceNotFound(id))
    }

    fn default_names(&self) -> (Option<String>, Option<String>) {
        let input = self
            .host
            .default_input_device()
            .and_then(|d| device_name(&d).ok());
        let output = self
            .host
            .default_output_device()
            .and_then(|d| device_name(&d).ok());
        (input, output)
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let (default_input, default_output) = self.default_names();
        let mut infos = Vec::new();

        for (id, device) in self.devices()?.iter().enumerate() {
            let name = match device_name(device) {
                Ok(name) => name,
                Err(e) => {
                    tracing::debug!(id, error = %e, "skipping device without a name");
                    continue;
                }
            };
            let max_inputs = max_input_channels(device);
            let max_outputs = max_output_channels(device);
            infos.push(DeviceInfo {
                id,
                is_default_input: max_inputs > 0 && default_input.as_deref() == Some(name.as_str()),
                is_default_output: max_outputs > 0
                    && default_output.as_deref() == Some(name.as_str()),
                name,
                max_inputs,
                max_outputs,
                default_sample_rate: default_sample_rate(device),
            });
        }

        Ok(infos)
    }

    fn default_devices(&self) -> Result<DefaultDevices> {
        let devices = self.list_devices()?;
        Ok(DefaultDevices {
            input: devices.iter().find(|d| d.is_default_input).map(|d| d.id),
            output: devices.iter().find(|d| d.is_default_output).map(|d| d.id),
        })
    }

    fn open_stream(
        &self,
        config: &StreamConfig,
        callback: Box<dyn AudioCallback>,
        on_error: ErrorCallback,
    ) -> Result<Box<dyn BackendStream>> {
        let devices = self.devices()?;
        let input_device = Self::device(&devices, config.input_device)?;
        let output_device = Self::device(&devices, config.output_device)?;

        let input_channels = input_device
            .default_input_config()
            .map_err(|e| Error::Device(format!("input {}: {e}", config.input_device)))?
            .channels();
        let output_channels = output_device
            .default_output_config()
            .map_err(|e| Error::Device(format!("output {}: {e}", config.output_device)))?
            .channels();

        let buffer_size = cpal::BufferSize::Fixed(config.buffer_size);
        let input_config = cpal::StreamConfig {
            channels: input_channels,
            sample_rate: config.sample_rate,
            buffer_size,
        };
        let output_config = cpal::StreamConfig {
            channels: output_channels,
            sample_rate: config.sample_rate,
            buffer_size,
        };

        let (mut capture, mut playback) = duplex_pair(
            config.buffer_size as usize,
            usize::from(input_channels),
            usize::from(output_channels),
            callback,
        );

        let input_error = on_error.clone();
        let input_stream = input_device
            .build_input_stream(
                &input_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| capture.write(data),
                move |err| input_error(&err.to_string()),
                None,
            )
            .map_err(|e| Error::Device(e.to_string()))?;

        let output_stream = output_device
            .build_output_stream(
                &output_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| playback.render(data),
                move |err| on_error(&err.to_string()),
                None,
            )
            .map_err(|e| Error::Device(e.to_string()))?;

        // cpal may auto-play on some hosts; streams start paused until asked.
        // Returning early drops both streams.
        pause_pair(&input_stream, &output_stream)
            .map_err(|e| Error::Device(format!("cannot hold new stream paused: {e}")))?;

        tracing::info!(
            input = config.input_device,
            output = config.output_device,
            input_channels,
            output_channels,
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "duplex stream opened"
        );

        Ok(Box::new(CpalStream {
            input: Some(input_stream),
            output: Some(output_stream),
        }))
    }
}

/// Live cpal capture/playback pair.
struct CpalStream {
    input: Option<Stream>,
    output: Option<Stream>,
}

impl BackendStream for CpalStream {
    fn start(&mut self) -> Result<()> {
        let (Some(input), Some(output)) = (&self.input, &self.output) else {
            return Err(Error::Stream("stream is closed".into()));
        };
        play_pair(input, output)?;
        tracing::debug!("duplex stream playing");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let (Some(input), Some(output)) = (&self.input, &self.output) else {
            return Err(Error::Stream("stream is closed".into()));
        };
        pause_pair(input, output)?;
        tracing::debug!("duplex stream paused");
        Ok(())
    }

    fn close(&mut self) {
        let output = self.output.take();
        let input = self.input.take();
        if output.is_some() || input.is_some() {
            drop(output);
            drop(input);
            tracing::debug!("duplex stream closed");
        }
    }
}

/// Start capture, then playback. If playback refuses, capture is paused again
/// so the pair never runs half-started.
fn play_pair<S: StreamTrait>(input: &S, output: &S) -> Result<()> {
    input.play().map_err(|e| Error::Stream(e.to_string()))?;
    if let Err(e) = output.play() {
        if let Err(pause_err) = input.pause() {
            tracing::warn!(error = %pause_err, "failed to pause capture after playback start failed");
        }
        return Err(Error::Stream(e.to_string()));
    }
    Ok(())
}

/// Pause playback, then capture. Both are attempted; the first error wins.
fn pause_pair<S: StreamTrait>(input: &S, output: &S) -> Result<()> {
    let output_result = output.pause();
    let input_result = input.pause();
    output_result
        .and(input_result)
        .map_err(|e| Error::Stream(e.to_string()))
}
