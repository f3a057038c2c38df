//! Integration tests for passband-io: engine lifecycle against a mock backend.
//!
//! The mock records every open/start/stop/close and keeps each stream's
//! callback so tests can pump audio blocks through it as the driver would.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use passband_core::{ChainSettings, FilterParameters};
use passband_io::{
    AudioBackend, AudioCallback, AudioEngine, BackendStream, DefaultDevices, DeviceInfo, Error,
    ErrorCallback, Result, StreamConfig, StreamState,
};

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Open(StreamConfig),
    Start(usize),
    Stop(usize),
    Close(usize),
}

#[derive(Default)]
struct MockState {
    events: Vec<Event>,
    live: usize,
    max_live: usize,
    callbacks: Vec<Option<Box<dyn AudioCallback>>>,
}

#[derive(Clone, Default)]
struct Probe {
    state: Arc<Mutex<MockState>>,
    fail_open: Arc<AtomicBool>,
    fail_start: Arc<AtomicBool>,
    fail_enumeration: Arc<AtomicBool>,
}

impl Probe {
    fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    fn opens(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, Event::Open(_))).count()
    }

    fn live(&self) -> usize {
        self.state.lock().live
    }

    fn max_live(&self) -> usize {
        self.state.lock().max_live
    }

    /// Run one block through the most recently opened stream's callback.
    fn pump(&self, input: &[f32]) -> Vec<f32> {
        let mut state = self.state.lock();
        let mut output = vec![0.0; input.len()];
        if let Some(Some(callback)) = state.callbacks.last_mut() {
            callback.process(input, &mut output);
        }
        output
    }
}

struct MockBackend {
    devices: Vec<DeviceInfo>,
    probe: Probe,
}

fn device(id: usize, name: &str, inputs: u16, outputs: u16, rate: u32) -> DeviceInfo {
    DeviceInfo {
        id,
        name: name.to_string(),
        max_inputs: inputs,
        max_outputs: outputs,
        default_sample_rate: rate,
        is_default_input: id == 0,
        is_default_output: id == 1,
    }
}

fn mock() -> (MockBackend, Probe) {
    let probe = Probe::default();
    let backend = MockBackend {
        devices: vec![
            device(0, "Built-in Microphone", 1, 0, 48000),
            device(1, "Built-in Output", 0, 2, 48000),
            device(2, "USB Interface", 2, 2, 44100),
        ],
        probe: probe.clone(),
    };
    (backend, probe)
}

impl AudioBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        if self.probe.fail_enumeration.load(Ordering::SeqCst) {
            return Err(Error::DeviceEnumeration("host went away".into()));
        }
        Ok(self.devices.clone())
    }

    fn default_devices(&self) -> Result<DefaultDevices> {
        Ok(DefaultDevices {
            input: Some(0),
            output: Some(1),
        })
    }

    fn open_stream(
        &self,
        config: &StreamConfig,
        callback: Box<dyn AudioCallback>,
        _on_error: ErrorCallback,
    ) -> Result<Box<dyn BackendStream>> {
        if self.probe.fail_open.load(Ordering::SeqCst) {
            return Err(Error::Device("device busy".into()));
        }
        let mut state = self.probe.state.lock();
        let index = state.callbacks.len();
        state.events.push(Event::Open(*config));
        state.callbacks.push(Some(callback));
        state.live += 1;
        state.max_live = state.max_live.max(state.live);
        Ok(Box::new(MockStream {
            index,
            probe: self.probe.clone(),
            closed: false,
        }))
    }
}

struct MockStream {
    index: usize,
    probe: Probe,
    closed: bool,
}

impl BackendStream for MockStream {
    fn start(&mut self) -> Result<()> {
        if self.probe.fail_start.load(Ordering::SeqCst) {
            return Err(Error::Stream("hardware refused to start".into()));
        }
        self.probe.state.lock().events.push(Event::Start(self.index));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.probe.state.lock().events.push(Event::Stop(self.index));
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut state = self.probe.state.lock();
        state.events.push(Event::Close(self.index));
        state.live -= 1;
        state.callbacks[self.index] = None;
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.close();
    }
}

fn engine() -> (AudioEngine, Probe) {
    let (backend, probe) = mock();
    (AudioEngine::new(Box::new(backend)), probe)
}

fn sine(freq_hz: f32, sample_rate: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| 0.3 * (std::f32::consts::TAU * freq_hz * n as f32 / sample_rate).sin())
        .collect()
}

fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

// ---------------------------------------------------------------------------
// Device listing
// ---------------------------------------------------------------------------

#[test]
fn lists_devices_and_host_info() {
    let (engine, _) = engine();
    let devices = engine.list_devices().unwrap();
    assert_eq!(devices.len(), 3);
    assert_eq!(devices[2].name, "USB Interface");

    let info = engine.host_info().unwrap();
    assert_eq!(info.backend, "mock");
    assert_eq!(info.default_input.unwrap().name, "Built-in Microphone");
    assert_eq!(info.default_output.unwrap().name, "Built-in Output");
}

#[test]
fn enumeration_failure_propagates() {
    let (engine, probe) = engine();
    probe.fail_enumeration.store(true, Ordering::SeqCst);
    assert!(matches!(engine.list_devices(), Err(Error::DeviceEnumeration(_))));
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn full_lifecycle() {
    let (mut engine, probe) = engine();
    assert_eq!(engine.status().stream_state, StreamState::Uninitialized);

    let config = engine.select_devices(0, 1, 256).unwrap();
    assert_eq!(config.sample_rate, 48000);
    assert_eq!(engine.status().stream_state, StreamState::Configured);

    engine.start().unwrap();
    assert_eq!(engine.status().stream_state, StreamState::Running);
    assert!(matches!(engine.start(), Err(Error::Stream(_))));

    engine.stop().unwrap();
    engine.stop().unwrap();
    assert_eq!(engine.status().stream_state, StreamState::Stopped);

    engine.start().unwrap();
    engine.close();
    assert_eq!(engine.status().stream_state, StreamState::Closed);
    assert_eq!(probe.live(), 0);

    assert_eq!(
        probe.events(),
        vec![
            Event::Open(config),
            Event::Start(0),
            Event::Stop(0),
            Event::Start(0),
            Event::Stop(0),
            Event::Close(0),
        ]
    );
}

#[test]
fn start_before_selection_fails() {
    let (mut engine, _) = engine();
    assert!(matches!(engine.start(), Err(Error::Stream(_))));
    assert!(matches!(engine.stop(), Err(Error::Stream(_))));
}

#[test]
fn closed_engine_rejects_everything() {
    let (mut engine, probe) = engine();
    engine.close();
    engine.close();
    assert!(engine.select_devices(0, 1, 256).is_err());
    assert!(engine.start().is_err());
    assert!(engine.stop().is_err());
    assert_eq!(probe.opens(), 0);
}

#[test]
fn hardware_start_failure_keeps_configured() {
    let (mut engine, probe) = engine();
    engine.select_devices(0, 1, 256).unwrap();
    probe.fail_start.store(true, Ordering::SeqCst);
    assert!(matches!(engine.start(), Err(Error::Stream(_))));
    assert_eq!(engine.status().stream_state, StreamState::Configured);

    probe.fail_start.store(false, Ordering::SeqCst);
    engine.start().unwrap();
    assert_eq!(engine.status().stream_state, StreamState::Running);
}

// ---------------------------------------------------------------------------
// Device switching
// ---------------------------------------------------------------------------

#[test]
fn switching_devices_never_overlaps_streams() {
    let (mut engine, probe) = engine();
    engine.select_devices(0, 1, 256).unwrap();
    engine.start().unwrap();
    let second = engine.select_devices(2, 2, 512).unwrap();
    engine.start().unwrap();
    engine.select_devices(0, 2, 128).unwrap();

    assert_eq!(probe.max_live(), 1);
    assert_eq!(probe.live(), 1);
    assert_eq!(second.sample_rate, 44100);
    assert_eq!(engine.parameters().sample_rate, 44100.0);

    // Old stream stopped and closed before the next one is opened.
    let events = probe.events();
    let close_0 = events.iter().position(|e| *e == Event::Close(0)).unwrap();
    let open_1 = events.iter().position(|e| matches!(e, Event::Open(c) if c.buffer_size == 512)).unwrap();
    assert!(events[..close_0].contains(&Event::Stop(0)));
    assert!(close_0 < open_1);

    // Reselection leaves the new stream configured, not running.
    assert_eq!(engine.status().stream_state, StreamState::Configured);
}

#[test]
fn sample_rate_follows_output_device() {
    let (mut engine, _) = engine();
    engine.select_devices(0, 2, 256).unwrap();
    assert_eq!(engine.parameters().sample_rate, 44100.0);
    assert_eq!(engine.status().stream_config.unwrap().sample_rate, 44100);
}

#[test]
fn invalid_selection_keeps_current_stream() {
    let (mut engine, probe) = engine();
    let config = engine.select_devices(0, 1, 256).unwrap();
    engine.start().unwrap();

    // Device 1 has no inputs, device 0 has no outputs, device 9 does not exist.
    assert!(matches!(engine.select_devices(1, 1, 256), Err(Error::Device(_))));
    assert!(matches!(engine.select_devices(0, 0, 256), Err(Error::Device(_))));
    assert!(matches!(engine.select_devices(9, 1, 256), Err(Error::DeviceNotFound(9))));
    assert!(matches!(engine.select_devices(0, 1, 0), Err(Error::Validation(_))));

    let status = engine.status();
    assert_eq!(status.stream_state, StreamState::Running);
    assert_eq!(status.stream_config, Some(config));
    assert_eq!(probe.opens(), 1);
    assert_eq!(probe.live(), 1);
}

#[test]
fn failed_open_leaves_engine_uninitialized() {
    let (mut engine, probe) = engine();
    engine.select_devices(0, 1, 256).unwrap();
    engine.start().unwrap();

    probe.fail_open.store(true, Ordering::SeqCst);
    assert!(matches!(engine.select_devices(2, 2, 256), Err(Error::Device(_))));

    let status = engine.status();
    assert_eq!(status.stream_state, StreamState::Uninitialized);
    assert!(status.stream_config.is_none());
    assert_eq!(probe.live(), 0);

    probe.fail_open.store(false, Ordering::SeqCst);
    engine.select_devices(2, 2, 256).unwrap();
    assert_eq!(engine.status().stream_state, StreamState::Configured);
}

// ---------------------------------------------------------------------------
// Parameters and processing
// ---------------------------------------------------------------------------

#[test]
fn parameter_updates_reach_the_audio_callback() {
    let (mut engine, probe) = engine();
    engine.select_devices(0, 1, 4800).unwrap();
    engine.start().unwrap();

    let input = sine(700.0, 48000.0, 4800);
    let in_band = probe.pump(&input);
    assert!(peak(&in_band[2400..]) > 0.4);

    engine.update_parameters(Some(4000.0), None).unwrap();
    let out_of_band = probe.pump(&input);
    assert!(peak(&out_of_band[2400..]) < 0.05);
}

#[test]
fn update_parameters_clamps_and_validates() {
    let (engine, _) = engine();
    let params = engine.update_parameters(Some(100.0), None).unwrap();
    assert_eq!(params.center_freq, 100.0);
    assert_eq!(params.bandwidth, 100.0);

    let params = engine.update_parameters(None, Some(0.0)).unwrap();
    assert_eq!(params.bandwidth, 1.0);

    assert!(matches!(
        engine.update_parameters(Some(f32::NAN), None),
        Err(Error::Validation(_))
    ));
    assert_eq!(engine.parameters(), params);
}

#[test]
fn faulted_blocks_are_counted_in_status() {
    let (mut engine, probe) = engine();
    engine.select_devices(0, 1, 64).unwrap();
    engine.start().unwrap();

    let output = probe.pump(&[f32::NAN; 64]);
    assert!(output.iter().all(|&s| s == 0.0));
    probe.pump(&[0.1; 64]);
    assert_eq!(engine.status().faulted_blocks, 1);
}

#[test]
fn custom_settings_and_startup_parameters() {
    let (backend, probe) = mock();
    let settings = ChainSettings {
        pre_gain: 1.0,
        ceiling: 0.5,
        knee: 0.4,
        ..ChainSettings::default()
    };
    let mut engine = AudioEngine::with_settings(
        Box::new(backend),
        FilterParameters::new(1000.0, 400.0, 48000.0),
        settings,
    );
    assert_eq!(engine.parameters().center_freq, 1000.0);

    engine.select_devices(0, 1, 4800).unwrap();
    let loud: Vec<f32> = sine(1000.0, 48000.0, 4800).iter().map(|s| s * 10.0).collect();
    let output = probe.pump(&loud);
    assert!(peak(&output) <= 0.5);
}

#[test]
fn status_serializes_to_json() {
    let (mut engine, _) = engine();
    engine.select_devices(0, 1, 256).unwrap();
    let json = serde_json::to_value(engine.status()).unwrap();
    assert_eq!(json["stream_state"], "configured");
    assert_eq!(json["params"]["center_freq"], 700.0);
    assert_eq!(json["stream_config"]["buffer_size"], 256);
    assert_eq!(json["faulted_blocks"], 0);
}
