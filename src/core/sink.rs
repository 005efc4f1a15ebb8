//! Sinks: consumers of per-frame render updates and debounced events
//!
//! The capture loop calls sinks synchronously, so anything that performs
//! I/O should be wrapped in a [`ThreadedSink`], which moves the work onto
//! its own thread and drops stale render updates instead of blocking.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use colored::Colorize;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::api::NotifyHub;
use crate::types::{overlay_text, ChannelId, ClassificationResult, Frame, GestureEvent, RenderUpdate};

// =============================================================================
// Sink trait
// =============================================================================

/// Capability set the pipeline exposes to its collaborators.
///
/// Arguments are read-only snapshots; a sink must not hold on to borrowed
/// data past the call.
pub trait Sink: Send {
    /// Called for every frame, hand or no hand
    fn on_frame_rendered(&mut self, frame: &Frame, result: Option<&ClassificationResult>);

    /// Called once per debounced edge
    fn on_event(&mut self, event: &GestureEvent);

    /// Name used in logs
    fn name(&self) -> &str {
        "sink"
    }

    /// Flush and release resources; called once when the pipeline shuts down
    fn close(&mut self) {}
}

/// Fan-out to every registered sink, in registration order
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn Sink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sink: impl Sink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn render(&mut self, frame: &Frame, result: Option<&ClassificationResult>) {
        for sink in &mut self.sinks {
            sink.on_frame_rendered(frame, result);
        }
    }

    pub fn emit(&mut self, event: &GestureEvent) {
        for sink in &mut self.sinks {
            sink.on_event(event);
        }
    }

    pub fn close(&mut self) {
        for sink in &mut self.sinks {
            debug!(sink = sink.name(), "closing sink");
            sink.close();
        }
    }
}

// =============================================================================
// ThreadedSink: decouples slow sinks from the capture loop
// =============================================================================

enum SinkMessage {
    Render(Arc<Frame>, Option<ClassificationResult>),
    Event(GestureEvent),
}

/// Runs an inner sink on its own thread.
///
/// Events are always queued. Render updates are dropped once `backlog` of
/// them are waiting, so a slow consumer never stalls frame acquisition.
pub struct ThreadedSink {
    name: String,
    tx: Option<Sender<SinkMessage>>,
    pending_renders: Arc<AtomicUsize>,
    backlog: usize,
    dropped_renders: u64,
    handle: Option<JoinHandle<()>>,
}

impl ThreadedSink {
    pub fn spawn<S: Sink + 'static>(mut inner: S, backlog: usize) -> Self {
        let name = inner.name().to_string();
        let (tx, rx) = mpsc::channel::<SinkMessage>();
        let pending_renders = Arc::new(AtomicUsize::new(0));
        let pending = Arc::clone(&pending_renders);

        let handle = thread::Builder::new()
            .name(format!("sink-{}", name))
            .spawn(move || {
                for msg in rx {
                    match msg {
                        SinkMessage::Render(frame, result) => {
                            pending.fetch_sub(1, Ordering::AcqRel);
                            inner.on_frame_rendered(&frame, result.as_ref());
                        }
                        SinkMessage::Event(event) => inner.on_event(&event),
                    }
                }
                inner.close();
            });

        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(sink = %name, error = %e, "failed to spawn sink thread, sink disabled");
                None
            }
        };

        Self {
            name,
            tx: handle.as_ref().map(|_| tx),
            pending_renders,
            backlog: backlog.max(1),
            dropped_renders: 0,
            handle,
        }
    }

    /// Render updates discarded because the worker fell behind
    pub fn dropped_renders(&self) -> u64 {
        self.dropped_renders
    }

    fn send(&mut self, msg: SinkMessage) -> bool {
        match &self.tx {
            Some(tx) => tx.send(msg).is_ok(),
            None => false,
        }
    }

    fn shutdown(&mut self) {
        self.tx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(sink = %self.name, "sink thread panicked");
            }
        }
    }
}

impl Sink for ThreadedSink {
    fn on_frame_rendered(&mut self, frame: &Frame, result: Option<&ClassificationResult>) {
        if self.pending_renders.load(Ordering::Acquire) >= self.backlog {
            self.dropped_renders += 1;
            debug!(sink = %self.name, frame = frame.index, "render backlog full, dropping update");
            return;
        }
        self.pending_renders.fetch_add(1, Ordering::AcqRel);
        if !self.send(SinkMessage::Render(Arc::new(frame.clone()), result.copied())) {
            self.pending_renders.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn on_event(&mut self, event: &GestureEvent) {
        if !self.send(SinkMessage::Event(event.clone())) {
            warn!(sink = %self.name, channel = %event.channel, "sink thread gone, event lost");
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl Drop for ThreadedSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// TerminalSink: overlay text and event lines on a terminal
// =============================================================================

/// Prints the finger-status overlay whenever it changes, plus one line per event
pub struct TerminalSink {
    out: Box<dyn Write + Send>,
    color: bool,
    json: bool,
    last_overlay: Option<String>,
}

impl TerminalSink {
    pub fn stdout(color: bool, json: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), color, json)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, color: bool, json: bool) -> Self {
        Self {
            out,
            color,
            json,
            last_overlay: None,
        }
    }

    fn write_line(&mut self, line: &str) {
        if writeln!(self.out, "{}", line).and_then(|_| self.out.flush()).is_err() {
            debug!("terminal sink write failed");
        }
    }
}

/// Serialize one output record, None (logged) if it cannot be encoded
pub(crate) fn json_line<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(line) => Some(line),
        Err(e) => {
            debug!(error = %e, "record not serializable, skipped");
            None
        }
    }
}

impl Sink for TerminalSink {
    fn on_frame_rendered(&mut self, frame: &Frame, result: Option<&ClassificationResult>) {
        let overlay = overlay_text(result);
        if self.last_overlay.as_deref() == Some(overlay.as_str()) {
            return;
        }
        let line = if self.json {
            let update = RenderUpdate::new(frame.index, frame.timestamp, result.copied());
            match json_line(&update) {
                Some(line) => line,
                None => return,
            }
        } else if self.color {
            match result {
                Some(r) => format!("{} {}", "Finger Status:".bold(), r.to_terminal_string()),
                None => overlay.dimmed().to_string(),
            }
        } else {
            overlay.clone()
        };
        self.write_line(&line);
        self.last_overlay = Some(overlay);
    }

    fn on_event(&mut self, event: &GestureEvent) {
        let line = if self.json {
            match json_line(event) {
                Some(line) => line,
                None => return,
            }
        } else if self.color {
            event.to_terminal_string()
        } else {
            event.to_parseable_string()
        };
        self.write_line(&line);
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

// =============================================================================
// AudioCueSink: terminal bell on selected channels
// =============================================================================

/// Rings the terminal bell for events on the configured channels
pub struct AudioCueSink {
    channels: Vec<ChannelId>,
    out: Box<dyn Write + Send>,
    cues: u64,
}

impl AudioCueSink {
    pub fn bell(channels: Vec<ChannelId>) -> Self {
        Self::with_writer(channels, Box::new(io::stdout()))
    }

    pub fn with_writer(channels: Vec<ChannelId>, out: Box<dyn Write + Send>) -> Self {
        Self {
            channels,
            out,
            cues: 0,
        }
    }

    pub fn cues_played(&self) -> u64 {
        self.cues
    }
}

impl Sink for AudioCueSink {
    fn on_frame_rendered(&mut self, _frame: &Frame, _result: Option<&ClassificationResult>) {}

    fn on_event(&mut self, event: &GestureEvent) {
        if !self.channels.contains(&event.channel) {
            return;
        }
        self.cues += 1;
        if write!(self.out, "\x07").and_then(|_| self.out.flush()).is_err() {
            debug!("audio cue write failed");
        }
    }

    fn name(&self) -> &str {
        "audio"
    }
}

// =============================================================================
// BroadcastSink: network notification through the API hub
// =============================================================================

/// Publishes events and the latest render status to WebSocket subscribers.
///
/// Never blocks: events go to a bounded broadcast channel (lagging
/// subscribers lose the oldest), render status is last-value-wins.
pub struct BroadcastSink {
    hub: NotifyHub,
}

impl BroadcastSink {
    pub fn new(hub: NotifyHub) -> Self {
        Self { hub }
    }
}

impl Sink for BroadcastSink {
    fn on_frame_rendered(&mut self, frame: &Frame, result: Option<&ClassificationResult>) {
        self.hub
            .publish_status(RenderUpdate::new(frame.index, frame.timestamp, result.copied()));
    }

    fn on_event(&mut self, event: &GestureEvent) {
        self.hub.publish_event(event);
    }

    fn name(&self) -> &str {
        "broadcast"
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Condvar, Mutex};
    use crate::types::{FingerId, FingerState, Handedness};

    /// Writer whose contents survive the sink that owns it
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn event(channel: ChannelId) -> GestureEvent {
        GestureEvent::new(channel, 3, 0.3, serde_json::json!({"hand": "left"}))
    }

    #[test]
    fn test_terminal_prints_overlay_only_on_change() {
        let buf = SharedBuf::default();
        let mut sink = TerminalSink::with_writer(Box::new(buf.clone()), false, false);
        let frame = Frame::blank(0, 0.0, 640, 480);
        sink.on_frame_rendered(&frame, None);
        sink.on_frame_rendered(&frame, None);
        let open = ClassificationResult::new([FingerState::Straight; 5], Handedness::Left);
        sink.on_frame_rendered(&frame, Some(&open));

        let text = buf.text();
        assert_eq!(text.matches("No hand detected").count(), 1);
        assert!(text.contains("Finger Status: Thumb: Straight"));
    }

    #[test]
    fn test_terminal_event_line() {
        let buf = SharedBuf::default();
        let mut sink = TerminalSink::with_writer(Box::new(buf.clone()), false, false);
        sink.on_event(&event(ChannelId::LeftHandPresent));
        assert!(buf.text().starts_with("event=left-hand-present | frame=3"));
    }

    #[test]
    fn test_terminal_json_event_line() {
        let buf = SharedBuf::default();
        let mut sink = TerminalSink::with_writer(Box::new(buf.clone()), false, true);
        sink.on_event(&event(ChannelId::LeftHandPresent));
        let line: serde_json::Value = serde_json::from_str(buf.text().trim()).unwrap();
        assert_eq!(line["channel"], "left-hand-present");
    }

    #[test]
    fn test_unserializable_record_is_skipped() {
        // JSON object keys must be strings
        let mut record = std::collections::HashMap::new();
        record.insert((1u8, 2u8), "x");
        assert!(json_line(&record).is_none());
        assert_eq!(json_line(&[1, 2]).as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_audio_cue_filters_channels() {
        let buf = SharedBuf::default();
        let index = ChannelId::FingerBent(FingerId::Index);
        let mut sink = AudioCueSink::with_writer(vec![index], Box::new(buf.clone()));
        sink.on_event(&event(ChannelId::LeftHandPresent));
        sink.on_event(&event(index));
        assert_eq!(sink.cues_played(), 1);
        assert_eq!(buf.text(), "\x07");
    }

    /// Blocks inside on_frame_rendered until released
    struct GatedSink {
        gate: Arc<(Mutex<bool>, Condvar)>,
        rendered: Arc<AtomicUsize>,
        events: Arc<AtomicUsize>,
    }

    impl Sink for GatedSink {
        fn on_frame_rendered(&mut self, _frame: &Frame, _result: Option<&ClassificationResult>) {
            let (lock, cvar) = &*self.gate;
            let mut open = lock.lock().unwrap();
            while !*open {
                open = cvar.wait(open).unwrap();
            }
            self.rendered.fetch_add(1, Ordering::SeqCst);
        }
        fn on_event(&mut self, _event: &GestureEvent) {
            self.events.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_threaded_sink_drops_stale_renders_but_keeps_events() {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let rendered = Arc::new(AtomicUsize::new(0));
        let events = Arc::new(AtomicUsize::new(0));
        let inner = GatedSink {
            gate: Arc::clone(&gate),
            rendered: Arc::clone(&rendered),
            events: Arc::clone(&events),
        };
        let mut sink = ThreadedSink::spawn(inner, 2);

        for i in 0..20 {
            sink.on_frame_rendered(&Frame::blank(i, i as f64 * 0.03, 4, 4), None);
        }
        sink.on_event(&event(ChannelId::HandPresent));

        // At most: one in flight inside the gate plus a full backlog
        assert!(sink.dropped_renders() >= 20 - 3);

        {
            let (lock, cvar) = &*gate;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }
        sink.close();

        assert_eq!(rendered.load(Ordering::SeqCst) as u64, 20 - sink.dropped_renders());
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_threaded_sink_close_is_idempotent() {
        let buf = SharedBuf::default();
        let mut sink = ThreadedSink::spawn(TerminalSink::with_writer(Box::new(buf.clone()), false, false), 4);
        sink.on_event(&event(ChannelId::LeftHandPresent));
        sink.close();
        sink.close();
        assert!(buf.text().contains("left-hand-present"));
        assert_eq!(sink.name(), "terminal");
    }
}
