//! Pipeline Driver: the per-frame capture → classify → debounce → sink loop
//!
//! Per frame, in order:
//! 1. read a frame from the source (EndOfStream ends the run cleanly)
//! 2. mirror it if configured
//! 3. run the landmark extractor (zero or one snapshot)
//! 4. classify if the snapshot clears the confidence gate
//! 5. feed every channel's raw signal into the debouncer
//! 6. dispatch fired events to all sinks
//! 7. always hand the frame + result to the sinks for rendering
//!
//! Only source failures end a run early. The source is released on every
//! exit path, including unwinding.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::core::debounce::Debouncer;
use crate::core::geometry::GeometryEvaluator;
use crate::core::signals::{event_payload, raw_signal};
use crate::core::sink::{Sink, SinkSet};
use crate::error::{HandcueError, Result};
use crate::types::{ChannelId, ClassificationResult, Frame, GestureEvent, LandmarkSnapshot, PipelineConfig};

// =============================================================================
// Collaborator interfaces
// =============================================================================

/// Result of one frame read
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Frame(Frame),
    EndOfStream,
}

/// Video frame acquisition device.
///
/// `release` must be safe to call after a failed `open` and more than once.
pub trait FrameSource: Send {
    fn open(&mut self) -> Result<()>;
    fn read(&mut self) -> Result<ReadOutcome>;
    fn release(&mut self);
}

/// Black-box landmark model, single-hand mode
pub trait LandmarkExtractor: Send {
    /// Zero or one snapshot for the frame; `Ok(None)` means no hand
    fn infer(&mut self, frame: &Frame) -> Result<Option<LandmarkSnapshot>>;

    /// Free model resources at the end of a run
    fn release(&mut self) {}
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }
    fn read(&mut self) -> Result<ReadOutcome> {
        (**self).read()
    }
    fn release(&mut self) {
        (**self).release()
    }
}

impl<T: LandmarkExtractor + ?Sized> LandmarkExtractor for Box<T> {
    fn infer(&mut self, frame: &Frame) -> Result<Option<LandmarkSnapshot>> {
        (**self).infer(frame)
    }
    fn release(&mut self) {
        (**self).release()
    }
}

/// Releases the source and extractor when dropped
struct RunGuard<'a, S: FrameSource, E: LandmarkExtractor> {
    source: &'a mut S,
    extractor: &'a mut E,
}

impl<S: FrameSource, E: LandmarkExtractor> Drop for RunGuard<'_, S, E> {
    fn drop(&mut self) {
        self.extractor.release();
        self.source.release();
        info!("frame source released");
    }
}

// =============================================================================
// Stop handle and run summary
// =============================================================================

#[derive(Debug, Default)]
struct StopState {
    /// Id of the current (or most recent) run, 0 before the first
    run: AtomicU64,
    /// Run id a stop was requested for
    requested: AtomicU64,
}

/// Cooperative stop request, checked before each frame.
///
/// A stop applies to the run in progress only; one issued while no run is
/// active is forgotten when the next run starts.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<StopState>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let run = self.0.run.load(Ordering::SeqCst);
        self.0.requested.store(run, Ordering::SeqCst);
    }

    /// Whether the current (or most recent) run was asked to stop
    pub fn is_stopped(&self) -> bool {
        let run = self.0.run.load(Ordering::SeqCst);
        run != 0 && self.stops(run)
    }

    fn begin_run(&self) -> u64 {
        self.0.run.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn stops(&self, run: u64) -> bool {
        self.0.requested.load(Ordering::SeqCst) == run
    }
}

/// Why a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunExit {
    Exhausted,
    Stopped,
}

/// Counters for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub classified: u64,
    pub no_hand: u64,
    pub low_confidence: u64,
    pub invalid_snapshots: u64,
    pub extractor_errors: u64,
    pub events_fired: u64,
    pub exit: RunExit,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            frames: 0,
            classified: 0,
            no_hand: 0,
            low_confidence: 0,
            invalid_snapshots: 0,
            extractor_errors: 0,
            events_fired: 0,
            exit: RunExit::Exhausted,
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "frames={} | classified={} | no_hand={} | low_confidence={} | invalid={} | events={} | exit={:?}",
            self.frames,
            self.classified,
            self.no_hand,
            self.low_confidence,
            self.invalid_snapshots,
            self.events_fired,
            self.exit
        )
    }
}

// =============================================================================
// PipelineDriver
// =============================================================================

/// Owns the source, extractor, debouncer and sinks for any number of runs
pub struct PipelineDriver<S: FrameSource, E: LandmarkExtractor> {
    config: PipelineConfig,
    evaluator: GeometryEvaluator,
    debouncer: Debouncer,
    channels: Vec<ChannelId>,
    source: S,
    extractor: E,
    sinks: SinkSet,
    stop: StopHandle,
    latest: Option<ClassificationResult>,
}

impl<S: FrameSource, E: LandmarkExtractor> PipelineDriver<S, E> {
    /// Validate the config and build a driver with no sinks
    pub fn new(config: PipelineConfig, source: S, extractor: E) -> Result<Self> {
        config.validate()?;
        let debouncer = Debouncer::from_config(&config);
        let channels = debouncer.channels().map(|c| c.id).collect();
        Ok(Self {
            evaluator: GeometryEvaluator::from_config(&config),
            debouncer,
            channels,
            config,
            source,
            extractor,
            sinks: SinkSet::new(),
            stop: StopHandle::new(),
            latest: None,
        })
    }

    pub fn add_sink(&mut self, sink: impl Sink + 'static) {
        self.sinks.add(sink);
    }

    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Classification of the most recent frame, None if it had no hand
    pub fn latest(&self) -> Option<&ClassificationResult> {
        self.latest.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run until the source is exhausted, a stop is requested, or the
    /// source fails. Debounce state carries over between runs.
    pub fn run(&mut self) -> Result<RunSummary> {
        let run_id = self.stop.begin_run();
        self.run_as(run_id)
    }

    fn run_as(&mut self, run_id: u64) -> Result<RunSummary> {
        let Self {
            config,
            evaluator,
            debouncer,
            channels,
            source,
            extractor,
            sinks,
            stop,
            latest,
        } = self;

        info!(
            run = run_id,
            mirror = config.mirror_view,
            min_confidence = config.min_detection_confidence,
            bend_ratio = evaluator.bend_ratio(),
            channels = channels.len(),
            "pipeline run starting"
        );

        let guard = RunGuard { source, extractor };
        if let Err(e) = guard.source.open() {
            error!(error = %e, "could not open frame source");
            return Err(e);
        }
        debouncer.begin_run();

        let interval = Duration::from_millis(config.frame_interval_ms);
        let mut summary = RunSummary::new();

        loop {
            if stop.stops(run_id) {
                summary.exit = RunExit::Stopped;
                break;
            }

            let mut frame = match guard.source.read() {
                Ok(ReadOutcome::Frame(frame)) => frame,
                Ok(ReadOutcome::EndOfStream) => {
                    summary.exit = RunExit::Exhausted;
                    break;
                }
                Err(e) => {
                    error!(frame = summary.frames, error = %e, "frame read failed, ending run");
                    return Err(match e {
                        HandcueError::SourceRead(_) | HandcueError::SourceUnavailable(_) => e,
                        other => HandcueError::source_read(other.to_string()),
                    });
                }
            };

            if config.mirror_view {
                frame.mirror();
            }

            let snapshot = match guard.extractor.infer(&frame) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(frame = frame.index, error = %e, "landmark extraction failed");
                    summary.extractor_errors += 1;
                    None
                }
            };

            let result = match snapshot {
                Some(snap) if snap.meets_confidence(config.min_detection_confidence) => {
                    match evaluator.classify(&snap) {
                        Ok(result) => {
                            summary.classified += 1;
                            Some(result)
                        }
                        Err(e) => {
                            warn!(frame = frame.index, error = %e, "skipping malformed snapshot");
                            summary.invalid_snapshots += 1;
                            None
                        }
                    }
                }
                Some(snap) => {
                    debug!(frame = frame.index, confidence = snap.confidence, "below detection confidence");
                    summary.low_confidence += 1;
                    None
                }
                None => {
                    summary.no_hand += 1;
                    None
                }
            };

            for &channel in channels.iter() {
                let raw = raw_signal(channel, result.as_ref());
                if debouncer.observe(channel, raw, frame.timestamp) {
                    let event = GestureEvent::new(
                        channel,
                        frame.index,
                        frame.timestamp,
                        event_payload(channel, result.as_ref()),
                    );
                    info!(channel = %channel, frame = frame.index, t = frame.timestamp, "event fired");
                    sinks.emit(&event);
                    summary.events_fired += 1;
                }
            }

            sinks.render(&frame, result.as_ref());
            *latest = result;
            summary.frames += 1;

            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }

        drop(guard);
        info!(
            frames = summary.frames,
            events = summary.events_fired,
            exit = ?summary.exit,
            "pipeline run finished"
        );
        Ok(summary)
    }

    /// Close every sink; call once when the driver is no longer needed
    pub fn shutdown(mut self) {
        self.sinks.close();
    }
}

impl<S, E> PipelineDriver<S, E>
where
    S: FrameSource + 'static,
    E: LandmarkExtractor + 'static,
{
    /// Move the driver onto a dedicated capture thread
    pub fn spawn(mut self) -> Result<RunningPipeline<S, E>> {
        let stop = self.stop_handle();
        let run_id = stop.begin_run();
        let handle = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                let result = self.run_as(run_id);
                (self, result)
            })?;
        Ok(RunningPipeline { stop, handle })
    }
}

/// A driver running on its capture thread
pub struct RunningPipeline<S: FrameSource, E: LandmarkExtractor> {
    stop: StopHandle,
    handle: JoinHandle<(PipelineDriver<S, E>, Result<RunSummary>)>,
}

impl<S: FrameSource, E: LandmarkExtractor> RunningPipeline<S, E> {
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run to end; returns the driver for a later restart
    pub fn join(self) -> Result<(PipelineDriver<S, E>, Result<RunSummary>)> {
        self.handle
            .join()
            .map_err(|_| HandcueError::source_read("capture thread panicked"))
    }
}

// =============================================================================
// TESTS
// =============================================================================
