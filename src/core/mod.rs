//! Core modules for handcue

pub mod geometry;
pub mod debounce;
pub mod signals;
pub mod sink;
pub mod pipeline;
pub mod replay;
pub mod api;

pub use geometry::GeometryEvaluator;
pub use debounce::{Debouncer, DebounceState};
pub use signals::{raw_signal, event_payload};
pub use sink::{Sink, SinkSet, ThreadedSink, TerminalSink, AudioCueSink, BroadcastSink};
pub use pipeline::{
    FrameSource, LandmarkExtractor, ReadOutcome, PipelineDriver, RunningPipeline,
    StopHandle, RunSummary, RunExit,
};
pub use replay::{Recording, RecordedFrame, ReplaySource, ReplayExtractor};
pub use api::{create_router, run_server, NotifyHub, DetectionMessage, DETECTION_EVENT};
