//! Job log retrieval
//!
//! [`JobLogStreamer`] follows a job through `INIT -> STARTED -> TERMINAL`:
//!
//! - `INIT`: wait for the job to start (polling its status) or fail with
//!   `NotStarted`.
//! - `STARTED`: subscribe to the live log channel and relay frames to the
//!   sink while re-checking the status on every tick. The session is closed
//!   as soon as the job leaves `STARTED`.
//! - `TERMINAL`: fetch the complete log once over REST.

pub mod frame;
pub mod sink;
pub mod socketio;

use std::time::Duration;

use async_trait::async_trait;
use ghost_models::JobStatus;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::errors::CasperError;
use crate::http::{Jobs, ResourceClient};
use crate::settings::{Settings, StreamUnavailablePolicy};

pub use frame::{html_to_text, strip_ansi, LogFrame, Utf8Decoder};
pub use sink::{LogSink, TeeSink};
pub use socketio::{build_socket_url, SocketIoChannel};

/// Floor applied to the status re-check period
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sending half of a session's frame channel
pub type FrameSender = mpsc::Sender<Result<LogFrame, CasperError>>;

/// Where job statuses and completed logs come from
#[async_trait]
pub trait JobSource {
    async fn status(&self, job_id: &str) -> Result<JobStatus, CasperError>;

    async fn fetch_log(&self, job_id: &str) -> Result<String, CasperError>;
}

#[async_trait]
impl JobSource for ResourceClient<Jobs> {
    async fn status(&self, job_id: &str) -> Result<JobStatus, CasperError> {
        ResourceClient::<Jobs>::status(self, job_id).await
    }

    async fn fetch_log(&self, job_id: &str) -> Result<String, CasperError> {
        ResourceClient::<Jobs>::fetch_log(self, job_id).await
    }
}

/// Push channel delivering the log of a running job
#[async_trait]
pub trait LogChannel {
    /// Capability probe
    async fn available(&self) -> Result<bool, CasperError>;

    /// Open a session subscribed to the log of `job_id`
    async fn open(&self, job_id: &str) -> Result<LogSession, CasperError>;
}

/// An open log channel session.
///
/// Frames arrive in transport order. The channel ends when the remote side
/// closes; an `Err` item reports a transport failure.
pub struct LogSession {
    frames: mpsc::Receiver<Result<LogFrame, CasperError>>,
    close: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LogSession {
    pub fn new(frames: mpsc::Receiver<Result<LogFrame, CasperError>>) -> Self {
        Self {
            frames,
            close: None,
            task: None,
        }
    }

    /// Attach the reader task feeding the session and its close signal
    pub fn with_task(mut self, close: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        self.close = Some(close);
        self.task = Some(task);
        self
    }

    /// Stop the reader task and wait for it to finish
    pub async fn close(mut self) {
        if let Some(close) = self.close.take() {
            let _ = close.send(());
        }
        self.frames.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Log channel task ended abnormally: {}", e);
            }
        }
    }
}

/// Streamer behaviour
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Wait for an `init` job to start instead of failing
    pub wait: bool,

    /// Status re-check period, while waiting and while streaming
    pub poll_interval: Duration,

    pub unavailable: StreamUnavailablePolicy,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            wait: false,
            poll_interval: Duration::from_secs(3),
            unavailable: StreamUnavailablePolicy::Fail,
        }
    }
}

impl StreamOptions {
    pub fn from_settings(settings: &Settings, wait: bool) -> Self {
        Self {
            wait,
            poll_interval: settings.poll_interval,
            unavailable: settings.stream_unavailable,
        }
    }
}

/// What a [`JobLogStreamer::follow`] call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReport {
    /// Last status observed
    pub status: JobStatus,

    /// Live frames handed to the sink
    pub frames: usize,

    /// REST log fetches performed
    pub fetches: usize,

    /// Live sessions opened
    pub sessions: usize,
}

impl StreamReport {
    fn new(status: JobStatus) -> Self {
        Self {
            status,
            frames: 0,
            fetches: 0,
            sessions: 0,
        }
    }
}

/// Streamer state, derived from the job status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogState {
    Init,
    Started,
    Terminal,
}

impl From<JobStatus> for LogState {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Init => LogState::Init,
            JobStatus::Started => LogState::Started,
            _ => LogState::Terminal,
        }
    }
}

/// Follows one job's log from a [`JobSource`] and a [`LogChannel`]
pub struct JobLogStreamer<S, C> {
    source: S,
    channel: C,
    options: StreamOptions,
}

impl<S: JobSource, C: LogChannel> JobLogStreamer<S, C> {
    pub fn new(source: S, channel: C, options: StreamOptions) -> Self {
        Self {
            source,
            channel,
            options,
        }
    }

    fn poll_interval(&self) -> Duration {
        self.options.poll_interval.max(MIN_POLL_INTERVAL)
    }

    /// Deliver the log of `job_id` to `sink`, until the job is terminal
    pub async fn follow<K: LogSink>(
        &self,
        job_id: &str,
        sink: &mut K,
    ) -> Result<StreamReport, CasperError> {
        let mut status = self.source.status(job_id).await?;

        loop {
            match LogState::from(status) {
                LogState::Init if !self.options.wait => {
                    return Err(CasperError::NotStarted(job_id.to_string()));
                }
                LogState::Init => {
                    let period = self.poll_interval();
                    debug!("Job {} has not started, checking again in {:?}", job_id, period);
                    tokio::time::sleep(period).await;
                    status = self.source.status(job_id).await?;
                }
                LogState::Started => return self.stream(job_id, sink).await,
                LogState::Terminal => {
                    info!("Job {} is {}, fetching its complete log", job_id, status);
                    let mut report = StreamReport::new(status);
                    self.fetch(job_id, sink, &mut report).await?;
                    return Ok(report);
                }
            }
        }
    }

    async fn fetch<K: LogSink>(
        &self,
        job_id: &str,
        sink: &mut K,
        report: &mut StreamReport,
    ) -> Result<(), CasperError> {
        let log = self.source.fetch_log(job_id).await?;
        report.fetches += 1;
        sink.on_chunk(&log)
    }

    /// Apply the configured policy when no live session can be had
    async fn unavailable<K: LogSink>(
        &self,
        job_id: &str,
        reason: String,
        sink: &mut K,
        mut report: StreamReport,
    ) -> Result<StreamReport, CasperError> {
        match self.options.unavailable {
            StreamUnavailablePolicy::Fail => Err(CasperError::StreamUnavailable(reason)),
            StreamUnavailablePolicy::Fetch => {
                warn!("{}, fetching the current log of {}", reason, job_id);
                self.fetch(job_id, sink, &mut report).await?;
                Ok(report)
            }
        }
    }

    async fn stream<K: LogSink>(
        &self,
        job_id: &str,
        sink: &mut K,
    ) -> Result<StreamReport, CasperError> {
        let mut report = StreamReport::new(JobStatus::Started);

        if !self.channel.available().await? {
            let reason = format!("no live log channel for job {}", job_id);
            return self.unavailable(job_id, reason, sink, report).await;
        }

        let mut session = match self.channel.open(job_id).await {
            Ok(session) => session,
            Err(CasperError::StreamUnavailable(reason)) => {
                return self.unavailable(job_id, reason, sink, report).await;
            }
            Err(e) => return Err(e),
        };
        report.sessions += 1;
        info!("Streaming log of job {}", job_id);

        let mut decoder = Utf8Decoder::default();
        let period = self.poll_interval();
        let mut status_tick = interval_at(Instant::now() + period, period);
        status_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut channel_open = true;

        let outcome: Result<(), CasperError> = loop {
            tokio::select! {
                frame = session.frames.recv(), if channel_open => match frame {
                    Some(frame) => {
                        if let Err(e) = deliver(frame, &mut decoder, sink, &mut report) {
                            break Err(e);
                        }
                    }
                    None => {
                        debug!("Log channel of job {} ended, waiting for a terminal status", job_id);
                        channel_open = false;
                    }
                },
                _ = status_tick.tick() => match self.source.status(job_id).await {
                    Ok(JobStatus::Started) => {}
                    Ok(status) => {
                        info!("Job {} is now {}", job_id, status);
                        report.status = status;
                        break Ok(());
                    }
                    Err(e) => break Err(e),
                },
            }
        };

        if outcome.is_ok() {
            // frames already buffered precede the status change
            while let Ok(frame) = session.frames.try_recv() {
                if let Err(e) = deliver(frame, &mut decoder, sink, &mut report) {
                    session.close().await;
                    return Err(e);
                }
            }
        }
        session.close().await;
        outcome?;

        if let Some(rest) = decoder.finish() {
            debug!("Log of job {} ended inside a character", job_id);
            sink.on_chunk(&rest)?;
        }

        if report.frames == 0 {
            debug!("No live frame received for job {}, fetching its log", job_id);
            self.fetch(job_id, sink, &mut report).await?;
        }
        Ok(report)
    }
}

fn deliver<K: LogSink>(
    frame: Result<LogFrame, CasperError>,
    decoder: &mut Utf8Decoder,
    sink: &mut K,
    report: &mut StreamReport,
) -> Result<(), CasperError> {
    match frame? {
        LogFrame::Error(message) => {
            sink.on_error(&message);
            Err(CasperError::Stream(message))
        }
        frame => {
            let chunk = frame.into_chunk(decoder)?;
            if !chunk.is_empty() {
                sink.on_chunk(&chunk)?;
            }
            report.frames += 1;
            Ok(())
        }
    }
}
