use super::{
    SessionCommand, SessionConfig, SessionHandle, SessionSnapshot,
    event::SessionEvent,
    state::{RetryAction, SessionFault, SessionState, TakeSummary},
};
use crate::{
    CoreResult, SessionError,
    capture::{CaptureSession, CaptureStatus, FinalizeIntent, StopMode, StopOutcome},
    device::{AnalysisTap, EndedSignal, Encoder, InputStream, Microphone, PlaybackEngine},
    marker::{Marker, MarkerTrack},
    playback::{EndedOutcome, PlaybackSession, SeekOutcome},
    take::{EncodedAudio, Take, TakeStore},
    waveform::{LiveWaveformRenderer, Surface},
};

use std::{collections::BTreeMap, future::pending, panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until},
};
use tracing::{debug, error, info, instrument, warn};

/// Capacity of the command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

type Event<M, P> = SessionEvent<
    <M as Microphone>::Stream,
    <M as Microphone>::Tap,
    <P as PlaybackEngine>::Player,
>;

/// How a granted microphone moves on to recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireMode {
    /// Wait out the arm delay first.
    Delayed,
    /// Record at once; part of a restart.
    Immediate,
}

/// Orchestrates capture, history, playback and the live waveform behind a
/// single state machine.
///
/// Runs as its own task; the rest of the application talks to it through a
/// [`SessionHandle`]. All timers are owned here and re-derived from state
/// after every command and event, so every exit path cancels them.
pub struct SessionController<M, E, P, S>
where
    M: Microphone,
    E: Encoder,
    P: PlaybackEngine,
    S: Surface,
{
    config: SessionConfig,
    microphone: Arc<M>,
    encoder: Arc<E>,
    engine: Arc<P>,

    capture: CaptureSession<M::Stream>,
    store: TakeStore,
    playback: PlaybackSession<P::Player>,
    renderer: LiveWaveformRenderer<S, M::Tap>,
    markers: MarkerTrack,
    fault: Option<SessionFault>,

    acquire: AcquireMode,
    pending_finalizes: BTreeMap<u64, FinalizeIntent>,
    arm_deadline: Option<Instant>,
    restart_deadline: Option<Instant>,
    record_tick: Option<Interval>,
    playback_tick: Option<Interval>,
    frame_tick: Option<Interval>,

    command_rx: mpsc::Receiver<SessionCommand>,
    event_tx: mpsc::UnboundedSender<Event<M, P>>,
    event_rx: mpsc::UnboundedReceiver<Event<M, P>>,
    ended_tx: mpsc::UnboundedSender<u64>,
    ended_rx: mpsc::UnboundedReceiver<u64>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<M, E, P, S> SessionController<M, E, P, S>
where
    M: Microphone,
    E: Encoder,
    P: PlaybackEngine,
    S: Surface,
{
    /// Build a controller and the handle that drives it.
    ///
    /// Nothing runs until [`run`](Self::run) is awaited.
    pub fn new(
        config: SessionConfig,
        microphone: M,
        encoder: E,
        engine: P,
        surface: S,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ended_tx, ended_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let controller = Self {
            store: TakeStore::new(config.max_takes),
            renderer: LiveWaveformRenderer::new(config.waveform.clone(), surface),
            config,
            microphone: Arc::new(microphone),
            encoder: Arc::new(encoder),
            engine: Arc::new(engine),
            capture: CaptureSession::new(),
            playback: PlaybackSession::new(),
            markers: MarkerTrack::new(),
            fault: None,
            acquire: AcquireMode::Delayed,
            pending_finalizes: BTreeMap::new(),
            arm_deadline: None,
            restart_deadline: None,
            record_tick: None,
            playback_tick: None,
            frame_tick: None,
            command_rx,
            event_tx,
            event_rx,
            ended_tx,
            ended_rx,
            snapshot_tx,
        };

        (controller, SessionHandle::new(command_tx, snapshot_rx))
    }

    /// Build a controller and run it on the current runtime.
    pub fn spawn(
        config: SessionConfig,
        microphone: M,
        encoder: E,
        engine: P,
        surface: S,
    ) -> (SessionHandle, tokio::task::JoinHandle<()>) {
        let (controller, handle) = Self::new(config, microphone, encoder, engine, surface);
        (handle, tokio::spawn(controller.run()))
    }

    /// Process commands, device events and timers until shutdown or until
    /// every handle is dropped.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Session controller starting");
        self.publish();

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(SessionCommand::Shutdown) | None => {
                            info!("Shutdown requested");
                            break;
                        }
                        Some(command) => self.handle_command(command),
                    }
                }

                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }

                Some(generation) = self.ended_rx.recv() => {
                    self.on_ended(generation);
                }

                _ = sleep_until_opt(self.arm_deadline) => {
                    self.arm_deadline = None;
                    self.begin_recording();
                }

                _ = sleep_until_opt(self.restart_deadline) => {
                    self.restart_deadline = None;
                    info!("Restart settle elapsed, reacquiring microphone");
                    self.markers.clear();
                    self.start_capture(AcquireMode::Immediate);
                }

                _ = tick_opt(&mut self.record_tick) => {
                    self.on_record_tick();
                }

                _ = tick_opt(&mut self.playback_tick) => {
                    self.playback.sample();
                }

                now = tick_opt(&mut self.frame_tick) => {
                    let elapsed = self.capture.elapsed_precise(now);
                    self.renderer.render_frame(now, self.markers.markers(), elapsed);
                }
            }

            self.sync_timers();
            self.publish();
        }

        self.shutdown();
        info!("Session controller stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        debug!(command = ?command, "Session command");

        if self.fault.is_some() {
            match command {
                SessionCommand::DismissError => self.dismiss_error(),
                SessionCommand::Retry => self.retry(),
                SessionCommand::SetRepeatOne(enabled) => self.playback.set_repeat_one(enabled),
                SessionCommand::SetMarker { reply } => {
                    let _ = reply.send(None);
                }
                other => debug!(command = ?other, "Ignored while faulted"),
            }
            return;
        }

        match command {
            SessionCommand::StartRecording => self.start_recording(),
            SessionCommand::StopRecording => self.stop_recording(),
            SessionCommand::Discard => self.discard(),
            SessionCommand::Delete => self.delete(),
            SessionCommand::Restart => self.restart(),
            SessionCommand::Play => self.play(),
            SessionCommand::Pause => {
                self.playback.pause();
            }
            SessionCommand::TogglePlayback => {
                if self.playback.is_playing() {
                    self.playback.pause();
                } else {
                    self.play();
                }
            }
            SessionCommand::StopPlayback => {
                self.playback.stop();
            }
            SessionCommand::Seek { seconds } => self.seek(seconds),
            SessionCommand::SetMarker { reply } => self.set_marker(reply),
            SessionCommand::NextMarker => {
                let target = self.markers.next_after(self.playback.position());
                self.seek_to_marker(target);
            }
            SessionCommand::PreviousMarker => {
                let target = self.markers.previous_before(self.playback.position());
                self.seek_to_marker(target);
            }
            SessionCommand::SetRepeatOne(enabled) => self.playback.set_repeat_one(enabled),
            SessionCommand::DismissError | SessionCommand::Retry => {}
            SessionCommand::Shutdown => {}
        }
    }

    #[instrument(skip(self))]
    fn start_recording(&mut self) {
        if self.capture.is_active() {
            debug!("Already recording");
            return;
        }

        if self.playback.is_playing() {
            info!("Stopping playback before recording");
        }
        self.supersede_restart();
        self.markers.clear();
        self.start_capture(AcquireMode::Delayed);
    }

    /// A recording started by the user wins over a pending restart; its
    /// false start is still stored but no longer reacquires the microphone.
    fn supersede_restart(&mut self) {
        if self.restart_deadline.take().is_some() {
            info!("Restart superseded by a new recording");
        }

        for (generation, intent) in self.pending_finalizes.iter_mut() {
            if *intent == FinalizeIntent::KeepAsFalseStart {
                info!(generation = *generation, "Pending restart superseded by a new recording");
                *intent = FinalizeIntent::FalseStartOnly;
            }
        }
    }

    fn start_capture(&mut self, mode: AcquireMode) {
        self.acquire = mode;
        self.arm_deadline = None;
        self.playback.stop();

        let generation = self.capture.request();
        let microphone = Arc::clone(&self.microphone);
        let tx = self.event_tx.clone();

        tokio::task::spawn_blocking(move || {
            let result = microphone.open();
            let _ = tx.send(SessionEvent::DeviceGranted { generation, result });
        });
        debug!(generation = generation, mode = ?mode, "Microphone requested");
    }

    fn begin_recording(&mut self) {
        if !self.capture.begin(Instant::now()) {
            return;
        }

        let generation = self.renderer.begin();
        let microphone = Arc::clone(&self.microphone);
        let window = self.config.waveform.analysis_window;
        let tx = self.event_tx.clone();

        tokio::task::spawn_blocking(move || {
            let result = microphone.open_analysis(window);
            let _ = tx.send(SessionEvent::AnalysisGranted { generation, result });
        });
    }

    #[instrument(skip(self))]
    fn stop_recording(&mut self) {
        if self.cancel_restart() {
            // A false start not yet finalized becomes an ordinary take.
            if let Some(intent) = self.pending_finalizes.values_mut().next_back() {
                if *intent == FinalizeIntent::KeepAsFalseStart {
                    *intent = FinalizeIntent::Keep;
                }
            }
        }
        self.end_capture(StopMode::Finalize(FinalizeIntent::Keep));
    }

    #[instrument(skip(self))]
    fn discard(&mut self) {
        self.cancel_restart();
        self.end_capture(StopMode::DropBuffered);
    }

    /// Drop the current take.
    ///
    /// While recording the capture is finalized with a discard intent and the
    /// finalize completion drops it. While a finalize is pending its intent is
    /// flipped instead, so the completion is the only place that decides.
    #[instrument(skip(self))]
    fn delete(&mut self) {
        if self.capture.is_active() {
            self.arm_deadline = None;
            self.end_capture(StopMode::Finalize(FinalizeIntent::Discard));
            return;
        }

        if let Some((generation, intent)) = self.pending_finalizes.iter_mut().next_back() {
            info!(generation = *generation, "Delete deferred until finalize completes");
            *intent = FinalizeIntent::Discard;
            self.restart_deadline = None;
            return;
        }

        if self.restart_deadline.take().is_some() {
            info!("Restart cancelled by delete");
        }

        match self.store.drop_last() {
            Some(take) => {
                info!(take_id = %take.id(), "Take deleted");
                self.after_history_change();
            }
            None => debug!("Nothing to delete"),
        }
    }

    #[instrument(skip(self))]
    fn restart(&mut self) {
        if self.capture.status() != CaptureStatus::Recording {
            debug!("Restart ignored, not recording");
            return;
        }

        self.end_capture(StopMode::Finalize(FinalizeIntent::KeepAsFalseStart));
    }

    fn end_capture(&mut self, mode: StopMode) {
        self.arm_deadline = None;
        let restart = mode == StopMode::Finalize(FinalizeIntent::KeepAsFalseStart);

        match self.capture.stop(mode) {
            StopOutcome::Released => {}
            StopOutcome::Empty => {
                if restart {
                    self.restart_deadline = Some(Instant::now() + self.config.restart_settle);
                }
            }
            StopOutcome::Finalize(pending) => {
                let generation = pending.generation;
                self.pending_finalizes.insert(generation, pending.intent);

                let encoder = Arc::clone(&self.encoder);
                let tx = self.event_tx.clone();
                tokio::task::spawn_blocking(move || {
                    let result = encoder.finalize(pending.format, pending.chunks);
                    let _ = tx.send(SessionEvent::Finalized { generation, result });
                });
            }
        }

        self.renderer.teardown();
    }

    fn cancel_restart(&mut self) -> bool {
        let had_deadline = self.restart_deadline.take().is_some();
        let pending = self
            .pending_finalizes
            .values()
            .any(|intent| *intent == FinalizeIntent::KeepAsFalseStart);
        let reacquiring = self.acquire == AcquireMode::Immediate && self.capture.is_active();

        had_deadline || pending || reacquiring
    }

    fn play(&mut self) {
        if self.capture_busy() {
            debug!("Play ignored while recording");
            return;
        }
        if !self.playback.play() {
            debug!("Play ignored, no take bound");
        }
    }

    fn seek(&mut self, seconds: f64) {
        if self.capture_busy() {
            debug!("Seek ignored while recording");
            return;
        }

        match self.playback.seek(seconds) {
            SeekOutcome::NoTake => debug!("Seek ignored, no take bound"),
            SeekOutcome::Previewed(position) => debug!(position = position, "Seek preview"),
            SeekOutcome::Relocated(position) => {
                debug!(position = position, "Seek relocated playback");
                self.playback_tick = None;
            }
        }
    }

    fn seek_to_marker(&mut self, marker: Option<Marker>) {
        match marker {
            Some(marker) => self.seek(marker.time_seconds),
            None => debug!("No marker in that direction"),
        }
    }

    fn set_marker(&mut self, reply: oneshot::Sender<Option<Marker>>) {
        let marker = if self.capture.status() == CaptureStatus::Recording {
            let marker = self.markers.add(self.capture.elapsed_precise(Instant::now()));
            info!(id = marker.id, time_seconds = marker.time_seconds, "Marker set");
            Some(marker)
        } else {
            None
        };

        let _ = reply.send(marker);
    }

    fn dismiss_error(&mut self) {
        if let Some(fault) = self.fault.take() {
            info!(kind = ?fault.kind, "Fault dismissed");
        }
        self.capture.reset();
    }

    fn retry(&mut self) {
        let Some(fault) = self.fault.take() else {
            return;
        };
        self.capture.reset();

        match fault.retry {
            RetryAction::Rearm => {
                info!(kind = ?fault.kind, "Retrying recording setup");
                self.markers.clear();
                self.start_capture(AcquireMode::Delayed);
            }
            RetryAction::Dismiss => info!(kind = ?fault.kind, "Fault dismissed"),
        }
    }

    fn on_record_tick(&mut self) {
        if let Some(reason) = self.capture.tick(Instant::now()) {
            let error = SessionError::DeviceError {
                reason,
                location: ErrorLocation::from(Location::caller()),
            };
            self.enter_error(error);
        }
    }

    fn on_ended(&mut self, generation: u64) {
        match self.playback.on_ended(generation) {
            EndedOutcome::Ignored => debug!(generation = generation, "Stale end-of-clip"),
            EndedOutcome::Looped => {
                debug!("Repeat-one restarted take");
                self.playback_tick = None;
            }
            EndedOutcome::Finished => info!("Playback finished"),
        }
    }

    fn handle_event(&mut self, event: Event<M, P>) {
        match event {
            SessionEvent::DeviceGranted { generation, result } => {
                self.on_device_granted(generation, result)
            }
            SessionEvent::AnalysisGranted { generation, result } => match result {
                Ok(tap) => {
                    if let Err(mut stale) = self.renderer.attach(generation, tap) {
                        stale.disconnect();
                        stale.stop_tracks();
                        stale.close();
                        debug!(generation = generation, "Stale analysis tap released");
                    }
                }
                Err(e) => self.renderer.fail(generation, &e.to_string()),
            },
            SessionEvent::Finalized { generation, result } => {
                self.on_finalized(generation, result)
            }
            SessionEvent::Loaded {
                generation,
                take_id,
                result,
            } => match result {
                Ok(player) => {
                    if !self.playback.bind(generation, take_id, player) {
                        debug!(generation = generation, "Stale player dropped");
                    }
                }
                Err(e) => {
                    if generation == self.playback.generation() {
                        self.enter_error(e);
                    } else {
                        debug!(generation = generation, error = ?e, "Stale load failure");
                    }
                }
            },
            SessionEvent::DurationProbed { generation, result } => match result {
                Ok(seconds) => {
                    self.playback.set_duration(generation, seconds);
                }
                Err(e) => warn!(generation = generation, error = ?e, "Duration probe failed"),
            },
        }
    }

    fn on_device_granted(&mut self, generation: u64, result: CoreResult<M::Stream>) {
        let current = generation == self.capture.generation()
            && self.capture.status() == CaptureStatus::RequestingDevice;

        match result {
            Ok(stream) => match self.capture.grant(generation, stream) {
                Ok(()) => match self.acquire {
                    AcquireMode::Delayed => {
                        self.arm_deadline = Some(Instant::now() + self.config.arm_delay);
                    }
                    AcquireMode::Immediate => self.begin_recording(),
                },
                Err(mut stale) => {
                    stale.close();
                    debug!(generation = generation, "Late microphone grant released");
                }
            },
            Err(e) if current => match self.acquire {
                AcquireMode::Delayed => self.enter_error(e),
                AcquireMode::Immediate => {
                    let error = SessionError::RestartFailed {
                        source: Box::new(e),
                        location: ErrorLocation::from(Location::caller()),
                    };
                    self.enter_error(error);
                }
            },
            Err(e) => debug!(generation = generation, error = ?e, "Stale microphone failure"),
        }
    }

    /// The single place that decides what a finished encode becomes.
    fn on_finalized(&mut self, generation: u64, result: CoreResult<EncodedAudio>) {
        self.capture.finish_finalize(generation);

        let Some(intent) = self.pending_finalizes.remove(&generation) else {
            warn!(generation = generation, "Finalize without a pending intent");
            return;
        };

        match (intent, result) {
            (FinalizeIntent::Discard, Ok(audio)) => {
                info!(generation = generation, bytes = audio.len(), "Finalized take discarded");
            }
            (FinalizeIntent::Discard, Err(e)) => {
                warn!(generation = generation, error = ?e, "Discarded take failed to finalize");
            }
            (FinalizeIntent::Keep, Ok(audio)) => {
                let take = Take::normal(audio);
                info!(generation = generation, take_id = %take.id(), "Take stored");
                self.store.append(take);
                self.after_history_change();
            }
            (FinalizeIntent::KeepAsFalseStart, Ok(audio)) => {
                let take = Take::false_start(audio);
                info!(generation = generation, take_id = %take.id(), "False start stored");
                self.store.append(take);
                self.after_history_change();

                if self.fault.is_none() {
                    self.restart_deadline = Some(Instant::now() + self.config.restart_settle);
                }
            }
            (FinalizeIntent::FalseStartOnly, Ok(audio)) => {
                let take = Take::false_start(audio);
                info!(generation = generation, take_id = %take.id(), "False start stored");
                self.store.append(take);
                self.after_history_change();
            }
            (FinalizeIntent::FalseStartOnly, Err(e)) => {
                warn!(generation = generation, error = ?e, "Superseded false start failed to finalize");
            }
            (FinalizeIntent::Keep | FinalizeIntent::KeepAsFalseStart, Err(e)) => {
                self.enter_error(e);
            }
        }
    }

    /// Rebind playback to the current take. Runs after every history change.
    fn after_history_change(&mut self) {
        let Some(take) = self.store.current().map(Arc::clone) else {
            info!("History empty, playback unbound");
            self.playback.unbind();
            return;
        };

        let generation = self.playback.prepare_rebind();
        let engine = Arc::clone(&self.engine);
        let ended = EndedSignal::new(self.ended_tx.clone(), generation);
        let tx = self.event_tx.clone();

        tokio::task::spawn_blocking(move || {
            let result = engine.load(take.audio(), ended);
            let loaded = result.is_ok();
            let _ = tx.send(SessionEvent::Loaded {
                generation,
                take_id: take.id(),
                result,
            });

            if loaded {
                let result = engine.probe_duration(take.audio());
                let _ = tx.send(SessionEvent::DurationProbed { generation, result });
            }
        });
    }

    fn enter_error(&mut self, error: SessionError) {
        error!(error = %error, "Session fault");

        self.arm_deadline = None;
        self.restart_deadline = None;
        self.capture.fail(error.to_string());
        self.renderer.teardown();
        self.playback.pause();
        self.fault = Some(SessionFault::from_error(&error));
    }

    fn capture_busy(&self) -> bool {
        self.capture.is_active()
            || self.restart_deadline.is_some()
            || self
                .pending_finalizes
                .values()
                .any(|intent| *intent == FinalizeIntent::KeepAsFalseStart)
    }

    fn state(&self) -> SessionState {
        if self.fault.is_some() {
            return SessionState::Error;
        }

        match self.capture.status() {
            CaptureStatus::Recording => return SessionState::Recording,
            CaptureStatus::RequestingDevice | CaptureStatus::Armed => {
                return match self.acquire {
                    AcquireMode::Delayed => SessionState::Armed,
                    AcquireMode::Immediate => SessionState::Recording,
                };
            }
            _ => {}
        }

        if self.capture_busy() {
            SessionState::Recording
        } else if self.playback.is_playing() {
            SessionState::Playing
        } else if self.store.current().is_some() {
            SessionState::Stopped
        } else {
            SessionState::Idle
        }
    }

    fn sync_timers(&mut self) {
        let now = Instant::now();

        if self.capture.status() != CaptureStatus::Recording {
            self.renderer.teardown();
        }
        if self.capture.status() != CaptureStatus::Armed {
            self.arm_deadline = None;
        }

        sync_interval(
            &mut self.record_tick,
            self.capture.status() == CaptureStatus::Recording,
            now,
            self.config.record_tick,
        );
        sync_interval(
            &mut self.playback_tick,
            self.playback.is_playing(),
            now,
            self.config.playback_tick,
        );
        sync_interval(
            &mut self.frame_tick,
            self.renderer.wants_frames(),
            now,
            self.config.frame_interval,
        );
    }

    fn publish(&self) {
        let snapshot = SessionSnapshot {
            state: self.state(),
            capture: self.capture.status(),
            elapsed_seconds: self.capture.elapsed_seconds(),
            playback: self.playback.status(),
            position_seconds: self.playback.position(),
            duration_seconds: self.playback.duration(),
            repeat_one: self.playback.repeat_one(),
            takes: self.store.iter().map(|t| TakeSummary::from(t.as_ref())).collect(),
            bound_take: self.playback.take_id(),
            markers: self.markers.markers().to_vec(),
            marker_placements: self.renderer.placements().to_vec(),
            renderer: self.renderer.status(),
            pending_finalizes: self.pending_finalizes.len(),
            fault: self.fault.clone(),
        };

        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn shutdown(&mut self) {
        self.arm_deadline = None;
        self.restart_deadline = None;
        self.capture.reset();
        self.renderer.teardown();
        self.playback.unbind();
        self.record_tick = None;
        self.playback_tick = None;
        self.frame_tick = None;
        self.publish();
    }
}

fn sync_interval(slot: &mut Option<Interval>, wanted: bool, now: Instant, period: Duration) {
    match (wanted, slot.is_some()) {
        (true, false) => {
            let period = period.max(Duration::from_millis(1));
            let mut interval = interval_at(now + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *slot = Some(interval);
        }
        (false, true) => *slot = None,
        _ => {}
    }
}

async fn tick_opt(interval: &mut Option<Interval>) -> Instant {
    match interval {
        Some(interval) => interval.tick().await,
        None => pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
