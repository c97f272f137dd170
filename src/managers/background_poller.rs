//! Background device-flow poller for dotpush.
//!
//! Owns at most one active poll session. Each session runs in its own tokio task
//! that ticks, sleeps for the provider's interval and ticks again until the
//! flow is granted, denied, expired or cancelled. Results are persisted to the
//! credential store and broadcast to whoever is listening.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::credential_store::CredentialStore;
use crate::services::device_flow_client::DeviceFlowApi;
use crate::types::auth::{PollTermination, PollerStatus, TickDecision};
use crate::types::credential::Credential;
use crate::types::github::{DeviceFlowSession, PollOutcome};
use crate::types::message::BackgroundEvent;

const EVENT_CAPACITY: usize = 16;
pub const EXPIRED_REASON: &str = "expired_token";
/// Floor for any reschedule, so a zero interval cannot spin.
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// One poll session. The `active` flag is the cancellation signal.
pub struct PollState {
    pub id: Uuid,
    pub session: DeviceFlowSession,
    active: AtomicBool,
    started_at: Instant,
}

impl PollState {
    pub fn new(session: DeviceFlowSession) -> Self {
        Self {
            id: Uuid::new_v4(),
            session,
            active: AtomicBool::new(true),
            started_at: Instant::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    fn expired(&self) -> bool {
        self.started_at.elapsed() >= Duration::from_secs(self.session.expires_in)
    }

    /// Clamps a requested wait to at least one second and to no later than
    /// the first tick that will see the session expired.
    fn delay(&self, secs: u64) -> u64 {
        let remaining = Duration::from_secs(self.session.expires_in).saturating_sub(self.started_at.elapsed());
        let until_expiry = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        secs.min(until_expiry).max(MIN_POLL_INTERVAL_SECS)
    }
}

struct ActivePoll {
    state: Arc<PollState>,
    handle: Option<JoinHandle<()>>,
}

/// Device-flow poller. Cheap to clone; clones share the same active session.
#[derive(Clone)]
pub struct BackgroundPoller {
    api: Arc<dyn DeviceFlowApi>,
    store: Arc<CredentialStore>,
    events: broadcast::Sender<BackgroundEvent>,
    slow_down_increment: u64,
    current: Arc<Mutex<Option<ActivePoll>>>,
}

impl BackgroundPoller {
    pub fn new(api: Arc<dyn DeviceFlowApi>, store: Arc<CredentialStore>, slow_down_increment: u64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            store,
            events,
            slow_down_increment,
            current: Arc::new(Mutex::new(None)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActivePoll>> {
        self.current.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BackgroundEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> PollerStatus {
        match self.lock().as_ref() {
            Some(poll) => PollerStatus::Polling {
                session_id: poll.state.id,
                user_code: poll.state.session.user_code.clone(),
                verification_uri: poll.state.session.verification_uri.clone(),
            },
            None => PollerStatus::Idle,
        }
    }

    /// Starts polling `session`, replacing any poll already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, session: DeviceFlowSession) -> Uuid {
        let state = Arc::new(PollState::new(session));
        let id = state.id;

        let mut current = self.lock();
        if let Some(previous) = current.take() {
            Self::stop(previous);
        }
        let poller = self.clone();
        let task_state = Arc::clone(&state);
        let handle = tokio::spawn(async move { poller.run(task_state).await });
        info!(session_id = %id, interval = state.session.interval, "polling started");
        *current = Some(ActivePoll {
            state,
            handle: Some(handle),
        });
        id
    }

    /// Stops the active poll, if any. Nothing is broadcast.
    pub fn cancel(&self) -> bool {
        let previous = self.lock().take();
        match previous {
            Some(poll) => {
                Self::stop(poll);
                true
            }
            None => false,
        }
    }

    fn stop(poll: ActivePoll) {
        poll.state.deactivate();
        if let Some(handle) = poll.handle {
            handle.abort();
        }
        info!(session_id = %poll.state.id, "polling cancelled");
    }

    async fn run(&self, state: Arc<PollState>) {
        loop {
            match self.tick(&state).await {
                TickDecision::Reschedule(secs) => sleep(Duration::from_secs(secs)).await,
                TickDecision::Finished(termination) => {
                    self.finish(&state, termination);
                    return;
                }
            }
        }
    }

    /// Clears the slot only if it still holds this session.
    fn finish(&self, state: &PollState, termination: PollTermination) {
        let mut current = self.lock();
        if current.as_ref().map_or(false, |poll| poll.state.id == state.id) {
            *current = None;
        }
        state.deactivate();
        debug!(session_id = %state.id, ?termination, "poll session finished");
    }

    /// Performs one poll step for `poll`.
    pub async fn tick(&self, poll: &PollState) -> TickDecision {
        if !poll.is_active() {
            return TickDecision::Finished(PollTermination::Cancelled);
        }
        if poll.expired() {
            return self.fail(poll, EXPIRED_REASON.to_string());
        }

        match self.api.poll_once(&poll.session).await {
            Ok(PollOutcome::Pending) => TickDecision::Reschedule(poll.delay(poll.session.interval)),
            Ok(PollOutcome::SlowDown) => {
                debug!("provider asked to slow down");
                let slower = poll.session.interval.saturating_add(self.slow_down_increment);
                TickDecision::Reschedule(poll.delay(slower))
            }
            Ok(PollOutcome::Granted(token)) => self.complete(poll, token).await,
            Ok(PollOutcome::Denied(reason)) => self.fail(poll, reason),
            Err(e) => self.fail(poll, e.to_string()),
        }
    }

    async fn complete(&self, poll: &PollState, token: String) -> TickDecision {
        if !poll.is_active() {
            return TickDecision::Finished(PollTermination::Cancelled);
        }
        let profile = match self.api.fetch_identity(&token).await {
            Ok(profile) => profile,
            Err(e) => return self.fail(poll, e.to_string()),
        };
        if !poll.is_active() {
            return TickDecision::Finished(PollTermination::Cancelled);
        }

        let credential = Credential::from_profile(&token, profile.clone());
        if let Err(e) = self.store.save(&credential) {
            return self.fail(poll, e.to_string());
        }

        info!(username = %credential.username, "device flow authorized");
        self.broadcast(BackgroundEvent::AuthComplete { token, profile });
        TickDecision::Finished(PollTermination::Granted)
    }

    fn fail(&self, poll: &PollState, reason: String) -> TickDecision {
        if !poll.is_active() {
            return TickDecision::Finished(PollTermination::Cancelled);
        }
        warn!(session_id = %poll.id, %reason, "device flow failed");
        self.broadcast(BackgroundEvent::AuthFailed {
            reason: reason.clone(),
        });
        TickDecision::Finished(PollTermination::Denied(reason))
    }

    fn broadcast(&self, event: BackgroundEvent) {
        let name = event.name();
        if self.events.send(event).is_err() {
            debug!(event = name, "no listeners for event");
        }
    }
}
