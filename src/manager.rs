//! Session lifecycle: owns the active token, schedules the midpoint
//! refresh, and tears the session down when the service revokes it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::AuthError;
use crate::store::SessionStore;
use crate::token::Token;
use crate::transport::Transport;
use crate::types::TokenResponse;

const REFRESH_PATH: &str = "/session/refresh";

/// Maintains at most one live session against the identity service.
///
/// Two states: Idle (no session, no timer) and Active (a decoded token
/// plus at most one armed refresh timer). The refresh fires at the
/// midpoint of the token's validity window, not at expiry.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    state: Mutex<ManagerState>,
}

enum ManagerState {
    Idle,
    Active {
        token: Token,
        timer: Option<RefreshTimer>,
    },
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn SessionStore>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            store,
            state: Mutex::new(ManagerState::Idle),
        })
    }

    /// Load any persisted session and start maintaining it.
    ///
    /// An empty store leaves the manager Idle. A stored token that fails
    /// to decode is reported to the caller and the manager stays Idle.
    pub async fn initialize(self: &Arc<Self>) -> Result<(), AuthError> {
        let raw = match self.store.read()? {
            Some(raw) => raw,
            None => return Ok(()),
        };
        let token = Token::decode(&raw)?;
        {
            let mut state = self.state.lock().await;
            *state = ManagerState::Active { token, timer: None };
        }
        self.maintain().await;
        Ok(())
    }

    /// Raw token of the live session, if any.
    pub async fn session(&self) -> Option<String> {
        match &*self.state.lock().await {
            ManagerState::Active { token, .. } => Some(token.raw().to_string()),
            ManagerState::Idle => None,
        }
    }

    /// Delay the armed refresh timer was scheduled with, if one is armed.
    pub async fn pending_refresh(&self) -> Option<Duration> {
        match &*self.state.lock().await {
            ManagerState::Active {
                timer: Some(timer), ..
            } if timer.state() == TimerState::Armed => Some(timer.delay()),
            _ => None,
        }
    }

    /// Evaluate the active session: refresh immediately when the token is
    /// past its midpoint (or claims to be issued in the future), otherwise
    /// arm a timer for the midpoint. No-op while Idle.
    pub async fn maintain(self: &Arc<Self>) {
        let refresh_now = {
            let mut state = self.state.lock().await;
            match &mut *state {
                ManagerState::Idle => return,
                ManagerState::Active { token, timer } => {
                    let now_ms = Utc::now().timestamp_millis();
                    let issued_at_ms = token.issued_at() * 1000;
                    let refresh_at_ms = (token.issued_at() + token.half_life()) * 1000;
                    if now_ms < issued_at_ms || now_ms >= refresh_at_ms {
                        true
                    } else {
                        let delay = Duration::from_millis((refresh_at_ms - now_ms) as u64);
                        // Replacing the slot drops (and aborts) any prior timer.
                        *timer = Some(RefreshTimer::arm(Arc::downgrade(self), delay));
                        false
                    }
                }
            }
        };
        if refresh_now {
            self.refresh().await;
        }
    }

    /// Adopt a freshly issued token: persist it, replace the active
    /// session wholesale, and re-arm the timer for half the token's
    /// lifetime (the token was just issued, so its midpoint is simply
    /// `half_life` from now).
    ///
    /// Decode failures propagate and leave both store and session as
    /// they were.
    pub async fn update_and_maintain(self: &Arc<Self>, raw: &str) -> Result<(), AuthError> {
        let token = Token::decode(raw)?;
        self.store.update(raw)?;
        let delay = Duration::from_millis(token.half_life().max(0) as u64 * 1000);
        let mut state = self.state.lock().await;
        let timer = RefreshTimer::arm(Arc::downgrade(self), delay);
        *state = ManagerState::Active {
            token,
            timer: Some(timer),
        };
        Ok(())
    }

    /// Drop the session: cancel any pending refresh, clear the store,
    /// return to Idle. Safe to call when already Idle.
    pub async fn end_session(&self) -> Result<(), AuthError> {
        {
            let mut state = self.state.lock().await;
            if let ManagerState::Active { timer, .. } = &mut *state {
                if let Some(timer) = timer.take() {
                    timer.cancel();
                }
            }
            *state = ManagerState::Idle;
        }
        self.store.delete()
    }

    /// One refresh round-trip, fired by the timer or the immediate path.
    ///
    /// Success feeds [`Self::update_and_maintain`]; `Unauthorized` tears
    /// the session down; anything else is dropped — the refresh is a
    /// background operation with no caller, and the next `maintain()`
    /// will see the session as due again.
    pub(crate) async fn refresh(self: &Arc<Self>) {
        match self.transport.get(REFRESH_PATH, &[]).await {
            Ok(value) => {
                let raw = value
                    .and_then(|v| serde_json::from_value::<TokenResponse>(v).ok())
                    .map(|r| r.id_token);
                match raw {
                    Some(raw) => {
                        if let Err(err) = self.update_and_maintain(&raw).await {
                            tracing::warn!(error = %err, "refresh returned an unusable token");
                        }
                    }
                    None => tracing::debug!("refresh response carried no token"),
                }
            }
            Err(AuthError::Unauthorized) => {
                tracing::debug!("session revoked by the identity service");
                if let Err(err) = self.end_session().await {
                    tracing::warn!(error = %err, "failed to clear revoked session");
                }
            }
            Err(err) => tracing::debug!(error = %err, "session refresh failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Armed,
    Fired,
    Cancelled,
}

/// One-shot refresh timer owned by the manager.
///
/// At most one exists per manager; arming a replacement drops (and
/// thereby aborts) a still-armed predecessor. A timer that already fired
/// is left alone — its task may be mid-refresh.
struct RefreshTimer {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
    cancelled: bool,
    delay: Duration,
}

impl RefreshTimer {
    fn arm(manager: Weak<SessionManager>, delay: Duration) -> Self {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flag.store(true, Ordering::SeqCst);
            if let Some(manager) = manager.upgrade() {
                manager.refresh().await;
            }
        });
        Self {
            handle,
            fired,
            cancelled: false,
            delay,
        }
    }

    fn state(&self) -> TimerState {
        if self.fired.load(Ordering::SeqCst) {
            TimerState::Fired
        } else if self.cancelled {
            TimerState::Cancelled
        } else {
            TimerState::Armed
        }
    }

    fn delay(&self) -> Duration {
        self.delay
    }

    fn cancel(mut self) {
        if self.state() == TimerState::Armed {
            self.handle.abort();
        }
        self.cancelled = true;
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if !self.cancelled && !self.fired.load(Ordering::SeqCst) {
            self.handle.abort();
        }
    }
}
