//! OAuth device authorization flow implementation (RFC 8628).

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::auth::error::{DeviceFlowError, DeviceFlowResult};
use crate::auth::tokens::TokenSet;
use crate::auth::transport::DeviceFlowTransport;

/// Floor for the polling interval, also used when the server sends none.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Added to the interval on every `slow_down`.
pub const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Where the flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// No device code requested yet.
    Idle,
    /// Device code issued, waiting for the user.
    AwaitingAuthorization,
    /// A token was obtained.
    Authorized,
    /// The device code ran out.
    Expired,
    /// The user rejected the request.
    Denied,
    /// Any other terminal failure, including cancellation.
    Failed,
}

/// What the user needs to see to complete authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCodePrompt {
    /// Code to type in.
    pub user_code: String,
    /// URL for the user to visit.
    pub verification_uri: String,
    /// Complete URL with code (if available).
    pub verification_uri_complete: Option<String>,
    /// How long until the code expires.
    pub expires_in: Duration,
}

/// In-memory state between `initiate` and a terminal poll.
#[derive(Debug, Clone)]
struct DeviceCodeSession {
    device_code: String,
    interval: Duration,
    expires_at: Instant,
}

/// Drives one device authorization from code request to token.
pub struct DeviceAuthFlow {
    transport: Arc<dyn DeviceFlowTransport>,
    session: Option<DeviceCodeSession>,
    state: FlowState,
}

impl DeviceAuthFlow {
    /// Creates an idle flow on top of a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn DeviceFlowTransport>) -> Self {
        Self {
            transport,
            session: None,
            state: FlowState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> FlowState {
        self.state
    }

    /// Polling interval of the active session, if any.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.session.as_ref().map(|s| s.interval)
    }

    /// Requests a device code and starts a new session.
    ///
    /// Any previous session is replaced.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the request fails; the flow is then `Failed`.
    pub async fn initiate(&mut self) -> DeviceFlowResult<DeviceCodePrompt> {
        self.session = None;

        let grant = match self.transport.request_device_code().await {
            Ok(grant) => grant,
            Err(err) => {
                self.state = FlowState::Failed;
                return Err(err);
            },
        };

        let interval = grant.interval.max(MIN_POLL_INTERVAL);
        debug!(
            interval_secs = interval.as_secs(),
            expires_in_secs = grant.expires_in.as_secs(),
            "Device code issued"
        );

        self.session = Some(DeviceCodeSession {
            device_code: grant.device_code,
            interval,
            expires_at: Instant::now() + grant.expires_in,
        });
        self.state = FlowState::AwaitingAuthorization;

        Ok(DeviceCodePrompt {
            user_code: grant.user_code,
            verification_uri: grant.verification_uri,
            verification_uri_complete: grant.verification_uri_complete,
            expires_in: grant.expires_in,
        })
    }

    /// Polls the token endpoint once.
    ///
    /// Returns `Ok(None)` while the user has not finished authorizing.
    ///
    /// # Errors
    ///
    /// - [`DeviceFlowError::NotInitiated`] without an active session
    /// - [`DeviceFlowError::Expired`] once the device code has run out, without a request
    /// - [`DeviceFlowError::Denied`], [`DeviceFlowError::Unknown`] or
    ///   [`DeviceFlowError::Request`] as reported by the server
    pub async fn poll(&mut self) -> DeviceFlowResult<Option<TokenSet>> {
        let session = self.session.as_ref().ok_or(DeviceFlowError::NotInitiated)?;

        if Instant::now() > session.expires_at {
            return Err(self.finish(DeviceFlowError::Expired));
        }

        let device_code = session.device_code.clone();
        let result = self.transport.request_token(&device_code).await;

        match result {
            Ok(token) if token.is_expired() => Err(self.finish(DeviceFlowError::Expired)),
            Ok(token) => {
                info!("Device authorization granted");
                self.session = None;
                self.state = FlowState::Authorized;
                Ok(Some(token))
            },
            Err(DeviceFlowError::SlowDown) => {
                if let Some(session) = self.session.as_mut() {
                    session.interval += SLOW_DOWN_STEP;
                    debug!(
                        interval_secs = session.interval.as_secs(),
                        "Server asked to slow down"
                    );
                }
                Ok(None)
            },
            Err(err) if err.is_pending() => Ok(None),
            Err(err) => Err(self.finish(err)),
        }
    }

    /// Polls until the user authorizes, the code expires, or `cancel` fires.
    ///
    /// Sleeps for the current interval before every poll. `on_poll` receives the
    /// attempt count after each poll that did not yield a token.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceFlowError::Cancelled`] when `cancel` fires, or the first
    /// terminal error from [`poll`](Self::poll).
    pub async fn wait_for_authorization<F>(
        &mut self,
        mut on_poll: F,
        cancel: &CancellationToken,
    ) -> DeviceFlowResult<TokenSet>
    where
        F: FnMut(u32) + Send,
    {
        let mut attempts = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(self.finish(DeviceFlowError::Cancelled));
            }

            let interval = self.interval().ok_or(DeviceFlowError::NotInitiated)?;

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(self.finish(DeviceFlowError::Cancelled));
                }
                () = tokio::time::sleep(interval) => {}
            }

            if cancel.is_cancelled() {
                return Err(self.finish(DeviceFlowError::Cancelled));
            }

            if let Some(token) = self.poll().await? {
                return Ok(token);
            }

            attempts += 1;
            on_poll(attempts);
        }
    }

    /// Discards the session and records the terminal state for `err`.
    fn finish(&mut self, err: DeviceFlowError) -> DeviceFlowError {
        self.session = None;
        self.state = match err {
            DeviceFlowError::Expired => FlowState::Expired,
            DeviceFlowError::Denied => FlowState::Denied,
            _ => FlowState::Failed,
        };
        debug!(state = ?self.state, "Device authorization ended: {err}");
        err
    }
}

/// Open the verification URL in the default browser.
///
/// Returns `true` if the browser was opened successfully, `false` otherwise.
pub fn open_browser(prompt: &DeviceCodePrompt) -> bool {
    let url = prompt
        .verification_uri_complete
        .as_ref()
        .unwrap_or(&prompt.verification_uri);

    open::that(url).is_ok()
}
