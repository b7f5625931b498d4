//! Connection supervisor — keeps trying to reach a robot.

use std::time::Duration;

use crate::ports::{Connection, DeviceConnector};

/// Waits between connection attempts.
pub const DEFAULT_LADDER: [Duration; 5] = [
    Duration::from_secs(10),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(300),
    Duration::from_secs(600),
];

/// Increasing retry delays that hold at the last step.
#[derive(Debug, Clone)]
pub struct BackoffLadder {
    steps: Vec<Duration>,
    index: usize,
}

impl Default for BackoffLadder {
    fn default() -> Self {
        Self::new(DEFAULT_LADDER.to_vec())
    }
}

impl BackoffLadder {
    /// Create a ladder from its steps. An empty ladder retries immediately.
    #[must_use]
    pub fn new(steps: Vec<Duration>) -> Self {
        Self { steps, index: 0 }
    }

    /// Wait to apply after the current failure, then climb one step.
    pub fn next_wait(&mut self) -> Duration {
        let wait = self.steps.get(self.index).copied().unwrap_or_default();
        if self.index + 1 < self.steps.len() {
            self.index += 1;
        }
        wait
    }
}

/// Where the supervisor stands with its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Drives a [`DeviceConnector`] until it yields a connection.
///
/// The ladder is shared by every [`establish`](Self::establish) call of the
/// supervisor and is never reset.
pub struct ConnectionSupervisor<C> {
    connector: C,
    ladder: BackoffLadder,
    state: ConnectionState,
    label: String,
}

impl<C: DeviceConnector> ConnectionSupervisor<C> {
    /// Create a supervisor; `label` identifies the device in logs.
    pub fn new(connector: C, ladder: BackoffLadder, label: impl Into<String>) -> Self {
        Self {
            connector,
            ladder,
            state: ConnectionState::Disconnected,
            label: label.into(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Record that the established connection was lost.
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Give up on the current connection and wait the next ladder step
    /// before the following [`establish`](Self::establish).
    #[tracing::instrument(skip(self), fields(device = %self.label))]
    pub async fn backoff(&mut self) {
        self.mark_disconnected();
        let wait = self.ladder.next_wait();
        tracing::warn!(wait_secs = wait.as_secs(), "device connection unusable, backing off");
        tokio::time::sleep(wait).await;
    }

    /// Connect, retrying forever.
    #[tracing::instrument(skip(self), fields(device = %self.label))]
    pub async fn establish(&mut self) -> Connection<C::Link> {
        loop {
            self.state = ConnectionState::Connecting;
            tracing::info!("connecting to device");
            match self.connector.connect().await {
                Ok(connection) => {
                    self.state = ConnectionState::Connected;
                    tracing::info!("device connected");
                    return connection;
                }
                Err(err) => {
                    self.state = ConnectionState::Disconnected;
                    let wait = self.ladder.next_wait();
                    tracing::warn!(%err, wait_secs = wait.as_secs(), "device connection failed");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedConnector;

    #[test]
    fn should_climb_and_hold_at_last_step() {
        let mut ladder = BackoffLadder::default();
        let waits: Vec<u64> = (0..7).map(|_| ladder.next_wait().as_secs()).collect();
        assert_eq!(waits, vec![10, 30, 60, 300, 600, 600, 600]);
    }

    #[test]
    fn should_retry_immediately_with_empty_ladder() {
        let mut ladder = BackoffLadder::new(Vec::new());
        assert_eq!(ladder.next_wait(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn should_connect_on_first_attempt() {
        let connector = ScriptedConnector::default();
        let mut supervisor =
            ConnectionSupervisor::new(connector.clone(), BackoffLadder::default(), "BLID1");

        supervisor.establish().await;

        assert_eq!(connector.attempts(), 1);
        assert_eq!(supervisor.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_wait_along_the_ladder_between_failures() {
        let connector = ScriptedConnector::failing(3);
        let mut supervisor =
            ConnectionSupervisor::new(connector.clone(), BackoffLadder::default(), "BLID1");
        let started = tokio::time::Instant::now();

        supervisor.establish().await;

        assert_eq!(connector.attempts(), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(10 + 30 + 60));
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_reset_ladder_between_connections() {
        let connector = ScriptedConnector::failing(1);
        let mut supervisor =
            ConnectionSupervisor::new(connector.clone(), BackoffLadder::default(), "BLID1");
        supervisor.establish().await;
        supervisor.mark_disconnected();
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);

        let mut ladder = supervisor.ladder.clone();
        assert_eq!(ladder.next_wait(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn should_climb_ladder_on_backoff() {
        let connector = ScriptedConnector::default();
        let mut supervisor =
            ConnectionSupervisor::new(connector.clone(), BackoffLadder::default(), "BLID1");
        supervisor.establish().await;
        let started = tokio::time::Instant::now();

        supervisor.backoff().await;
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        assert_eq!(started.elapsed(), Duration::from_secs(10));

        supervisor.backoff().await;
        assert_eq!(started.elapsed(), Duration::from_secs(10 + 30));
        assert_eq!(connector.attempts(), 1);
    }
}
