use std::time::Duration;

/// SSH client configuration.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Time allowed for TCP connect plus key exchange.
    pub connect_timeout: Duration,
    /// Interval between keepalive probes on an idle session.
    pub keepalive_interval: Duration,
    /// Unanswered keepalives before the session is dropped.
    pub keepalive_max: usize,
    /// Accept host keys that cannot be verified, logging a warning.
    pub accept_unknown_host_keys: bool,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(30),
            keepalive_max: 3,
            accept_unknown_host_keys: true,
        }
    }
}

impl SshConfig {
    /// Builds the russh client configuration.
    pub(crate) fn to_client_config(&self) -> russh::client::Config {
        russh::client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(self.keepalive_interval),
            keepalive_max: self.keepalive_max,
            ..Default::default()
        }
    }
}
