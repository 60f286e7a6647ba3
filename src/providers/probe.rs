use crate::core::config::ConnectivityConfig;
use crate::core::connectivity::{ConnectivityMonitor, NetworkStatus, StatusStream};
use anyhow::Context;
use futures::StreamExt;
use reqwest::Url;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Reports reachability by periodically opening a TCP connection to the
/// quote host.
pub struct ProbeConnectivityMonitor {
    target: String,
    interval: Duration,
    timeout: Duration,
}

impl ProbeConnectivityMonitor {
    /// `target` is a `host:port` pair.
    pub fn new(target: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        ProbeConnectivityMonitor {
            target: target.into(),
            interval,
            timeout,
        }
    }

    /// Probes the host serving `base_url`.
    pub fn for_base_url(base_url: &str, config: &ConnectivityConfig) -> anyhow::Result<Self> {
        let url = Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
        let host = url
            .host_str()
            .with_context(|| format!("Base URL has no host: {base_url}"))?;
        let port = url
            .port_or_known_default()
            .with_context(|| format!("Base URL has no port: {base_url}"))?;
        Ok(Self::new(
            format!("{host}:{port}"),
            Duration::from_secs(config.probe_interval_secs),
            Duration::from_millis(config.probe_timeout_ms),
        ))
    }
}

async fn probe(target: &str, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(target)).await,
        Ok(Ok(_))
    )
}

/// A single failed probe only degrades an available network to `Losing`.
fn next_status(previous: Option<NetworkStatus>, reachable: bool) -> NetworkStatus {
    match (previous, reachable) {
        (_, true) => NetworkStatus::Available,
        (Some(NetworkStatus::Available), false) => NetworkStatus::Losing,
        (Some(NetworkStatus::Losing | NetworkStatus::Lost), false) => NetworkStatus::Lost,
        (None | Some(NetworkStatus::Unavailable), false) => NetworkStatus::Unavailable,
    }
}

impl ConnectivityMonitor for ProbeConnectivityMonitor {
    fn observe(&self) -> StatusStream {
        let (sender, receiver) = futures::channel::mpsc::unbounded();
        let target = self.target.clone();
        let interval = self.interval;
        let timeout = self.timeout;

        tokio::spawn(async move {
            let mut current = None;
            loop {
                let status = next_status(current, probe(&target, timeout).await);
                if current != Some(status) {
                    debug!(%status, target = %target, "Connectivity changed");
                    if sender.unbounded_send(status).is_err() {
                        break;
                    }
                    current = Some(status);
                }
                tokio::time::sleep(interval).await;
                if sender.is_closed() {
                    break;
                }
            }
            debug!(target = %target, "Connectivity probe stopped");
        });

        receiver.boxed()
    }
}
