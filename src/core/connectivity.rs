//! Network reachability reporting

use futures::stream::BoxStream;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkStatus {
    Available,
    Unavailable,
    Losing,
    Lost,
}

impl NetworkStatus {
    /// Whether this status means requests can no longer reach the network.
    pub fn is_offline(&self) -> bool {
        matches!(self, NetworkStatus::Unavailable | NetworkStatus::Lost)
    }
}

impl Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                NetworkStatus::Available => "available",
                NetworkStatus::Unavailable => "unavailable",
                NetworkStatus::Losing => "losing",
                NetworkStatus::Lost => "lost",
            }
        )
    }
}

pub type StatusStream = BoxStream<'static, NetworkStatus>;

pub trait ConnectivityMonitor: Send + Sync {
    /// Subscribes to status changes.
    ///
    /// The stream yields the current status first and then every transition.
    /// Dropping it releases the subscription.
    fn observe(&self) -> StatusStream;
}
