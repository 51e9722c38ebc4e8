use educe::Educe;
use log::{debug, error, warn};
use thiserror::Error;

use crate::framework::RoutingSystem;

/// Failures of a single node while sending or handling packets.
/// None of them are fatal to the node, they are reported through a [`FeedbackSink`].
#[derive(Error, Educe)]
#[educe(Debug(bound()))]
pub enum RoutingError<T: RoutingSystem + ?Sized> {
    /// The destination is not registered in the network, topology misconfiguration
    #[error("destination {addr} not found")]
    DestinationNotFound { addr: T::NodeAddress },
    /// There is no directed edge between the two nodes
    #[error("edge {from} -> {to} not found")]
    EdgeNotFound {
        from: T::NodeAddress,
        to: T::NodeAddress,
    },
    #[error("malformed OGM: {0}")]
    Decode(#[source] serde_json::Error),
    /// OGMs are only trusted from direct links. Either stale neighbour state or spoofing.
    #[error("OGM for {originator} sent by {sender}, which is not a neighbour")]
    UnknownSender {
        originator: T::NodeAddress,
        sender: T::NodeAddress,
    },
    /// Expected while flooding, the same generation arrives over several paths
    #[error("stale OGM for {originator}: sequence {received} <= {stored}")]
    StaleSequence {
        originator: T::NodeAddress,
        received: u64,
        stored: u64,
    },
    #[error("failed to serialize OGM: {0}")]
    Serialization(#[source] serde_json::Error),
    /// Some neighbours could not be reached during a flood, the rest were still sent to
    #[error("flood failed for {} of {attempted} neighbours", .failures.len())]
    Flood {
        attempted: usize,
        failures: Vec<(T::NodeAddress, RoutingError<T>)>,
    },
}

impl<T: RoutingSystem + ?Sized> RoutingError<T> {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RoutingError::DestinationNotFound { .. } | RoutingError::EdgeNotFound { .. }
        )
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, RoutingError::StaleSequence { .. })
    }
}

/// Receives every failure a node runs into, tagged with the node it happened on
pub trait FeedbackSink<T: RoutingSystem + ?Sized>: Send + Sync {
    fn report(&self, node: &T::NodeAddress, error: &RoutingError<T>);
}

/// Default sink, writes failures to the log
#[derive(Default, Clone, Copy, Debug)]
pub struct LogSink;

impl<T: RoutingSystem + ?Sized> FeedbackSink<T> for LogSink {
    fn report(&self, node: &T::NodeAddress, error: &RoutingError<T>) {
        match error {
            RoutingError::StaleSequence { .. } => debug!("[{node}] {error}"),
            RoutingError::UnknownSender { .. } | RoutingError::Decode(_) => {
                warn!("[{node}] dropped OGM, {error}")
            }
            RoutingError::Flood { failures, .. } => {
                error!("[{node}] {error}");
                for (neigh, err) in failures {
                    error!("[{node}]   -> {neigh}: {err}");
                }
            }
            _ => error!("[{node}] {error}"),
        }
    }
}
