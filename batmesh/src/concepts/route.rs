use educe::Educe;
use serde::{Deserialize, Serialize};

use crate::framework::RoutingSystem;

#[derive(Educe, Serialize, Deserialize)]
#[educe(Clone(bound()), Debug(bound()))]
#[serde(bound = "")]
pub struct NextHop<T: RoutingSystem + ?Sized> {
    /// the neighbour packets for the originator are forwarded to
    pub addr: T::NodeAddress,
    /// the path metric that was accepted through this neighbour
    pub throughput: u64,
}

/// Route table entry for one destination
#[derive(Educe, Serialize, Deserialize)]
#[educe(Clone(bound()), Debug(bound()))]
#[serde(bound = "")]
pub struct Originator<T: RoutingSystem + ?Sized> {
    /// the destination of this route
    pub addr: T::NodeAddress,
    pub next_hop: NextHop<T>,
    /// the last accepted ogm sequence number from this destination, anything at or below it is stale
    pub seqno: u64,
    /// our own ogm sequence number at the time this entry was last accepted
    pub refreshed_at: u64,
}
