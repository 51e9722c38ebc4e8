use educe::Educe;
use serde::{Deserialize, Serialize};

use crate::feedback::RoutingError;
use crate::framework::RoutingSystem;

/// Packet type tag of an originator message
pub const OGM_PACKET: &str = "OGM";

/// Originator Message, the flooded advertisement of one node
#[derive(Educe, Serialize, Deserialize)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[serde(bound = "", rename_all = "camelCase")]
pub struct Ogm<T: RoutingSystem + ?Sized> {
    /// generation number, increases on every origination
    pub sequence: u64,
    /// the node that created this ogm
    pub originator_address: T::NodeAddress,
    /// the neighbour the ogm was last forwarded by
    pub sender_address: T::NodeAddress,
    /// path throughput metric, not clamped on the wire
    pub throughput: u64,
    /// origination time in milliseconds since the unix epoch
    pub timestamp: u64,
}

impl<T: RoutingSystem + ?Sized> Ogm<T> {
    pub fn encode(&self) -> Result<Vec<u8>, RoutingError<T>> {
        serde_json::to_vec(self).map_err(RoutingError::Serialization)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, RoutingError<T>> {
        serde_json::from_slice(payload).map_err(RoutingError::Decode)
    }
}

/// Envelope moved between nodes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(kind: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    pub fn ogm(payload: Vec<u8>) -> Self {
        Self::new(OGM_PACKET, payload)
    }
}

#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
pub struct OutboundPacket<T: RoutingSystem + ?Sized> {
    /// neighbour to deliver to
    pub dest: T::NodeAddress,
    pub packet: Packet,
}
