use educe::Educe;
use serde::{Deserialize, Serialize};

use crate::framework::RoutingSystem;

#[derive(Educe, Serialize, Deserialize)]
#[educe(Clone(bound()), Debug(bound()))]
#[serde(bound = "")]
pub struct Neighbour<T: RoutingSystem + ?Sized> {
    /// the mesh address of the directly linked node
    pub addr: T::NodeAddress,
    /// Estimated capacity of the direct link. Higher is better.
    pub throughput: u64,
}
