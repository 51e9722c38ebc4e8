use crate::concepts::neighbour::Neighbour;
use crate::concepts::packet::{Ogm, OutboundPacket, Packet};
use crate::concepts::route::{NextHop, Originator};
use crate::feedback::RoutingError;
use crate::framework::{ProtocolParams, RoutingSystem};
use crate::util::{apply_hop_penalty, bottleneck};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::HashMap;

/// Routing state of a single node. I/O free, packets to send are written to `outbound_packets`.
#[serde_as]
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Router<T: RoutingSystem + ?Sized> {
    pub address: T::NodeAddress,
    /// Destination, Route
    #[serde_as(as = "Vec<(_, _)>")]
    pub originators: HashMap<T::NodeAddress, Originator<T>>,
    #[serde_as(as = "Vec<(_, _)>")]
    pub neighbours: HashMap<T::NodeAddress, Neighbour<T>>,
    /// sequence number of our last originated ogm, only ever incremented
    pub seqno: u64,
    #[serde(skip_serializing, skip_deserializing)]
    pub outbound_packets: Vec<OutboundPacket<T>>,
    #[serde(skip_serializing, skip_deserializing)]
    pub params: ProtocolParams,
}

/// What an accepted OGM did to the route table
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum UpdateAction {
    /// first route to this originator
    Installed,
    /// a higher metric was accepted, possibly through a new next hop
    Switched,
    /// sequence advanced, next hop unchanged
    Refreshed,
}

impl<T: RoutingSystem> Router<T> {
    pub fn new(address: T::NodeAddress) -> Self {
        Self::with_params(address, T::config())
    }

    pub fn with_params(address: T::NodeAddress, params: ProtocolParams) -> Self {
        Self {
            address,
            originators: HashMap::new(),
            neighbours: HashMap::new(),
            seqno: 0,
            outbound_packets: Vec::new(),
            params,
        }
    }

    pub fn add_neighbour(&mut self, addr: T::NodeAddress, throughput: u64) {
        self.neighbours
            .insert(addr.clone(), Neighbour { addr, throughput });
    }

    // region Interface
    /// writes a packet to the outbound packet queue for all neighbours
    pub fn write_broadcast_packet(&mut self, packet: &Packet) {
        for neigh in self.neighbours.keys() {
            self.outbound_packets.push(OutboundPacket {
                dest: neigh.clone(),
                packet: packet.clone(),
            });
        }
    }

    pub fn next_hop(&self, addr: &T::NodeAddress) -> Option<&T::NodeAddress> {
        self.originators.get(addr).map(|o| &o.next_hop.addr)
    }

    pub fn metric_to(&self, addr: &T::NodeAddress) -> Option<u64> {
        self.originators.get(addr).map(|o| o.next_hop.throughput)
    }

    pub fn seqno_for(&self, addr: &T::NodeAddress) -> Option<u64> {
        if *addr == self.address {
            return Some(self.seqno);
        }
        self.originators.get(addr).map(|o| o.seqno)
    }
    // endregion

    /// Handles a raw OGM payload. Returns the OGM that was reflooded, or `None` for an echo of our own.
    pub fn handle_ogm(&mut self, payload: &[u8]) -> Result<Option<Ogm<T>>, RoutingError<T>> {
        let ogm = Ogm::<T>::decode(payload)?;
        trace!(
            "[{}] got OGM {} #{} from {}",
            self.address,
            ogm.originator_address,
            ogm.sequence,
            ogm.sender_address
        );

        if ogm.originator_address == self.address {
            // our own flood came back, this is what stops it
            return Ok(None);
        }

        let ogm = self.adjust(ogm)?;
        self.update_route(&ogm)?;
        self.reflood(ogm).map(Some)
    }

    /// Recomputes the path metric for the hop the OGM just traversed:
    ///  - an OGM from its own originator has travelled one hop, the metric is the link throughput.
    ///  - otherwise the metric is the smaller of the carried metric and the link throughput.
    /// The hop penalty is applied on top of both.
    pub fn adjust(&self, mut ogm: Ogm<T>) -> Result<Ogm<T>, RoutingError<T>> {
        let Some(neigh) = self.neighbours.get(&ogm.sender_address) else {
            return Err(RoutingError::UnknownSender {
                originator: ogm.originator_address,
                sender: ogm.sender_address,
            });
        };

        let metric = if ogm.originator_address == ogm.sender_address {
            neigh.throughput
        } else {
            bottleneck(ogm.throughput, neigh.throughput)
        };
        ogm.throughput = apply_hop_penalty(metric, self.params.hop_penalty);
        Ok(ogm)
    }

    /// Route selection, the sequence number filters out replays and reordered floods
    pub fn update_route(&mut self, ogm: &Ogm<T>) -> Result<UpdateAction, RoutingError<T>> {
        let refreshed_at = self.seqno;
        let Some(route) = self.originators.get_mut(&ogm.originator_address) else {
            info!(
                "[{}] new route to {} via {} ({})",
                self.address, ogm.originator_address, ogm.sender_address, ogm.throughput
            );
            self.originators.insert(
                ogm.originator_address.clone(),
                Originator {
                    addr: ogm.originator_address.clone(),
                    next_hop: NextHop {
                        addr: ogm.sender_address.clone(),
                        throughput: ogm.throughput,
                    },
                    seqno: ogm.sequence,
                    refreshed_at,
                },
            );
            return Ok(UpdateAction::Installed);
        };

        if ogm.sequence <= route.seqno {
            return Err(RoutingError::StaleSequence {
                originator: ogm.originator_address.clone(),
                received: ogm.sequence,
                stored: route.seqno,
            });
        }

        // the sequence advances even when the next hop is kept, otherwise this generation could be accepted again
        route.seqno = ogm.sequence;
        route.refreshed_at = refreshed_at;

        // ties keep the current next hop
        if ogm.throughput > route.next_hop.throughput {
            if route.next_hop.addr != ogm.sender_address {
                info!(
                    "[{}] route to {} switched {} -> {} ({} -> {})",
                    self.address,
                    route.addr,
                    route.next_hop.addr,
                    ogm.sender_address,
                    route.next_hop.throughput,
                    ogm.throughput
                );
            }
            route.next_hop = NextHop {
                addr: ogm.sender_address.clone(),
                throughput: ogm.throughput,
            };
            return Ok(UpdateAction::Switched);
        }
        Ok(UpdateAction::Refreshed)
    }

    /// Forwards the OGM to every neighbour, including the one it came from.
    /// Nothing is queued if the OGM cannot be serialized.
    pub fn reflood(&mut self, mut ogm: Ogm<T>) -> Result<Ogm<T>, RoutingError<T>> {
        ogm.sender_address = self.address.clone();
        let payload = ogm.encode()?;
        self.write_broadcast_packet(&Packet::ogm(payload));
        Ok(ogm)
    }

    /// Starts a new generation of our own OGM and floods it
    pub fn originate(&mut self, timestamp: u64) -> Result<Ogm<T>, RoutingError<T>> {
        self.seqno += 1;
        self.purge_stale_originators();
        let ogm = Ogm {
            sequence: self.seqno,
            originator_address: self.address.clone(),
            sender_address: self.address.clone(),
            throughput: self.params.max_throughput,
            timestamp,
        };
        self.reflood(ogm)
    }

    /// Drops originators that have not been refreshed within `originator_timeout` of our own originations
    pub fn purge_stale_originators(&mut self) {
        let Some(timeout) = self.params.originator_timeout else {
            return;
        };
        let seqno = self.seqno;
        let address = &self.address;
        self.originators.retain(|addr, route| {
            let fresh = route.refreshed_at.saturating_add(timeout) >= seqno;
            if !fresh {
                info!("[{address}] route to {addr} expired, last refreshed at {}", route.refreshed_at);
            }
            fresh
        });
        debug!("[{}] {} originators after purge", self.address, self.originators.len());
    }
}
