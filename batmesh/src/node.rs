use std::mem;
use std::sync::Arc;

use log::{debug, trace};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::concepts::packet::{OutboundPacket, Packet, OGM_PACKET};
use crate::feedback::{FeedbackSink, RoutingError};
use crate::framework::RoutingSystem;
use crate::network::Network;
use crate::router::Router;
use crate::util::now_millis;

/// Everything that can land in a node's inbound queue
#[derive(Clone, Debug)]
pub enum NodeEvent {
    Packet(Packet),
    /// the clock asks the node to originate a new OGM
    Originate,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum Delivery {
    Queued,
    Dropped(DropReason),
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum DropReason {
    /// the edge token bucket had no room left
    Congested,
    /// the destination stopped listening
    Closed,
}

/// A mesh participant. Its router is only ever touched from the task that owns the node.
pub struct Node<T: RoutingSystem> {
    pub router: Router<T>,
    network: Arc<Network<T>>,
    inbound: UnboundedReceiver<NodeEvent>,
    sink: Arc<dyn FeedbackSink<T>>,
}

impl<T: RoutingSystem> Node<T> {
    pub fn new(
        router: Router<T>,
        network: Arc<Network<T>>,
        inbound: UnboundedReceiver<NodeEvent>,
        sink: Arc<dyn FeedbackSink<T>>,
    ) -> Self {
        Self {
            router,
            network,
            inbound,
            sink,
        }
    }

    pub fn address(&self) -> &T::NodeAddress {
        &self.router.address
    }

    /// Sends a packet over the direct edge to `dest`.
    /// Packets that do not fit into the edge are dropped, that is not an error. Only a missing node or edge is.
    pub fn send_packet(
        &self,
        dest: &T::NodeAddress,
        kind: &str,
        payload: Vec<u8>,
    ) -> Result<Delivery, RoutingError<T>> {
        let mailbox = self.network.node_by_address(dest)?;
        let link = self.network.edge_by_pair(self.address(), dest)?;

        if !link.admit(payload.len() as u64) {
            debug!("[{}] {kind} to {dest} dropped, edge is congested", self.address());
            return Ok(Delivery::Dropped(DropReason::Congested));
        }
        if mailbox.send(NodeEvent::Packet(Packet::new(kind, payload))).is_err() {
            debug!("[{}] {kind} to {dest} dropped, node is gone", self.address());
            return Ok(Delivery::Dropped(DropReason::Closed));
        }
        trace!("[{}] {kind} queued for {dest}", self.address());
        Ok(Delivery::Queued)
    }

    /// Sends everything the router queued. A failing neighbour does not stop the rest.
    fn flush_outbound(&mut self) -> Result<(), RoutingError<T>> {
        let outbound = mem::take(&mut self.router.outbound_packets);
        let attempted = outbound.len();
        let mut failures = Vec::new();
        for OutboundPacket { dest, packet } in outbound {
            if let Err(err) = self.send_packet(&dest, &packet.kind, packet.payload) {
                failures.push((dest, err));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(RoutingError::Flood { attempted, failures })
        }
    }

    pub fn handle_ogm(&mut self, payload: &[u8]) -> Result<(), RoutingError<T>> {
        self.router.handle_ogm(payload)?;
        self.flush_outbound()
    }

    pub fn originate(&mut self) -> Result<(), RoutingError<T>> {
        self.router.originate(now_millis())?;
        self.flush_outbound()
    }

    pub fn dispatch(&mut self, packet: Packet) -> Result<(), RoutingError<T>> {
        match packet.kind.as_str() {
            OGM_PACKET => self.handle_ogm(&packet.payload),
            other => {
                trace!("[{}] ignoring packet of type {other}", self.address());
                Ok(())
            }
        }
    }

    /// Handles one event, failures go to the sink
    pub fn handle_event(&mut self, event: NodeEvent) {
        let result = match event {
            NodeEvent::Packet(packet) => self.dispatch(packet),
            NodeEvent::Originate => self.originate(),
        };
        if let Err(err) = result {
            self.sink.report(&self.router.address, &err);
        }
    }

    /// Everything currently queued, without waiting
    pub fn take_pending(&mut self) -> Vec<NodeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.inbound.try_recv() {
            events.push(event);
        }
        events
    }

    /// Dispatch loop, returns the final routing state once `shutdown` is cancelled
    pub async fn run(mut self, shutdown: CancellationToken) -> Router<T> {
        debug!("[{}] listening", self.address());
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.inbound.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
        }
        debug!("[{}] stopped", self.address());
        self.router
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<Router<T>> {
        tokio::spawn(self.run(shutdown))
    }
}
