use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::concepts::edge::Link;
use crate::feedback::{FeedbackSink, RoutingError};
use crate::framework::{ProtocolParams, RoutingSystem};
use crate::node::{Node, NodeEvent};
use crate::router::Router;

/// Inbound queue of a node, the only way other tasks reach it
pub type Mailbox = UnboundedSender<NodeEvent>;

/// Topology registry shared read-only by every node.
/// Holds the node mailboxes and the directed edges, never the node state itself.
pub struct Network<T: RoutingSystem> {
    nodes: HashMap<T::NodeAddress, Mailbox>,
    /// (from, to), edges are directed
    edges: HashMap<(T::NodeAddress, T::NodeAddress), Link>,
    params: ProtocolParams,
}

impl<T: RoutingSystem> Network<T> {
    pub fn node_by_address(&self, addr: &T::NodeAddress) -> Result<&Mailbox, RoutingError<T>> {
        self.nodes
            .get(addr)
            .ok_or_else(|| RoutingError::DestinationNotFound { addr: addr.clone() })
    }

    pub fn edge_by_pair(
        &self,
        from: &T::NodeAddress,
        to: &T::NodeAddress,
    ) -> Result<&Link, RoutingError<T>> {
        self.edges
            .get(&(from.clone(), to.clone()))
            .ok_or_else(|| RoutingError::EdgeNotFound {
                from: from.clone(),
                to: to.clone(),
            })
    }

    pub fn edges(&self) -> impl Iterator<Item = (&(T::NodeAddress, T::NodeAddress), &Link)> {
        self.edges.iter()
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Leaks `elapsed` worth of capacity out of every edge
    pub fn drain_edges(&self, elapsed: Duration) {
        for link in self.edges.values() {
            link.drain(elapsed);
        }
    }

    /// Posts an event to every node, returns how many nodes are still listening
    pub fn broadcast(&self, event: NodeEvent) -> usize {
        let mut delivered = 0;
        for (addr, mailbox) in &self.nodes {
            if mailbox.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                trace!("{addr} is no longer listening");
            }
        }
        delivered
    }
}

/// Builds the network and its nodes from a list of nodes and links
pub struct TopologyBuilder<T: RoutingSystem> {
    params: ProtocolParams,
    nodes: Vec<T::NodeAddress>,
    /// (from, to, throughput)
    edges: Vec<(T::NodeAddress, T::NodeAddress, u64)>,
}

impl<T: RoutingSystem> Default for TopologyBuilder<T> {
    fn default() -> Self {
        Self::new(T::config())
    }
}

impl<T: RoutingSystem> TopologyBuilder<T> {
    pub fn new(params: ProtocolParams) -> Self {
        Self {
            params,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, addr: T::NodeAddress) -> &mut Self {
        if !self.nodes.contains(&addr) {
            self.nodes.push(addr);
        }
        self
    }

    /// A directed edge, `to` becomes a neighbour of `from`
    pub fn add_edge(&mut self, from: T::NodeAddress, to: T::NodeAddress, throughput: u64) -> &mut Self {
        self.edges.push((from, to, throughput));
        self
    }

    /// Edges in both directions with the same throughput
    pub fn add_link(&mut self, a: T::NodeAddress, b: T::NodeAddress, throughput: u64) -> &mut Self {
        self.add_edge(a.clone(), b.clone(), throughput);
        self.add_edge(b, a, throughput)
    }

    pub fn build(
        self,
        sink: Arc<dyn FeedbackSink<T>>,
    ) -> Result<(Arc<Network<T>>, Vec<Node<T>>), RoutingError<T>> {
        let mut mailboxes = HashMap::new();
        let mut routers = HashMap::new();
        let mut receivers = Vec::new();
        for addr in &self.nodes {
            let (tx, rx) = unbounded_channel();
            mailboxes.insert(addr.clone(), tx);
            routers.insert(
                addr.clone(),
                Router::with_params(addr.clone(), self.params.clone()),
            );
            receivers.push((addr.clone(), rx));
        }

        let mut edges = HashMap::new();
        for (from, to, throughput) in self.edges {
            if !mailboxes.contains_key(&to) {
                return Err(RoutingError::DestinationNotFound { addr: to });
            }
            let Some(router) = routers.get_mut(&from) else {
                return Err(RoutingError::DestinationNotFound { addr: from });
            };
            router.add_neighbour(to.clone(), throughput);
            let capacity = throughput.saturating_mul(self.params.capacity_scale);
            debug!("edge {from} -> {to}, throughput {throughput}, capacity {capacity}");
            edges.insert((from, to), Link::new(capacity));
        }

        let network = Arc::new(Network {
            nodes: mailboxes,
            edges,
            params: self.params,
        });

        let mut nodes = Vec::with_capacity(receivers.len());
        for (addr, rx) in receivers {
            if let Some(router) = routers.remove(&addr) {
                nodes.push(Node::new(router, network.clone(), rx, sink.clone()));
            }
        }
        Ok((network, nodes))
    }
}
