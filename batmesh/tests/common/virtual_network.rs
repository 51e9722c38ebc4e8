use std::sync::{Arc, Mutex};

use batmesh::concepts::packet::{Ogm, Packet};
use batmesh::feedback::{FeedbackSink, RoutingError};
use batmesh::framework::{ProtocolParams, RoutingSystem};
use batmesh::network::{Network, TopologyBuilder};
use batmesh::node::{Node, NodeEvent};
use batmesh::router::Router;

pub struct VirtualSystem;

impl RoutingSystem for VirtualSystem {
    type NodeAddress = String;
}

#[derive(Debug, Clone)]
pub struct Report {
    pub node: String,
    pub message: String,
    pub stale: bool,
    pub not_found: bool,
    pub kind: &'static str,
}

/// Keeps every reported failure so tests can look at them
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<Report>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }

    pub fn reports_at(&self, node: &str) -> Vec<Report> {
        self.reports().into_iter().filter(|r| r.node == node).collect()
    }

    /// everything except the stale sequence reports that flooding produces all the time
    pub fn failures(&self) -> Vec<Report> {
        self.reports().into_iter().filter(|r| !r.stale).collect()
    }
}

impl FeedbackSink<VirtualSystem> for RecordingSink {
    fn report(&self, node: &String, error: &RoutingError<VirtualSystem>) {
        let kind = match error {
            RoutingError::DestinationNotFound { .. } => "destination",
            RoutingError::EdgeNotFound { .. } => "edge",
            RoutingError::Decode(_) => "decode",
            RoutingError::UnknownSender { .. } => "unknown-sender",
            RoutingError::StaleSequence { .. } => "stale",
            RoutingError::Serialization(_) => "serialization",
            RoutingError::Flood { .. } => "flood",
        };
        self.reports.lock().unwrap().push(Report {
            node: node.clone(),
            message: error.to_string(),
            stale: error.is_stale(),
            not_found: error.is_not_found(),
            kind,
        });
    }
}

/// Runs nodes without tasks. Each round every node handles what was queued for it before the round started.
pub struct VirtualNetwork {
    pub network: Arc<Network<VirtualSystem>>,
    pub nodes: Vec<Node<VirtualSystem>>,
    pub sink: Arc<RecordingSink>,
}

impl VirtualNetwork {
    pub fn create(nodes: &[&str], links: &[(&str, &str, u64)]) -> VirtualNetwork {
        Self::with_params(ProtocolParams::default(), nodes, links)
    }

    pub fn with_params(
        params: ProtocolParams,
        nodes: &[&str],
        links: &[(&str, &str, u64)],
    ) -> VirtualNetwork {
        let mut builder = TopologyBuilder::<VirtualSystem>::new(params);
        for node in nodes {
            builder.add_node(node.to_string());
        }
        for (a, b, throughput) in links {
            builder.add_link(a.to_string(), b.to_string(), *throughput);
        }
        let sink = Arc::new(RecordingSink::default());
        let (network, nodes) = builder.build(sink.clone()).unwrap();
        VirtualNetwork {
            network,
            nodes,
            sink,
        }
    }

    pub fn get_node(&mut self, node: &str) -> &mut Node<VirtualSystem> {
        self.nodes
            .iter_mut()
            .find(|n| n.address() == node)
            .unwrap_or_else(|| panic!("No node {node} found"))
    }

    pub fn router(&self, node: &str) -> &Router<VirtualSystem> {
        &self
            .nodes
            .iter()
            .find(|n| n.address() == node)
            .unwrap_or_else(|| panic!("No node {node} found"))
            .router
    }

    pub fn get_next_hop(&self, cur: &str, dst: &str) -> String {
        self.router(cur)
            .next_hop(&dst.to_string())
            .unwrap_or_else(|| panic!("No route found to {dst}"))
            .clone()
    }

    pub fn get_metric_to(&self, cur: &str, dst: &str) -> u64 {
        self.router(cur)
            .metric_to(&dst.to_string())
            .unwrap_or_else(|| panic!("No route found to {dst}"))
    }

    pub fn originate(&mut self, node: &str) {
        self.get_node(node).handle_event(NodeEvent::Originate);
    }

    /// Puts a packet straight into a node's queue, bypassing edges
    pub fn inject(&self, node: &str, packet: Packet) {
        self.network
            .node_by_address(&node.to_string())
            .unwrap()
            .send(NodeEvent::Packet(packet))
            .unwrap();
    }

    pub fn inject_ogm(&self, node: &str, ogm: &Ogm<VirtualSystem>) {
        self.inject(node, Packet::ogm(ogm.encode().unwrap()));
    }

    /// Returns the number of events handled
    pub fn round(&mut self) -> usize {
        let pending: Vec<Vec<NodeEvent>> = self.nodes.iter_mut().map(|n| n.take_pending()).collect();
        let mut handled = 0;
        for (node, events) in self.nodes.iter_mut().zip(pending) {
            for event in events {
                node.handle_event(event);
                handled += 1;
            }
        }
        handled
    }

    pub fn rounds(&mut self, times: usize) {
        for _ in 0..times {
            self.round();
        }
    }

    /// Runs rounds until nothing is in flight
    pub fn settle(&mut self) -> usize {
        let mut rounds = 0;
        while self.round() > 0 {
            rounds += 1;
            assert!(rounds < 100, "network did not quiesce");
        }
        rounds
    }
}

pub fn ogm(sequence: u64, originator: &str, sender: &str, throughput: u64) -> Ogm<VirtualSystem> {
    Ogm {
        sequence,
        originator_address: originator.to_string(),
        sender_address: sender.to_string(),
        throughput,
        timestamp: 0,
    }
}
