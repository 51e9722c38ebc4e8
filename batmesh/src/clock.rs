use std::sync::Arc;
use std::time::Duration;

use log::trace;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::framework::RoutingSystem;
use crate::network::Network;
use crate::node::NodeEvent;

/// Drives every edge and node of a network in lockstep
pub struct Clock<T: RoutingSystem> {
    network: Arc<Network<T>>,
    ticks: u64,
    tick_interval: Duration,
    ticks_per_ogm: u64,
}

impl<T: RoutingSystem> Clock<T> {
    pub fn new(network: Arc<Network<T>>) -> Self {
        let params = network.params();
        Self {
            tick_interval: params.tick(),
            ticks_per_ogm: params.ticks_per_ogm(),
            network,
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// One simulated interval: edges leak, and every `ticks_per_ogm` ticks all nodes originate.
    /// Returns whether an origination was triggered.
    pub fn tick(&mut self) -> bool {
        self.network.drain_edges(self.tick_interval);
        let originate = self.ticks % self.ticks_per_ogm == 0;
        if originate {
            let listening = self.network.broadcast(NodeEvent::Originate);
            trace!("tick {}: originate sent to {listening} nodes", self.ticks);
        }
        self.ticks += 1;
        originate
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut timer = interval(self.tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {
                    self.tick();
                }
            }
        }
    }
}
