use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait RoutingSystem: Send + Sync + 'static {
    /// Address of the node on the mesh, MUST be globally unique
    type NodeAddress: Ord + PartialOrd + RootData + RootKey + Debug + Display + Send + Sync + 'static;
    fn config() -> ProtocolParams {
        Default::default()
    }
}

pub trait RootData: Clone + Serialize + DeserializeOwned + Sized {}
pub trait RootKey: Eq + PartialEq + Hash {}
impl<T: Eq + PartialEq + Hash> RootKey for T {}
impl<T: Clone + Serialize + DeserializeOwned + Sized> RootData for T {}

/// Shortest clock period, a zero `tick_interval` runs at this rate
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Denominator of the hop penalty, a penalty of `p` scales a metric by `(255 - p) / 255`
pub const PENALTY_SCALE: u8 = 255;

/// Protocol Parameters
#[derive(Clone, Debug)]
pub struct ProtocolParams {
    /// Fraction of the metric (out of [`PENALTY_SCALE`]) removed on every hop.
    pub hop_penalty: u8,
    /// Throughput carried by a freshly originated OGM. The first hop always replaces it with the link throughput.
    pub max_throughput: u64,
    /// How often every node originates an OGM.
    pub ogm_interval: Duration,
    /// Length of one simulated interval, edges leak `throughput * tick_interval` per tick.
    pub tick_interval: Duration,
    /// Edge capacity (payload bytes per second) per unit of link throughput.
    pub capacity_scale: u64,
    /// Originators not refreshed within this many of our own originations are purged. Disabled when `None`.
    pub originator_timeout: Option<u64>,
}

impl ProtocolParams {
    /// Period the clock actually ticks at, never shorter than [`MIN_TICK`]
    pub fn tick(&self) -> Duration {
        self.tick_interval.max(MIN_TICK)
    }

    /// Number of clock ticks between two originations, at least one.
    pub fn ticks_per_ogm(&self) -> u64 {
        let ticks = self.ogm_interval.as_nanos() / self.tick().as_nanos();
        u64::try_from(ticks).unwrap_or(u64::MAX).max(1)
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            hop_penalty: 15,
            max_throughput: u64::MAX,
            ogm_interval: Duration::from_secs(1),
            tick_interval: Duration::from_millis(100),
            capacity_scale: 1000,
            originator_timeout: None,
        }
    }
}
