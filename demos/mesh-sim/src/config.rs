use std::time::Duration;

use batmesh::framework::ProtocolParams;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Params {
    pub hop_penalty: u8,
    pub ogm_interval_ms: u64,
    pub tick_interval_ms: u64,
    pub capacity_scale: u64,
    pub originator_timeout: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        let params = ProtocolParams::default();
        Self {
            hop_penalty: params.hop_penalty,
            ogm_interval_ms: params.ogm_interval.as_millis() as u64,
            tick_interval_ms: params.tick_interval.as_millis() as u64,
            capacity_scale: params.capacity_scale,
            originator_timeout: params.originator_timeout,
        }
    }
}

impl From<&Params> for ProtocolParams {
    fn from(value: &Params) -> Self {
        ProtocolParams {
            hop_penalty: value.hop_penalty,
            ogm_interval: Duration::from_millis(value.ogm_interval_ms),
            tick_interval: Duration::from_millis(value.tick_interval_ms),
            capacity_scale: value.capacity_scale,
            originator_timeout: value.originator_timeout,
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LinkConfig {
    pub from: String,
    pub to: String,
    pub throughput: u64,
    /// create the reverse edge with the same throughput
    #[serde(default = "yes")]
    pub bidirectional: bool,
}

fn yes() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SimConfig {
    pub params: Params,
    pub nodes: Vec<String>,
    pub links: Vec<LinkConfig>,
    pub run_for_ms: u64,
    /// one of off, error, warn, info, debug, trace
    pub log_level: String,
}

impl Default for SimConfig {
    /// A - B - C with a bottleneck on the B - C link
    fn default() -> Self {
        let link = |from: &str, to: &str, throughput| LinkConfig {
            from: from.to_string(),
            to: to.to_string(),
            throughput,
            bidirectional: true,
        };
        Self {
            params: Params::default(),
            nodes: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            links: vec![link("A", "B", 100), link("B", "C", 80)],
            run_for_ms: 3500,
            log_level: "info".to_string(),
        }
    }
}
