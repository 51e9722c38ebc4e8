use std::cmp::min;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::framework::PENALTY_SCALE;

/// Discounts a throughput metric by one hop
///
/// # Arguments
///
/// * `metric`: path throughput before the hop
/// * `penalty`: fraction removed, out of 255
///
/// returns: u64
///
/// # Examples
///
/// ```
/// assert_eq!(batmesh::util::apply_hop_penalty(100, 15), 94);
/// assert_eq!(batmesh::util::apply_hop_penalty(255, 15), 240);
/// assert_eq!(batmesh::util::apply_hop_penalty(100, 0), 100);
/// ```
pub fn apply_hop_penalty(metric: u64, penalty: u8) -> u64 {
    let penalty = min(penalty, PENALTY_SCALE) as u128;
    let scale = PENALTY_SCALE as u128;
    (metric as u128 * (scale - penalty) / scale) as u64
}

/// Bottleneck rule, a path is never faster than its slowest link
pub fn bottleneck(path: u64, link: u64) -> u64 {
    min(path, link)
}

/// Milliseconds since the unix epoch, 0 if the system clock is before it
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
