use crate::common::virtual_network::VirtualNetwork;

/// A - B - C, the B - C link is the bottleneck
pub fn vnet_line() -> VirtualNetwork {
    VirtualNetwork::create(&["A", "B", "C"], &[("A", "B", 100), ("B", "C", 80)])
}

/// Two paths from A to D, through B (fast) and through C (slow)
pub fn vnet_diamond() -> VirtualNetwork {
    VirtualNetwork::create(
        &["A", "B", "C", "D"],
        &[
            ("A", "B", 100),
            ("A", "C", 50),
            ("B", "D", 100),
            ("C", "D", 100),
        ],
    )
}

pub fn vnet_mesh() -> VirtualNetwork {
    VirtualNetwork::create(
        &["1", "2", "3", "4", "5"],
        &[
            ("1", "2", 20),
            ("1", "3", 10),
            ("2", "3", 40),
            ("2", "4", 50),
            ("3", "4", 100),
            ("3", "5", 80),
            ("4", "5", 10),
        ],
    )
}
