mod config;

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use batmesh::clock::Clock;
use batmesh::feedback::LogSink;
use batmesh::framework::{ProtocolParams, RoutingSystem};
use batmesh::network::TopologyBuilder;
use log::{info, set_boxed_logger, set_max_level, warn};
use serde_json::json;
use simplelog::*;
use tokio::fs;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::SimConfig;

pub struct SimSystem;

impl RoutingSystem for SimSystem {
    type NodeAddress = String;
}

async fn load_config() -> anyhow::Result<SimConfig> {
    match env::args().nth(1) {
        Some(path) => {
            let file = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {path}"))?;
            serde_json::from_str(&file).with_context(|| format!("Failed to parse {path}"))
        }
        None => Ok(SimConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = load_config().await?;

    let level = LevelFilter::from_str(&cfg.log_level)
        .map_err(|_| anyhow!("Unknown log level {}", cfg.log_level))?;
    set_max_level(level);
    set_boxed_logger(TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto))
        .context("Failed to init logger")?;

    info!("Starting OGM mesh simulation");
    let params = ProtocolParams::from(&cfg.params);
    info!(
        "{} nodes, {} links, ogm every {:?}, tick {:?}",
        cfg.nodes.len(),
        cfg.links.len(),
        params.ogm_interval,
        params.tick_interval
    );

    let mut builder = TopologyBuilder::<SimSystem>::new(params);
    for node in &cfg.nodes {
        builder.add_node(node.clone());
    }
    for link in &cfg.links {
        if link.bidirectional {
            builder.add_link(link.from.clone(), link.to.clone(), link.throughput);
        } else {
            builder.add_edge(link.from.clone(), link.to.clone(), link.throughput);
        }
    }
    let (network, nodes) = builder
        .build(Arc::new(LogSink))
        .map_err(|err| anyhow!("Invalid topology: {err}"))?;

    let shutdown = CancellationToken::new();
    let handles: Vec<_> = nodes
        .into_iter()
        .map(|node| node.spawn(shutdown.clone()))
        .collect();
    let clock = tokio::spawn(Clock::new(network.clone()).run(shutdown.clone()));

    tokio::select! {
        _ = sleep(Duration::from_millis(cfg.run_for_ms)) => {}
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for ctrl-c")?;
            warn!("Interrupted, shutting down");
        }
    }
    shutdown.cancel();
    clock.await?;

    let mut routers = Vec::with_capacity(handles.len());
    for handle in handles {
        routers.push(handle.await?);
    }
    routers.sort_by(|a, b| a.address.cmp(&b.address));

    for router in &routers {
        info!("[{}] originated {} OGMs", router.address, router.seqno);
        let mut routes: Vec<_> = router.originators.values().collect();
        routes.sort_by(|a, b| a.addr.cmp(&b.addr));
        for route in routes {
            info!(
                "[{}]   {} via {} metric {} seqno {}",
                router.address, route.addr, route.next_hop.addr, route.next_hop.throughput, route.seqno
            );
        }
    }

    let mut edges: Vec<_> = network.edges().collect();
    edges.sort_by(|a, b| a.0.cmp(b.0));
    for ((from, to), link) in edges {
        let edge = link.snapshot();
        info!(
            "edge {from} -> {to}: {} admitted, {} dropped, bucket {}/{}",
            edge.admitted, edge.dropped, edge.bucket, edge.throughput
        );
    }

    if let Some(router) = routers.first() {
        info!("Final state of {}: {}", router.address, json!(router));
    }

    Ok(())
}
