use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;

use sweepr_common::config::DEFAULT_HANDSHAKE_TIMEOUT;
use sweepr_common::probe::{ProbeOutcome, ProbeTransport};
use sweepr_common::{info, success};
use sweepr_protocols::quic::QuicProbe;

/// One-shot check of a single host, outside the block machinery.
pub async fn probe(host: &str, port: u16) -> anyhow::Result<()> {
    let addr = resolve_ipv4(host, port).await?;
    if addr.to_string() != host {
        info!("resolved {host} to {addr}");
    }

    info!("probing {addr}:{port}...");
    let transport = QuicProbe::new()?;
    match transport.probe(addr, port, DEFAULT_HANDSHAKE_TIMEOUT).await {
        ProbeOutcome::ServerPresent => success!("server found at {addr}:{port}"),
        ProbeOutcome::NoServer(reason) => info!("no server at {addr}:{port} ({reason})"),
    }
    Ok(())
}

async fn resolve_ipv4(host: &str, port: u16) -> anyhow::Result<Ipv4Addr> {
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("resolving {host}"))?;

    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
        .with_context(|| format!("{host} has no IPv4 address"))
}
