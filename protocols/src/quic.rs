//! # QUIC Handshake Probe
//!
//! Liveness is decided by running a real QUIC handshake against the target.
//! There is deliberately no cheap "is the UDP port open" pre-check: a
//! connectionless endpoint opens successfully whether or not anything
//! listens behind it, so such a check adds latency without telling us
//! anything. Completing the handshake is the one test that cannot lie.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use quinn::{ClientConfig, Endpoint, TransportConfig};
use tracing::debug;

use sweepr_common::probe::{ProbeFailure, ProbeOutcome, ProbeTransport};

/// ALPN offered by retail game servers, captured from a live client hello.
const GAME_ALPN: &[u8] = b"hytale/1";

/// Connections this old with no progress are torn down by quinn itself, as
/// a backstop behind the per-probe timeout.
const MAX_IDLE: Duration = Duration::from_secs(5);

/// Probes by QUIC handshake. One UDP socket is bound up front and shared by
/// every probe; quinn multiplexes the connections over it.
pub struct QuicProbe {
    endpoint: Endpoint,
}

impl QuicProbe {
    pub fn new() -> anyhow::Result<Self> {
        let bind_addr: SocketAddr = "0.0.0.0:0".parse().context("parsing bind address")?;
        let mut endpoint = Endpoint::client(bind_addr).context("binding probe socket")?;
        endpoint.set_default_client_config(client_config()?);
        Ok(Self { endpoint })
    }
}

#[async_trait]
impl ProbeTransport for QuicProbe {
    async fn probe(&self, addr: Ipv4Addr, port: u16, timeout: Duration) -> ProbeOutcome {
        let remote = SocketAddr::new(addr.into(), port);

        // Game servers identify by address, not name; the SNI just carries
        // the target IP the way a retail client would send it.
        let connecting = match self.endpoint.connect(remote, &addr.to_string()) {
            Ok(connecting) => connecting,
            Err(e) => {
                debug!("cannot start handshake with {remote}: {e}");
                return ProbeOutcome::NoServer(ProbeFailure::Transport);
            }
        };

        match tokio::time::timeout(timeout, connecting).await {
            Ok(Ok(connection)) => {
                // Handshake done, that is all we came for.
                connection.close(0u32.into(), b"");
                ProbeOutcome::ServerPresent
            }
            Ok(Err(e)) => {
                debug!("handshake with {remote} failed: {e}");
                ProbeOutcome::NoServer(ProbeFailure::Rejected)
            }
            Err(_) => ProbeOutcome::NoServer(ProbeFailure::Timeout),
        }
    }
}

fn client_config() -> anyhow::Result<ClientConfig> {
    let mut crypto = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_custom_certificate_verifier(SkipServerVerification::new())
        .with_no_client_auth();
    crypto.alpn_protocols = vec![GAME_ALPN.to_vec()];

    let mut transport = TransportConfig::default();
    transport.max_idle_timeout(Some(MAX_IDLE.try_into().context("idle timeout out of range")?));

    let mut config = ClientConfig::new(Arc::new(crypto));
    config.transport_config(Arc::new(transport));
    Ok(config)
}

/// Scanned servers present self-signed certificates; we are testing for
/// their existence, not authenticating them.
struct SkipServerVerification;

impl SkipServerVerification {
    fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl rustls::client::ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<rustls::client::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::ServerCertVerified::assertion())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
