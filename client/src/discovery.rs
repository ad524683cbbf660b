//! RFC 3489 NAT type discovery.
//!
//! Probes are issued one at a time on a single [`Transport`]:
//!
//! * Test I: binding request to the primary address.
//! * Test II: same, asking the server to answer from its other IP and port.
//! * Test III: same, asking the server to answer from its other port only.
//! * Test I': Test I sent to the CHANGED-ADDRESS reported by the first reply.
//!
//! ```text
//! I ── no reply ──────────────────────────────────────── UDP_BLOCKED
//! │
//! ├─ mapped ip == local ip ── II ── reply ────────────── OPEN_INTERNET
//! │                              └─ no reply ─────────── SYMMETRIC_UDP_FIREWALL
//! │
//! └─ mapped ip != local ip ── II ── reply ────────────── FULL_CONE
//!                                └─ no reply ── I' ── no reply ── UDP_BLOCKED
//!                                               ├─ other mapping ─ SYMMETRIC_NAT
//!                                               └─ same mapping ── III ── reply ── RESTRICTED_NAT
//!                                                                     └─ no reply ─ RESTRICTED_PORT_NAT
//! ```

use log::{debug, info, warn};
use nat_stun::message::{marshal_request, unmarshal, BindingResponse};
use nat_stun::util::{format_trans_id, new_trans_id};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::{lookup_host, UdpSocket};

use crate::channel::{Channel, Transport};
use crate::config::DiscoveryConfig;
use crate::error::ProbeError;
use crate::nat_type::NatType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    AwaitI,
    CheckMapped {
        mapped: SocketAddrV4,
        changed: SocketAddrV4,
    },
    AwaitII {
        mapped: SocketAddrV4,
        changed: SocketAddrV4,
        translated: bool,
    },
    AwaitIPrime {
        mapped: SocketAddrV4,
        changed: SocketAddrV4,
    },
    AwaitIII,
    Done(NatType),
}

pub struct Discovery<'a, T: Transport + ?Sized> {
    transport: &'a T,
    server: SocketAddrV4,
    local_ip: Ipv4Addr,
    alt_port: Option<u16>,
}

impl<'a, T: Transport + ?Sized> Discovery<'a, T> {
    pub fn new(transport: &'a T, server: SocketAddrV4, local_ip: Ipv4Addr) -> Self {
        Self {
            transport,
            server,
            local_ip,
            alt_port: None,
        }
    }

    pub fn with_alt_port(mut self, alt_port: Option<u16>) -> Self {
        self.alt_port = alt_port;
        self
    }

    async fn exchange(
        &self,
        dest: SocketAddrV4,
        change_ip: Option<bool>,
    ) -> Result<BindingResponse, ProbeError> {
        let trans_id = new_trans_id();
        let request = marshal_request(trans_id, change_ip);

        let reply = self.transport.send_and_await(dest, &request).await?;
        let response = unmarshal(reply.as_deref())?;

        if response.is_response && response.trans_id != Some(trans_id) {
            warn!(
                "transaction id mismatch, sent: {}, recv: {:?}",
                format_trans_id(&trans_id),
                response.trans_id.as_ref().map(format_trans_id)
            );
        }

        Ok(response)
    }

    async fn test_i(&self, dest: SocketAddrV4) -> Result<BindingResponse, ProbeError> {
        self.exchange(dest, None).await
    }

    async fn test_ii(&self) -> Result<BindingResponse, ProbeError> {
        self.exchange(self.server, Some(true)).await
    }

    async fn test_iii(&self) -> Result<BindingResponse, ProbeError> {
        self.exchange(self.server, Some(false)).await
    }

    /// Advances the state machine by one transition.
    pub async fn step(&self, state: State) -> Result<State, ProbeError> {
        let next = match state {
            State::Init => {
                debug!("discovery start, server: {}, local ip: {}", self.server, self.local_ip);
                State::AwaitI
            }

            State::AwaitI => {
                let res = self.test_i(self.server).await?;
                if !res.is_response {
                    return Ok(State::Done(NatType::UdpBlocked));
                }

                match (res.mapped_address, res.changed_address) {
                    (Some(mapped), Some(changed)) => State::CheckMapped { mapped, changed },
                    (None, _) => {
                        return Err(ProbeError::ProtocolFault(
                            "test I response without MAPPED-ADDRESS".to_string(),
                        ));
                    }
                    (_, None) => {
                        return Err(ProbeError::ProtocolFault(
                            "test I response without CHANGED-ADDRESS".to_string(),
                        ));
                    }
                }
            }

            State::CheckMapped { mapped, changed } => {
                debug!("mapped: {}, changed: {}", mapped, changed);
                if let Some(alt_port) = self.alt_port {
                    if alt_port != changed.port() {
                        info!(
                            "server reports changed port {}, configured alt port {}",
                            changed.port(),
                            alt_port
                        );
                    }
                }

                State::AwaitII {
                    mapped,
                    changed,
                    translated: *mapped.ip() != self.local_ip,
                }
            }

            State::AwaitII {
                mapped,
                changed,
                translated,
            } => {
                let res = self.test_ii().await?;
                match (translated, res.is_response) {
                    (false, true) => State::Done(NatType::OpenInternet),
                    (false, false) => State::Done(NatType::SymmetricUdpFirewall),
                    (true, true) => State::Done(NatType::FullCone),
                    (true, false) => State::AwaitIPrime { mapped, changed },
                }
            }

            State::AwaitIPrime { mapped, changed } => {
                let res = self.test_i(changed).await?;
                if !res.is_response {
                    return Ok(State::Done(NatType::UdpBlocked));
                }

                let mapped_alt = res.mapped_address.ok_or_else(|| {
                    ProbeError::ProtocolFault(
                        "test I' response without MAPPED-ADDRESS".to_string(),
                    )
                })?;

                debug!("mapped: {}, mapped via {}: {}", mapped, changed, mapped_alt);
                if mapped_alt != mapped {
                    State::Done(NatType::SymmetricNat)
                } else {
                    State::AwaitIII
                }
            }

            State::AwaitIII => {
                let res = self.test_iii().await?;
                if res.is_response {
                    State::Done(NatType::RestrictedNat)
                } else {
                    State::Done(NatType::RestrictedPortNat)
                }
            }

            State::Done(nat_type) => State::Done(nat_type),
        };

        Ok(next)
    }

    pub async fn run(&self) -> Result<NatType, ProbeError> {
        let mut state = State::Init;
        loop {
            state = match state {
                State::Done(nat_type) => {
                    debug!("discovery done, server: {}, {}", self.server, nat_type);
                    return Ok(nat_type);
                }
                s => self.step(s).await?,
            };
        }
    }
}

/// Resolves the server to its first IPv4 address.
pub async fn resolve_server(host: &str, port: u16) -> Result<SocketAddrV4, ProbeError> {
    let addrs = lookup_host((host, port)).await?;
    for addr in addrs {
        if let SocketAddr::V4(v) = addr {
            return Ok(v);
        }
    }

    Err(ProbeError::InvalidArgument(format!(
        "no ipv4 address for {}:{}",
        host, port
    )))
}

/// The address compared with MAPPED-ADDRESS.
///
/// A channel bound to 0.0.0.0 uses the source address the OS picks toward the
/// server, learned from a connected throwaway socket.
pub async fn local_ip_toward(
    bound_ip: Ipv4Addr,
    server: SocketAddrV4,
) -> Result<Ipv4Addr, ProbeError> {
    if !bound_ip.is_unspecified() {
        return Ok(bound_ip);
    }

    let probe = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)).await?;
    probe.connect(server).await?;
    match probe.local_addr()?.ip() {
        IpAddr::V4(ip) => Ok(ip),
        IpAddr::V6(ip) => Err(ProbeError::InvalidArgument(format!(
            "ipv6 not support: {}",
            ip
        ))),
    }
}

/// Runs discovery on a channel the caller created.
///
/// The channel is closed before this returns, whatever the outcome.
pub async fn run_on_channel(
    channel: &Channel,
    server: SocketAddrV4,
    alt_port: Option<u16>,
) -> Result<NatType, ProbeError> {
    let result = async {
        let local_ip = local_ip_toward(*channel.local_addr().ip(), server).await?;
        Discovery::new(channel, server, local_ip)
            .with_alt_port(alt_port)
            .run()
            .await
    }
    .await;

    channel.close();
    result
}

pub async fn run_discovery(config: &DiscoveryConfig) -> Result<NatType, ProbeError> {
    let server = resolve_server(&config.server_host, config.server_port).await?;
    debug!("server {}:{} -> {}", config.server_host, config.server_port, server);

    let channel = Channel::bind(config.local_ip).await?;
    run_on_channel(&channel, server, config.alt_port).await
}
