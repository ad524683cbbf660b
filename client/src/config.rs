use std::net::Ipv4Addr;

pub const DEFAULT_STUN_HOST: &str = "stun.sipgate.net";
pub const DEFAULT_STUN_PORT: u16 = 3478;
pub const DEFAULT_STUN_ALT_PORT: u16 = 3479;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Hostname or IPv4 literal of the STUN server.
    pub server_host: String,
    pub server_port: u16,
    /// Only compared against the CHANGED-ADDRESS the server reports, which is
    /// what gets probed.
    pub alt_port: Option<u16>,
    /// Unspecified binds all interfaces and looks up the address routed
    /// toward the server.
    pub local_ip: Ipv4Addr,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_STUN_HOST.to_string(),
            server_port: DEFAULT_STUN_PORT,
            alt_port: Some(DEFAULT_STUN_ALT_PORT),
            local_ip: Ipv4Addr::UNSPECIFIED,
        }
    }
}
