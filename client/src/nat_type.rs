use std::fmt;

/// NAT behavior as classified by the RFC 3489 discovery procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NatType {
    /// No reply to the first probe, or the alternate address is unreachable.
    UdpBlocked,
    /// Public address, no filtering.
    OpenInternet,
    FullCone,
    /// Public address, but unsolicited inbound traffic is dropped.
    SymmetricUdpFirewall,
    RestrictedNat,
    RestrictedPortNat,
    /// A different mapping per destination.
    SymmetricNat,
}

/// How a peer behind a given [`NatType`] is best reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Traversal {
    Direct,
    HolePunch,
    Relay,
    Unreachable,
}

impl NatType {
    pub fn traversal(&self) -> Traversal {
        match self {
            Self::OpenInternet => Traversal::Direct,
            Self::FullCone
            | Self::RestrictedNat
            | Self::RestrictedPortNat
            | Self::SymmetricUdpFirewall => Traversal::HolePunch,
            Self::SymmetricNat => Traversal::Relay,
            Self::UdpBlocked => Traversal::Unreachable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UdpBlocked => "UDP_BLOCKED",
            Self::OpenInternet => "OPEN_INTERNET",
            Self::FullCone => "FULL_CONE",
            Self::SymmetricUdpFirewall => "SYMMETRIC_UDP_FIREWALL",
            Self::RestrictedNat => "RESTRICTED_NAT",
            Self::RestrictedPortNat => "RESTRICTED_PORT_NAT",
            Self::SymmetricNat => "SYMMETRIC_NAT",
        }
    }
}

impl fmt::Display for NatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Direct => "direct",
            Self::HolePunch => "hole punching",
            Self::Relay => "relay",
            Self::Unreachable => "unreachable",
        };
        f.write_str(name)
    }
}
