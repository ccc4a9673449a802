//! Network allow-list.

use std::net::IpAddr;

use ipnet::IpNet;

/// Parse a network spec: a CIDR block, or a bare address treated as a
/// host-length prefix.
pub fn parse_network(spec: &str) -> Result<IpNet, ipnet::AddrParseError> {
    match spec.parse::<IpNet>() {
        Ok(net) => Ok(net),
        Err(err) => match spec.parse::<IpAddr>() {
            Ok(addr) => Ok(IpNet::from(addr)),
            Err(_) => Err(err),
        },
    }
}

/// The set of client networks the server will talk to.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    networks: Vec<IpNet>,
}

impl AccessPolicy {
    /// Build a policy from configured network specs. Fails on the first
    /// spec that parses as neither a CIDR block nor a bare address.
    pub fn from_strings(specs: &[String]) -> Result<Self, ipnet::AddrParseError> {
        let networks = specs
            .iter()
            .map(|spec| parse_network(spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { networks })
    }

    /// Whether the address falls inside any allowed network.
    pub fn permits(&self, addr: IpAddr) -> bool {
        self.networks.iter().any(|net| net.contains(&addr))
    }
}
