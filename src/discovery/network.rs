// Local network detection
//
// Finds the IPv4 network this host sits on (from the interface list) and
// its default gateway (from /proc/net/route). Read-only.

use super::DiscoveryError;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use sysinfo::Networks;

const ROUTE_TABLE: &str = "/proc/net/route";

/// RTF_GATEWAY flag in /proc/net/route
const RTF_GATEWAY: u32 = 0x2;

/// Subnets wider than this are primed as the /24 around the host address
const MAX_PRIME_PREFIX: u8 = 22;

/// IPv4 network of the scanning host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNetwork {
    pub interface: String,
    pub address: Ipv4Addr,
    pub prefix: u8,
    pub gateway: Ipv4Addr,
}

impl LocalNetwork {
    /// Network address with host bits cleared
    pub fn network_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & prefix_mask(self.prefix))
    }

    /// CIDR notation, e.g. "192.168.1.0/24"
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.network_address(), self.prefix)
    }

    /// Whether an address falls inside this network
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = prefix_mask(self.prefix);
        u32::from(ip) & mask == u32::from(self.address) & mask
    }

    /// Host addresses to prime before reading the neighbor table
    ///
    /// Excludes the network, broadcast and local addresses. Networks wider
    /// than /22 are narrowed to the /24 around the local address.
    pub fn prime_targets(&self) -> Vec<Ipv4Addr> {
        let prefix = if self.prefix < MAX_PRIME_PREFIX {
            24
        } else {
            self.prefix
        };
        if prefix >= 31 {
            return Vec::new();
        }

        let mask = prefix_mask(prefix);
        let network = u32::from(self.address) & mask;
        let broadcast = network | !mask;
        let local = u32::from(self.address);

        (network + 1..broadcast)
            .filter(|host| *host != local)
            .map(Ipv4Addr::from)
            .collect()
    }
}

fn prefix_mask(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p if p >= 32 => u32::MAX,
        p => u32::MAX << (32 - u32::from(p)),
    }
}

fn is_usable(addr: Ipv4Addr) -> bool {
    !addr.is_loopback()
        && !addr.is_unspecified()
        && !addr.is_link_local()
        && addr.octets()[0] != 0
}

/// A default route from the kernel routing table
#[derive(Debug, Clone, PartialEq, Eq)]
struct DefaultRoute {
    interface: String,
    gateway: Ipv4Addr,
    metric: u32,
}

/// Detect the local IPv4 network and its gateway
///
/// The interface carrying the default route wins (lowest metric first), so
/// container and VM bridges are passed over. Without a default route,
/// interfaces are visited in name order and the first host of the network
/// is assumed to be the gateway.
pub fn detect_local_network() -> Result<LocalNetwork, DiscoveryError> {
    let networks = Networks::new_with_refreshed_list();

    let candidates: Vec<(String, Ipv4Addr, u8)> = networks
        .list()
        .iter()
        .flat_map(|(name, data)| {
            data.ip_networks().iter().filter_map(move |net| match net.addr {
                IpAddr::V4(addr) if is_usable(addr) => Some((name.clone(), addr, net.prefix)),
                _ => None,
            })
        })
        .collect();

    let routes = match fs::read_to_string(ROUTE_TABLE) {
        Ok(content) => parse_default_routes(&content),
        Err(source) => {
            let e = DiscoveryError::TableRead {
                path: ROUTE_TABLE,
                source,
            };
            tracing::warn!(error = %e, "Route table unavailable, assuming first host is the gateway");
            Vec::new()
        }
    };

    let network = select_network(candidates, &routes).ok_or(DiscoveryError::NoInterface)?;
    tracing::debug!(
        interface = %network.interface,
        address = %network.address,
        prefix = network.prefix,
        gateway = %network.gateway,
        "Detected local network"
    );
    Ok(network)
}

/// Pick the scanning network from interface addresses and default routes
fn select_network(
    mut candidates: Vec<(String, Ipv4Addr, u8)>,
    routes: &[DefaultRoute],
) -> Option<LocalNetwork> {
    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    let routed = routes
        .iter()
        .filter_map(|route| {
            candidates
                .iter()
                .find(|(name, _, _)| *name == route.interface)
                .map(|candidate| (route, candidate))
        })
        .min_by_key(|(route, _)| route.metric);

    if let Some((route, (interface, address, prefix))) = routed {
        return Some(LocalNetwork {
            interface: interface.clone(),
            address: *address,
            prefix: *prefix,
            gateway: route.gateway,
        });
    }

    candidates
        .into_iter()
        .next()
        .map(|(interface, address, prefix)| LocalNetwork {
            interface,
            address,
            prefix,
            gateway: fallback_gateway(address, prefix),
        })
}

/// First host of the network, the usual home-router address
fn fallback_gateway(address: Ipv4Addr, prefix: u8) -> Ipv4Addr {
    let network = u32::from(address) & prefix_mask(prefix);
    Ipv4Addr::from(network.wrapping_add(1))
}

/// Default routes in /proc/net/route content
fn parse_default_routes(content: &str) -> Vec<DefaultRoute> {
    // Iface Destination Gateway Flags RefCnt Use Metric Mask MTU Window IRTT
    // eth0  00000000    0101A8C0 0003  0      0   100    00000000 ...
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 8 || parts[1] != "00000000" {
                return None;
            }
            let flags = u32::from_str_radix(parts[3], 16).ok()?;
            if flags & RTF_GATEWAY == 0 {
                return None;
            }
            Some(DefaultRoute {
                interface: parts[0].to_string(),
                gateway: parse_hex_ip(parts[2])?,
                metric: parts[6].parse().unwrap_or(u32::MAX),
            })
        })
        .collect()
}

/// Parse hex IP address (little-endian format)
/// Example: "0101A8C0" = 192.168.1.1
pub(crate) fn parse_hex_ip(hex_ip: &str) -> Option<Ipv4Addr> {
    if hex_ip.len() != 8 {
        return None;
    }
    let raw = u32::from_str_radix(hex_ip, 16).ok()?;
    Some(Ipv4Addr::from(raw.swap_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE_SAMPLE: &str = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
docker0\t00000000\t010011AC\t0003\t0\t0\t200\t00000000\t0\t0\t0
eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
";

    fn network(address: [u8; 4], prefix: u8) -> LocalNetwork {
        LocalNetwork {
            interface: "eth0".to_string(),
            address: Ipv4Addr::from(address),
            prefix,
            gateway: Ipv4Addr::new(192, 168, 1, 1),
        }
    }

    #[test]
    fn test_parse_hex_ip() {
        assert_eq!(parse_hex_ip("0101A8C0"), Some(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(parse_hex_ip("0100007F"), Some(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(parse_hex_ip("00000000"), Some(Ipv4Addr::UNSPECIFIED));
        assert_eq!(parse_hex_ip("XYZ"), None);
    }

    #[test]
    fn test_default_routes_parsed() {
        let routes = parse_default_routes(ROUTE_SAMPLE);
        assert_eq!(
            routes,
            vec![
                DefaultRoute {
                    interface: "docker0".to_string(),
                    gateway: Ipv4Addr::new(172, 17, 0, 1),
                    metric: 200,
                },
                DefaultRoute {
                    interface: "eth0".to_string(),
                    gateway: Ipv4Addr::new(192, 168, 1, 1),
                    metric: 100,
                },
            ]
        );
    }

    fn candidate(name: &str, address: [u8; 4], prefix: u8) -> (String, Ipv4Addr, u8) {
        (name.to_string(), Ipv4Addr::from(address), prefix)
    }

    #[test]
    fn test_default_route_interface_beats_bridges() {
        let content = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
docker0\t000011AC\t00000000\t0001\t0\t0\t0\t0000FFFF\t0\t0\t0
eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
";
        let candidates = vec![
            candidate("virbr0", [192, 168, 122, 1], 24),
            candidate("docker0", [172, 17, 0, 1], 16),
            candidate("eth0", [192, 168, 1, 23], 24),
        ];
        let net = select_network(candidates, &parse_default_routes(content)).unwrap();
        assert_eq!(net.interface, "eth0");
        assert_eq!(net.address, Ipv4Addr::new(192, 168, 1, 23));
        assert_eq!(net.gateway, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(net.cidr(), "192.168.1.0/24");
    }

    #[test]
    fn test_lowest_metric_default_route_wins() {
        let routes = parse_default_routes(
            "Iface\tDestination\tGateway\tFlags\tRefCnt\tUse\tMetric\tMask\n\
             wlan0\t00000000\t0100000A\t0003\t0\t0\t600\t00000000\n\
             enp3s0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\n",
        );
        let candidates = vec![
            candidate("wlan0", [10, 0, 0, 7], 24),
            candidate("enp3s0", [192, 168, 1, 9], 24),
        ];
        let net = select_network(candidates, &routes).unwrap();
        assert_eq!(net.interface, "enp3s0");
        assert_eq!(net.gateway, Ipv4Addr::new(192, 168, 1, 1));
    }

    #[test]
    fn test_no_default_route_falls_back_to_name_order() {
        let candidates = vec![
            candidate("eth1", [10, 9, 8, 7], 24),
            candidate("eth0", [192, 168, 5, 20], 24),
        ];
        let net = select_network(candidates, &[]).unwrap();
        assert_eq!(net.interface, "eth0");
        assert_eq!(net.gateway, Ipv4Addr::new(192, 168, 5, 1));

        assert!(select_network(Vec::new(), &[]).is_none());
    }

    #[test]
    fn test_route_on_unknown_interface_is_ignored() {
        let routes = vec![DefaultRoute {
            interface: "tun0".to_string(),
            gateway: Ipv4Addr::new(10, 8, 0, 1),
            metric: 0,
        }];
        let net = select_network(vec![candidate("eth0", [192, 168, 1, 4], 24)], &routes).unwrap();
        assert_eq!(net.interface, "eth0");
        assert_eq!(net.gateway, Ipv4Addr::new(192, 168, 1, 1));
    }

    #[test]
    fn test_route_without_gateway_flag_is_skipped() {
        let content = "Iface\tDestination\tGateway\tFlags\n\
                       eth0\t00000000\t0101A8C0\t0001\t0\t0\t100\t00000000\n";
        assert!(parse_default_routes(content).is_empty());
    }

    #[test]
    fn test_cidr_and_contains() {
        let net = network([192, 168, 1, 57], 24);
        assert_eq!(net.cidr(), "192.168.1.0/24");
        assert!(net.contains(Ipv4Addr::new(192, 168, 1, 200)));
        assert!(!net.contains(Ipv4Addr::new(192, 168, 2, 1)));
    }

    #[test]
    fn test_prime_targets_skip_local_and_edges() {
        let net = network([192, 168, 1, 57], 24);
        let targets = net.prime_targets();
        assert_eq!(targets.len(), 253);
        assert_eq!(targets.first(), Some(&Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(targets.last(), Some(&Ipv4Addr::new(192, 168, 1, 254)));
        assert!(!targets.contains(&Ipv4Addr::new(192, 168, 1, 57)));
    }

    #[test]
    fn test_wide_network_narrowed_to_slash_24() {
        let net = network([10, 20, 30, 40], 8);
        let targets = net.prime_targets();
        assert_eq!(targets.len(), 253);
        assert!(targets.iter().all(|ip| ip.octets()[..3] == [10, 20, 30]));
    }

    #[test]
    fn test_point_to_point_has_no_targets() {
        assert!(network([10, 0, 0, 1], 31).prime_targets().is_empty());
        assert!(network([10, 0, 0, 1], 32).prime_targets().is_empty());
    }

    #[test]
    fn test_fallback_gateway_is_first_host() {
        assert_eq!(
            fallback_gateway(Ipv4Addr::new(192, 168, 7, 33), 24),
            Ipv4Addr::new(192, 168, 7, 1)
        );
    }

    #[test]
    fn test_usable_addresses() {
        assert!(is_usable(Ipv4Addr::new(192, 168, 1, 5)));
        assert!(!is_usable(Ipv4Addr::LOCALHOST));
        assert!(!is_usable(Ipv4Addr::new(169, 254, 3, 4)));
        assert!(!is_usable(Ipv4Addr::UNSPECIFIED));
    }
}
