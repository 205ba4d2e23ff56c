//! LAN IPv4 discovery.
//!
//! Uses the UDP-connect trick: connecting a datagram socket picks the
//! outbound interface without sending a packet, and its local address is
//! the host's LAN IP. Only private-range addresses are reported.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Private IPv4 addresses of this host, sorted and deduplicated.
pub fn lan_ipv4s() -> Vec<String> {
    let mut out = Vec::new();
    if let Some(ip) = outbound_ipv4() {
        if is_private_ipv4(ip) {
            out.push(ip.to_string());
        }
    }
    out.sort();
    out.dedup();
    out
}

/// The IPv4 address the default route would use.
fn outbound_ipv4() -> Option<Ipv4Addr> {
    let sock = UdpSocket::bind("0.0.0.0:0").ok()?;
    // No packet is sent; connect only resolves the route.
    sock.connect("8.8.8.8:80").ok()?;
    match sock.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}

/// RFC 1918 private-range check.
pub fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, _, _] = ip.octets();
    match a {
        10 => true,
        172 => (16..=31).contains(&b),
        192 => b == 168,
        _ => false,
    }
}

/// Browsable URLs for this host: loopback first, then each LAN IP.
pub fn access_urls(port: u16) -> Vec<String> {
    let mut urls = vec![format!("http://127.0.0.1:{port}/")];
    for ip in lan_ipv4s() {
        urls.push(format!("http://{ip}:{port}/"));
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_ranges() {
        assert!(is_private_ipv4(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(is_private_ipv4(Ipv4Addr::new(172, 16, 0, 1)));
        assert!(is_private_ipv4(Ipv4Addr::new(172, 31, 255, 255)));
        assert!(is_private_ipv4(Ipv4Addr::new(192, 168, 1, 10)));

        assert!(!is_private_ipv4(Ipv4Addr::new(172, 32, 0, 1)));
        assert!(!is_private_ipv4(Ipv4Addr::new(8, 8, 8, 8)));
        assert!(!is_private_ipv4(Ipv4Addr::new(127, 0, 0, 1)));
        assert!(!is_private_ipv4(Ipv4Addr::new(192, 167, 0, 1)));
    }

    #[test]
    fn urls_start_with_loopback() {
        let urls = access_urls(8099);
        assert_eq!(urls[0], "http://127.0.0.1:8099/");
        assert!(urls.iter().all(|u| u.starts_with("http://") && u.ends_with(":8099/")));
    }

    #[test]
    fn discovery_never_panics() {
        // Result depends on the host network; only the contract matters.
        for ip in lan_ipv4s() {
            let parsed: Ipv4Addr = ip.parse().unwrap();
            assert!(is_private_ipv4(parsed));
        }
    }
}
