use std::net::{IpAddr, Ipv6Addr};

/// Hostname the host service itself answers to inside the compose network.
pub const INTERNAL_HOST_NAME: &str = "host";

/// Service names modules reach each other under on the internal network.
pub const KNOWN_SERVICE_HOSTS: &[&str] = &[
    "host",
    "faktura",
    "zeiterfassung",
    "angebote",
    "projekte",
    "belege",
    "buchhaltung",
];

/// Classifies a caller as trusted inter-service traffic.
///
/// Identification is by network position, not credentials: either the Host
/// header names a known service, or the peer address is private.
pub fn is_internal_caller(host_header: Option<&str>, remote: Option<IpAddr>) -> bool {
    if let Some(host) = host_header {
        if is_internal_host(host) {
            return true;
        }
    }
    remote.is_some_and(is_private_ip)
}

pub fn is_internal_host(host_header: &str) -> bool {
    let name = host_header.split(':').next().unwrap_or(host_header).trim();
    name.eq_ignore_ascii_case(INTERNAL_HOST_NAME)
        || KNOWN_SERVICE_HOSTS
            .iter()
            .any(|known| name.eq_ignore_ascii_case(known))
}

pub fn is_private_ip(ip: IpAddr) -> bool {
    // Containers often hand us the IPv4 peer as an IPv4-mapped IPv6 address.
    let ip = match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    };

    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => is_private_v6(&v6),
    }
}

// fc00::/7 unique-local, fe80::/10 link-local.
fn is_private_v6(ip: &Ipv6Addr) -> bool {
    ip.is_loopback()
        || (ip.segments()[0] & 0xfe00) == 0xfc00
        || (ip.segments()[0] & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn known_service_hosts_are_internal() {
        assert!(is_internal_host("host"));
        assert!(is_internal_host("host:5000"));
        assert!(is_internal_host("Faktura"));
        assert!(is_internal_host("buchhaltung:8080"));
        assert!(!is_internal_host("werkbank.example.com"));
        assert!(!is_internal_host("evil-host"));
    }

    #[test]
    fn private_ranges_are_internal() {
        assert!(is_private_ip(ip("10.0.0.7")));
        assert!(is_private_ip(ip("172.20.0.5")));
        assert!(is_private_ip(ip("192.168.1.10")));
        assert!(is_private_ip(ip("127.0.0.1")));
        assert!(!is_private_ip(ip("8.8.8.8")));
        assert!(!is_private_ip(ip("203.0.113.9")));
    }

    #[test]
    fn ipv6_local_ranges_are_internal() {
        assert!(is_private_ip(ip("::1")));
        assert!(is_private_ip(ip("fd12:3456:789a::1")));
        assert!(is_private_ip(ip("fe80::1")));
        assert!(!is_private_ip(ip("2001:db8::1")));
    }

    #[test]
    fn ipv4_mapped_ipv6_is_normalized_first() {
        assert!(is_private_ip(ip("::ffff:172.20.0.5")));
        assert!(!is_private_ip(ip("::ffff:8.8.8.8")));
    }

    #[test]
    fn caller_classification_combines_host_and_ip() {
        assert!(is_internal_caller(Some("host"), Some(ip("8.8.8.8"))));
        assert!(is_internal_caller(Some("werkbank.example.com"), Some(ip("172.20.0.5"))));
        assert!(!is_internal_caller(Some("werkbank.example.com"), Some(ip("8.8.8.8"))));
        assert!(!is_internal_caller(None, None));
    }
}
