use dns_lookup::{lookup_addr, lookup_host};
use std::net::{IpAddr, Ipv4Addr};

/// Resolve `hostname` to the first IPv4 address it maps to.
pub async fn resolve_ipv4(hostname: &str) -> anyhow::Result<Ipv4Addr> {
    // First try to parse as IP address
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => Ok(v4),
            IpAddr::V6(_) => Err(anyhow::anyhow!("IPv6 destinations are not supported: {}", hostname)),
        };
    }

    let addresses = tokio::task::spawn_blocking({
        let hostname = hostname.to_string();
        move || lookup_host(&hostname)
    })
    .await??;

    log::debug!("{} resolved to {:?}", hostname, addresses);

    first_ipv4(&addresses).ok_or_else(|| anyhow::anyhow!("No IPv4 addresses found for hostname: {}", hostname))
}

fn first_ipv4(addresses: &[IpAddr]) -> Option<Ipv4Addr> {
    addresses.iter().find_map(|addr| match addr {
        IpAddr::V4(v4) => Some(*v4),
        IpAddr::V6(_) => None,
    })
}

/// Blocking reverse lookup, used from inside the probe loop.
pub fn reverse_lookup(ip: Ipv4Addr) -> Option<String> {
    lookup_addr(&IpAddr::V4(ip)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ip_address_parsing() {
        let result = resolve_ipv4("8.8.8.8").await;
        assert_eq!(result.unwrap(), Ipv4Addr::new(8, 8, 8, 8));
    }

    #[tokio::test]
    async fn test_ipv6_literal_rejected() {
        assert!(resolve_ipv4("::1").await.is_err());
    }

    #[test]
    fn test_first_ipv4_skips_ipv6() {
        let addresses: Vec<IpAddr> = vec!["2001:db8::1".parse().unwrap(), "203.0.113.5".parse().unwrap()];
        assert_eq!(first_ipv4(&addresses), Some(Ipv4Addr::new(203, 0, 113, 5)));
        assert_eq!(first_ipv4(&addresses[..1]), None);
    }

    #[test]
    fn test_reverse_lookup() {
        let result = reverse_lookup(Ipv4Addr::LOCALHOST);
        // This may or may not succeed depending on DNS configuration
        println!("Reverse lookup result: {:?}", result);
    }
}
