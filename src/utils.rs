use std::process;
use std::time::Duration;

/// Generate a random identifier for ICMP packets
pub fn generate_identifier() -> u16 {
    use rand::Rng;
    rand::thread_rng().gen_range(1..=65535)
}

/// Print error message and exit with error code
pub fn exit_with_error(message: &str, code: i32) -> ! {
    eprintln!("pingtrace: {}", message);
    process::exit(code);
}

/// Validate ping parameters
pub fn validate_ping_params(size: u32, count: u32, timeout: u32, ttl: Option<u32>) -> anyhow::Result<()> {
    if size > 65500 {
        return Err(anyhow::anyhow!("Bad value for option -l, valid range is from 0 to 65500."));
    }

    if count == 0 {
        return Err(anyhow::anyhow!("Bad value for option -n, valid range is from 1 to 4294967295."));
    }

    if timeout == 0 {
        return Err(anyhow::anyhow!("Bad value for option -w, must be greater than 0."));
    }

    if let Some(ttl) = ttl {
        if ttl == 0 || ttl > 255 {
            return Err(anyhow::anyhow!("Bad value for option -i, valid range is from 1 to 255."));
        }
    }

    Ok(())
}

/// Validate traceroute parameters
pub fn validate_trace_params(max_hops: u32, attempts: u32, timeout: u32) -> anyhow::Result<()> {
    if max_hops == 0 || max_hops > 255 {
        return Err(anyhow::anyhow!("Bad value for option -h, valid range is from 1 to 255."));
    }

    if attempts == 0 {
        return Err(anyhow::anyhow!("Bad value for option -q, must be greater than 0."));
    }

    if timeout == 0 {
        return Err(anyhow::anyhow!("Bad value for option -w, must be greater than 0."));
    }

    Ok(())
}

/// Format a round-trip time in whole milliseconds
pub fn format_time(rtt: Duration) -> String {
    format!("{}ms", rtt.as_millis())
}
