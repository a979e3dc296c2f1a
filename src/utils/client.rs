// src/utils/client.rs

use std::net::{IpAddr, SocketAddr};
use std::sync::LazyLock;

use regex::Regex;

static BROWSER_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    // Order matters: Edge and Opera also advertise Chrome, Chrome advertises Safari.
    [
        ("Edge", r"Edg(?:e|A|iOS)?/(\d+)"),
        ("Opera", r"OPR/(\d+)"),
        ("Firefox", r"Firefox/(\d+)"),
        ("Chrome", r"(?:Chrome|CriOS)/(\d+)"),
        ("Safari", r"Version/(\d+)[\d.]* (?:Mobile/\S+ )?Safari/"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
    .collect()
});

static OS_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("Windows", r"Windows NT"),
        ("Android", r"Android"),
        ("iOS", r"iPhone|iPad|iPod"),
        ("macOS", r"Mac OS X|Macintosh"),
        ("Linux", r"Linux|X11"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
    .collect()
});

/// Derives a short "Browser N on OS" description from a user agent string.
/// Returns an empty string when nothing is recognised.
pub fn describe_user_agent(user_agent: &str) -> String {
    let browser = BROWSER_PATTERNS.iter().find_map(|(name, re)| {
        re.captures(user_agent)
            .map(|caps| match caps.get(1) {
                Some(version) => format!("{} {}", name, version.as_str()),
                None => name.to_string(),
            })
    });
    let os = OS_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(user_agent))
        .map(|(name, _)| *name);

    match (browser, os) {
        (Some(browser), Some(os)) => format!("{browser} on {os}"),
        (Some(browser), None) => browser,
        (None, Some(os)) => os.to_string(),
        (None, None) => String::new(),
    }
}

/// Coarse location class of a remote address (`ip` or `ip:port`).
pub fn classify_address(remote_addr: &str) -> &'static str {
    let ip = remote_addr
        .parse::<SocketAddr>()
        .map(|addr| addr.ip())
        .or_else(|_| remote_addr.parse::<IpAddr>());

    match ip {
        Ok(ip) if ip.is_loopback() => "Loopback",
        Ok(IpAddr::V4(v4)) if v4.is_private() || v4.is_link_local() => "Private network",
        Ok(IpAddr::V6(v6)) if (v6.segments()[0] & 0xfe00) == 0xfc00 => "Private network",
        Ok(IpAddr::V6(v6)) if (v6.segments()[0] & 0xffc0) == 0xfe80 => "Private network",
        Ok(ip) if ip.is_unspecified() => "Unknown",
        Ok(_) => "Public network",
        Err(_) => "Unknown",
    }
}
