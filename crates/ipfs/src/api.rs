//! Locating the HTTP RPC endpoint of a local IPFS node

use multiaddr::{Multiaddr, Protocol};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Endpoint used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

/// Environment variable naming the node's repository directory
pub const IPFS_PATH_ENV: &str = "IPFS_PATH";

/// Pick the API base URL.
///
/// Order: an explicit value, then the multiaddr the running node wrote to
/// `<repo>/api`, then [`DEFAULT_API_URL`].
pub fn discover_api_url(configured: Option<&str>) -> String {
    if let Some(url) = configured {
        return url.trim_end_matches('/').to_string();
    }
    if let Some(repo) = ipfs_repo_path() {
        if let Some(url) = read_api_file(&repo) {
            return url;
        }
    }
    DEFAULT_API_URL.to_string()
}

/// `$IPFS_PATH`, or `~/.ipfs`
pub fn ipfs_repo_path() -> Option<PathBuf> {
    match std::env::var_os(IPFS_PATH_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => dirs::home_dir().map(|home| home.join(".ipfs")),
    }
}

/// Read and convert `<repo>/api`, if present and understood
pub fn read_api_file(repo: &Path) -> Option<String> {
    let path = repo.join("api");
    let text = std::fs::read_to_string(&path).ok()?;
    let url = multiaddr_to_url(text.trim());
    match &url {
        Some(url) => debug!("Using IPFS API {} from {}", url, path.display()),
        None => debug!("Ignoring unrecognised API address in {}", path.display()),
    }
    url
}

/// Convert a TCP multiaddr such as `/ip4/127.0.0.1/tcp/5001` to an HTTP URL
pub fn multiaddr_to_url(addr: &str) -> Option<String> {
    let addr: Multiaddr = addr.parse().ok()?;
    let mut protocols = addr.iter();

    let host = match protocols.next()? {
        Protocol::Ip4(ip) => ip.to_string(),
        Protocol::Ip6(ip) => format!("[{}]", ip),
        Protocol::Dns(name) | Protocol::Dns4(name) | Protocol::Dns6(name) => name.to_string(),
        _ => return None,
    };
    let Protocol::Tcp(port) = protocols.next()? else {
        return None;
    };

    let mut scheme = "http";
    for protocol in protocols {
        match protocol {
            Protocol::Http => {}
            Protocol::Https | Protocol::Tls => scheme = "https",
            // Peer identity does not change where requests go
            Protocol::P2p(_) => {}
            _ => return None,
        }
    }
    Some(format!("{}://{}:{}", scheme, host, port))
}
