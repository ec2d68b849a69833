// src/cluster/spec.rs

//! Node-list parsing: `"[host1,host2:3001,'host3']"` into addresses.

use crate::config::defaults::MIN_PORT;
use crate::errors::{DistmakeError, Result};

const MAX_HOSTNAME_LEN: usize = 255;

/// One parsed entry of a node list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

/// Parse a comma-separated node list.
///
/// Quotes anywhere and one pair of brackets around the whole list are
/// decoration and are removed before splitting; empty entries are skipped.
/// An entry is `host` (which gets `default_port`), `host:port`, or an IPv6
/// literal: bare (`::1`, default port) or bracketed (`[::1]`, `[::1]:3001`).
///
/// Count bounds are checked by [`crate::cluster::NodePool`], not here; this
/// only fails on an empty list or a malformed entry.
pub fn parse_node_list(spec: &str, default_port: u16) -> Result<Vec<NodeAddress>> {
    if spec.trim().is_empty() {
        return Err(DistmakeError::InvalidConfig(
            "node list cannot be empty".to_string(),
        ));
    }

    let unquoted = spec.replace(['\'', '"'], "");
    let body = strip_list_brackets(unquoted.trim());

    body.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_entry(entry, default_port))
        .collect()
}

/// `[a,b]` -> `a,b`. Leaves `[::1]:3001` alone since it does not end in `]`.
fn strip_list_brackets(list: &str) -> &str {
    list.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(list)
}

fn parse_entry(entry: &str, default_port: u16) -> Result<NodeAddress> {
    let (host, port) = if let Some(rest) = entry.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| {
            DistmakeError::InvalidConfig(format!("unclosed '[' in node entry '{entry}'"))
        })?;
        let port = match tail.trim() {
            "" => default_port,
            tail => match tail.strip_prefix(':') {
                Some(port) => parse_port(entry, port)?,
                None => {
                    return Err(DistmakeError::InvalidConfig(format!(
                        "unexpected '{tail}' after ']' in node entry '{entry}'"
                    )));
                }
            },
        };
        (host.trim(), port)
    } else {
        match entry.split_once(':') {
            Some((host, port)) if !port.contains(':') => (host.trim(), parse_port(entry, port)?),
            _ => (entry, default_port),
        }
    };

    validate_hostname(host)?;

    Ok(NodeAddress {
        host: host.to_string(),
        port,
    })
}

fn parse_port(entry: &str, raw: &str) -> Result<u16> {
    let value: u32 = raw.trim().parse().map_err(|_| {
        DistmakeError::InvalidConfig(format!("invalid port in node entry '{entry}'"))
    })?;

    if value < u32::from(MIN_PORT) || value > u32::from(u16::MAX) {
        return Err(DistmakeError::InvalidConfig(format!(
            "port {value} in node entry '{entry}' must be between {MIN_PORT} and 65535"
        )));
    }

    Ok(value as u16)
}

fn validate_hostname(host: &str) -> Result<()> {
    if host.is_empty() {
        return Err(DistmakeError::InvalidConfig(
            "hostname cannot be empty".to_string(),
        ));
    }
    if host.len() > MAX_HOSTNAME_LEN {
        return Err(DistmakeError::InvalidConfig(format!(
            "hostname too long ({} > {MAX_HOSTNAME_LEN} chars)",
            host.len()
        )));
    }
    Ok(())
}
