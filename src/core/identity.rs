//! Client identity derivation from proxy-forwarded headers.

use crate::models::RequestMetadata;

/// Identity used when no usable client address is present. Pools all such
/// clients into one shared counter.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Derive a stable client identity from request metadata.
///
/// Takes the first entry of the forwarded-for list, then the real-IP
/// header, then the client-IP header, falling back to [`UNKNOWN_IDENTITY`].
/// IPv6-mapped IPv4 addresses are normalized to their IPv4 form.
pub fn derive_identity(meta: &RequestMetadata) -> String {
    if let Some(forwarded) = meta.forwarded_for.as_deref() {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return normalize_address(first);
            }
        }
    }

    if let Some(real_ip) = non_empty(meta.real_ip.as_deref()) {
        return normalize_address(real_ip);
    }

    if let Some(client_ip) = non_empty(meta.client_ip.as_deref()) {
        return normalize_address(client_ip);
    }

    UNKNOWN_IDENTITY.to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Strip the IPv6-mapped-IPv4 prefix so dual-stack clients map to one key
fn normalize_address(addr: &str) -> String {
    addr.strip_prefix("::ffff:")
        .or_else(|| addr.strip_prefix("::FFFF:"))
        .unwrap_or(addr)
        .to_string()
}
