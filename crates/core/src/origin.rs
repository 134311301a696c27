//! Origin validation for inbound cross-context messages.
//!
//! A companion browser script running on the automation target posts
//! finished report URLs back to us. The message is only trusted when its
//! origin belongs to the target's domain.

use url::Url;

/// Returns `true` when `origin` is an https origin whose host is `domain`
/// or a subdomain of it.
///
/// Plain http is accepted only for `localhost`. A bare substring match is
/// not enough: `https://raidbots.com.evil.net` is rejected.
pub fn is_trusted_origin(origin: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }

    let Ok(parsed) = Url::parse(origin.trim()) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    match parsed.scheme() {
        "https" => {}
        "http" if host == "localhost" => {}
        _ => return false,
    }

    host == domain || host.ends_with(&format!(".{domain}"))
}
