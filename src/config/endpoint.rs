// ABOUTME: Ping endpoint URL construction.
// ABOUTME: Derives /start and /fail sub-URLs and joins legacy host + uuid pairs.

use url::Url;

/// Append `segment` as an extra path segment of `base`.
///
/// A single `/` separator is inserted unless the path already ends with one.
/// Query string and fragment are carried over untouched, so provisioning
/// flags like `?create=1` survive on every derived URL.
pub fn derive_sub_url(base: &Url, segment: &str) -> Url {
    let mut derived = base.clone();
    let path = base.path();
    let sep = if path.ends_with('/') { "" } else { "/" };
    derived.set_path(&format!("{path}{sep}{segment}"));
    derived
}

/// Join a ping host and check uuid into a single ping URL.
pub fn join_host_uuid(host: &str, uuid: &str) -> String {
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        uuid.trim_start_matches('/')
    )
}
