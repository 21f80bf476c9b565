//! Slash handling for request targets.

/// Returns `value` with a single leading slash.
pub fn prepend_slash(value: &str) -> String {
    format!("/{}", value.trim_start_matches('/'))
}

/// Returns `value` with a single trailing slash.
pub fn append_slash(value: &str) -> String {
    format!("{}/", value.trim_end_matches('/'))
}

/// Strips every leading and trailing slash.
pub fn trim_slashes(value: &str) -> &str {
    value.trim_matches('/')
}

/// Joins a request name and a query fragment with exactly one slash between
/// them and none at either end.
///
/// An empty side contributes nothing, so `"/"` + `"page.php"` is `"page.php"`
/// and `"/posts/"` + `""` is `"posts"`.
pub fn join_request_name(request_name: &str, query: &str) -> String {
    let name = trim_slashes(request_name);
    let query = trim_slashes(query);
    match (name.is_empty(), query.is_empty()) {
        (_, true) => name.to_string(),
        (true, false) => query.to_string(),
        (false, false) => format!("{name}{}", prepend_slash(query)),
    }
}

/// Builds the full URI of an HTTP call from the service root and the
/// endpoint's full request name.
pub fn full_uri(service_uri: &str, full_request_name: &str) -> String {
    format!(
        "{}{}",
        append_slash(service_uri),
        trim_slashes(full_request_name)
    )
}
