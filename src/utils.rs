use url::Url;

/// File-name stem for results about `url`: the host with dots replaced
///
/// Falls back to a sanitized form of the raw input when it does not parse.
pub fn host_file_stem(url: &str) -> String {
    let host = Url::parse(url).ok().and_then(|parsed| {
        let host = parsed.host_str()?.to_string();
        Some(match parsed.port() {
            Some(port) => format!("{}_{}", host, port),
            None => host,
        })
    });

    sanitize_filename(&host.unwrap_or_else(|| url.to_string()).replace('.', "_"))
}

/// Convert a string to a sanitized filename
pub fn sanitize_filename(name: &str) -> String {
    // Remove protocol and replace invalid filename characters
    let name = name.replace("http://", "").replace("https://", "");
    let name = name.replace(['/', '\\', ':', '?', '&', '=', '#', '%', '*', '"', '<', '>', '|', ' '], "_");

    let name: String = name.chars().take(100).collect();
    if name.is_empty() {
        "unknown".to_string()
    } else {
        name
    }
}
