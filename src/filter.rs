use url::Url;

/// Decides which resolved links belong to the same site as the page they were found on
///
/// Host (case-insensitive) and explicit port must match, like comparing
/// network locations. The scheme is not compared, so `http` links on an
/// `https` page are kept.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    required_host: Option<String>,
    required_port: Option<u16>,
}

impl LinkFilter {
    /// Same-site filter for links found on `base_url`
    pub fn for_base(base_url: &Url) -> Self {
        Self {
            required_host: base_url.host_str().map(|h| h.to_ascii_lowercase()),
            required_port: base_url.port(),
        }
    }

    /// Determine if a resolved link should be kept as a candidate
    pub fn accepts(&self, url: &Url) -> bool {
        // A base without a host accepts nothing
        let Some(required_host) = &self.required_host else {
            return false;
        };

        match url.host_str() {
            Some(host) => host.eq_ignore_ascii_case(required_host) && url.port() == self.required_port,
            None => false,
        }
    }
}
