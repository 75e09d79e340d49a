use std::time::Duration;
use url::Url;

/// How long to wait for the backend before giving up on a request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for talking to a storefront backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where the REST API lives. All request paths are resolved against it.
    pub base_url: Url,
    pub timeout: Duration,
    /// Logging in with this address goes through the admin endpoints.
    pub admin_email: Option<String>,
    pub user_agent: String,
}

impl Config {
    pub fn new(mut base_url: Url) -> Self {
        // without the trailing slash, joining would replace the last segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Config {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            admin_email: None,
            user_agent: crate::DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_admin_email(mut self, email: &str) -> Self {
        self.admin_email = Some(email.trim().to_lowercase());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Should this (already normalised) email log in as an admin?
    pub fn is_admin_email(&self, email: &str) -> bool {
        match self.admin_email.as_deref() {
            Some(admin) => !admin.is_empty() && admin == email,
            None => false,
        }
    }

    /// Resolve an absolute API path (e.g. `/api/users/products`) against the
    /// base URL.
    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path.trim_start_matches('/'))
    }
}
