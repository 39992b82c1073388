use std::path::PathBuf;
use std::time::Duration;

/// Roots used to verify the *server* certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CaRoots {
    /// The public trust store libcurl was built against.
    #[default]
    System,
    /// A PEM bundle on disk.
    Bundle(PathBuf),
}

/// Connection policy and transport options for one session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub ca_roots: CaRoots,
    /// Cap on concurrently open connections; extra transfers queue inside libcurl.
    pub max_total_connections: usize,
    /// Per-host cap; 0 means uncapped.
    pub max_connections_per_host: usize,
    /// Whole-transfer deadline. `None` waits for the response indefinitely.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ca_roots: CaRoots::System,
            max_total_connections: 100,
            max_connections_per_host: 0,
            request_timeout: None,
            connect_timeout: None,
        }
    }
}
