use std::{env, fs, path::PathBuf};

use tracing::debug;

use crate::error::PulseError;

/// Client identity and endpoint configuration for a connection.
///
/// Server socket and authentication cookie locations follow the standard
/// PulseAudio client conventions when not set explicitly: `PULSE_SERVER`
/// and `PULSE_COOKIE` from the environment, then the runtime directory
/// socket and the per-user cookie file.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client name announced to the server during the handshake
    pub name: String,
    /// Explicit server socket path, overriding environment resolution
    pub server: Option<PathBuf>,
    /// Explicit authentication cookie path, overriding environment resolution
    pub cookie: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a configuration with the given client name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: None,
            cookie: None,
        }
    }

    /// Use an explicit server socket path
    #[must_use]
    pub fn with_server(mut self, path: impl Into<PathBuf>) -> Self {
        self.server = Some(path.into());
        self
    }

    /// Use an explicit authentication cookie file
    #[must_use]
    pub fn with_cookie(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie = Some(path.into());
        self
    }

    /// Resolve the server socket path.
    ///
    /// # Errors
    /// Returns [`PulseError::Connect`] when no socket path can be determined
    /// or the configured address is not a local socket.
    pub fn resolve_socket(&self) -> Result<PathBuf, PulseError> {
        if let Some(path) = &self.server {
            return Ok(path.clone());
        }

        if let Ok(server) = env::var("PULSE_SERVER") {
            // "unix:/run/user/1000/pulse/native" or a bare path. Anything
            // else (tcp:, multiple fallbacks) is not a local socket.
            let path = server.strip_prefix("unix:").unwrap_or(&server);
            if path.starts_with('/') {
                return Ok(PathBuf::from(path));
            }
            return Err(PulseError::connect(format!(
                "unsupported server address {server:?}: only local sockets are supported"
            )));
        }

        if let Ok(runtime_dir) = env::var("XDG_RUNTIME_DIR") {
            return Ok(PathBuf::from(runtime_dir).join("pulse/native"));
        }

        Err(PulseError::connect(
            "cannot determine server socket: set PULSE_SERVER or XDG_RUNTIME_DIR",
        ))
    }

    /// Load the authentication cookie bytes.
    ///
    /// A missing or unreadable cookie yields an empty cookie; same-user
    /// connections authenticate without one.
    pub fn load_cookie(&self) -> Vec<u8> {
        for path in self.cookie_candidates() {
            match fs::read(&path) {
                Ok(bytes) => return bytes,
                Err(err) => {
                    debug!(path = %path.display(), %err, "cookie not readable");
                }
            }
        }
        Vec::new()
    }

    fn cookie_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.cookie {
            candidates.push(path.clone());
        }
        if let Ok(path) = env::var("PULSE_COOKIE") {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(home) = env::var("HOME") {
            let home = PathBuf::from(home);
            candidates.push(home.join(".config/pulse/cookie"));
            candidates.push(home.join(".pulse-cookie"));
        }
        candidates
    }
}
