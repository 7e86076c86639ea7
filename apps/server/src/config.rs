// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

/// Headroom for multipart boundaries and part headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Root directory holding one sub-directory per converted model.
    pub storage_dir: String,
    /// Public API base used in catalog retrieval URLs.
    pub public_url: String,
    /// Maximum upload size in MB.
    pub max_file_size_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// External STEP mesher command line (program and arguments).
    pub mesher_command: Option<String>,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080);

        Self {
            port,
            storage_dir: std::env::var("STORAGE_DIR").unwrap_or_else(|_| {
                // Docker images mount persistent storage at /app/uploads
                if std::path::Path::new("/.dockerenv").exists() {
                    "/app/uploads".into()
                } else {
                    std::env::current_dir()
                        .ok()
                        .and_then(|dir| dir.join("uploads").to_str().map(|s| s.to_string()))
                        .unwrap_or_else(|| "./uploads".into())
                }
            }),
            public_url: std::env::var("PUBLIC_API_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/api", port)),
            max_file_size_mb: std::env::var("MAX_FILE_SIZE_MB")
                .unwrap_or_else(|_| "200".into())
                .parse()
                .unwrap_or(200),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .unwrap_or(300),
            mesher_command: std::env::var("STEP_MESHER_CMD")
                .ok()
                .filter(|cmd| !cmd.trim().is_empty()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Maximum upload size in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Maximum request body size: the upload limit plus room for multipart framing.
    pub fn max_body_size_bytes(&self) -> usize {
        self.max_file_size_bytes() + MULTIPART_OVERHEAD_BYTES
    }

    /// Whether CORS should allow any origin.
    pub fn cors_permissive(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
