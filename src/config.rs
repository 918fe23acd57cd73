//! Configuration types for the PDF-to-JSON service.
//!
//! All service behaviour is controlled through [`ServerConfig`], built via its
//! [`ServerConfigBuilder`]. The server value is constructed explicitly from a
//! config instead of reading process-wide globals, so tests can point it at
//! fake tools and a private scratch directory.

use crate::error::Pdf2JsonError;
use std::net::ToSocketAddrs;
use std::path::PathBuf;
use std::time::Duration;

/// Default listen address when `LISTEN_ADDRESS` is unset.
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:9001";

/// Default multipart body ceiling: 128 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 128 * 1024 * 1024;

/// An external executable and how long it may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Program name (looked up on `PATH`) or absolute path.
    pub program: PathBuf,
    /// Hard limit on a single invocation. The child is killed when exceeded.
    pub timeout: Duration,
}

impl ToolConfig {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Short name used in log lines and error messages.
    pub fn name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Configuration for the PDF-to-JSON service.
///
/// # Example
/// ```rust
/// use edgequake_pdf2json::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .listen_address(":8080")
///     .tool_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.listen_address, "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` the HTTP listener binds. Default: `127.0.0.1:9001`.
    ///
    /// The host may be a name (`localhost:9001`) and is resolved at bind
    /// time. After [`ServerConfigBuilder::build`] a bare `:port` has been
    /// expanded to `0.0.0.0:port`.
    pub listen_address: String,

    /// Text extraction tool (`pdftotext`).
    pub pdftotext: ToolConfig,

    /// Image extraction tool (`pdfimages`).
    pub pdfimages: ToolConfig,

    /// Maximum accepted request body in bytes. Default: 128 MiB.
    pub max_upload_bytes: usize,

    /// Parent directory for per-request workspaces. `None` uses the system
    /// temp directory.
    pub work_dir: Option<PathBuf>,

    /// Honour the `images=1` query parameter. Default: true.
    ///
    /// When false, image extraction is never run and every page carries an
    /// empty image list.
    pub images_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let timeout = Duration::from_secs(300);
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            pdftotext: ToolConfig::new("pdftotext", timeout),
            pdfimages: ToolConfig::new("pdfimages", timeout),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            work_dir: None,
            images_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn listen_address(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_address = addr.into();
        self
    }

    pub fn pdftotext_path(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.pdftotext.program = program.into();
        self
    }

    pub fn pdfimages_path(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.pdfimages.program = program.into();
        self
    }

    /// Timeout applied to both tools.
    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        let timeout = Duration::from_secs(secs);
        self.config.pdftotext.timeout = timeout;
        self.config.pdfimages.timeout = timeout;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = Some(dir.into());
        self
    }

    pub fn images_enabled(mut self, v: bool) -> Self {
        self.config.images_enabled = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ServerConfig, Pdf2JsonError> {
        self.config.listen_address = resolve_listen_address(&self.config.listen_address)?;

        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(Pdf2JsonError::InvalidConfig(
                "max upload size must be > 0".into(),
            ));
        }
        if c.pdftotext.timeout.is_zero() || c.pdfimages.timeout.is_zero() {
            return Err(Pdf2JsonError::InvalidConfig(
                "tool timeout must be ≥ 1s".into(),
            ));
        }
        if c.pdftotext.program.as_os_str().is_empty() || c.pdfimages.program.as_os_str().is_empty()
        {
            return Err(Pdf2JsonError::InvalidConfig(
                "tool program must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Normalise a listen address and check that it resolves.
///
/// An empty host (`:9001`) listens on every interface.
fn resolve_listen_address(addr: &str) -> Result<String, Pdf2JsonError> {
    let addr = addr.trim();
    let addr = match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    };

    let resolved = addr
        .to_socket_addrs()
        .map_err(|e| Pdf2JsonError::InvalidConfig(format!("listen address '{addr}': {e}")))?
        .next();
    if resolved.is_none() {
        return Err(Pdf2JsonError::InvalidConfig(format!(
            "listen address '{addr}' resolved to nothing"
        )));
    }
    Ok(addr)
}
