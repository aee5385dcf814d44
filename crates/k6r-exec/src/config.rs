use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ExecError;

/// Default timeout, in seconds, for requests to the docker daemon.
pub const DEFAULT_DOCKER_TIMEOUT_SECS: u64 = 120;

/// Where the docker daemon listens.
///
/// The agent resolves this from `--docker-host`, then the `DOCKER_HOST`
/// environment variable, and falls back to `local`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DockerEndpoint {
    /// bollard's platform default socket, used when neither `--docker-host`
    /// nor `DOCKER_HOST` names an endpoint.
    #[default]
    Local,
    UnixSocket(PathBuf),
    /// `tcp://` or `http://` address.
    Http(String),
}

impl DockerEndpoint {
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DockerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DockerEndpoint::Local => f.write_str("local"),
            DockerEndpoint::UnixSocket(path) => write!(f, "unix://{}", path.display()),
            DockerEndpoint::Http(addr) => f.write_str(addr),
        }
    }
}

impl FromStr for DockerEndpoint {
    type Err = ExecError;

    /// Accepts `local`, `unix:///path`, an absolute socket path, `tcp://host:port` or `http://host:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("local") {
            return Ok(DockerEndpoint::Local);
        }
        if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(ExecError::InvalidConfig("unix socket path is empty".into()));
            }
            return Ok(DockerEndpoint::UnixSocket(PathBuf::from(path)));
        }
        if s.starts_with('/') {
            return Ok(DockerEndpoint::UnixSocket(PathBuf::from(s)));
        }
        if let Some(rest) = s.strip_prefix("tcp://") {
            return Ok(DockerEndpoint::Http(format!("http://{rest}")));
        }
        if s.starts_with("http://") {
            return Ok(DockerEndpoint::Http(s.to_string()));
        }
        Err(ExecError::InvalidConfig(format!(
            "unsupported docker host '{s}'"
        )))
    }
}

impl TryFrom<String> for DockerEndpoint {
    type Error = ExecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DockerEndpoint> for String {
    fn from(e: DockerEndpoint) -> Self {
        e.to_string()
    }
}

/// Docker client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DockerConfig {
    pub endpoint: DockerEndpoint,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            endpoint: DockerEndpoint::Local,
            timeout_secs: DEFAULT_DOCKER_TIMEOUT_SECS,
        }
    }
}

impl DockerConfig {
    pub fn validate(&self) -> Result<(), ExecError> {
        if self.timeout_secs == 0 {
            return Err(ExecError::InvalidConfig("timeoutSecs cannot be zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_hosts() {
        assert_eq!("".parse::<DockerEndpoint>().unwrap(), DockerEndpoint::Local);
        assert_eq!("local".parse::<DockerEndpoint>().unwrap(), DockerEndpoint::Local);
        assert_eq!(
            "unix:///var/run/docker.sock".parse::<DockerEndpoint>().unwrap(),
            DockerEndpoint::UnixSocket(PathBuf::from("/var/run/docker.sock"))
        );
        assert_eq!(
            "/run/user/1000/docker.sock".parse::<DockerEndpoint>().unwrap(),
            DockerEndpoint::UnixSocket(PathBuf::from("/run/user/1000/docker.sock"))
        );
        assert_eq!(
            "tcp://docker:2375".parse::<DockerEndpoint>().unwrap(),
            DockerEndpoint::Http("http://docker:2375".into())
        );
    }

    #[test]
    fn rejects_unknown_schemes() {
        for bad in ["ssh://host", "unix://", "docker:2375"] {
            assert!(
                matches!(bad.parse::<DockerEndpoint>(), Err(ExecError::InvalidConfig(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn config_deserializes_endpoint_from_string() {
        let cfg: DockerConfig =
            serde_json::from_str(r#"{"endpoint": "unix:///var/run/docker.sock"}"#).unwrap();
        assert_eq!(
            cfg.endpoint,
            DockerEndpoint::UnixSocket(PathBuf::from("/var/run/docker.sock"))
        );
        assert_eq!(cfg.timeout_secs, DEFAULT_DOCKER_TIMEOUT_SECS);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let cfg = DockerConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
