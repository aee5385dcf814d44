use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, ValueEnum};

use k6r_core::{OutputConfig, OverflowPolicy, QueueConfig, RunnerConfig};
use k6r_exec::{DEFAULT_DOCKER_TIMEOUT_SECS, DockerConfig, DockerEndpoint, ExecError};
use k6r_observe::{LoggerConfig, LoggerFormat, LoggerLevel, LoggerTimeZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Overflow {
    /// Fail the submission with 503.
    Reject,
    /// Hold the request until a slot frees up.
    Block,
}

impl From<Overflow> for OverflowPolicy {
    fn from(o: Overflow) -> Self {
        match o {
            Overflow::Reject => OverflowPolicy::Reject,
            Overflow::Block => OverflowPolicy::Block,
        }
    }
}

/// Runner flags. Unset runner options keep the built-in defaults.
#[derive(Debug, Parser)]
#[command(name = "k6r-agentd")]
#[command(about = "Runs k6 load-test scripts in a docker container on request")]
pub struct Cli {
    /// HTTP listen address.
    #[arg(long, env = "RUNNER_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Docker daemon: `unix:///var/run/docker.sock`, `tcp://host:2375`, or `local`.
    #[arg(long, env = "DOCKER_HOST", default_value = "local")]
    pub docker_host: String,

    #[arg(long, env = "RUNNER_DOCKER_TIMEOUT_SECS", default_value_t = DEFAULT_DOCKER_TIMEOUT_SECS)]
    pub docker_timeout_secs: u64,

    /// Container in which `k6 run` is executed.
    #[arg(long, env = "RUNNER_K6_CONTAINER")]
    pub k6_container: Option<String>,

    /// The only BASE_URL runs may target.
    #[arg(long, env = "RUNNER_ALLOW_BASE_URL")]
    pub allow_base_url: Option<String>,

    #[arg(long, env = "RUNNER_PROM_REMOTE_WRITE_URL")]
    pub prom_remote_write_url: Option<String>,

    #[arg(long, env = "RUNNER_SCRIPTS_DIR")]
    pub scripts_dir: Option<PathBuf>,

    #[arg(long, env = "RUNNER_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,

    #[arg(long, env = "RUNNER_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Bound the submission queue; unbounded when unset.
    #[arg(long, env = "RUNNER_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    #[arg(long, env = "RUNNER_QUEUE_OVERFLOW", value_enum, default_value_t = Overflow::Reject)]
    pub queue_overflow: Overflow,

    /// Fail runs that take longer than this; no limit when unset.
    #[arg(long, env = "RUNNER_RUN_TIMEOUT_MS")]
    pub run_timeout_ms: Option<u64>,

    #[arg(long, env = "RUNNER_OUTPUT_MAX_LINE_LENGTH")]
    pub output_max_line_length: Option<usize>,

    #[arg(long, env = "RUNNER_OUTPUT_BUFFER_FRAMES")]
    pub output_buffer_frames: Option<usize>,

    #[arg(long, env = "RUNNER_LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    /// Filter expression, e.g. `info,k6r::output=warn`.
    #[arg(long, env = "RUNNER_LOG_LEVEL", default_value = "info")]
    pub log_level: LoggerLevel,

    #[arg(long, env = "RUNNER_LOG_TZ", default_value = "utc")]
    pub log_tz: LoggerTimeZone,

    #[arg(long, env = "RUNNER_LOG_NO_COLOR")]
    pub log_no_color: bool,
}

impl Cli {
    pub fn runner_config(&self) -> RunnerConfig {
        let defaults = RunnerConfig::default();
        let output = OutputConfig {
            max_line_length: self
                .output_max_line_length
                .unwrap_or(defaults.output.max_line_length),
            buffer_frames: self
                .output_buffer_frames
                .unwrap_or(defaults.output.buffer_frames),
            ..defaults.output
        };
        let queue = match self.queue_capacity {
            Some(capacity) => QueueConfig::bounded(capacity, self.queue_overflow.into()),
            None => QueueConfig::unbounded(),
        };

        RunnerConfig {
            k6_container: self.k6_container.clone().unwrap_or(defaults.k6_container),
            allow_base_url: self.allow_base_url.clone().unwrap_or(defaults.allow_base_url),
            prom_remote_write_url: self
                .prom_remote_write_url
                .clone()
                .unwrap_or(defaults.prom_remote_write_url),
            scripts_dir: self.scripts_dir.clone().unwrap_or(defaults.scripts_dir),
            results_dir: self.results_dir.clone().unwrap_or(defaults.results_dir),
            max_concurrency: self.max_concurrency.unwrap_or(defaults.max_concurrency),
            queue,
            run_timeout_ms: self.run_timeout_ms,
            output,
        }
    }

    pub fn docker_config(&self) -> Result<DockerConfig, ExecError> {
        Ok(DockerConfig {
            endpoint: self.docker_host.parse::<DockerEndpoint>()?,
            timeout_secs: self.docker_timeout_secs,
        })
    }

    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            format: self.log_format,
            level: self.log_level.clone(),
            tz: self.log_tz,
            use_color: !self.log_no_color,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["k6r-agentd"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn no_flags_keep_runner_defaults() {
        let cli = parse(&[]);
        let cfg = cli.runner_config();

        assert_eq!(cfg.k6_container, RunnerConfig::default().k6_container);
        assert_eq!(cfg.max_concurrency, 1);
        assert_eq!(cfg.queue, QueueConfig::unbounded());
        assert!(cfg.run_timeout_ms.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--k6-container",
            "loadgen",
            "--scripts-dir",
            "/srv/k6",
            "--max-concurrency",
            "3",
            "--queue-capacity",
            "8",
            "--queue-overflow",
            "block",
            "--run-timeout-ms",
            "600000",
        ]);
        let cfg = cli.runner_config();

        assert_eq!(cfg.k6_container, "loadgen");
        assert_eq!(cfg.scripts_dir, PathBuf::from("/srv/k6"));
        assert_eq!(cfg.workers(), 3);
        assert_eq!(cfg.queue, QueueConfig::bounded(8, OverflowPolicy::Block));
        assert_eq!(cfg.run_timeout_ms, Some(600_000));
    }

    #[test]
    fn docker_host_is_parsed() {
        let cli = parse(&["--docker-host", "tcp://docker:2375"]);
        assert_eq!(
            cli.docker_config().unwrap().endpoint,
            DockerEndpoint::Http("http://docker:2375".into())
        );
        assert!(parse(&["--docker-host", "ssh://x"]).docker_config().is_err());
    }

    #[test]
    fn local_docker_host_uses_platform_default() {
        let cli = parse(&["--docker-host", "local"]);
        assert_eq!(cli.docker_config().unwrap().endpoint, DockerEndpoint::Local);
    }

    #[test]
    fn logger_flags_are_validated() {
        let cli = parse(&["--log-format", "json", "--log-level", "k6r::output=warn,info", "--log-no-color"]);
        let log = cli.logger_config();
        assert_eq!(log.format, LoggerFormat::Json);
        assert!(!log.use_color);

        let argv = ["k6r-agentd", "--log-level", "k6r_core=loud"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
