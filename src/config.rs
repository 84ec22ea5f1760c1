use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{env, path::PathBuf, str::FromStr};

use crate::client::s3_client::{DEFAULT_REGION, S3ClientConfig};

/// Which `StorageClient` the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    S3,
    /// In-process bucket, lost on exit.
    Memory,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "s3" => Ok(Backend::S3),
            "memory" => Ok(Backend::Memory),
            other => bail!("unknown backend `{}` (expected `s3` or `memory`)", other),
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub backend: Backend,
    pub s3: S3ClientConfig,
    pub download_dir: PathBuf,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "HTTP gateway to a single object-storage bucket")]
pub struct Args {
    /// Host to bind to (overrides BUCKET_SERVICE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BUCKET_SERVICE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket every operation runs against (overrides BUCKET_SERVICE_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Storage backend (overrides BUCKET_SERVICE_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// S3 region (overrides BUCKET_SERVICE_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint, e.g. a MinIO URL (overrides BUCKET_SERVICE_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Static access key (overrides BUCKET_SERVICE_ACCESS_KEY)
    #[arg(long)]
    pub access_key: Option<String>,

    /// Static secret key (overrides BUCKET_SERVICE_SECRET_KEY)
    #[arg(long)]
    pub secret_key: Option<String>,

    /// Use path-style bucket addressing (overrides BUCKET_SERVICE_FORCE_PATH_STYLE)
    #[arg(long)]
    pub force_path_style: bool,

    /// Directory downloads are staged in (overrides BUCKET_SERVICE_DOWNLOAD_DIR)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name))
    }

    /// Merge `args` over the variables visible through `lookup`.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |name: &str| -> Result<Option<String>> {
            match lookup(name) {
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", name)),
            }
        };

        let env_port = match var("BUCKET_SERVICE_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing BUCKET_SERVICE_PORT value `{}`", value))?,
            None => 3000,
        };
        let env_backend = match var("BUCKET_SERVICE_BACKEND")? {
            Some(value) => value
                .parse::<Backend>()
                .context("parsing BUCKET_SERVICE_BACKEND")?,
            None => Backend::S3,
        };
        let env_path_style = match var("BUCKET_SERVICE_FORCE_PATH_STYLE")? {
            Some(value) => value.parse::<bool>().with_context(|| {
                format!("parsing BUCKET_SERVICE_FORCE_PATH_STYLE value `{}`", value)
            })?,
            None => false,
        };

        let bucket = match args.bucket {
            Some(bucket) => bucket,
            None => var("BUCKET_SERVICE_BUCKET")?
                .context("a bucket is required (--bucket or BUCKET_SERVICE_BUCKET)")?,
        };
        if bucket.trim().is_empty() {
            bail!("bucket name must not be empty");
        }

        let s3 = S3ClientConfig {
            region: Some(
                args.region
                    .or(var("BUCKET_SERVICE_REGION")?)
                    .unwrap_or_else(|| DEFAULT_REGION.into()),
            ),
            endpoint_url: args.endpoint_url.or(var("BUCKET_SERVICE_ENDPOINT_URL")?),
            access_key: args.access_key.or(var("BUCKET_SERVICE_ACCESS_KEY")?),
            secret_key: args.secret_key.or(var("BUCKET_SERVICE_SECRET_KEY")?),
            force_path_style: args.force_path_style || env_path_style,
        };
        if s3.access_key.is_some() != s3.secret_key.is_some() {
            bail!("access key and secret key must be set together");
        }

        Ok(Self {
            host: args
                .host
                .or(var("BUCKET_SERVICE_HOST")?)
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            bucket,
            backend: args.backend.unwrap_or(env_backend),
            s3,
            download_dir: args
                .download_dir
                .or(var("BUCKET_SERVICE_DOWNLOAD_DIR")?.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("./data/downloads")),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_when_only_bucket_is_set() {
        let cfg = AppConfig::resolve(Args::default(), lookup(&[("BUCKET_SERVICE_BUCKET", "media")]))
            .unwrap();

        assert_eq!(cfg.bucket, "media");
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.backend, Backend::S3);
        assert_eq!(cfg.s3.region.as_deref(), Some(DEFAULT_REGION));
        assert!(!cfg.s3.force_path_style);
        assert_eq!(cfg.download_dir, PathBuf::from("./data/downloads"));
    }

    #[test]
    fn args_override_environment() {
        let args = Args {
            port: Some(8080),
            bucket: Some("cli-bucket".into()),
            backend: Some(Backend::Memory),
            ..Default::default()
        };
        let cfg = AppConfig::resolve(
            args,
            lookup(&[
                ("BUCKET_SERVICE_BUCKET", "env-bucket"),
                ("BUCKET_SERVICE_PORT", "9000"),
                ("BUCKET_SERVICE_BACKEND", "s3"),
                ("BUCKET_SERVICE_REGION", "us-west-2"),
                ("BUCKET_SERVICE_FORCE_PATH_STYLE", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.bucket, "cli-bucket");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.backend, Backend::Memory);
        assert_eq!(cfg.s3.region.as_deref(), Some("us-west-2"));
        assert!(cfg.s3.force_path_style);
    }

    #[test]
    fn missing_bucket_is_an_error() {
        let err = AppConfig::resolve(Args::default(), lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("bucket is required"));
    }

    #[test]
    fn bad_port_reports_the_value() {
        let err = AppConfig::resolve(
            Args::default(),
            lookup(&[("BUCKET_SERVICE_BUCKET", "media"), ("BUCKET_SERVICE_PORT", "http")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("`http`"));
    }

    #[test]
    fn half_configured_credentials_are_rejected() {
        let err = AppConfig::resolve(
            Args::default(),
            lookup(&[
                ("BUCKET_SERVICE_BUCKET", "media"),
                ("BUCKET_SERVICE_ACCESS_KEY", "AKIA"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("set together"));
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("MEMORY".parse::<Backend>().unwrap(), Backend::Memory);
        assert!("gcs".parse::<Backend>().is_err());
    }
}
