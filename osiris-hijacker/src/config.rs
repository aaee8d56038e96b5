//! This module defines the configuration of the webhook server.

use std::{
    fs,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;
use tracing::Level;

pub const DEFAULT_SECURE_PORT: u16 = 5000;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

#[derive(Parser, Debug, Clone)]
#[command(name = "osiris-hijacker")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to a YAML configuration file. Flags given on the command line take precedence.
    #[arg(short, long)]
    pub config_file: Option<PathBuf>,
    /// The port to listen on.
    /// Default is 5000.
    #[arg(short = 'p', long)]
    pub secure_port: Option<u16>,
    /// The path to the TLS certificate.
    #[arg(long)]
    pub tls_cert_file: Option<PathBuf>,
    /// The path to the TLS key.
    #[arg(long)]
    pub tls_key_file: Option<PathBuf>,
    /// Seconds in-flight requests are given to complete on shutdown.
    #[arg(long)]
    pub shutdown_grace_secs: Option<u64>,
    /// The maximum level of the log events written to stdout.
    #[arg(long, default_value = "info")]
    pub log_level: Level,
}

/// Static configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub secure_port: u16,
    pub tls_cert_file: PathBuf,
    pub tls_key_file: PathBuf,
    pub shutdown_grace_secs: u64,
}

/// The configuration file, where every setting may be left to the command line.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub secure_port: Option<u16>,
    pub tls_cert_file: Option<PathBuf>,
    pub tls_key_file: Option<PathBuf>,
    pub shutdown_grace_secs: Option<u64>,
}

impl ConfigFile {
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_file(file_path: &Path) -> anyhow::Result<Self> {
        let config_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        Self::from_str(&config_content)
            .with_context(|| format!("Failed to parse {}", file_path.display()))
    }
}

impl Config {
    /// Merges the optional configuration file with the command line flags.
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let file = match &args.config_file {
            Some(path) => ConfigFile::from_file(path)?,
            None => ConfigFile::default(),
        };

        Ok(Self {
            secure_port: args
                .secure_port
                .or(file.secure_port)
                .unwrap_or(DEFAULT_SECURE_PORT),
            tls_cert_file: args
                .tls_cert_file
                .clone()
                .or(file.tls_cert_file)
                .ok_or(anyhow!("No TLS certificate file configured"))?,
            tls_key_file: args
                .tls_key_file
                .clone()
                .or(file.tls_key_file)
                .ok_or(anyhow!("No TLS key file configured"))?,
            shutdown_grace_secs: args
                .shutdown_grace_secs
                .or(file.shutdown_grace_secs)
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
        })
    }

    /// The dual-stack address to listen on, then the IPv4 one for hosts without IPv6.
    pub fn socket_addrs(&self) -> [SocketAddr; 2] {
        [
            (Ipv6Addr::UNSPECIFIED, self.secure_port).into(),
            (Ipv4Addr::UNSPECIFIED, self.secure_port).into(),
        ]
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
