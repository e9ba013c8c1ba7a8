// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::load_balancer::DEFAULT_TIMEOUT_SECS;
use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const DEFAULT_CHART_NAME: &str = "redis";
const DEFAULT_CHART_REPO: &str = "https://charts.bitnami.com/bitnami";
const DEFAULT_CHART_VERSION: &str = "18.19.2";
const DEFAULT_PASSWORD_SECRET_NAME: &str = "redis-password";
const DEFAULT_PASSWORD_SECRET_KEY: &str = "password";

/// What a run does with the deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackOperation {
    #[default]
    Up,
    Destroy,
}

impl FromStr for StackOperation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(StackOperation::Up),
            "destroy" => Ok(StackOperation::Destroy),
            other => bail!("unknown stack operation '{}', expected 'up' or 'destroy'", other),
        }
    }
}

/// Packaged application to install
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub name: String,
    pub repo: Url,
    pub version: String,
}

/// Provisioner configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// YAML file holding the deployment specification
    pub stack_input: PathBuf,
    pub operation: StackOperation,
    /// Send every apply with dryRun=All
    pub dry_run: bool,
    /// Check through discovery that CRD-backed APIs are served before using them
    pub verify_apis: bool,
    pub kubeconfig_path: Option<PathBuf>,
    pub kube_context: Option<String>,
    pub chart: ChartConfig,
    /// Pre-existing secret holding the cache password
    pub password_secret_name: String,
    pub password_secret_key: String,
    pub load_balancer_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stack_input: PathBuf::new(),
            operation: StackOperation::Up,
            dry_run: false,
            verify_apis: true,
            kubeconfig_path: None,
            kube_context: None,
            chart: ChartConfig {
                name: DEFAULT_CHART_NAME.to_string(),
                repo: Url::parse(DEFAULT_CHART_REPO).expect("default chart repo is a valid URL"),
                version: DEFAULT_CHART_VERSION.to_string(),
            },
            password_secret_name: DEFAULT_PASSWORD_SECRET_NAME.to_string(),
            password_secret_key: DEFAULT_PASSWORD_SECRET_KEY.to_string(),
            load_balancer_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let stack_input = env::var("STACK_INPUT_PATH")
            .context("STACK_INPUT_PATH environment variable not set")?
            .into();

        let operation = match env::var("STACK_OPERATION") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.operation,
        };

        let repo = match env::var("HELM_CHART_REPO") {
            Ok(v) => Url::parse(&v).with_context(|| format!("HELM_CHART_REPO is not a valid URL: {}", v))?,
            Err(_) => defaults.chart.repo,
        };

        let load_balancer_timeout = parse_timeout(
            "LOAD_BALANCER_TIMEOUT_SECS",
            env::var("LOAD_BALANCER_TIMEOUT_SECS").ok(),
            defaults.load_balancer_timeout,
        )?;

        Ok(Config {
            stack_input,
            operation,
            dry_run: parse_bool("DRY_RUN", env::var("DRY_RUN").ok(), defaults.dry_run)?,
            verify_apis: parse_bool("VERIFY_APIS", env::var("VERIFY_APIS").ok(), defaults.verify_apis)?,
            kubeconfig_path: env::var("KUBECONFIG_PATH").ok().map(PathBuf::from),
            kube_context: env::var("KUBE_CONTEXT").ok(),
            chart: ChartConfig {
                name: env::var("HELM_CHART_NAME").unwrap_or(defaults.chart.name),
                repo,
                version: env::var("HELM_CHART_VERSION").unwrap_or(defaults.chart.version),
            },
            password_secret_name: env::var("PASSWORD_SECRET_NAME")
                .unwrap_or(defaults.password_secret_name),
            password_secret_key: env::var("PASSWORD_SECRET_KEY")
                .unwrap_or(defaults.password_secret_key),
            load_balancer_timeout,
        })
    }
}

/// Unset means `default`; anything other than true/false/1/0 is an error
fn parse_bool(name: &str, value: Option<String>, default: bool) -> Result<bool> {
    let Some(v) = value else {
        return Ok(default);
    };
    match v.trim().to_ascii_lowercase().as_str() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => other
            .parse()
            .with_context(|| format!("{} is not a boolean: {}", name, v)),
    }
}

fn parse_timeout(name: &str, value: Option<String>, default: Duration) -> Result<Duration> {
    let Some(v) = value else {
        return Ok(default);
    };
    let secs: u64 = v
        .trim()
        .parse()
        .with_context(|| format!("{} is not a number: {}", name, v))?;
    if secs == 0 {
        bail!("{} must be greater than zero", name);
    }
    Ok(Duration::from_secs(secs))
}
