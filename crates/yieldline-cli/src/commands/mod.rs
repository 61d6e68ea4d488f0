mod cache;
mod credentials;
mod div;
mod fx;
mod metric;

use std::time::Instant;

use serde_json::Value;
use yieldline_core::{EnvProperties, MetricError, Provider};

use crate::cli::{Cli, Command};
use crate::config::AppContext;
use crate::envelope::{Envelope, EnvelopeError, EnvelopeMeta};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub cache_hit: bool,
    pub provider_chain: Vec<Provider>,
}

impl CommandResult {
    pub fn ok(data: Value, provider_chain: Vec<Provider>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            cache_hit: false,
            provider_chain,
        }
    }

    /// Business failures land in `errors[]`; invalid input aborts the command.
    pub fn failed(
        error: MetricError,
        data: Value,
        provider_chain: Vec<Provider>,
    ) -> Result<Self, CliError> {
        if let MetricError::Validation(validation) = error {
            return Err(CliError::Validation(validation));
        }

        Ok(Self::ok(data, provider_chain).with_error(EnvelopeError::from(&error)))
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_error(mut self, error: EnvelopeError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Credentials => credentials::run(&EnvProperties)?,
        Command::Div(args) => div::run(args, &AppContext::from_cli(cli)?).await?,
        Command::Metric(args) => metric::run(args, &AppContext::from_cli(cli)?).await?,
        Command::Fx(args) => fx::run(args, &AppContext::from_cli(cli)?).await?,
        Command::Cache(args) => cache::run(args, &AppContext::from_cli(cli)?).await?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        cache_hit,
        provider_chain,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(provider_chain, latency_ms, cache_hit);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope { meta, data, errors })
}
