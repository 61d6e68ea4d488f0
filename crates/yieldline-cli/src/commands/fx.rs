use serde_json::json;
use yieldline_core::{format_date, parse_date, validate_currency_code, RateSource};

use crate::cli::FxArgs;
use crate::config::AppContext;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &FxArgs, context: &AppContext) -> Result<CommandResult, CliError> {
    let date = parse_date(&args.date)?;
    let from = validate_currency_code(&args.from)?;
    let to = validate_currency_code(&args.to)?;
    if !args.fallback.is_finite() || args.fallback <= 0.0 {
        return Err(CliError::Command(format!(
            "--fallback must be a positive number, got {}",
            args.fallback
        )));
    }

    let quote = context.service.fx().quote(date, &from, &to, args.fallback).await;

    let mut result = CommandResult::ok(
        json!({
            "date": format_date(date),
            "from": from,
            "to": to,
            "rate": quote.rate,
            "source": quote.source,
        }),
        Vec::new(),
    )
    .with_cache_hit(quote.source == RateSource::Cache);

    if quote.source == RateSource::Fallback {
        result = result.with_warning(format!("fx lookup failed; used fallback rate {}", quote.rate));
    }
    Ok(result)
}
