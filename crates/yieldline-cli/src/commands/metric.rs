use serde_json::json;
use yieldline_core::{validate_year, Provider, RateSource, Ticker};

use crate::cli::MetricArgs;
use crate::config::AppContext;
use crate::error::CliError;

use super::CommandResult;

const PROVIDER_CHAIN: [Provider; 2] = [Provider::Alphavantage, Provider::Eodhd];

pub async fn run(args: &MetricArgs, context: &AppContext) -> Result<CommandResult, CliError> {
    let ticker = Ticker::parse(&args.ticker)?;
    let year = validate_year(args.year)?;

    match context
        .service
        .metric_report(&ticker, year, &args.currency, args.fiscal_year_end)
        .await
    {
        Ok(report) => {
            let mut warnings = Vec::new();
            if report.fx.source == RateSource::Fallback {
                warnings.push(format!(
                    "fx lookup for USD->{} failed; used fallback rate {}",
                    report.currency, report.fx.rate
                ));
            }

            let cache_hit = report.cache_hit;
            Ok(
                CommandResult::ok(serde_json::to_value(&report)?, PROVIDER_CHAIN.to_vec())
                    .with_warnings(warnings)
                    .with_cache_hit(cache_hit),
            )
        }
        Err(error) => CommandResult::failed(
            error,
            json!({
                "ticker": ticker,
                "year": year,
                "currency": args.currency,
                "value": null,
            }),
            PROVIDER_CHAIN.to_vec(),
        ),
    }
}
