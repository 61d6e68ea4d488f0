use serde_json::json;
use yieldline_core::{validate_year, DividendReconciler, Provider, Ticker, ZeroSumPolicy};

use crate::cli::DivArgs;
use crate::config::AppContext;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &DivArgs, context: &AppContext) -> Result<CommandResult, CliError> {
    let ticker = Ticker::parse(&args.ticker)?;
    let year = validate_year(args.year)?;

    let zero_sum = if args.accept_zero {
        ZeroSumPolicy::Accept
    } else {
        ZeroSumPolicy::Reject
    };
    let service = context
        .service
        .clone()
        .with_reconciler(DividendReconciler::new(zero_sum));

    match service
        .dividend_report(&ticker, year, args.fiscal_year_end)
        .await
    {
        Ok(report) => {
            let cache_hit = report.cache_hit;
            Ok(CommandResult::ok(serde_json::to_value(&report)?, vec![Provider::Eodhd])
                .with_cache_hit(cache_hit))
        }
        Err(error) => CommandResult::failed(
            error,
            json!({
                "ticker": ticker,
                "year": year,
                "fiscal_year_end": args.fiscal_year_end,
                "total": null,
            }),
            vec![Provider::Eodhd],
        ),
    }
}
