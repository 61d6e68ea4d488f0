use serde_json::Value;

use crate::cli::OutputFormat;
use crate::envelope::Envelope;
use crate::error::CliError;

pub fn render(envelope: &Envelope<Value>, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)?),
    }

    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> Result<String, CliError> {
    let mut lines = vec![
        format!("request_id  : {}", envelope.meta.request_id),
        format!("generated_at: {}", envelope.meta.generated_at),
        format!(
            "providers   : {}",
            envelope
                .meta
                .provider_chain
                .iter()
                .map(|provider| provider.as_str())
                .collect::<Vec<_>>()
                .join(",")
        ),
        format!("latency_ms  : {}", envelope.meta.latency_ms),
        format!("cache_hit   : {}", envelope.meta.cache_hit),
    ];

    if !envelope.meta.warnings.is_empty() {
        lines.push(String::from("warnings:"));
        lines.extend(
            envelope
                .meta
                .warnings
                .iter()
                .map(|warning| format!("  - {warning}")),
        );
    }

    lines.push(String::from("data:"));
    match &envelope.data {
        Value::Object(fields) => {
            let width = fields.keys().map(String::len).max().unwrap_or(0);
            for (name, value) in fields {
                lines.push(format!("  {name:<width$} : {}", scalar(value)?));
            }
        }
        other => {
            let pretty_data = serde_json::to_string_pretty(other)?;
            lines.extend(pretty_data.lines().map(|line| format!("  {line}")));
        }
    }

    if !envelope.errors.is_empty() {
        lines.push(String::from("errors:"));
        lines.extend(
            envelope
                .errors
                .iter()
                .map(|error| format!("  - {}: {}", error.code, error.message)),
        );
    }

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    Ok(rendered)
}

fn scalar(value: &Value) -> Result<String, CliError> {
    Ok(match value {
        Value::String(text) => text.clone(),
        Value::Null => String::from("-"),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value)?,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use yieldline_core::Provider;

    use super::*;
    use crate::envelope::{EnvelopeError, EnvelopeMeta};

    #[test]
    fn table_aligns_data_fields_and_lists_errors() {
        let envelope = Envelope {
            meta: EnvelopeMeta::new(vec![Provider::Eodhd], 12, false),
            data: json!({ "ticker": "MC.PA", "value": null }),
            errors: vec![EnvelopeError::new("metric.no_data", "Error: No data")],
        };

        let rendered = render_table(&envelope).expect("renders");

        assert!(rendered.contains("providers   : eodhd"), "{rendered}");
        assert!(rendered.contains("  ticker : MC.PA"), "{rendered}");
        assert!(rendered.contains("  value  : -"), "{rendered}");
        assert!(rendered.contains("  - metric.no_data: Error: No data"), "{rendered}");
    }
}
