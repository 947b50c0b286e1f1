use clap::Parser;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use pairing_worker::config::WorkerArgs;
use pairing_worker::drain::{run_drain, DrainReport};
use pairing_worker::logging::init_tracing;
use pairing_worker::runtime::load_runtime_dependencies;
use serde::Deserialize;
use serde_json::Value;

/// Optional per-invocation overrides carried in the scheduled event payload.
#[derive(Debug, Default, Deserialize)]
struct InvocationOverrides {
    #[serde(default)]
    max_batches: Option<usize>,
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<DrainReport, Error> {
    let args = WorkerArgs::try_parse_from(["pairing_lambda"])
        .map_err(|error| Error::from(format!("invalid worker configuration: {error}")))?;
    let mut settings = args.drain_settings()?;
    if let Some(max_batches) = parse_overrides(event.payload)?.max_batches {
        settings.max_batches = Some(max_batches);
    }

    let deps = load_runtime_dependencies(&args).await?;
    let report = run_drain(deps.pairing(), &settings).await?;
    Ok(report)
}

/// Non-object payloads (plain schedule ticks) carry no overrides. An object
/// with a malformed override fails the invocation.
fn parse_overrides(payload: Value) -> Result<InvocationOverrides, Error> {
    if !payload.is_object() {
        return Ok(InvocationOverrides::default());
    }
    serde_json::from_value(payload)
        .map_err(|error| Error::from(format!("invalid invocation overrides: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_max_batches_override() {
        let overrides = parse_overrides(json!({"max_batches": 4})).expect("overrides should parse");
        assert_eq!(overrides.max_batches, Some(4));
    }

    #[test]
    fn scheduled_event_without_overrides_uses_configuration() {
        let overrides = parse_overrides(json!({
            "source": "aws.events",
            "detail-type": "Scheduled Event",
            "detail": {}
        }))
        .expect("overrides should parse");
        assert_eq!(overrides.max_batches, None);
    }

    #[test]
    fn non_object_payload_is_ignored() {
        let overrides = parse_overrides(json!("tick")).expect("non-object payload is accepted");
        assert_eq!(overrides.max_batches, None);
    }

    #[test]
    fn rejects_malformed_max_batches_override() {
        for payload in [json!({"max_batches": "many"}), json!({"max_batches": -1})] {
            let error = parse_overrides(payload).expect_err("override should be rejected");
            assert!(error.to_string().contains("invalid invocation overrides"));
        }
    }
}
