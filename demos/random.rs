//! Declare a `Random` resource and export its result.
//!
//! There is no engine transport in this crate, so the program runs against the mock engine, which
//! stands in for the provider by generating the random value itself.
//!
//! Usage: cargo run --example random

use std::{iter, process};

use awstags::{
    config::DeploymentSettings,
    engine::PropertyMap,
    logging,
    mocks::{MockEngine, MockResourceArgs},
    Deployment, EngineError, Random, RandomArgs, RANDOM_TYPE,
};
use serde_json::{json, Value};

#[tokio::main]
async fn main() {
    logging::init_logging();

    if let Err(error) = try_main().await {
        eprintln!("{}", error);
        process::exit(1);
    }
}

async fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = DeploymentSettings::from_env().unwrap_or_else(|error| {
        tracing::warn!(%error, "using default deployment settings");
        DeploymentSettings::default()
    });
    let engine = MockEngine::with_stack(provide, settings.project.clone(), settings.stack.clone());

    let outputs = Deployment::run(engine, settings, |ctx| async move {
        let my_random_resource = Random::new(
            &ctx,
            "myRandomResource",
            RandomArgs::default().set_length(24),
            None,
        )?;
        ctx.export(
            "output",
            &my_random_resource
                .result
                .apply(|value| json!({ "value": value })),
        );
        Ok(())
    })
    .await?;

    eprintln!("=== Deployment succeeded ===");
    eprintln!("{:#}", Value::Object(outputs.into_inner()));
    Ok(())
}

fn provide(args: MockResourceArgs) -> Result<(String, PropertyMap), EngineError> {
    let mut state = args.inputs;
    if args.type_token == RANDOM_TYPE {
        let length = state
            .get("length")
            .and_then(Value::as_u64)
            .ok_or_else(|| EngineError::new("length must be a non-negative integer"))?;
        let length = usize::try_from(length).map_err(|error| EngineError::new(error.to_string()))?;
        let result: String = iter::repeat_with(fastrand::alphanumeric)
            .take(length)
            .collect();
        state.insert("result".to_string(), Value::from(result));
    }
    Ok((format!("{}-{}", args.name, fastrand::u32(..)), state))
}
