#![allow(dead_code)]

use awstags::{
    aws::RESOURCE_TAG_TYPE,
    config::DeploymentSettings,
    engine::PropertyMap,
    mocks::{MockEngine, MockResourceArgs, Mocks},
    Deployment, EngineError, RANDOM_TYPE,
};
use serde_json::{json, Value};

const NAME_PREFIX: &str = "awstags-testing-";

pub const BUCKET_ARN: &str = "arn:aws:s3:::awstags-testing-bucket";

pub const EXISTING_RESULT: &str = "abcdefgh";

pub fn generated_name() -> String {
    format!("{}{}", NAME_PREFIX, fastrand::u32(..))
}

/// A mock engine that behaves like a well-behaved provider.
pub fn engine() -> MockEngine<impl Mocks> {
    MockEngine::new(provide)
}

/// A deployment context for the default settings.
pub fn deployment(engine: MockEngine<impl Mocks>) -> Deployment {
    Deployment::new(engine, DeploymentSettings::default())
}

/// Echoes inputs back as state, fills in `Random` results, and answers lookups with canned state.
pub fn provide(args: MockResourceArgs) -> Result<(String, PropertyMap), EngineError> {
    let mut state = args.inputs;
    if let Some(id) = &args.id {
        if state.is_empty() {
            state = existing_state(&args.type_token, id);
        }
    }
    if args.type_token == RANDOM_TYPE && !state.contains_key("result") {
        let length = state
            .get("length")
            .and_then(Value::as_u64)
            .ok_or_else(|| EngineError::new("length must be a non-negative integer"))?;
        let result: String = (0..length).map(|_| fastrand::alphanumeric()).collect();
        state.insert("result".to_string(), Value::from(result));
    }

    let id = args.id.unwrap_or_else(|| format!("{}-id", args.name));
    Ok((id, state))
}

fn existing_state(type_token: &str, id: &str) -> PropertyMap {
    let state = if type_token == RESOURCE_TAG_TYPE {
        json!({
            "resourceARN": BUCKET_ARN,
            "tag": { "key": "existing", "value": id },
        })
    } else if type_token == RANDOM_TYPE {
        json!({ "length": EXISTING_RESULT.len(), "result": EXISTING_RESULT })
    } else {
        json!({})
    };
    match state {
        Value::Object(state) => state,
        _ => PropertyMap::new(),
    }
}
