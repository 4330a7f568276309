use assert_matches::assert_matches;
use futures_util::StreamExt;
use serde_json::{json, Value};

use awstags::{
    aws::{ResourceTag, ResourceTagArgs, TagArgs, RESOURCE_TAG_TYPE},
    config::{ConfigError, DeploymentSettings},
    engine::{STACK_TYPE, UNKNOWN_VALUE},
    mocks::{MockCall, MockEngine, MockResourceArgs},
    registry::{self, AnyResource, ResourceKind},
    resource::{CustomResource, Resource, Urn},
    Deployment, DeploymentEvent, EngineError, Error, Operation, OperationStatus, Output,
    OutputError, Random, RandomArgs, RegistrationFailure,
};

mod common;

use common::{deployment, engine, generated_name, BUCKET_ARN, EXISTING_RESULT};

const ROOT_URN: &str = "urn:pulumi:stack::project::pulumi:pulumi:Stack::project-stack";

#[tokio::test]
async fn run_registers_stack_and_exports() -> Result<(), Box<dyn std::error::Error>> {
    let engine = engine();
    let calls = engine.calls();

    let outputs = Deployment::run(engine, DeploymentSettings::default(), |ctx| async move {
        let random = Random::new(
            &ctx,
            "myRandomResource",
            RandomArgs::default().set_length(24),
            None,
        )?;
        ctx.export(
            "output",
            &random.result.apply(|value| json!({ "value": value })),
        );
        ctx.export("length", &random.length);
        Ok(())
    })
    .await?;

    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs.get("length"), Some(&json!(24)));
    let value = outputs
        .get("output")
        .and_then(|output| output.get("value"))
        .and_then(Value::as_str)
        .expect("output.value is a string");
    assert_eq!(value.len(), 24);

    let calls = calls.snapshot();
    assert_matches!(
        calls.first(),
        Some(MockCall::Register(request)) if request.type_token == STACK_TYPE && !request.custom
    );
    assert_matches!(
        calls.last(),
        Some(MockCall::RegisterOutputs { urn, outputs: registered })
            if urn == ROOT_URN && registered.len() == 2
    );

    Ok(())
}

#[tokio::test]
async fn exporting_a_name_again_keeps_the_last() -> Result<(), Box<dyn std::error::Error>> {
    let engine = engine();
    let calls = engine.calls();

    let outputs = Deployment::run(engine, DeploymentSettings::default(), |ctx| async move {
        ctx.export("value", &Output::known("first".to_string()));
        ctx.export("value", &Output::known("second".to_string()));
        Ok(())
    })
    .await?;

    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs.get("value"), Some(&json!("second")));
    assert_matches!(
        calls.snapshot().last(),
        Some(MockCall::RegisterOutputs { outputs: registered, .. })
            if registered.len() == 1 && registered.get("value") == Some(&json!("second"))
    );

    Ok(())
}

#[tokio::test]
async fn run_reports_registration_failure() {
    let engine = MockEngine::from_fn(|args: MockResourceArgs| {
        if args.type_token == RESOURCE_TAG_TYPE {
            Err(EngineError::new("AccessDeniedException: not authorized"))
        } else {
            common::provide(args)
        }
    });
    let calls = engine.calls();

    let result = Deployment::run(engine, DeploymentSettings::default(), |ctx| async move {
        Random::new(&ctx, "fine", RandomArgs::default().set_length(8), None)?;
        ResourceTag::new(
            &ctx,
            "broken",
            ResourceTagArgs::new(BUCKET_ARN, TagArgs::new("owner", "platform")),
            None,
        )?;
        Ok(())
    })
    .await;

    assert_matches!(
        result,
        Err(Error::Registration(RegistrationFailure {
            urn,
            error: OutputError::Engine(EngineError { message }),
        })) if urn.ends_with("::broken") && message.starts_with("AccessDeniedException")
    );
    assert!(!calls
        .snapshot()
        .iter()
        .any(|call| matches!(call, MockCall::RegisterOutputs { .. })));
}

#[tokio::test]
async fn run_returns_program_error_after_registrations() {
    let engine = engine();
    let calls = engine.calls();

    let result = Deployment::run(engine, DeploymentSettings::default(), |ctx| async move {
        Random::new(&ctx, &generated_name(), RandomArgs::default().set_length(8), None)?;
        Random::new(&ctx, &generated_name(), RandomArgs::default(), None)?;
        Ok(())
    })
    .await;

    assert_matches!(
        result,
        Err(Error::MissingRequiredArgument {
            property: "length",
            ..
        })
    );
    assert_eq!(calls.registrations().len(), 1);
}

#[tokio::test]
async fn program_can_await_outputs() -> Result<(), Box<dyn std::error::Error>> {
    let outputs = Deployment::run(engine(), DeploymentSettings::default(), |ctx| async move {
        let random = Random::new(&ctx, &generated_name(), RandomArgs::default().set_length(12), None)?;
        let result = random.result.get().await?;
        ctx.export("upper", &Output::known(result.to_uppercase()));
        Ok(())
    })
    .await?;

    let upper = outputs.get("upper").and_then(Value::as_str).unwrap_or_default();
    assert_eq!(upper.len(), 12);
    assert_eq!(upper, upper.to_uppercase());

    Ok(())
}

#[tokio::test]
async fn failed_export() {
    let result = Deployment::run(engine(), DeploymentSettings::default(), |ctx| async move {
        ctx.export(
            "broken",
            &Output::<String>::failed(OutputError::Invalid {
                message: "not serializable".to_string(),
            }),
        );
        Ok(())
    })
    .await;

    assert_matches!(
        result,
        Err(Error::Export {
            name,
            source: OutputError::Invalid { .. },
        }) if name == "broken"
    );
}

#[tokio::test]
async fn events_end_with_finished() -> Result<(), Box<dyn std::error::Error>> {
    let (sender, receiver) = tokio::sync::oneshot::channel();

    Deployment::run(engine(), DeploymentSettings::default(), |ctx| async move {
        let _ = sender.send(tokio::spawn(ctx.events().collect::<Vec<_>>()));
        Random::new(&ctx, "events", RandomArgs::default().set_length(4), None)?;
        Ok(())
    })
    .await?;
    let events = receiver.await?.await?;

    let statuses: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            DeploymentEvent::Resource {
                urn,
                operation: Operation::Register,
                status,
                ..
            } if urn.name() == "events" => Some(status.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![OperationStatus::InProgress, OperationStatus::Complete]
    );
    assert_matches!(
        events.last(),
        Some(DeploymentEvent::Finished {
            succeeded: true,
            ..
        })
    );

    Ok(())
}

#[tokio::test]
async fn preview_tolerates_unknowns() -> Result<(), Box<dyn std::error::Error>> {
    let engine = MockEngine::from_fn(|args: MockResourceArgs| {
        let mut state = args.inputs;
        if args.type_token == awstags::RANDOM_TYPE {
            state.insert("result".to_string(), Value::from(UNKNOWN_VALUE));
        }
        Ok((UNKNOWN_VALUE.to_string(), state))
    });
    let calls = engine.calls();
    let settings = DeploymentSettings::default().set_dry_run(true);

    let outputs = Deployment::run(engine, settings, |ctx| async move {
        assert!(ctx.is_dry_run());
        let random = Random::new(&ctx, "suffix", RandomArgs::default().set_length(8), None)?;
        let tag = ResourceTag::new(
            &ctx,
            "tag",
            ResourceTagArgs::new(&random.result, TagArgs::new("owner", "platform")),
            None,
        )?;
        assert_eq!(random.result.get().await, Err(OutputError::Unknown));
        assert_eq!(random.id().get().await, Err(OutputError::Unknown));
        assert_eq!(random.length.get().await, Ok(8));
        ctx.export("arn", &tag.resource_arn);
        Ok(())
    })
    .await?;

    assert_eq!(outputs.get("arn"), Some(&Value::from(UNKNOWN_VALUE)));
    let tag = calls
        .registrations()
        .into_iter()
        .find(|request| request.type_token == RESOURCE_TAG_TYPE)
        .expect("tag was registered");
    assert!(tag.preview);
    assert_eq!(tag.object.get("resourceARN"), Some(&Value::from(UNKNOWN_VALUE)));

    Ok(())
}

#[tokio::test]
async fn config_is_namespaced() {
    let settings = DeploymentSettings::new("tags", "dev")
        .set_config("awstags:region", "eu-west-2")
        .set_config("app:region", "us-east-1");
    let ctx = Deployment::new(engine(), settings);

    assert_eq!(ctx.project(), "tags");
    assert_eq!(ctx.stack(), "dev");
    assert_eq!(ctx.root_urn().as_str(), "urn:pulumi:dev::tags::pulumi:pulumi:Stack::tags-dev");

    let config = ctx.config("awstags");
    assert_eq!(config.get("region"), Some("eu-west-2"));
    assert_matches!(config.require("profile"), Err(ConfigError::MissingKey { .. }));
    assert_eq!(ctx.config("app").get("region"), Some("us-east-1"));
}

#[tokio::test]
async fn construct_from_urn() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = deployment(engine());

    let urn = Urn::parse("urn:pulumi:stack::project::awstags:index:Random::existing")?;
    let random = match registry::construct_from_urn(&ctx, &urn, "random-1")? {
        AnyResource::Random(random) => random,
        other => panic!("unexpected resource: {:?}", other),
    };
    assert_eq!(random.urn(), &urn);
    assert_eq!(random.id().get().await?, "random-1");
    assert_eq!(random.result.get().await?, EXISTING_RESULT);

    let tag = registry::construct(&ctx, ResourceKind::ResourceTag, "existing", "tag-1", None)?;
    assert_eq!(tag.as_resource().type_token(), RESOURCE_TAG_TYPE);

    let provider = Urn::parse("urn:pulumi:stack::project::pulumi:providers:awstags::default")?;
    assert_matches!(
        registry::construct_from_urn(&ctx, &provider, "provider-1"),
        Err(Error::UnsupportedLookup { .. })
    );
    let bucket = Urn::parse("urn:pulumi:stack::project::aws:s3/bucket:Bucket::logs")?;
    assert_matches!(
        registry::construct_from_urn(&ctx, &bucket, "logs"),
        Err(Error::UnknownResourceType { type_token }) if type_token == "aws:s3/bucket:Bucket"
    );

    Ok(())
}
