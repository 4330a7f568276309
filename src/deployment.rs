//! The deployment context resources register themselves with.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_stream::stream;
use chrono::{DateTime, Utc};
use futures_util::{future::join_all, Stream};
use serde::Serialize;
use serde_json::Value;
use serde_plain::forward_display_to_serde;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    config::{Config, DeploymentSettings},
    engine::{
        Engine, PropertyMap, ReadResourceRequest, RegisterResourceRequest, STACK_TYPE,
        UNKNOWN_VALUE,
    },
    options::CustomResourceOptions,
    resource::{CustomResourceState, OutputSlots, PropertyInputs, Urn},
    Error, Output, OutputError, RegistrationFailure,
};

const EVENT_CAPACITY: usize = 256;

/// The operation performed for a resource.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// The resource was registered (created, updated, or adopted).
    Register,

    /// An existing resource was read.
    Read,
}

forward_display_to_serde!(Operation);

/// The status of a resource operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OperationStatus {
    /// The request has been issued and the engine has not yet answered.
    InProgress,

    /// The engine completed the operation.
    Complete,

    /// The operation failed.
    Failed(OutputError),
}

/// Progress of a deployment, as reported by [`Deployment::events`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeploymentEvent {
    /// An operation on a resource progressed.
    Resource {
        /// The URN of the resource.
        urn: Urn,

        /// The operation being performed.
        operation: Operation,

        /// The status of the operation.
        status: OperationStatus,

        /// When the status was observed.
        timestamp: DateTime<Utc>,
    },

    /// The deployment finished.
    Finished {
        /// Whether every registration and export succeeded.
        succeeded: bool,

        /// When the deployment finished.
        timestamp: DateTime<Utc>,
    },
}

impl DeploymentEvent {
    /// Indicates whether or not this is the last event of the deployment.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    fn resource(urn: &Urn, operation: Operation, status: OperationStatus) -> Self {
        Self::Resource {
            urn: urn.clone(),
            operation,
            status,
            timestamp: Utc::now(),
        }
    }
}

/// The exports of a completed deployment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StackOutputs(PropertyMap);

impl StackOutputs {
    /// The value exported as `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The number of exports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The exports as a property map.
    #[must_use]
    pub fn into_inner(self) -> PropertyMap {
        self.0
    }
}

/// Everything a resource proxy hands over when registering itself.
pub(crate) struct Registration {
    pub(crate) type_token: &'static str,
    pub(crate) name: String,
    pub(crate) custom: bool,
    pub(crate) inputs: PropertyInputs,
    pub(crate) options: CustomResourceOptions,
    pub(crate) outputs: OutputSlots,
}

type RegistrationTask = JoinHandle<Result<(), RegistrationFailure>>;

struct Inner {
    engine: Arc<dyn Engine>,
    settings: DeploymentSettings,
    config: Arc<BTreeMap<String, String>>,
    root_urn: Urn,
    urns: Mutex<HashSet<Urn>>,
    tasks: Mutex<Vec<RegistrationTask>>,
    exports: Mutex<BTreeMap<String, Output<Value>>>,
    events: broadcast::Sender<DeploymentEvent>,
}

/// The context of a running deployment program.
///
/// Resource constructors take a `&Deployment` and register the resource with it. Registrations
/// run concurrently on spawned tasks, so constructors must be called from within a tokio runtime.
///
/// ```no_run
/// use awstags::{config::DeploymentSettings, mocks::MockEngine, Deployment, Random, RandomArgs};
///
/// # async fn example() -> Result<(), awstags::Error> {
/// # let engine = MockEngine::from_fn(|args: awstags::mocks::MockResourceArgs| Ok((args.name, args.inputs)));
/// let outputs = Deployment::run(engine, DeploymentSettings::default(), |ctx| async move {
///     let random = Random::new(&ctx, "suffix", RandomArgs::default().set_length(24), None)?;
///     ctx.export("suffix", &random.result);
///     Ok(())
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Deployment {
    inner: Arc<Inner>,
}

impl Deployment {
    /// Construct a deployment context for `engine`.
    ///
    /// Most programs should use [`run`](Self::run), which also registers the stack and its exports.
    pub fn new(engine: impl Engine, settings: DeploymentSettings) -> Self {
        let root_urn = Urn::new(
            &settings.stack,
            &settings.project,
            STACK_TYPE,
            &format!("{}-{}", settings.project, settings.stack),
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                engine: Arc::new(engine),
                config: Arc::new(settings.config.clone()),
                settings,
                root_urn,
                urns: Mutex::new(HashSet::new()),
                tasks: Mutex::new(Vec::new()),
                exports: Mutex::new(BTreeMap::new()),
                events,
            }),
        }
    }

    /// Run a deployment program.
    ///
    /// This registers the stack, runs `program`, waits for every resource registration it issued
    /// to complete, and finally reports the stack's exports to the engine.
    ///
    /// # Errors
    ///
    /// Returns the program's own error, the first failed registration, or the engine's failure to
    /// register the stack or its outputs. Nothing is retried.
    pub async fn run<E, F, Fut>(
        engine: E,
        settings: DeploymentSettings,
        program: F,
    ) -> Result<StackOutputs, Error>
    where
        E: Engine,
        F: FnOnce(Deployment) -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        let ctx = Self::new(engine, settings);
        tracing::info!(
            project = %ctx.project(),
            stack = %ctx.stack(),
            dry_run = ctx.is_dry_run(),
            "running deployment"
        );

        let result = ctx.run_program(program).await;
        ctx.emit(DeploymentEvent::Finished {
            succeeded: result.is_ok(),
            timestamp: Utc::now(),
        });
        match &result {
            Ok(outputs) => tracing::info!(exports = outputs.len(), "deployment complete"),
            Err(error) => tracing::error!(%error, "deployment failed"),
        }
        result
    }

    async fn run_program<F, Fut>(&self, program: F) -> Result<StackOutputs, Error>
    where
        F: FnOnce(Deployment) -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        self.register_stack().await?;

        let program_result = program(self.clone()).await;
        // Registrations already issued still run to completion, even if the program failed.
        let registrations = self.wait_for_registrations().await;
        program_result?;
        registrations?;

        self.register_outputs().await
    }

    /// The name of the project being deployed.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.inner.settings.project
    }

    /// The name of the stack being deployed.
    #[must_use]
    pub fn stack(&self) -> &str {
        &self.inner.settings.stack
    }

    /// Whether this deployment is a preview.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.inner.settings.dry_run
    }

    /// The URN of the stack resource, the implicit parent of every resource.
    #[must_use]
    pub fn root_urn(&self) -> &Urn {
        &self.inner.root_urn
    }

    /// Configuration values in `namespace`.
    #[must_use]
    pub fn config(&self, namespace: &str) -> Config {
        Config::new(namespace, Arc::clone(&self.inner.config))
    }

    /// Export `output` as the stack output `name`.
    ///
    /// Exporting the same name again replaces the previous export.
    pub fn export<T>(&self, name: impl Into<String>, output: &Output<T>)
    where
        T: Serialize + Clone + Send + Sync + 'static,
    {
        let value = output.try_apply(|value| {
            serde_json::to_value(value).map_err(|error| OutputError::Invalid {
                message: error.to_string(),
            })
        });
        lock(&self.inner.exports).insert(name.into(), value);
    }

    /// A stream of progress events for this deployment.
    ///
    /// Only events that happen after subscribing are observed, so subscribe before declaring the
    /// resources whose progress should be reported. The stream ends after the
    /// [`Finished`](DeploymentEvent::Finished) event.
    pub fn events(&self) -> impl Stream<Item = DeploymentEvent> {
        let mut receiver = self.inner.events.subscribe();
        stream! {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let is_terminal = event.is_terminal();
                        yield event;
                        if is_terminal {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "deployment event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    /// Register a resource.
    ///
    /// Local validation happens synchronously; the engine request is issued on a spawned task
    /// whose result settles the resource's outputs.
    pub(crate) fn register(&self, registration: Registration) -> Result<CustomResourceState, Error> {
        let Registration {
            type_token,
            name,
            custom,
            inputs,
            options,
            outputs,
        } = registration;

        if name.is_empty() {
            return Err(Error::InvalidResourceName { type_token });
        }
        let parent = options
            .parent
            .clone()
            .unwrap_or_else(|| self.inner.root_urn.clone());
        let urn = Urn::child(&parent, type_token, &name);
        if !lock(&self.inner.urns).insert(urn.clone()) {
            return Err(Error::DuplicateResourceName {
                urn: urn.to_string(),
            });
        }

        let operation = if options.id.is_some() {
            Operation::Read
        } else {
            Operation::Register
        };
        tracing::debug!(%urn, %operation, "issuing resource operation");

        let (id_resolver, id) = Output::pending();
        let request = PendingRequest {
            type_token,
            name,
            custom,
            parent,
            inputs,
            options,
            preview: self.is_dry_run(),
        };
        let engine = Arc::clone(&self.inner.engine);
        let events = self.inner.events.clone();
        let task_urn = urn.clone();
        let task = tokio::spawn(async move {
            let _ = events.send(DeploymentEvent::resource(
                &task_urn,
                operation,
                OperationStatus::InProgress,
            ));

            let result = request.send(engine.as_ref()).await;
            let (id, properties) = match result {
                Ok((id, properties)) => (id, Ok(properties)),
                Err(error) => (Err(error.clone()), Err(error)),
            };
            id_resolver.settle(id);
            outputs.settle(&properties);

            match properties {
                Ok(_) => {
                    tracing::debug!(urn = %task_urn, %operation, "resource operation complete");
                    let _ = events.send(DeploymentEvent::resource(
                        &task_urn,
                        operation,
                        OperationStatus::Complete,
                    ));
                    Ok(())
                }
                Err(error) => {
                    tracing::error!(urn = %task_urn, %operation, %error, "resource operation failed");
                    let _ = events.send(DeploymentEvent::resource(
                        &task_urn,
                        operation,
                        OperationStatus::Failed(error.clone()),
                    ));
                    Err(RegistrationFailure {
                        urn: task_urn.to_string(),
                        error,
                    })
                }
            }
        });
        lock(&self.inner.tasks).push(task);

        Ok(CustomResourceState { urn, id })
    }

    async fn register_stack(&self) -> Result<(), Error> {
        let settings = &self.inner.settings;
        let request = RegisterResourceRequest {
            type_token: STACK_TYPE.to_string(),
            name: format!("{}-{}", settings.project, settings.stack),
            custom: false,
            parent: None,
            object: PropertyMap::new(),
            dependencies: Vec::new(),
            protect: false,
            provider: None,
            ignore_changes: Vec::new(),
            version: None,
            plugin_download_url: None,
            delete_before_replace: false,
            retain_on_delete: false,
            aliases: Vec::new(),
            import_id: None,
            custom_timeouts: None,
            preview: settings.dry_run,
        };
        self.inner
            .engine
            .register_resource(request)
            .await
            .map_err(Error::Engine)?;
        lock(&self.inner.urns).insert(self.inner.root_urn.clone());
        Ok(())
    }

    /// Wait for every registration issued so far.
    ///
    /// Returns the first failure; later failures are only logged (by the tasks themselves).
    async fn wait_for_registrations(&self) -> Result<(), Error> {
        let mut first_error = None;
        loop {
            let tasks = std::mem::take(&mut *lock(&self.inner.tasks));
            if tasks.is_empty() {
                break;
            }
            for result in join_all(tasks).await {
                let error = match result {
                    Ok(Ok(())) => continue,
                    Ok(Err(failure)) => Error::Registration(failure),
                    Err(join_error) => Error::TaskPanicked {
                        message: join_error.to_string(),
                    },
                };
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn register_outputs(&self) -> Result<StackOutputs, Error> {
        let exports = std::mem::take(&mut *lock(&self.inner.exports));
        let mut outputs = PropertyMap::new();
        for (name, output) in exports {
            match output.get().await {
                Ok(value) => {
                    outputs.insert(name, value);
                }
                Err(OutputError::Unknown) if self.is_dry_run() => {
                    outputs.insert(name, Value::from(UNKNOWN_VALUE));
                }
                Err(source) => return Err(Error::Export { name, source }),
            }
        }

        self.inner
            .engine
            .register_resource_outputs(self.inner.root_urn.as_str(), outputs.clone())
            .await
            .map_err(Error::Engine)?;
        Ok(StackOutputs(outputs))
    }

    fn emit(&self, event: DeploymentEvent) {
        // Events are best-effort; there may be no subscribers.
        let _ = self.inner.events.send(event);
    }
}

impl fmt::Debug for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployment")
            .field("project", &self.project())
            .field("stack", &self.stack())
            .field("dry_run", &self.is_dry_run())
            .finish()
    }
}

/// A registration whose inputs may not be known yet.
struct PendingRequest {
    type_token: &'static str,
    name: String,
    custom: bool,
    parent: Urn,
    inputs: PropertyInputs,
    options: CustomResourceOptions,
    preview: bool,
}

impl PendingRequest {
    /// Wait for the inputs and send the request, returning the resource's ID and properties.
    async fn send(
        self,
        engine: &dyn Engine,
    ) -> Result<(Result<String, OutputError>, PropertyMap), OutputError> {
        let Self {
            type_token,
            name,
            custom,
            parent,
            inputs,
            options,
            preview,
        } = self;

        let provider = match options.provider {
            Some(provider) => Some(provider.resolve().await?),
            None => None,
        };
        let properties = inputs.resolve(preview).await?;
        let dependencies = options.depends_on.iter().map(Urn::to_string).collect();

        if let Some(id) = options.id {
            let id = id.resolve().await?;
            let response = engine
                .read_resource(ReadResourceRequest {
                    id: id.clone(),
                    type_token: type_token.to_string(),
                    name,
                    parent: Some(parent.to_string()),
                    properties,
                    dependencies,
                    provider,
                    version: options.version,
                    plugin_download_url: options.plugin_download_url,
                    preview,
                })
                .await?;
            return Ok((Ok(id), response.properties));
        }

        let response = engine
            .register_resource(RegisterResourceRequest {
                type_token: type_token.to_string(),
                name,
                custom,
                parent: Some(parent.to_string()),
                object: properties,
                dependencies,
                protect: options.protect.unwrap_or(false),
                provider,
                ignore_changes: options.ignore_changes,
                version: options.version,
                plugin_download_url: options.plugin_download_url,
                delete_before_replace: options.delete_before_replace.unwrap_or(false),
                retain_on_delete: options.retain_on_delete.unwrap_or(false),
                aliases: options.aliases.iter().map(Urn::to_string).collect(),
                import_id: options.import_id,
                custom_timeouts: options.custom_timeouts,
                preview,
            })
            .await?;

        let id = match response.id {
            Some(id) if id == UNKNOWN_VALUE => Err(OutputError::Unknown),
            Some(id) if !id.is_empty() => Ok(id),
            _ if preview => Err(OutputError::Unknown),
            _ => Err(OutputError::Missing {
                property: "id".to_string(),
            }),
        };
        Ok((id, response.object))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // The guarded collections stay consistent even if a holder panicked.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
