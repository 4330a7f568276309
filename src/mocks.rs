//! An in-process deployment engine for tests and local runs.
//!
//! [`MockEngine`] answers every request itself, asking a [`Mocks`] implementation for the ID and
//! state of each custom resource, and records every request it receives.
//!
//! ```
//! use awstags::mocks::{MockEngine, MockResourceArgs};
//!
//! // Echo every resource's inputs back as its state.
//! let engine = MockEngine::from_fn(|args: MockResourceArgs| Ok((format!("{}-id", args.name), args.inputs)));
//! let calls = engine.calls();
//! assert!(calls.is_empty());
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    engine::{
        Engine, PropertyMap, ReadResourceRequest, ReadResourceResponse, RegisterResourceRequest,
        RegisterResourceResponse,
    },
    resource::Urn,
    EngineError,
};

/// The arguments to [`Mocks::new_resource`].
#[derive(Clone, Debug, PartialEq)]
pub struct MockResourceArgs {
    /// The resource's type token.
    pub type_token: String,

    /// The resource's name.
    pub name: String,

    /// The resource's resolved inputs.
    pub inputs: PropertyMap,

    /// The explicit provider reference, if any.
    pub provider: Option<String>,

    /// The ID being read, for lookups.
    pub id: Option<String>,
}

/// Produces the state of mocked resources.
pub trait Mocks: Send + Sync + 'static {
    /// Produce the ID and output properties of a new (or looked-up) custom resource.
    ///
    /// For lookups the returned ID is ignored; the resource keeps the requested ID.
    ///
    /// # Errors
    ///
    /// An error is reported to the program as if the provider had failed the operation.
    fn new_resource(&self, args: MockResourceArgs) -> Result<(String, PropertyMap), EngineError>;
}

impl<F> Mocks for F
where
    F: Fn(MockResourceArgs) -> Result<(String, PropertyMap), EngineError> + Send + Sync + 'static,
{
    fn new_resource(&self, args: MockResourceArgs) -> Result<(String, PropertyMap), EngineError> {
        self(args)
    }
}

/// A request received by a [`MockEngine`].
#[derive(Clone, Debug, PartialEq)]
pub enum MockCall {
    /// A [`RegisterResourceRequest`].
    Register(RegisterResourceRequest),

    /// A [`ReadResourceRequest`].
    Read(ReadResourceRequest),

    /// Outputs registered for a resource.
    RegisterOutputs {
        /// The URN of the resource.
        urn: String,

        /// The outputs.
        outputs: PropertyMap,
    },
}

/// A shared log of the requests a [`MockEngine`] received.
#[derive(Clone, Debug, Default)]
pub struct MockCalls(Arc<Mutex<Vec<MockCall>>>);

impl MockCalls {
    fn push(&self, call: MockCall) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// A snapshot of every request received so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<MockCall> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether no requests have been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// The registration requests received so far, excluding the stack's own registration.
    #[must_use]
    pub fn registrations(&self) -> Vec<RegisterResourceRequest> {
        self.snapshot()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Register(request) if request.custom => Some(request),
                _ => None,
            })
            .collect()
    }

    /// The read requests received so far.
    #[must_use]
    pub fn reads(&self) -> Vec<ReadResourceRequest> {
        self.snapshot()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Read(request) => Some(request),
                _ => None,
            })
            .collect()
    }
}

/// A deployment engine that resolves resources with [`Mocks`].
#[derive(Debug)]
pub struct MockEngine<M> {
    mocks: M,
    project: String,
    stack: String,
    calls: MockCalls,
}

impl<M: Mocks> MockEngine<M> {
    /// Construct an engine for the default project and stack.
    ///
    /// These match [`DeploymentSettings::default`](crate::config::DeploymentSettings::default).
    pub fn new(mocks: M) -> Self {
        Self::with_stack(mocks, "project", "stack")
    }

    /// Construct an engine for the given `project` and `stack`.
    pub fn with_stack(mocks: M, project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            mocks,
            project: project.into(),
            stack: stack.into(),
            calls: MockCalls::default(),
        }
    }

    /// A handle to the log of requests this engine receives.
    ///
    /// The handle stays usable after the engine has been moved into a deployment.
    #[must_use]
    pub fn calls(&self) -> MockCalls {
        self.calls.clone()
    }

    fn urn(&self, parent: Option<&str>, type_token: &str, name: &str) -> String {
        match parent.map(Urn::parse) {
            Some(Ok(parent)) => Urn::child(&parent, type_token, name).to_string(),
            _ => Urn::new(&self.stack, &self.project, type_token, name).to_string(),
        }
    }
}

impl<F> MockEngine<F>
where
    F: Fn(MockResourceArgs) -> Result<(String, PropertyMap), EngineError> + Send + Sync + 'static,
{
    /// Construct an engine for the default project and stack from a closure.
    pub fn from_fn(mocks: F) -> Self {
        Self::new(mocks)
    }
}

#[async_trait::async_trait]
impl<M: Mocks> Engine for MockEngine<M> {
    async fn register_resource(
        &self,
        request: RegisterResourceRequest,
    ) -> Result<RegisterResourceResponse, EngineError> {
        self.calls.push(MockCall::Register(request.clone()));
        let urn = self.urn(request.parent.as_deref(), &request.type_token, &request.name);

        if !request.custom {
            return Ok(RegisterResourceResponse {
                urn,
                id: None,
                object: request.object,
            });
        }

        let (id, object) = self.mocks.new_resource(MockResourceArgs {
            type_token: request.type_token,
            name: request.name,
            inputs: request.object,
            provider: request.provider,
            id: request.import_id,
        })?;
        Ok(RegisterResourceResponse {
            urn,
            id: Some(id),
            object,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequest,
    ) -> Result<ReadResourceResponse, EngineError> {
        self.calls.push(MockCall::Read(request.clone()));
        let urn = self.urn(request.parent.as_deref(), &request.type_token, &request.name);

        let (_, properties) = self.mocks.new_resource(MockResourceArgs {
            type_token: request.type_token,
            name: request.name,
            inputs: request.properties,
            provider: request.provider,
            id: Some(request.id),
        })?;
        Ok(ReadResourceResponse { urn, properties })
    }

    async fn register_resource_outputs(
        &self,
        urn: &str,
        outputs: PropertyMap,
    ) -> Result<(), EngineError> {
        self.calls.push(MockCall::RegisterOutputs {
            urn: urn.to_string(),
            outputs,
        });
        Ok(())
    }
}
