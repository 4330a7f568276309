//! The seam between the SDK and the deployment engine.
//!
//! The engine owns the resource graph, diffing, and the provider plugins. The SDK only asks it to
//! register or read resources and reports the stack's outputs. The transport that carries these
//! requests is supplied by implementing [`Engine`]; [`MockEngine`](crate::mocks::MockEngine) is an
//! in-process implementation for tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EngineError;

/// A property map, as exchanged with the engine.
pub type PropertyMap = serde_json::Map<String, Value>;

/// The sentinel the engine uses for values that are unknown during a preview.
pub const UNKNOWN_VALUE: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// The type token of the root resource of every deployment.
pub const STACK_TYPE: &str = "pulumi:pulumi:Stack";

/// Whether `value` is the engine's unknown sentinel.
#[must_use]
pub fn is_unknown(value: &Value) -> bool {
    value.as_str() == Some(UNKNOWN_VALUE)
}

/// Timeouts for the engine's create, update, and delete operations.
///
/// Values are durations such as `5m` or `1h30m`, interpreted by the engine.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTimeouts {
    /// The timeout for creating the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<String>,

    /// The timeout for updating the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,

    /// The timeout for deleting the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
}

/// A request to register (create, update, or adopt) a resource.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResourceRequest {
    /// The resource's type token.
    #[serde(rename = "type")]
    pub type_token: String,

    /// The resource's name.
    pub name: String,

    /// Whether the resource is managed by a provider plugin (rather than being a component).
    pub custom: bool,

    /// The URN of the resource's parent, if any.
    pub parent: Option<String>,

    /// The resource's resolved input properties.
    pub object: PropertyMap,

    /// URNs of resources this resource explicitly depends on.
    pub dependencies: Vec<String>,

    /// Whether the resource is protected from deletion.
    pub protect: bool,

    /// A reference (`urn::id`) to an explicit provider resource.
    pub provider: Option<String>,

    /// Input properties whose changes should be ignored.
    pub ignore_changes: Vec<String>,

    /// The version of the provider plugin to use.
    pub version: Option<String>,

    /// Where the engine can download the provider plugin.
    #[serde(rename = "pluginDownloadURL")]
    pub plugin_download_url: Option<String>,

    /// Whether replacements should delete the old resource before creating the new one.
    pub delete_before_replace: bool,

    /// Whether the resource should be left in place when deleted from the program.
    pub retain_on_delete: bool,

    /// Previous URNs of this resource.
    pub aliases: Vec<String>,

    /// The ID of an existing resource to adopt rather than create.
    pub import_id: Option<String>,

    /// Timeouts for the engine's operations on this resource.
    pub custom_timeouts: Option<CustomTimeouts>,

    /// Whether this registration is part of a preview.
    pub preview: bool,
}

/// The engine's answer to a [`RegisterResourceRequest`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResourceResponse {
    /// The URN the engine assigned.
    pub urn: String,

    /// The provider-assigned ID, if the resource is custom and the ID is known.
    pub id: Option<String>,

    /// The resource's output properties.
    pub object: PropertyMap,
}

/// A request to read the state of an existing resource.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResourceRequest {
    /// The provider-assigned ID of the resource.
    pub id: String,

    /// The resource's type token.
    #[serde(rename = "type")]
    pub type_token: String,

    /// The name to give the resource in this deployment.
    pub name: String,

    /// The URN of the resource's parent, if any.
    pub parent: Option<String>,

    /// Extra properties used to qualify the lookup.
    pub properties: PropertyMap,

    /// URNs of resources this resource explicitly depends on.
    pub dependencies: Vec<String>,

    /// A reference (`urn::id`) to an explicit provider resource.
    pub provider: Option<String>,

    /// The version of the provider plugin to use.
    pub version: Option<String>,

    /// Where the engine can download the provider plugin.
    #[serde(rename = "pluginDownloadURL")]
    pub plugin_download_url: Option<String>,

    /// Whether this read is part of a preview.
    pub preview: bool,
}

/// The engine's answer to a [`ReadResourceRequest`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResourceResponse {
    /// The URN the engine assigned.
    pub urn: String,

    /// The resource's current properties.
    pub properties: PropertyMap,
}

/// A deployment engine.
///
/// Implementations are expected to forward requests verbatim; the SDK does not retry failed
/// requests.
#[async_trait::async_trait]
pub trait Engine: Send + Sync + 'static {
    /// Register a resource.
    async fn register_resource(
        &self,
        request: RegisterResourceRequest,
    ) -> Result<RegisterResourceResponse, EngineError>;

    /// Read an existing resource.
    async fn read_resource(
        &self,
        request: ReadResourceRequest,
    ) -> Result<ReadResourceResponse, EngineError>;

    /// Report the outputs of a resource (in practice, the stack's exports).
    async fn register_resource_outputs(
        &self,
        urn: &str,
        outputs: PropertyMap,
    ) -> Result<(), EngineError>;
}
