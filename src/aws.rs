//! Resources in the `aws` module of the package.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    deployment::Registration,
    options::make_resource_options,
    resource::{
        CustomResource, CustomResourceState, Marshal, OutputSlots, PropertyInputs, Resource,
        ResourceArgs, Urn,
    },
    CustomResourceOptions, Deployment, Error, Input, Output,
};

/// The type token of [`ResourceTag`].
pub const RESOURCE_TAG_TYPE: &str = "awstags:aws:ResourceTag";

/// A single tag on an already deployed (or imported) AWS resource.
///
/// The tag is applied by the provider plugin when the resource is created and removed when it is
/// deleted. Changing the tag key or the target ARN moves the tag.
///
/// ```no_run
/// # use awstags::{aws::{ResourceTag, ResourceTagArgs, TagArgs}, Deployment, Error};
/// # fn example(ctx: &Deployment) -> Result<(), Error> {
/// let tag = ResourceTag::new(
///     ctx,
///     "bucket-owner",
///     ResourceTagArgs::new(
///         "arn:aws:s3:::my-bucket",
///         TagArgs::new("owner", "platform-team"),
///     ),
///     None,
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ResourceTag {
    state: CustomResourceState,

    /// The ARN of the tagged resource.
    pub resource_arn: Output<String>,

    /// The tag applied to the resource.
    pub tag: Output<Tag>,
}

impl ResourceTag {
    /// Create a `ResourceTag` resource with the given unique `name`, arguments, and options.
    ///
    /// # Errors
    ///
    /// Returns an error if a required argument is missing, or if `name` is empty or already in
    /// use. Nothing is sent to the engine in that case. Errors from the engine are reported
    /// through the resource's outputs instead.
    pub fn new(
        ctx: &Deployment,
        name: &str,
        args: ResourceTagArgs,
        options: Option<CustomResourceOptions>,
    ) -> Result<Self, Error> {
        let inputs = args.into_inputs()?;
        Self::register(ctx, name, inputs, make_resource_options(options, None))
    }

    /// Get an existing `ResourceTag` resource's state with the given `name` and provider `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or already in use.
    pub fn get(
        ctx: &Deployment,
        name: &str,
        id: impl Into<Input<String>>,
        options: Option<CustomResourceOptions>,
    ) -> Result<Self, Error> {
        Self::register(
            ctx,
            name,
            PropertyInputs::new("ResourceTagArgs"),
            make_resource_options(options, Some(id.into())),
        )
    }

    fn register(
        ctx: &Deployment,
        name: &str,
        inputs: PropertyInputs,
        options: CustomResourceOptions,
    ) -> Result<Self, Error> {
        let mut outputs = OutputSlots::new();
        let resource_arn = outputs.required("resourceARN");
        let tag = outputs.required("tag");
        let state = ctx.register(Registration {
            type_token: RESOURCE_TAG_TYPE,
            name: name.to_string(),
            custom: true,
            inputs,
            options,
            outputs,
        })?;
        Ok(Self {
            state,
            resource_arn,
            tag,
        })
    }
}

impl Resource for ResourceTag {
    fn type_token(&self) -> &'static str {
        RESOURCE_TAG_TYPE
    }

    fn urn(&self) -> &Urn {
        self.state.urn()
    }
}

impl CustomResource for ResourceTag {
    fn id(&self) -> &Output<String> {
        self.state.id()
    }
}

/// The arguments used to populate a [`ResourceTag`].
///
/// Both properties are required.
#[derive(Clone, Debug, Default)]
pub struct ResourceTagArgs {
    /// The ARN of the resource to tag.
    pub resource_arn: Option<Input<String>>,

    /// The tag to apply.
    pub tag: Option<Input<TagArgs>>,
}

impl ResourceTagArgs {
    /// Construct arguments with every required property set.
    pub fn new(resource_arn: impl Into<Input<String>>, tag: impl Into<Input<TagArgs>>) -> Self {
        Self {
            resource_arn: Some(resource_arn.into()),
            tag: Some(tag.into()),
        }
    }

    /// Set the value for `resource_arn`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_resource_arn(mut self, resource_arn: impl Into<Input<String>>) -> Self {
        self.resource_arn = Some(resource_arn.into());
        self
    }

    /// Set the value for `tag`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_tag(mut self, tag: impl Into<Input<TagArgs>>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl ResourceArgs for ResourceTagArgs {
    fn into_inputs(self) -> Result<PropertyInputs, Error> {
        let mut inputs = PropertyInputs::new("ResourceTagArgs");
        inputs
            .require("resourceARN", self.resource_arn)?
            .require("tag", self.tag)?;
        Ok(inputs)
    }
}

/// A tag key/value pair, as an input.
#[derive(Clone, Debug, Default)]
pub struct TagArgs {
    /// The tag key.
    pub key: Option<Input<String>>,

    /// The tag value.
    pub value: Option<Input<String>>,
}

impl TagArgs {
    /// Construct a tag with the given `key` and `value`.
    pub fn new(key: impl Into<Input<String>>, value: impl Into<Input<String>>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }
}

impl Marshal for TagArgs {
    fn marshal(self) -> Result<Output<Value>, Error> {
        let mut inputs = PropertyInputs::new("TagArgs");
        inputs
            .require("key", self.key)?
            .require("value", self.value)?;
        Ok(inputs.into_output())
    }
}

impl From<TagArgs> for Input<TagArgs> {
    fn from(tag: TagArgs) -> Self {
        Self::Value(tag)
    }
}

/// A tag key/value pair, as resolved by the engine.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Tag {
    /// The tag key.
    pub key: String,

    /// The tag value.
    pub value: String,
}
