//! The package's `Random` resource.

use crate::{
    deployment::Registration,
    options::make_resource_options,
    resource::{
        CustomResource, CustomResourceState, OutputSlots, PropertyInputs, Resource, ResourceArgs,
        Urn,
    },
    CustomResourceOptions, Deployment, Error, Input, Output,
};

/// The type token of [`Random`].
pub const RANDOM_TYPE: &str = "awstags:index:Random";

/// A random string generated by the provider, e.g. for use as a resource name suffix.
#[derive(Clone, Debug)]
pub struct Random {
    state: CustomResourceState,

    /// The requested length.
    pub length: Output<i64>,

    /// The generated value.
    pub result: Output<String>,
}

impl Random {
    /// Create a `Random` resource with the given unique `name`, arguments, and options.
    ///
    /// # Errors
    ///
    /// Returns an error if `length` is not set, or if `name` is empty or already in use.
    pub fn new(
        ctx: &Deployment,
        name: &str,
        args: RandomArgs,
        options: Option<CustomResourceOptions>,
    ) -> Result<Self, Error> {
        let inputs = args.into_inputs()?;
        Self::register(ctx, name, inputs, make_resource_options(options, None))
    }

    /// Get an existing `Random` resource's state with the given `name` and provider `id`.
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
            PropertyInputs::new("RandomArgs"),
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
        let length = outputs.required("length");
        let result = outputs.required("result");
        let state = ctx.register(Registration {
            type_token: RANDOM_TYPE,
            name: name.to_string(),
            custom: true,
            inputs,
            options,
            outputs,
        })?;
        Ok(Self {
            state,
            length,
            result,
        })
    }
}

impl Resource for Random {
    fn type_token(&self) -> &'static str {
        RANDOM_TYPE
    }

    fn urn(&self) -> &Urn {
        self.state.urn()
    }
}

impl CustomResource for Random {
    fn id(&self) -> &Output<String> {
        self.state.id()
    }
}

/// The arguments used to populate a [`Random`].
#[derive(Clone, Debug, Default)]
pub struct RandomArgs {
    /// The length of the generated value. Required.
    pub length: Option<Input<i64>>,
}

impl RandomArgs {
    /// Set the value for `length`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_length(mut self, length: impl Into<Input<i64>>) -> Self {
        self.length = Some(length.into());
        self
    }
}

impl ResourceArgs for RandomArgs {
    fn into_inputs(self) -> Result<PropertyInputs, Error> {
        let mut inputs = PropertyInputs::new("RandomArgs");
        inputs.require("length", self.length)?;
        Ok(inputs)
    }
}
