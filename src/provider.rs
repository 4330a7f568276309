//! The package's explicit provider resource.

use crate::{
    deployment::Registration,
    options::make_resource_options,
    resource::{
        CustomResource, CustomResourceState, OutputSlots, PropertyInputs, Resource, ResourceArgs,
        Urn,
    },
    CustomResourceOptions, Deployment, Error, Output, OutputError,
};

/// The type token of [`Provider`].
pub const PROVIDER_TYPE: &str = "pulumi:providers:awstags";

/// An explicitly configured instance of the `awstags` provider plugin.
///
/// Resources use a default provider unless one is passed via
/// [`CustomResourceOptions::set_provider`].
#[derive(Clone, Debug)]
pub struct Provider {
    state: CustomResourceState,
}

impl Provider {
    /// Create a `Provider` resource with the given unique `name`, arguments, and options.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or already in use.
    pub fn new(
        ctx: &Deployment,
        name: &str,
        args: ProviderArgs,
        options: Option<CustomResourceOptions>,
    ) -> Result<Self, Error> {
        let state = ctx.register(Registration {
            type_token: PROVIDER_TYPE,
            name: name.to_string(),
            custom: true,
            inputs: args.into_inputs()?,
            options: make_resource_options(options, None),
            outputs: OutputSlots::new(),
        })?;
        Ok(Self { state })
    }

    /// A reference to this provider, for use in [`CustomResourceOptions::set_provider`].
    #[must_use]
    pub fn as_reference(&self) -> ProviderReference {
        ProviderReference {
            urn: self.state.urn().clone(),
            id: self.state.id().clone(),
        }
    }
}

impl Resource for Provider {
    fn type_token(&self) -> &'static str {
        PROVIDER_TYPE
    }

    fn urn(&self) -> &Urn {
        self.state.urn()
    }
}

impl CustomResource for Provider {
    fn id(&self) -> &Output<String> {
        self.state.id()
    }
}

/// The arguments used to populate a [`Provider`].
///
/// The provider currently takes no configuration.
#[derive(Clone, Debug, Default)]
pub struct ProviderArgs {}

impl ResourceArgs for ProviderArgs {
    fn into_inputs(self) -> Result<PropertyInputs, Error> {
        Ok(PropertyInputs::new("ProviderArgs"))
    }
}

/// A reference to a provider resource.
#[derive(Clone, Debug)]
pub struct ProviderReference {
    urn: Urn,
    id: Output<String>,
}

impl ProviderReference {
    /// The URN of the provider.
    #[must_use]
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    /// Wait for the provider's ID and render the reference as the engine expects (`urn::id`).
    pub(crate) async fn resolve(self) -> Result<String, OutputError> {
        let id = self.id.get().await?;
        Ok(format!("{}::{}", self.urn, id))
    }
}
