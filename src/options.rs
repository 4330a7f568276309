//! Options that control how the engine manages a resource.

use crate::{
    engine::CustomTimeouts,
    plugin,
    provider::ProviderReference,
    resource::{Resource, Urn},
    Input,
};

/// A bag of options that control a custom resource's behavior.
///
/// Every field is optional. Options are combined with the package defaults (the pinned plugin
/// version and download URL) via [`merge`](Self::merge) before a resource is registered.
///
/// ```
/// use awstags::CustomResourceOptions;
///
/// let options = CustomResourceOptions::default()
///     .set_protect(true)
///     .set_ignore_changes(["tag"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CustomResourceOptions {
    /// The provider-assigned ID of an existing resource to read, rather than create.
    ///
    /// Only lookups read an existing resource; [`make_resource_options`] clears this for creates.
    pub id: Option<Input<String>>,

    /// The version of the provider plugin to use.
    pub version: Option<String>,

    /// Where the engine can download the provider plugin.
    pub plugin_download_url: Option<String>,

    /// The resource's parent.
    pub parent: Option<Urn>,

    /// Resources this resource explicitly depends on, in addition to those implied by its inputs.
    pub depends_on: Vec<Urn>,

    /// Whether the resource is protected from deletion.
    pub protect: Option<bool>,

    /// An explicit provider resource to manage this resource with.
    pub provider: Option<ProviderReference>,

    /// Input properties whose changes should be ignored when diffing.
    pub ignore_changes: Vec<String>,

    /// Whether replacements should delete the old resource before creating the new one.
    pub delete_before_replace: Option<bool>,

    /// Whether the resource should be left in place when it is removed from the program.
    pub retain_on_delete: Option<bool>,

    /// Previous URNs of this resource, to avoid replacing it when it is renamed or reparented.
    pub aliases: Vec<Urn>,

    /// The ID of an existing resource to adopt into the deployment.
    pub import_id: Option<String>,

    /// Timeouts for the engine's operations on this resource.
    pub custom_timeouts: Option<CustomTimeouts>,
}

impl CustomResourceOptions {
    /// Set the value for `id`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_id(mut self, id: impl Into<Input<String>>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the value for `version`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the value for `plugin_download_url`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_plugin_download_url(mut self, plugin_download_url: impl Into<String>) -> Self {
        self.plugin_download_url = Some(plugin_download_url.into());
        self
    }

    /// Set the value for `parent`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_parent(mut self, parent: &impl Resource) -> Self {
        self.parent = Some(parent.urn().clone());
        self
    }

    /// Add `resource` to `depends_on`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn depends_on(mut self, resource: &impl Resource) -> Self {
        push_unique(&mut self.depends_on, resource.urn().clone());
        self
    }

    /// Set the value for `protect`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_protect(mut self, protect: bool) -> Self {
        self.protect = Some(protect);
        self
    }

    /// Set the value for `provider`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_provider(mut self, provider: ProviderReference) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the value for `ignore_changes`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_ignore_changes<I, S>(mut self, ignore_changes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_changes = ignore_changes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the value for `delete_before_replace`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_delete_before_replace(mut self, delete_before_replace: bool) -> Self {
        self.delete_before_replace = Some(delete_before_replace);
        self
    }

    /// Set the value for `retain_on_delete`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_retain_on_delete(mut self, retain_on_delete: bool) -> Self {
        self.retain_on_delete = Some(retain_on_delete);
        self
    }

    /// Add `alias` to `aliases`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn add_alias(mut self, alias: Urn) -> Self {
        push_unique(&mut self.aliases, alias);
        self
    }

    /// Set the value for `import_id`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_import_id(mut self, import_id: impl Into<String>) -> Self {
        self.import_id = Some(import_id.into());
        self
    }

    /// Set the value for `custom_timeouts`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_custom_timeouts(mut self, custom_timeouts: CustomTimeouts) -> Self {
        self.custom_timeouts = Some(custom_timeouts);
        self
    }

    /// Overlay `options` on `defaults`.
    ///
    /// Single-valued options set in `options` replace those in `defaults`. List options are the
    /// entries of `defaults` followed by the entries of `options` not already present.
    #[must_use]
    pub fn merge(defaults: Self, options: Option<Self>) -> Self {
        let options = match options {
            Some(options) => options,
            None => return defaults,
        };

        let mut depends_on = defaults.depends_on;
        for urn in options.depends_on {
            push_unique(&mut depends_on, urn);
        }
        let mut ignore_changes = defaults.ignore_changes;
        for property in options.ignore_changes {
            push_unique(&mut ignore_changes, property);
        }
        let mut aliases = defaults.aliases;
        for urn in options.aliases {
            push_unique(&mut aliases, urn);
        }

        Self {
            id: options.id.or(defaults.id),
            version: options.version.or(defaults.version),
            plugin_download_url: options.plugin_download_url.or(defaults.plugin_download_url),
            parent: options.parent.or(defaults.parent),
            depends_on,
            protect: options.protect.or(defaults.protect),
            provider: options.provider.or(defaults.provider),
            ignore_changes,
            delete_before_replace: options
                .delete_before_replace
                .or(defaults.delete_before_replace),
            retain_on_delete: options.retain_on_delete.or(defaults.retain_on_delete),
            aliases,
            import_id: options.import_id.or(defaults.import_id),
            custom_timeouts: options.custom_timeouts.or(defaults.custom_timeouts),
        }
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// The final options for a resource of this package.
///
/// The package defaults (plugin version and download URL) are overlaid with `options`. The
/// resulting ID is always `id`: a lookup's ID replaces any ID set in `options`, and creates
/// (`id` of `None`, or an empty ID) never carry one.
#[must_use]
pub fn make_resource_options(
    options: Option<CustomResourceOptions>,
    id: Option<Input<String>>,
) -> CustomResourceOptions {
    let defaults = CustomResourceOptions {
        version: Some(plugin::PLUGIN_VERSION.to_string()),
        plugin_download_url: Some(plugin::default_plugin_download_url()),
        ..CustomResourceOptions::default()
    };
    let mut merged = CustomResourceOptions::merge(defaults, options);
    merged.id = id.filter(|id| !matches!(id, Input::Value(id) if id.is_empty()));
    merged
}
