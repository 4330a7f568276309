//! Building blocks shared by the resource proxies.

use std::{fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    engine::{is_unknown, PropertyMap, UNKNOWN_VALUE},
    Error, Input, Output, OutputError, OutputResolver,
};

/// A resource's unique name within the deployment engine.
///
/// URNs have the form `urn:pulumi:<stack>::<project>::<qualified type>::<name>`, where the qualified
/// type is the resource's type token prefixed by the types of its parents, separated by `$`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Urn(String);

impl Urn {
    /// Construct a URN from its parts.
    pub fn new(stack: &str, project: &str, qualified_type: &str, name: &str) -> Self {
        Self(format!(
            "urn:pulumi:{}::{}::{}::{}",
            stack, project, qualified_type, name
        ))
    }

    /// Construct the URN of a resource of type `type_token` whose parent is `parent`.
    #[must_use]
    pub fn child(parent: &Urn, type_token: &str, name: &str) -> Self {
        // Children of the stack itself are not qualified by its type.
        let qualified_type = if parent.type_token() == crate::engine::STACK_TYPE {
            type_token.to_string()
        } else {
            format!("{}${}", parent.qualified_type(), type_token)
        };
        Self::new(parent.stack(), parent.project(), &qualified_type, name)
    }

    /// Parse a URN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrn`] if `urn` is not a well-formed URN.
    pub fn parse(urn: &str) -> Result<Self, Error> {
        lazy_static! {
            static ref URN: Regex =
                Regex::new(r"^urn:pulumi:[^:]+::[^:]+::[^:$]+:[^:$]*:[^:$]+(?:\$[^:$]+:[^:$]*:[^:$]+)*::.+$")
                    .unwrap();
        }

        if URN.is_match(urn) {
            Ok(Self(urn.to_string()))
        } else {
            Err(Error::InvalidUrn {
                urn: urn.to_string(),
            })
        }
    }

    fn part(&self, index: usize) -> &str {
        self.0
            .trim_start_matches("urn:pulumi:")
            .splitn(4, "::")
            .nth(index)
            .unwrap_or_default()
    }

    /// The stack the resource belongs to.
    #[must_use]
    pub fn stack(&self) -> &str {
        self.part(0)
    }

    /// The project the resource belongs to.
    #[must_use]
    pub fn project(&self) -> &str {
        self.part(1)
    }

    /// The resource's type qualified by the types of its parents.
    #[must_use]
    pub fn qualified_type(&self) -> &str {
        self.part(2)
    }

    /// The resource's own type token.
    #[must_use]
    pub fn type_token(&self) -> &str {
        let qualified_type = self.qualified_type();
        qualified_type
            .rsplit('$')
            .next()
            .unwrap_or(qualified_type)
    }

    /// The resource's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.part(3)
    }

    /// The URN as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Urn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A resource declared in a deployment.
pub trait Resource {
    /// The resource's type token.
    fn type_token(&self) -> &'static str;

    /// The resource's URN.
    fn urn(&self) -> &Urn;
}

/// A resource managed by a provider plugin, with a provider-assigned ID.
pub trait CustomResource: Resource {
    /// The provider-assigned ID of the resource.
    fn id(&self) -> &Output<String>;
}

/// The state every custom resource proxy carries.
#[derive(Clone, Debug)]
pub struct CustomResourceState {
    pub(crate) urn: Urn,
    pub(crate) id: Output<String>,
}

impl CustomResourceState {
    /// The resource's URN.
    #[must_use]
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    /// The provider-assigned ID of the resource.
    #[must_use]
    pub fn id(&self) -> &Output<String> {
        &self.id
    }
}

/// A value that can be sent to the engine as a property value.
///
/// Marshalling may have to wait on outputs of other resources, so the result is an [`Output`].
pub trait Marshal: Clone + Send + Sync + 'static {
    /// Convert the value into a property value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredArgument`] if the value is a nested argument type with a
    /// missing required property.
    fn marshal(self) -> Result<Output<Value>, Error>;
}

macro_rules! marshal_via_json {
    ($($ty:ty),*) => {
        $(
            impl Marshal for $ty {
                fn marshal(self) -> Result<Output<Value>, Error> {
                    Ok(Output::known(Value::from(self)))
                }
            }
        )*
    };
}

marshal_via_json!(String, bool, i64, f64);

impl Marshal for Value {
    fn marshal(self) -> Result<Output<Value>, Error> {
        Ok(Output::known(self))
    }
}

impl<T: Marshal> Input<T> {
    pub(crate) fn marshal(self) -> Result<Output<Value>, Error> {
        match self {
            Self::Value(value) => value.marshal(),
            Self::Output(output) => Ok(output.and_then(|value| {
                value.marshal().unwrap_or_else(|error| {
                    Output::failed(OutputError::Invalid {
                        message: error.to_string(),
                    })
                })
            })),
        }
    }
}

/// An argument bag for a resource.
pub trait ResourceArgs {
    /// Convert the arguments into input properties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredArgument`] for the first required property that is not set.
    fn into_inputs(self) -> Result<PropertyInputs, Error>;
}

/// Input properties on their way to the engine.
#[derive(Debug)]
pub struct PropertyInputs {
    args_type: &'static str,
    entries: Vec<(&'static str, Output<Value>)>,
}

impl PropertyInputs {
    /// Start collecting the properties of `args_type`.
    #[must_use]
    pub fn new(args_type: &'static str) -> Self {
        Self {
            args_type,
            entries: Vec::new(),
        }
    }

    /// Add the required property `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredArgument`] if `input` is `None`, or if it is a nested
    /// argument type with a missing required property.
    pub fn require<T: Marshal>(
        &mut self,
        name: &'static str,
        input: Option<Input<T>>,
    ) -> Result<&mut Self, Error> {
        let input = input.ok_or(Error::MissingRequiredArgument {
            args_type: self.args_type,
            property: name,
        })?;
        self.entries.push((name, input.marshal()?));
        Ok(self)
    }

    /// Add the optional property `name`, if set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredArgument`] if `input` is a nested argument type with a
    /// missing required property.
    pub fn optional<T: Marshal>(
        &mut self,
        name: &'static str,
        input: Option<Input<T>>,
    ) -> Result<&mut Self, Error> {
        if let Some(input) = input {
            self.entries.push((name, input.marshal()?));
        }
        Ok(self)
    }

    /// Whether no properties have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combine the properties into a single object value.
    pub(crate) fn into_output(self) -> Output<Value> {
        let (names, outputs): (Vec<_>, Vec<_>) = self.entries.into_iter().unzip();
        Output::all(outputs).apply(move |values| {
            Value::Object(
                names
                    .into_iter()
                    .map(String::from)
                    .zip(values)
                    .collect(),
            )
        })
    }

    /// Wait for every property to be known.
    ///
    /// During a preview, properties that are unknown are sent as the unknown sentinel so the
    /// engine can still plan the operation.
    pub(crate) async fn resolve(self, preview: bool) -> Result<PropertyMap, OutputError> {
        let mut properties = PropertyMap::new();
        for (name, output) in self.entries {
            let value = match output.get().await {
                Ok(value) => value,
                Err(OutputError::Unknown) if preview => Value::from(UNKNOWN_VALUE),
                Err(error) => return Err(error),
            };
            properties.insert(name.to_string(), value);
        }
        Ok(properties)
    }
}

type Settle = Box<dyn FnOnce(&Result<PropertyMap, OutputError>) + Send>;

/// Typed output properties waiting for the engine's response.
#[derive(Default)]
pub struct OutputSlots {
    slots: Vec<Settle>,
}

impl OutputSlots {
    /// Construct an empty set of slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An output for the property `name`, which the engine must return.
    pub fn required<T>(&mut self, name: &'static str) -> Output<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let (resolver, output) = Output::pending();
        self.push(resolver, move |properties| match properties.get(name) {
            None | Some(Value::Null) => Err(OutputError::Missing {
                property: name.to_string(),
            }),
            Some(value) => decode(name, value),
        });
        output
    }

    /// An output for the property `name`, which the engine may omit.
    pub fn optional<T>(&mut self, name: &'static str) -> Output<Option<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let (resolver, output) = Output::pending();
        self.push(resolver, move |properties| match properties.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(name, value).map(Some),
        });
        output
    }

    fn push<T, F>(&mut self, resolver: OutputResolver<T>, extract: F)
    where
        T: Send + 'static,
        F: FnOnce(&PropertyMap) -> Result<T, OutputError> + Send + 'static,
    {
        self.slots.push(Box::new(move |result| {
            resolver.settle(match result {
                Ok(properties) => extract(properties),
                Err(error) => Err(error.clone()),
            });
        }));
    }

    /// Resolve every slot from the engine's response.
    pub(crate) fn settle(self, result: &Result<PropertyMap, OutputError>) {
        for slot in self.slots {
            slot(result);
        }
    }
}

impl fmt::Debug for OutputSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSlots")
            .field("len", &self.slots.len())
            .finish()
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, OutputError> {
    if is_unknown(value) {
        return Err(OutputError::Unknown);
    }
    serde_json::from_value(value.clone()).map_err(|error| OutputError::Decode {
        property: name.to_string(),
        message: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn urn_parts() {
        let urn = Urn::new("dev", "tags", "awstags:aws:ResourceTag", "bucket-owner");
        assert_eq!(
            urn.as_str(),
            "urn:pulumi:dev::tags::awstags:aws:ResourceTag::bucket-owner"
        );
        assert_eq!(urn.stack(), "dev");
        assert_eq!(urn.project(), "tags");
        assert_eq!(urn.type_token(), "awstags:aws:ResourceTag");
        assert_eq!(urn.name(), "bucket-owner");
        assert_eq!(Urn::parse(urn.as_str()).unwrap(), urn);
    }

    #[test]
    fn child_urns_are_qualified_by_parent_type() {
        let stack = Urn::new("dev", "tags", "pulumi:pulumi:Stack", "tags-dev");
        let provider = Urn::child(&stack, "pulumi:providers:awstags", "default");
        assert_eq!(provider.qualified_type(), "pulumi:providers:awstags");

        let child = Urn::child(&provider, "awstags:aws:ResourceTag", "tag");
        assert_eq!(
            child.qualified_type(),
            "pulumi:providers:awstags$awstags:aws:ResourceTag"
        );
        assert_eq!(child.type_token(), "awstags:aws:ResourceTag");
        assert!(Urn::parse(child.as_str()).is_ok());
    }

    #[test]
    fn invalid_urns() {
        assert!(Urn::parse("arn:aws:s3:::bucket").is_err());
        assert!(Urn::parse("urn:pulumi:dev::tags::NotAType::name").is_err());
        assert!("urn:pulumi:dev::tags::awstags:index:Random::".parse::<Urn>().is_err());
    }

    #[tokio::test]
    async fn required_property_is_reported() {
        let mut inputs = PropertyInputs::new("RandomArgs");
        let error = inputs.require::<i64>("length", None).unwrap_err();
        assert!(matches!(
            error,
            Error::MissingRequiredArgument {
                args_type: "RandomArgs",
                property: "length"
            }
        ));
    }

    #[tokio::test]
    async fn inputs_resolve_outputs() {
        let (resolver, arn) = Output::pending();
        let mut inputs = PropertyInputs::new("ResourceTagArgs");
        inputs
            .require("resourceARN", Some(Input::Output(arn)))
            .unwrap()
            .optional::<String>("ignored", None)
            .unwrap();
        resolver.resolve("arn:aws:sqs:eu-west-2:123456789012:queue".to_string());

        let properties = inputs.resolve(false).await.unwrap();
        assert_eq!(
            Value::Object(properties),
            json!({ "resourceARN": "arn:aws:sqs:eu-west-2:123456789012:queue" })
        );
    }

    #[tokio::test]
    async fn unknown_inputs_during_preview() {
        let mut inputs = PropertyInputs::new("RandomArgs");
        inputs
            .require("length", Some(Input::Output(Output::<i64>::failed(OutputError::Unknown))))
            .unwrap();
        let properties = inputs.resolve(true).await.unwrap();
        assert_eq!(properties["length"], json!(UNKNOWN_VALUE));

        let mut inputs = PropertyInputs::new("RandomArgs");
        inputs
            .require("length", Some(Input::Output(Output::<i64>::failed(OutputError::Unknown))))
            .unwrap();
        assert_eq!(inputs.resolve(false).await, Err(OutputError::Unknown));
    }

    #[tokio::test]
    async fn slots_decode_properties() {
        let mut slots = OutputSlots::new();
        let result: Output<String> = slots.required("result");
        let length: Output<i64> = slots.required("length");
        let missing: Output<String> = slots.required("missing");
        let optional: Output<Option<String>> = slots.optional("missing");
        let unknown: Output<String> = slots.required("unknown");

        let properties = json!({
            "result": "abc",
            "length": "not a number",
            "unknown": UNKNOWN_VALUE,
        });
        let properties = properties.as_object().cloned().unwrap();
        slots.settle(&Ok(properties));

        assert_eq!(result.get().await, Ok("abc".to_string()));
        assert!(matches!(length.get().await, Err(OutputError::Decode { .. })));
        assert_eq!(
            missing.get().await,
            Err(OutputError::Missing {
                property: "missing".to_string()
            })
        );
        assert_eq!(optional.get().await, Ok(None));
        assert_eq!(unknown.get().await, Err(OutputError::Unknown));
    }

    #[tokio::test]
    async fn slots_share_failures() {
        let mut slots = OutputSlots::new();
        let first: Output<String> = slots.required("first");
        let second: Output<Option<i64>> = slots.optional("second");
        let error = OutputError::Engine(crate::EngineError::new("boom"));
        slots.settle(&Err(error.clone()));

        assert_eq!(first.get().await, Err(error.clone()));
        assert_eq!(second.get().await, Err(error));
    }
}
