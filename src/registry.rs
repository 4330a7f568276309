//! Type tokens and the resource types this package provides.

use std::{fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde_plain::forward_display_to_serde;

use crate::{
    aws::{ResourceTag, RESOURCE_TAG_TYPE},
    provider::PROVIDER_TYPE,
    random::{Random, RANDOM_TYPE},
    resource::{Resource, Urn},
    CustomResourceOptions, Deployment, Error, Input,
};

/// A parsed type token of the form `<package>:<module>:<name>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Token<'a> {
    /// The package that provides the type.
    pub package: &'a str,

    /// The module within the package.
    pub module: &'a str,

    /// The name of the type.
    pub name: &'a str,
}

impl<'a> Token<'a> {
    /// Parse a type token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResourceType`] if `token` is not well-formed.
    pub fn parse(token: &'a str) -> Result<Self, Error> {
        lazy_static! {
            static ref TOKEN: Regex = Regex::new(
                r"^(?P<package>[A-Za-z][A-Za-z0-9_-]*):(?P<module>[A-Za-z0-9_./-]*):(?P<name>[A-Za-z_][A-Za-z0-9_]*)$"
            )
            .unwrap();
        }

        let captures = TOKEN.captures(token).ok_or_else(|| Error::UnknownResourceType {
            type_token: token.to_string(),
        })?;
        let part = |name: &str| -> &'a str { captures.name(name).map_or("", |m| m.as_str()) };
        Ok(Self {
            package: part("package"),
            module: part("module"),
            name: part("name"),
        })
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.package, self.module, self.name)
    }
}

/// The kinds of resource this package provides.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ResourceKind {
    /// [`ResourceTag`].
    #[serde(rename = "awstags:aws:ResourceTag")]
    ResourceTag,

    /// [`Random`].
    #[serde(rename = "awstags:index:Random")]
    Random,

    /// [`Provider`](crate::Provider).
    #[serde(rename = "pulumi:providers:awstags")]
    Provider,
}

forward_display_to_serde!(ResourceKind);

impl ResourceKind {
    /// Every resource kind.
    pub const ALL: [Self; 3] = [Self::ResourceTag, Self::Random, Self::Provider];

    /// The kind's type token.
    #[must_use]
    pub fn type_token(self) -> &'static str {
        match self {
            Self::ResourceTag => RESOURCE_TAG_TYPE,
            Self::Random => RANDOM_TYPE,
            Self::Provider => PROVIDER_TYPE,
        }
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_plain::from_str(s).map_err(|_| Error::UnknownResourceType {
            type_token: s.to_string(),
        })
    }
}

/// A resource proxy of any kind this package provides.
#[derive(Clone, Debug)]
pub enum AnyResource {
    /// A [`ResourceTag`].
    ResourceTag(ResourceTag),

    /// A [`Random`].
    Random(Random),
}

impl AnyResource {
    /// The resource as a [`Resource`].
    #[must_use]
    pub fn as_resource(&self) -> &dyn Resource {
        match self {
            Self::ResourceTag(resource) => resource,
            Self::Random(resource) => resource,
        }
    }
}

/// Construct a proxy for an existing resource of the given `kind`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedLookup`] for provider resources, and the lookup's own errors
/// otherwise.
pub fn construct(
    ctx: &Deployment,
    kind: ResourceKind,
    name: &str,
    id: impl Into<Input<String>>,
    options: Option<CustomResourceOptions>,
) -> Result<AnyResource, Error> {
    match kind {
        ResourceKind::ResourceTag => {
            ResourceTag::get(ctx, name, id, options).map(AnyResource::ResourceTag)
        }
        ResourceKind::Random => Random::get(ctx, name, id, options).map(AnyResource::Random),
        ResourceKind::Provider => Err(Error::UnsupportedLookup {
            type_token: PROVIDER_TYPE,
        }),
    }
}

/// Construct a proxy for the existing resource identified by `urn` and `id`.
///
/// The resource's kind and name are taken from the URN.
///
/// # Errors
///
/// Returns [`Error::UnknownResourceType`] if the URN's type is not provided by this package, as
/// well as the errors of [`construct`].
pub fn construct_from_urn(
    ctx: &Deployment,
    urn: &Urn,
    id: impl Into<Input<String>>,
) -> Result<AnyResource, Error> {
    let kind = urn.type_token().parse()?;
    construct(ctx, kind, urn.name(), id, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tokens() {
        let token = Token::parse("awstags:aws:ResourceTag").unwrap();
        assert_eq!(token.package, "awstags");
        assert_eq!(token.module, "aws");
        assert_eq!(token.name, "ResourceTag");
        assert_eq!(token.to_string(), "awstags:aws:ResourceTag");

        assert!(Token::parse("awstags:ResourceTag").is_err());
        assert!(Token::parse("awstags:aws:Resource:Tag").is_err());
    }

    #[test]
    fn kinds_round_trip_through_tokens() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.to_string(), kind.type_token());
            assert_eq!(kind.type_token().parse::<ResourceKind>().unwrap(), kind);
            let token = Token::parse(kind.type_token()).unwrap();
            if kind != ResourceKind::Provider {
                assert_eq!(token.package, crate::plugin::PACKAGE_NAME);
            }
        }
        assert!(matches!(
            "awstags:aws:Unknown".parse::<ResourceKind>(),
            Err(Error::UnknownResourceType { .. })
        ));
    }
}
