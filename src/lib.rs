//! Rust SDK for the `awstags` resource provider.
//!
//! The provider manages individual tags on AWS resources that are already deployed (or imported).
//! This crate declares those resources in a deployment program: each resource proxy registers
//! itself with the [`Deployment`] it is constructed with, and exposes its properties as
//! [`Output`]s that resolve once the deployment engine has performed the operation.
//!
//! ```no_run
//! use awstags::{
//!     aws::{ResourceTag, ResourceTagArgs, TagArgs},
//!     config::DeploymentSettings,
//!     mocks::{MockEngine, MockResourceArgs},
//!     Deployment,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = MockEngine::from_fn(|args: MockResourceArgs| Ok((args.name, args.inputs)));
//! let outputs = Deployment::run(engine, DeploymentSettings::from_env()?, |ctx| async move {
//!     let tag = ResourceTag::new(
//!         &ctx,
//!         "bucket-owner",
//!         ResourceTagArgs::new("arn:aws:s3:::my-bucket", TagArgs::new("owner", "platform")),
//!         None,
//!     )?;
//!     ctx.export("taggedArn", &tag.resource_arn);
//!     Ok(())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod deployment;
mod error;
mod options;
mod output;
mod provider;
mod random;

pub mod aws;
pub mod config;
pub mod engine;
pub mod logging;
pub mod mocks;
pub mod plugin;
pub mod registry;
pub mod resource;

pub use deployment::{Deployment, DeploymentEvent, Operation, OperationStatus, StackOutputs};
pub use error::{EngineError, Error, OutputError, RegistrationFailure};
pub use options::{make_resource_options, CustomResourceOptions};
pub use output::{Input, Output, OutputResolver};
pub use provider::{Provider, ProviderArgs, ProviderReference, PROVIDER_TYPE};
pub use random::{Random, RandomArgs, RANDOM_TYPE};
