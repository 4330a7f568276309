//! Asynchronously resolved, single-assignment values.
//!
//! Every property of a resource is exposed as an [`Output`]. An output starts unresolved and is
//! resolved exactly once, when the deployment engine reports the result of the operation that
//! produces it. Outputs are cheap to clone and every clone observes the same value.
//!
//! Arguments to resources are [`Input`]s, which are either plain values or the outputs of other
//! resources. This is how dependencies between resources are expressed:
//!
//! ```no_run
//! # use awstags::{aws::{ResourceTag, ResourceTagArgs, TagArgs}, Deployment, Error};
//! # fn example(ctx: &Deployment, other: &ResourceTag) -> Result<(), Error> {
//! // Tag the same resource as `other`, once `other` has been registered.
//! let args = ResourceTagArgs::default()
//!     .set_resource_arn(&other.resource_arn)
//!     .set_tag(TagArgs::new("team", "platform"));
//! let tag = ResourceTag::new(ctx, "team-tag", args, None)?;
//! # Ok(())
//! # }
//! ```

use std::{fmt, future::IntoFuture};

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;

use crate::OutputError;

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, OutputError>>>;

/// An asynchronously resolved property value.
///
/// Await an output with [`get`](Self::get) (or by awaiting the output itself). Use
/// [`apply`](Self::apply) to derive new outputs without waiting.
pub struct Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: SharedResult<T>,
}

impl<T> Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Construct an unresolved output, and the resolver that will resolve it.
    #[must_use]
    pub fn pending() -> (OutputResolver<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        let inner = receiver
            .map(|result| result.unwrap_or(Err(OutputError::Dropped)))
            .boxed()
            .shared();
        (OutputResolver { sender }, Self { inner })
    }

    /// Construct an output that is already resolved to `value`.
    pub fn known(value: T) -> Self {
        Self::settled(Ok(value))
    }

    /// Construct an output that is already resolved to `error`.
    #[must_use]
    pub fn failed(error: OutputError) -> Self {
        Self::settled(Err(error))
    }

    fn settled(result: Result<T, OutputError>) -> Self {
        Self {
            inner: future::ready(result).boxed().shared(),
        }
    }

    /// Wait for the output to resolve.
    ///
    /// # Errors
    ///
    /// Returns the [`OutputError`] the output was resolved with.
    pub async fn get(&self) -> Result<T, OutputError> {
        self.inner.clone().await
    }

    /// The resolved result, if the output has already been resolved.
    #[must_use]
    pub fn try_get(&self) -> Option<Result<T, OutputError>> {
        self.inner.clone().now_or_never()
    }

    /// Whether or not the output has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.try_get().is_some()
    }

    /// Derive a new output by transforming this output's value.
    ///
    /// Errors are propagated to the derived output unchanged.
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let inner = self.inner.clone();
        Output {
            inner: async move { inner.await.map(f) }.boxed().shared(),
        }
    }

    /// Derive a new output with a fallible transformation.
    pub fn try_apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Result<U, OutputError> + Send + 'static,
    {
        let inner = self.inner.clone();
        Output {
            inner: async move { inner.await.and_then(f) }.boxed().shared(),
        }
    }

    /// Derive a new output from another output produced from this output's value.
    pub fn and_then<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Output<U> + Send + 'static,
    {
        let inner = self.inner.clone();
        Output {
            inner: async move {
                let next = f(inner.await?);
                next.get().await
            }
            .boxed()
            .shared(),
        }
    }

    /// Combine a collection of outputs into an output of all their values.
    ///
    /// The combined output fails with the first error among `outputs`.
    pub fn all(outputs: impl IntoIterator<Item = Self>) -> Output<Vec<T>> {
        let inners: Vec<_> = outputs.into_iter().map(|output| output.inner).collect();
        Output {
            inner: future::try_join_all(inners).boxed().shared(),
        }
    }
}

impl<T> Clone for Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Output<T>
where
    T: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_get() {
            Some(result) => f.debug_tuple("Output").field(&result).finish(),
            None => f.write_str("Output(<unresolved>)"),
        }
    }
}

impl<T> IntoFuture for Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = Result<T, OutputError>;
    type IntoFuture = SharedResult<T>;

    fn into_future(self) -> Self::IntoFuture {
        self.inner
    }
}

/// The write end of an unresolved [`Output`].
///
/// Resolving consumes the resolver, so an output can only ever be assigned once. If the resolver
/// is dropped without being used, the output resolves to [`OutputError::Dropped`].
#[derive(Debug)]
pub struct OutputResolver<T> {
    sender: oneshot::Sender<Result<T, OutputError>>,
}

impl<T> OutputResolver<T> {
    /// Resolve the output to `value`.
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Resolve the output to `error`.
    pub fn reject(self, error: OutputError) {
        self.settle(Err(error));
    }

    /// Resolve the output to `result`.
    pub fn settle(self, result: Result<T, OutputError>) {
        // Nobody is listening if every clone of the output has been dropped.
        let _ = self.sender.send(result);
    }
}

/// A resource argument: either a plain value or the output of another resource.
#[derive(Clone, Debug)]
pub enum Input<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A value known when the resource is declared.
    Value(T),

    /// A value that will be known once another resource has been registered.
    Output(Output<T>),
}

impl<T> Input<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wait for the input's value.
    ///
    /// # Errors
    ///
    /// Returns the [`OutputError`] of the underlying output, if any.
    pub async fn resolve(self) -> Result<T, OutputError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Output(output) => output.get().await,
        }
    }

    /// Convert the input into an output.
    pub fn into_output(self) -> Output<T> {
        match self {
            Self::Value(value) => Output::known(value),
            Self::Output(output) => output,
        }
    }
}

impl<T> From<Output<T>> for Input<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(output: Output<T>) -> Self {
        Self::Output(output)
    }
}

impl<T> From<&Output<T>> for Input<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(output: &Output<T>) -> Self {
        Self::Output(output.clone())
    }
}

impl From<String> for Input<String> {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Input<String> {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<&String> for Input<String> {
    fn from(value: &String) -> Self {
        Self::Value(value.clone())
    }
}

impl From<i64> for Input<i64> {
    fn from(value: i64) -> Self {
        Self::Value(value)
    }
}

impl From<i32> for Input<i64> {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<bool> for Input<bool> {
    fn from(value: bool) -> Self {
        Self::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_once_for_every_clone() {
        let (resolver, output) = Output::pending();
        let clone = output.clone();
        assert!(!output.is_resolved());

        resolver.resolve("hello".to_string());

        assert_eq!(output.get().await, Ok("hello".to_string()));
        assert_eq!(clone.await, Ok("hello".to_string()));
    }

    #[tokio::test]
    async fn dropped_resolver_fails_the_output() {
        let (resolver, output) = Output::<i64>::pending();
        drop(resolver);
        assert_eq!(output.get().await, Err(OutputError::Dropped));
    }

    #[tokio::test]
    async fn apply_propagates_errors() {
        let failed = Output::<i64>::failed(OutputError::Unknown);
        assert_eq!(failed.apply(|n| n * 2).get().await, Err(OutputError::Unknown));

        let known = Output::known(21_i64);
        assert_eq!(known.apply(|n| n * 2).get().await, Ok(42));
    }

    #[tokio::test]
    async fn and_then_flattens() {
        let (resolver, inner) = Output::pending();
        let outer = Output::known(1_i64).and_then(move |_| inner);
        resolver.resolve("late".to_string());
        assert_eq!(outer.get().await, Ok("late".to_string()));
    }

    #[tokio::test]
    async fn all_collects_in_order() {
        let (resolver, pending) = Output::pending();
        let combined = Output::all(vec![Output::known(1_i64), pending, Output::known(3)]);
        assert!(combined.try_get().is_none());

        resolver.resolve(2);
        assert_eq!(combined.get().await, Ok(vec![1, 2, 3]));
    }

    #[test]
    fn try_get_peeks_known_values() {
        assert_eq!(Output::known(true).try_get(), Some(Ok(true)));
        let (_resolver, output) = Output::<bool>::pending();
        assert_eq!(output.try_get(), None);
    }

    #[tokio::test]
    async fn inputs_resolve_values_and_outputs() {
        let input: Input<String> = "arn:aws:s3:::bucket".into();
        assert_eq!(input.resolve().await, Ok("arn:aws:s3:::bucket".to_string()));

        let input: Input<i64> = Output::known(24_i64).into();
        assert_eq!(input.resolve().await, Ok(24));
    }
}
