use std::future::Future;

use crate::branch::{Input, Output};
use crate::error::{Error, Result};

/// Invokes a lazily resolved function with a resolved input binding,
/// assigning its result through the output binding.
///
/// `loader` is any future producing the function on demand, `None`
/// meaning resolution succeeded but no function was there to call.
/// Input props are awaited before the function runs, so a `call` can
/// be dispatched before its arguments exist.
pub async fn call<L, F, Fut, I, T, O>(loader: L, input: I, output: O) -> Result<()>
where
    L: Future<Output = Option<F>>,
    F: FnOnce(I::Resolved) -> Fut,
    Fut: Future<Output = Result<T>>,
    I: Input,
    T: Send + 'static,
    O: Output<T>,
{
    let f = loader.await.ok_or(Error::UndefinedValue("call"))?;
    let resolved = input.resolve().await;
    let value = f(resolved).await?;
    output.bind(value)
}

/// Awaits a value and extracts one field from it; an absent field is
/// an error rather than a silent `None`.
pub async fn pick<Fut, T, V, F>(fut: Fut, extract: F) -> Result<V>
where
    Fut: Future<Output = T>,
    F: FnOnce(T) -> Option<V>,
{
    extract(fut.await).ok_or(Error::UndefinedValue("pick"))
}
