//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Typed service interfaces.
//!
//! A [`ServiceInterface`] pairs an [`InterfaceDescriptor`] with one invoker
//! per method. Invokers take the positional argument list in the neutral
//! [`serde_json::Value`] model, decode it into the method's argument tuple,
//! and call the user's closure with the bound instance.

use crate::converter::ConversionError;
use crate::error::RpcError;
use crate::service::descriptor::{InterfaceDescriptor, MethodDescriptor, ReturnKind};
use crate::service::error::ServiceError;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, Stream, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// The outcome of a successful invocation.
pub enum Reply {
    /// The method completed without a value.
    Unit,
    /// The method produced one value.
    Single(Value),
    /// The method produces a stream of values.
    Stream(BoxStream<'static, Result<Value, ServiceError>>),
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("Unit"),
            Self::Single(value) => f.debug_tuple("Single").field(value).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A pending invocation.
pub type ReplyFuture = BoxFuture<'static, Result<Reply, ServiceError>>;

type Invoker<S> =
    Arc<dyn Fn(Arc<S>, Vec<Value>) -> Result<ReplyFuture, ConversionError> + Send + Sync>;

/// Decodes a positional argument list into an argument tuple.
///
/// An empty list decodes as `()`.
pub fn from_arguments<A: DeserializeOwned>(method: &str, args: Vec<Value>) -> Result<A, ConversionError> {
    let value = if args.is_empty() {
        Value::Null
    } else {
        Value::Array(args)
    };
    serde_json::from_value(value).map_err(|e| ConversionError::Argument {
        method: method.to_string(),
        message: e.to_string(),
    })
}

/// Encodes an argument tuple into a positional argument list.
///
/// `()` encodes as an empty list and a non-tuple value as a one-element list.
pub fn to_arguments<A: Serialize>(method: &str, args: &A) -> Result<Vec<Value>, ConversionError> {
    let value = serde_json::to_value(args).map_err(|e| ConversionError::Argument {
        method: method.to_string(),
        message: e.to_string(),
    })?;
    Ok(match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    })
}

/// A published interface bound to an implementation type `S`.
///
/// Argument types are tuples: `()` for no parameters, `(T,)` for one,
/// `(T, U)` for two and so on.
///
/// # Examples
///
/// ```rust
/// use crirpc::service::{ReturnKind, ServiceInterface};
///
/// struct Calculator;
///
/// let interface = ServiceInterface::<Calculator>::builder("demo.Calculator")
///     .single("add", &["a", "b"], |_calc, (a, b): (i64, i64)| async move { Ok(a + b) })
///     .unit("reset", &[], |_calc, (): ()| async { Ok(()) })
///     .build();
///
/// let add = interface.descriptor().method("add").unwrap();
/// assert_eq!(add.returns(), ReturnKind::Single);
/// assert_eq!(add.arity(), 2);
/// ```
pub struct ServiceInterface<S> {
    descriptor: Arc<InterfaceDescriptor>,
    invokers: HashMap<String, Invoker<S>>,
}

impl<S: Send + Sync + 'static> ServiceInterface<S> {
    /// Starts building an interface called `name`.
    pub fn builder(name: impl Into<String>) -> ServiceInterfaceBuilder<S> {
        ServiceInterfaceBuilder {
            descriptor: InterfaceDescriptor::new(name),
            invokers: HashMap::new(),
        }
    }

    /// The method table.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<InterfaceDescriptor> {
        &self.descriptor
    }

    /// Starts an invocation of `method` on `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::MissingMethod`] if the method is not declared and
    /// [`RpcError::Conversion`] if the arguments do not decode.
    pub fn invoke(&self, instance: Arc<S>, method: &str, args: Vec<Value>) -> Result<ReplyFuture, RpcError> {
        let invoker = self
            .invokers
            .get(method)
            .ok_or_else(|| RpcError::missing_method(self.descriptor.name(), method))?;
        Ok(invoker(instance, args)?)
    }
}

impl<S> fmt::Debug for ServiceInterface<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInterface")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ServiceInterface`].
pub struct ServiceInterfaceBuilder<S> {
    descriptor: InterfaceDescriptor,
    invokers: HashMap<String, Invoker<S>>,
}

impl<S: Send + Sync + 'static> ServiceInterfaceBuilder<S> {
    /// Adds a method that completes without a value.
    #[must_use]
    pub fn unit<A, F, Fut>(self, name: &str, params: &[&str], f: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        F: Fn(Arc<S>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
    {
        let method = name.to_string();
        let invoker: Invoker<S> = Arc::new(move |instance: Arc<S>, args: Vec<Value>| -> Result<ReplyFuture, ConversionError> {
            let args = from_arguments::<A>(&method, args)?;
            let call = f(instance, args);
            Ok(async move {
                call.await?;
                Ok::<_, ServiceError>(Reply::Unit)
            }
            .boxed())
        });
        self.insert::<A>(name, params, ReturnKind::Unit, invoker)
    }

    /// Adds a method that produces one value.
    #[must_use]
    pub fn single<A, R, F, Fut>(self, name: &str, params: &[&str], f: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Arc<S>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
    {
        let method = name.to_string();
        let invoker: Invoker<S> = Arc::new(move |instance: Arc<S>, args: Vec<Value>| -> Result<ReplyFuture, ConversionError> {
            let args = from_arguments::<A>(&method, args)?;
            let call = f(instance, args);
            Ok(async move {
                let value = call.await?;
                Ok::<_, ServiceError>(Reply::Single(serde_json::to_value(value)?))
            }
            .boxed())
        });
        self.insert::<A>(name, params, ReturnKind::Single, invoker)
    }

    /// Adds a method that produces a stream of values.
    #[must_use]
    pub fn stream<A, R, F, St>(self, name: &str, params: &[&str], f: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Arc<S>, A) -> St + Send + Sync + 'static,
        St: Stream<Item = Result<R, ServiceError>> + Send + 'static,
    {
        let method = name.to_string();
        let invoker: Invoker<S> = Arc::new(move |instance: Arc<S>, args: Vec<Value>| -> Result<ReplyFuture, ConversionError> {
            let args = from_arguments::<A>(&method, args)?;
            let items = f(instance, args)
                .map(|item| item.and_then(|value| serde_json::to_value(value).map_err(ServiceError::from)))
                .boxed();
            Ok(async move { Ok::<_, ServiceError>(Reply::Stream(items)) }.boxed())
        });
        self.insert::<A>(name, params, ReturnKind::Multi, invoker)
    }

    /// Finishes the interface.
    #[must_use]
    pub fn build(self) -> ServiceInterface<S> {
        ServiceInterface {
            descriptor: Arc::new(self.descriptor),
            invokers: self.invokers,
        }
    }

    fn insert<A>(mut self, name: &str, params: &[&str], returns: ReturnKind, invoker: Invoker<S>) -> Self {
        let signature = std::any::type_name::<A>();
        self.descriptor
            .insert(MethodDescriptor::new(name, params, signature, returns));
        self.invokers.insert(name.to_string(), invoker);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Counter {
        base: i64,
    }

    fn interface() -> ServiceInterface<Counter> {
        ServiceInterface::<Counter>::builder("test.Counter")
            .single("add", &["n"], |c: Arc<Counter>, (n,): (i64,)| async move {
                Ok(c.base + n)
            })
            .unit("noop", &[], |_c, (): ()| async { Ok(()) })
            .stream("count", &["to"], |_c, (to,): (u32,)| {
                futures_util::stream::iter((0..to).map(Ok::<_, ServiceError>))
            })
            .single("fail", &[], |_c, (): ()| async {
                Err::<i64, _>(ServiceError::with_class("Boom", "failed"))
            })
            .build()
    }

    #[test]
    fn test_argument_helpers() {
        assert_eq!(to_arguments("m", &()).unwrap(), Vec::<Value>::new());
        assert_eq!(to_arguments("m", &(1, "x")).unwrap(), vec![json!(1), json!("x")]);
        assert_eq!(to_arguments("m", &(true,)).unwrap(), vec![json!(true)]);

        let (a, b): (i32, String) = from_arguments("m", vec![json!(1), json!("x")]).unwrap();
        assert_eq!((a, b.as_str()), (1, "x"));
        let () = from_arguments("m", Vec::new()).unwrap();

        let error = from_arguments::<(i32,)>("m", vec![json!("nope")]).unwrap_err();
        assert!(matches!(error, ConversionError::Argument { .. }));
    }

    #[test]
    fn test_descriptor_table() {
        let interface = interface();
        let descriptor = interface.descriptor();
        assert_eq!(descriptor.name(), "test.Counter");
        assert_eq!(descriptor.method("add").unwrap().returns(), ReturnKind::Single);
        assert_eq!(descriptor.method("noop").unwrap().returns(), ReturnKind::Unit);
        assert_eq!(descriptor.method("count").unwrap().returns(), ReturnKind::Multi);
        assert!(descriptor.method("add").unwrap().signature().contains("i64"));
    }

    #[tokio::test]
    async fn test_invoke_single_and_unit() {
        let interface = interface();
        let instance = Arc::new(Counter { base: 10 });

        let reply = interface
            .invoke(instance.clone(), "add", vec![json!(5)])
            .unwrap()
            .await
            .unwrap();
        assert!(matches!(reply, Reply::Single(v) if v == json!(15)));

        let reply = interface.invoke(instance, "noop", vec![]).unwrap().await.unwrap();
        assert!(matches!(reply, Reply::Unit));
    }

    #[tokio::test]
    async fn test_invoke_stream() {
        let interface = interface();
        let reply = interface
            .invoke(Arc::new(Counter { base: 0 }), "count", vec![json!(3)])
            .unwrap()
            .await
            .unwrap();
        let Reply::Stream(items) = reply else {
            panic!("expected a stream");
        };
        let items: Vec<Value> = items.map(|item| item.unwrap()).collect().await;
        assert_eq!(items, vec![json!(0), json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_invoke_errors() {
        let interface = interface();
        let instance = Arc::new(Counter { base: 0 });

        let missing = interface.invoke(instance.clone(), "baz", vec![]).err().unwrap();
        assert_eq!(missing.class_name(), "RpcMissingMethodException");

        let bad_args = interface.invoke(instance.clone(), "add", vec![json!("x")]).err().unwrap();
        assert!(matches!(bad_args, RpcError::Conversion(_)));

        let failed = interface.invoke(instance, "fail", vec![]).unwrap().await.unwrap_err();
        assert_eq!(failed.class_name(), "Boom");
    }
}
