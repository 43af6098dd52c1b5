//! Handler traits implemented for plain functions and closures.
//!
//! Parameters are produced in declaration order; the first failure aborts the
//! call before the function body runs.

use futures_util::future::BoxFuture;
use std::future::Future;

use super::params::{CallContext, FromContainer};
use crate::errors::Result;

/// A synchronous function whose parameters are all [`FromContainer`]
pub trait Handler<Args>: Send + Sync + 'static {
    type Output;

    fn invoke(&self, ctx: &mut CallContext) -> Result<Self::Output>;
}

/// An async function whose parameters are all [`FromContainer`]
pub trait AsyncHandler<Args>: Send + Sync + 'static {
    type Output: Send;

    fn invoke(&self, ctx: CallContext) -> BoxFuture<'_, Result<Self::Output>>;
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<F, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            $($ty: FromContainer,)*
        {
            type Output = R;

            fn invoke(&self, ctx: &mut CallContext) -> Result<R> {
                $(let $ty = $ty::from_container(ctx)?;)*
                Ok(self($($ty),*))
            }
        }

        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<F, Fut, $($ty,)*> AsyncHandler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future + Send + 'static,
            Fut::Output: Send,
            $($ty: FromContainer,)*
        {
            type Output = Fut::Output;

            fn invoke(&self, mut ctx: CallContext) -> BoxFuture<'_, Result<Self::Output>> {
                Box::pin(async move {
                    $(let $ty = $ty::from_container_async(&mut ctx).await?;)*
                    Ok(self($($ty),*).await)
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);
impl_handler!(A1, A2, A3, A4, A5);
impl_handler!(A1, A2, A3, A4, A5, A6);
impl_handler!(A1, A2, A3, A4, A5, A6, A7);
impl_handler!(A1, A2, A3, A4, A5, A6, A7, A8);
