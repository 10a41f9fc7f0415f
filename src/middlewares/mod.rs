use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    Error, HttpMessage, HttpRequest,
};
use futures_util::{future::LocalBoxFuture, FutureExt};
use std::sync::Arc;

use crate::{api::error, utils::Claims};

/// Bearer guard: decodes the JWT from `Authorization` and stores its [`Claims`]
/// in the request extensions.
pub fn authentication<B>(
    secret: Arc<str>,
) -> impl Fn(ServiceRequest, Next<B>) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>
where
    B: MessageBody + 'static,
{
    move |req: ServiceRequest, next: Next<B>| {
        let secret = secret.clone();
        async move {
            let auth = req.headers().get(header::AUTHORIZATION).and_then(|h| h.to_str().ok());
            let token = match auth.and_then(|h| h.strip_prefix("Bearer ")) {
                Some(t) => t,
                None => {
                    return Err(error::Error::unauthorized("Token Invalid or Expired").into());
                }
            };

            let claims = match Claims::decode(token, secret.as_bytes()) {
                Ok(claims) => claims,
                Err(_) => return Err(error::Error::forbidden("Token Invalid or Expired").into()),
            };

            req.extensions_mut().insert(claims);

            next.call(req).await
        }
        .boxed_local()
    }
}

pub fn get_extensions<T>(req: &HttpRequest) -> Result<T, error::Error>
where
    T: Clone + 'static,
{
    let extensions = req.extensions();

    let value =
        extensions.get::<T>().ok_or_else(|| error::Error::unauthorized("Unauthorized"))?.clone();

    Ok(value)
}
