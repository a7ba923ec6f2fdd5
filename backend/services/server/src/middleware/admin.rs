use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    Error,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

/// Guards the moderation console routes. Staff requests carry the shared
/// admin key in `X-Admin-Key`; everything else is rejected before the
/// handler runs. Auth provider internals stay outside this codebase.
pub struct AdminMiddleware {
    key: Rc<String>,
}

impl AdminMiddleware {
    pub fn new(key: String) -> Self {
        Self { key: Rc::new(key) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminMiddlewareService {
            service: Rc::new(service),
            key: self.key.clone(),
        }))
    }
}

pub struct AdminMiddlewareService<S> {
    service: Rc<S>,
    key: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for AdminMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let provided = req
            .headers()
            .get("X-Admin-Key")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let authorized = matches!(provided, Some(ref key) if key == self.key.as_ref());
        if !authorized {
            return Box::pin(async { Err(ErrorUnauthorized("Invalid or missing admin key")) });
        }

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res)
        })
    }
}
