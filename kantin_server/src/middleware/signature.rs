//! Notification signature middleware for Actix Web.
//!
//! Midtrans signs every notification with
//! `signature_key = hex(sha512(order_id + status_code + gross_amount + server_key))`, carried in the JSON body itself.
//! Wrap the notification route with this middleware to reject notifications that were not signed with our server key.
//!
//! A valid signature is not taken as proof of payment. The notification handler still asks Midtrans for the
//! transaction status.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorUnauthorized},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use kantin_common::Secret;
use log::{trace, warn};
use midtrans_tools::{helpers::verify_notification_signature, NotificationSignatureFields};

pub struct SignatureMiddlewareFactory {
    server_key: Secret<String>,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl SignatureMiddlewareFactory {
    pub fn new(server_key: Secret<String>, enabled: bool) -> Self {
        SignatureMiddlewareFactory { server_key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService {
            server_key: self.server_key.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct SignatureMiddlewareService<S> {
    server_key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let server_key = self.server_key.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking notification signature");
            if !enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {e:?}");
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let payload = serde_json::from_slice::<serde_json::Value>(data.as_ref()).map_err(|e| {
                warn!("🔐️ Notification body is not JSON. {e}");
                ErrorBadRequest("Notification body is not valid JSON.")
            })?;
            let fields = NotificationSignatureFields::from_payload(&payload).ok_or_else(|| {
                warn!("🔐️ Notification is missing its signature fields. Denying access.");
                ErrorUnauthorized("Notification is not signed.")
            })?;
            if verify_notification_signature(&fields, &server_key) {
                trace!("🔐️ Signature check for notification {} ✅️", fields.order_id);
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid signature on notification for {}. Denying access.", fields.order_id);
                Err(ErrorUnauthorized("Invalid notification signature."))
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
