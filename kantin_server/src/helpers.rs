use std::{
    future::{ready, Ready},
    str::FromStr,
};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use kantin_engine::db_types::GuestId;
use log::trace;

use crate::errors::ServerError;

pub const GUEST_ID_HEADER: &str = "X-Guest-Id";

/// The guest making the request, taken from the `X-Guest-Id` header.
///
/// Guest identity is resolved upstream of this server. The header is trusted as is.
#[derive(Debug, Clone)]
pub struct Guest(pub GuestId);

impl FromRequest for Guest {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(guest_from_request(req).map(Guest))
    }
}

pub fn guest_from_request(req: &HttpRequest) -> Result<GuestId, ServerError> {
    let value = req.headers().get(GUEST_ID_HEADER).ok_or(ServerError::MissingGuestId)?;
    let value = value.to_str().map_err(|_| ServerError::MissingGuestId)?;
    let guest = GuestId::from_str(value).map_err(|_| ServerError::MissingGuestId)?;
    trace!("💻️ Request from {guest}");
    Ok(guest)
}
