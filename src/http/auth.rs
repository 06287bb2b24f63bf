//! Caller identity, as injected by the upstream gateway.
//!
//! The gateway authenticates the session and forwards the resolved user id in
//! the `x-user-id` header. A missing header means the caller never
//! authenticated; a present but unusable header means the session is broken.
//! The two are reported differently so clients can tell "sign in" from
//! "session corrupt".

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::ServiceError;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_user(req))
    }
}

fn extract_user(req: &HttpRequest) -> Result<AuthenticatedUser, ServiceError> {
    let Some(value) = req.headers().get(USER_ID_HEADER) else {
        return Err(ServiceError::Unauthenticated);
    };

    let value = value
        .to_str()
        .map_err(|_| ServiceError::MalformedSession("user id header is not valid text".to_string()))?;

    if value.trim().is_empty() {
        return Err(ServiceError::MalformedSession(
            "user id header is empty".to_string(),
        ));
    }

    let user_id = Uuid::parse_str(value.trim()).map_err(|_| {
        ServiceError::MalformedSession("user id header is not a valid id".to_string())
    })?;

    Ok(AuthenticatedUser(user_id))
}
