//! Caller identity.
//!
//! Sessions are issued and checked by the gateway in front of this service,
//! which forwards the authenticated user as two headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use domain::{Actor, ActorRole};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Actor);

impl Caller {
    pub fn actor(&self) -> Actor {
        self.0
    }

    /// Returns the caller's id if they are acting as a buyer.
    pub fn buyer_id(&self) -> Result<UserId, ApiError> {
        self.require(ActorRole::Buyer)
    }

    /// Returns the caller's id if they are acting as a seller.
    pub fn seller_id(&self) -> Result<UserId, ApiError> {
        self.require(ActorRole::Seller)
    }

    fn require(&self, role: ActorRole) -> Result<UserId, ApiError> {
        if self.0.role == role {
            Ok(self.0.id)
        } else {
            Err(ApiError::Forbidden(format!(
                "this endpoint requires the {role} role"
            )))
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {name} header")))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized(format!("malformed {name} header")))
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id: UserId = header(parts, USER_ID_HEADER)?
            .parse()
            .map_err(|_| ApiError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;
        let role: ActorRole = header(parts, USER_ROLE_HEADER)?
            .parse()
            .map_err(ApiError::Unauthorized)?;

        Ok(Caller(Actor { id, role }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Caller, ApiError> {
        let (mut parts, _) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_identity_headers() {
        let user = UserId::new();
        let request = Request::builder()
            .header(USER_ID_HEADER, user.to_string())
            .header(USER_ROLE_HEADER, "seller")
            .body(())
            .unwrap();

        let caller = extract(request).await.unwrap();
        assert_eq!(caller.actor(), Actor::seller(user));
        assert_eq!(caller.seller_id().unwrap(), user);
        assert!(matches!(caller.buyer_id(), Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn missing_headers_are_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(request).await,
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn unknown_role_is_unauthorized() {
        let request = Request::builder()
            .header(USER_ID_HEADER, UserId::new().to_string())
            .header(USER_ROLE_HEADER, "admin")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await,
            Err(ApiError::Unauthorized(_))
        ));
    }
}
