//! Caller identity.
//!
//! Sign-in happens upstream: the auth gateway verifies the session and
//! forwards the user id in the `x-user-id` header. Roles come from the
//! [`RoleStore`] and are trusted as returned.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::models::{Role, RoleSummary};
use crate::state::AppState;
use crate::store::RoleStore;
use crate::utils::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller, if signed in.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Self(None));
        };

        let user_id = value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or_else(|| AppError::Unauthenticated("Malformed user identity".to_string()))?;

        Ok(Self(Some(user_id)))
    }
}

/// A caller that must be signed in.
#[derive(Debug, Clone, Copy)]
pub struct SignedIn(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for SignedIn
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        user.map(Self)
            .ok_or_else(|| AppError::Unauthenticated("Sign in to continue".to_string()))
    }
}

/// A signed-in caller holding the admin or moderator role.
#[derive(Debug, Clone, Copy)]
pub struct Moderator(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for Moderator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SignedIn(user_id) = SignedIn::from_request_parts(parts, state).await?;
        if role_summary(state.roles.as_ref(), user_id).await?.can_moderate() {
            Ok(Self(user_id))
        } else {
            Err(AppError::Forbidden(
                "Moderator or admin role required".to_string(),
            ))
        }
    }
}

pub async fn role_summary(roles: &dyn RoleStore, user_id: Uuid) -> Result<RoleSummary, AppError> {
    Ok(RoleSummary {
        user_id,
        is_admin: roles.has_role(user_id, Role::Admin).await?,
        is_moderator: roles.has_role(user_id, Role::Moderator).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRoleStore;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_missing_header_is_anonymous() {
        let CurrentUser(user) = CurrentUser::from_request_parts(&mut parts(None), &())
            .await
            .unwrap();
        assert!(user.is_none());

        let err = SignedIn::from_request_parts(&mut parts(None), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_header_is_parsed() {
        let id = Uuid::new_v4();
        let SignedIn(user) = SignedIn::from_request_parts(&mut parts(Some(&id.to_string())), &())
            .await
            .unwrap();
        assert_eq!(user, id);
    }

    #[tokio::test]
    async fn test_malformed_header_is_rejected() {
        let err = CurrentUser::from_request_parts(&mut parts(Some("not-a-uuid")), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_role_summary() {
        let roles = MemoryRoleStore::new();
        let user = Uuid::new_v4();
        assert!(!role_summary(&roles, user).await.unwrap().can_moderate());

        roles.grant(user, Role::Moderator).await;
        let summary = role_summary(&roles, user).await.unwrap();
        assert!(summary.is_moderator && !summary.is_admin);
        assert!(summary.can_moderate());
    }
}
