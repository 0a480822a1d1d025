//! Access gate for protected routes.
//!
//! Mount [`require_user`] with `axum::middleware::from_fn_with_state` in front of every
//! protected route. It runs [`AuthService::authorize`] once per request and either
//! short-circuits with the mapped [`AuthError`] or attaches the resolved user as a
//! [`CurrentUser`] request extension.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/me", get(me))
//!     .route_layer(middleware::from_fn_with_state(auth.clone(), require_user::<P, U>));
//!
//! async fn me(CurrentUser(user): CurrentUser) -> Json<UserInfo> {
//!     Json(user.to_info())
//! }
//! ```

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;

use super::provider::IdentityProvider;
use super::service::AuthService;
use crate::db::UserStore;
use crate::error::AuthError;
use crate::models::User;

/// The user resolved by the access gate, with a usable access token.
///
/// Use as an extractor in handlers behind [`require_user`]. Outside the gate it
/// rejects with [`AuthError::NoActiveUser`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::NoActiveUser)
    }
}

/// Middleware: allow the request only for a session bound to a user whose token is
/// fresh, or became fresh through a refresh.
pub async fn require_user<P: IdentityProvider, U: UserStore>(
    State(auth): State<AuthService<P, U>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = auth.authorize(&session).await?;

    tracing::debug!(user_id = %user.id, "Access granted");
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
