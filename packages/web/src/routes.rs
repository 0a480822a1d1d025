//! HTTP handlers. All lifecycle decisions live in [`AuthService`]; these only translate
//! between requests and service calls.

use auth::auth::AuthCallback;
use auth::{AuthError, AuthService, CurrentUser, IdentityProvider, UserInfo, UserStore};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use tower_sessions::Session;

pub async fn home<P: IdentityProvider, U: UserStore>(
    State(auth): State<AuthService<P, U>>,
) -> Html<String> {
    Html(format!(
        "<!doctype html>\
         <title>Sumnotes</title>\
         <h1>Sumnotes</h1>\
         <p><a href=\"/auth/{name}\">Sign in with {name}</a></p>",
        name = auth.provider().name()
    ))
}

/// Send the browser to the provider's consent screen.
pub async fn login<P: IdentityProvider, U: UserStore>(
    State(auth): State<AuthService<P, U>>,
    Path(provider): Path<String>,
    session: Session,
) -> Result<Response, AuthError> {
    if provider != auth.provider().name() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }
    let url = auth.begin_login(&session).await?;
    Ok(Redirect::to(&url).into_response())
}

pub async fn callback<P: IdentityProvider, U: UserStore>(
    State(auth): State<AuthService<P, U>>,
    Path(provider): Path<String>,
    session: Session,
    Query(params): Query<AuthCallback>,
) -> Result<Response, AuthError> {
    if provider != auth.provider().name() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }
    auth.complete_login(&session, params).await?;
    Ok(Redirect::to("/success").into_response())
}

pub async fn success(CurrentUser(user): CurrentUser) -> Html<String> {
    let info = user.to_info();
    Html(format!(
        "<!doctype html>\
         <title>Signed in</title>\
         <h1>Signed in as {}</h1>\
         <form method=\"post\" action=\"/logout\"><button>Sign out</button></form>",
        html_escape::encode_text(info.display_name())
    ))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserInfo> {
    Json(user.to_info())
}

pub async fn logout<P: IdentityProvider, U: UserStore>(
    State(auth): State<AuthService<P, U>>,
    session: Session,
) -> Result<Redirect, AuthError> {
    auth.logout(&session).await?;
    Ok(Redirect::to("/"))
}
