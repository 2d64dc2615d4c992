//! Response-mode negotiation and the dual renderer.
//!
//! Every operation produces one result value. That value knows how to present
//! itself as a structured JSON payload and as an HTML fragment; the negotiated
//! [`ResponseMode`] decides which of the two is sent.

use std::convert::Infallible;

use axum::extract::rejection::{FormRejection, PathRejection};
use axum::extract::{Form, FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::ACCEPT;
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::web::WebError;

/// Which rendition of a result a caller receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Machine readable JSON payload.
    Structured,
    /// Server rendered markup meant for direct insertion into a page.
    Fragment,
}

#[derive(Debug, Deserialize)]
struct FormatQuery {
    format: Option<String>,
}

impl ResponseMode {
    /// Picks the response mode for a request.
    ///
    /// A mode stored in the request extensions (set by the `/api` and `/htmx`
    /// mounts) wins, followed by the `format` query parameter, the `HX-Request`
    /// header and finally the `Accept` header.
    pub fn negotiate(parts: &Parts) -> Self {
        if let Some(mode) = parts.extensions.get::<ResponseMode>() {
            return *mode;
        }

        if let Ok(Query(FormatQuery {
            format: Some(format),
        })) = Query::<FormatQuery>::try_from_uri(&parts.uri)
        {
            match format.to_ascii_lowercase().as_str() {
                "json" => return Self::Structured,
                "html" => return Self::Fragment,
                _ => {}
            }
        }

        let is_htmx = parts
            .headers
            .get("hx-request")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        if is_htmx {
            return Self::Fragment;
        }

        let accept = parts
            .headers
            .get(ACCEPT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if accept.contains("application/json") {
            Self::Structured
        } else if accept.contains("text/html") {
            Self::Fragment
        } else {
            Self::Structured
        }
    }

    /// Renders a successful result, or the error that replaced it, in this mode.
    pub fn respond<R, E>(self, result: Result<R, E>) -> Response
    where
        R: DualRender,
        E: Into<WebError>,
    {
        match result {
            Ok(value) => self.render(&value),
            Err(err) => {
                let err: WebError = err.into();
                err.log();
                self.render(&err)
            }
        }
    }

    /// Renders a value in this mode.
    pub fn render<R: DualRender>(self, value: &R) -> Response {
        let status = value.status();
        match self {
            ResponseMode::Structured => (status, Json(value.payload())).into_response(),
            ResponseMode::Fragment => match value.fragment() {
                Ok(html) => {
                    let mut response = (status, Html(html)).into_response();
                    if status.is_client_error() || status.is_server_error() {
                        // htmx ignores error bodies unless told how to swap them
                        response.headers_mut().insert(
                            HeaderName::from_static("hx-reswap"),
                            HeaderValue::from_static("innerHTML"),
                        );
                    }
                    response
                }
                Err(err) => {
                    tracing::error!("Failed to render fragment: {}", err);
                    WebError::Template(err).into_response()
                }
            },
        }
    }
}

impl<S> FromRequestParts<S> for ResponseMode
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::negotiate(parts))
    }
}

/// [`Path`] whose rejection is rendered in the negotiated mode.
#[derive(Debug)]
pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                let mode = ResponseMode::negotiate(parts);
                Err(mode.respond::<Deleted, _>(Err(rejection)))
            }
        }
    }
}

/// [`Form`] whose rejection is rendered in the negotiated mode.
#[derive(Debug)]
pub struct FormInput<T>(pub T);

impl<S, T> FromRequest<S> for FormInput<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();
        let mode = ResponseMode::negotiate(&parts);
        match Form::<T>::from_request(Request::from_parts(parts, body), state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(rejection) => Err(mode.respond::<Deleted, _>(Err(rejection))),
        }
    }
}

impl From<PathRejection> for WebError {
    fn from(rejection: PathRejection) -> Self {
        WebError::Invalid(rejection.body_text())
    }
}

impl From<FormRejection> for WebError {
    fn from(rejection: FormRejection) -> Self {
        WebError::Invalid(rejection.body_text())
    }
}

/// A result that can be presented both as structured data and as markup.
///
/// Implementors build both renditions from the same fields so that the two
/// can never enumerate different entities.
pub trait DualRender {
    /// Status code shared by both renditions.
    fn status(&self) -> StatusCode {
        StatusCode::OK
    }

    fn payload(&self) -> impl Serialize + '_;

    fn fragment(&self) -> askama::Result<String>;
}

/// Result of a delete: `{"success": true}` or an empty fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deleted;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SuccessResponse {
    success: bool,
}

impl DualRender for Deleted {
    fn payload(&self) -> impl Serialize + '_ {
        SuccessResponse { success: true }
    }

    fn fragment(&self) -> askama::Result<String> {
        Ok(String::new())
    }
}
