//! Registration options and per-route options

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::context::{PanelContext, QueueSource};
use crate::error::PanelError;

/// Options accepted by [`crate::register`]
#[derive(Debug, Default)]
pub struct PanelOptions {
    /// Prefix for every panel route, e.g. `/admin`
    pub base_path: String,
    pub queues: QueueSource,
    pub route_options: RouteOptions,
}

/// Options applied to each panel route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteOptions {
    #[serde(default)]
    pub auth: Option<AuthStrategy>,

    /// Answer cross-origin requests with a permissive CORS policy
    #[serde(default)]
    pub cors: bool,
}

impl RouteOptions {
    pub(crate) fn apply(&self, router: Router<Arc<PanelContext>>) -> Router<Arc<PanelContext>> {
        let mut router = router;
        if let Some(auth) = &self.auth {
            router = router.route_layer(middleware::from_fn_with_state(
                auth.clone(),
                require_auth,
            ));
        }
        if self.cors {
            router = router.layer(CorsLayer::permissive());
        }
        router
    }
}

/// How panel requests are authenticated
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum AuthStrategy {
    /// `Authorization: Bearer <token>`
    #[serde(rename = "bearer")]
    Bearer { token: String },

    /// `Authorization: Basic base64(username:password)`
    #[serde(rename = "basic")]
    Basic { username: String, password: String },
}

impl AuthStrategy {
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };

        match self {
            Self::Bearer { token } => value
                .strip_prefix("Bearer ")
                .is_some_and(|given| given == token),
            Self::Basic { username, password } => value
                .strip_prefix("Basic ")
                .and_then(|encoded| {
                    base64::engine::general_purpose::STANDARD
                        .decode(encoded.trim())
                        .ok()
                })
                .and_then(|decoded| String::from_utf8(decoded).ok())
                .is_some_and(|credentials| {
                    credentials.split_once(':') == Some((username.as_str(), password.as_str()))
                }),
        }
    }
}

async fn require_auth(State(auth): State<AuthStrategy>, request: Request, next: Next) -> Response {
    if !request.headers().contains_key(header::AUTHORIZATION) {
        warn!(uri = %request.uri(), "Rejected unauthenticated panel request");
        return PanelError::Unauthorized.into_response();
    }
    if !auth.authorize(request.headers()) {
        warn!(uri = %request.uri(), "Rejected panel request with bad credentials");
        return PanelError::BadCredentials.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer() {
        let auth = AuthStrategy::Bearer {
            token: "s3cret".into(),
        };
        assert!(auth.authorize(&headers("Bearer s3cret")));
        assert!(!auth.authorize(&headers("Bearer wrong")));
        assert!(!auth.authorize(&HeaderMap::new()));
    }

    #[test]
    fn test_basic() {
        let auth = AuthStrategy::Basic {
            username: "admin".into(),
            password: "pa:ss".into(),
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode("admin:pa:ss");
        assert!(auth.authorize(&headers(&format!("Basic {}", encoded))));

        let wrong = base64::engine::general_purpose::STANDARD.encode("admin:nope");
        assert!(!auth.authorize(&headers(&format!("Basic {}", wrong))));
        assert!(!auth.authorize(&headers("Basic !!not-base64!!")));
    }

    #[test]
    fn test_deserialize_strategy() {
        let options: RouteOptions =
            serde_json::from_str(r#"{"auth": {"type": "bearer", "token": "t"}, "cors": true}"#)
                .unwrap();
        assert_eq!(
            options.auth,
            Some(AuthStrategy::Bearer { token: "t".into() })
        );
        assert!(options.cors);
    }
}
