use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::http::routes::{classify, health, stats};
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    let cors = build_cors(&state.config.allowed_origins);
    let mut router = Router::new()
        .route("/", get(health::health))
        .route("/health", get(health::health))
        .route("/classify", post(classify::classify))
        .route("/stats", get(stats::label_statistics))
        .with_state(state);
    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    router
}

fn build_cors(allowed_origins: &[String]) -> Option<CorsLayer> {
    let mut origins = Vec::new();
    let mut allow_any = false;
    for origin in allowed_origins {
        if is_wildcard_origin(origin) {
            allow_any = true;
            break;
        }
        match HeaderValue::from_str(origin.trim()) {
            Ok(value) => origins.push(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "invalid CORS origin ignored");
            }
        }
    }

    if !allow_any && origins.is_empty() {
        return None;
    }

    let cors = CorsLayer::new().allow_methods([Method::GET, Method::POST, Method::OPTIONS]);
    if allow_any {
        Some(cors.allow_origin(Any).allow_headers(Any))
    } else {
        Some(
            cors.allow_origin(AllowOrigin::list(origins))
                .allow_credentials(true)
                .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION]),
        )
    }
}

fn is_wildcard_origin(origin: &str) -> bool {
    origin.trim() == "*"
}

#[cfg(test)]
mod tests {
    use super::{build_cors, is_wildcard_origin};

    #[test]
    fn wildcard_origin_matches_trimmed_star() {
        assert!(is_wildcard_origin("*"));
        assert!(is_wildcard_origin(" * "));
        assert!(!is_wildcard_origin("https://feeltrack.example"));
    }

    #[test]
    fn cors_disabled_without_origins() {
        assert!(build_cors(&[]).is_none());
        assert!(build_cors(&["bad\norigin".to_string()]).is_none());
    }

    #[test]
    fn cors_enabled_for_listed_or_any_origin() {
        assert!(build_cors(&["https://feeltrack.example".to_string()]).is_some());
        assert!(build_cors(&["*".to_string()]).is_some());
    }
}
