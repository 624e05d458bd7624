use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::post;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::context::InferenceContext;
use crate::server::handlers;

pub struct RouterBuilder {
    context: Option<Arc<InferenceContext>>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self { context: None }
    }

    pub fn with_context(mut self, context: Arc<InferenceContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn build(self) -> crate::Result<Router> {
        let context = self
            .context
            .ok_or_else(|| crate::Error::internal("inference context must be set"))?;

        // Browsers call the endpoint directly from any page
        let cors_layer = CorsLayer::new()
            .allow_methods([Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_origin(AllowOrigin::any());

        let router = Router::new()
            .route("/predict", post(handlers::predict))
            .layer(cors_layer)
            .with_state(context);

        Ok(router)
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
