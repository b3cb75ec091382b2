use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use log::{error, info, warn};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::handlers::PaymentHandler;
use crate::platform::Platform;

pub const GENERATE_INVOICE_PATH: &str = "/api/generate-invoice";

// invoice issued by the http endpoint
pub const PRODUCT_TITLE: &str = "Test Product";
pub const PRODUCT_DESCRIPTION: &str = "Test description";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLinkResponse {
    pub invoice_link: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub struct ApiState<P: Platform> {
    pub platform: Arc<P>,
    pub invoice_chat_id: ChatId,
    pub bot_username: String,
    pub link_domain: String,
}

impl<P: Platform> Clone for ApiState<P> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            invoice_chat_id: self.invoice_chat_id,
            bot_username: self.bot_username.clone(),
            link_domain: self.link_domain.clone(),
        }
    }
}

impl<P: Platform> ApiState<P> {
    pub fn deep_link(&self, payload: &str) -> String {
        format!(
            "https://{}/{}?start={}",
            self.link_domain, self.bot_username, payload
        )
    }
}

pub fn router<P: Platform>(state: ApiState<P>, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([allowed_origin.clone()]))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route(GENERATE_INVOICE_PATH, post(generate_invoice::<P>))
        .route_layer(middleware::from_fn_with_state(
            allowed_origin,
            reject_foreign_origin,
        ))
        .layer(cors)
        .with_state(state)
}

/// binds the listener up front so a taken port fails startup
pub async fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!("Server started at {}", addr);
    Ok(listener)
}

pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app).await
}

// requests without an Origin header are not browser cross-origin calls
async fn reject_foreign_origin(
    State(allowed_origin): State<HeaderValue>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(origin) = req.headers().get(header::ORIGIN) {
        if *origin != allowed_origin {
            warn!("Rejected request from origin {:?}", origin);
            return Err(StatusCode::FORBIDDEN);
        }
    }
    Ok(next.run(req).await)
}

async fn generate_invoice<P: Platform>(State(state): State<ApiState<P>>) -> Response {
    let result = PaymentHandler::send_payment_invoice(
        state.platform.as_ref(),
        state.invoice_chat_id,
        PRODUCT_TITLE,
        PRODUCT_DESCRIPTION,
        PRODUCT_TITLE,
    )
    .await;

    match result {
        Ok(payload) => {
            let response = InvoiceLinkResponse {
                invoice_link: state.deep_link(&payload),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to send invoice from http endpoint: {}", e);
            let response = ErrorResponse {
                error: "Failed to send invoice".to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}
