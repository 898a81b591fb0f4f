//! Laptop Storefront Catalog - pricing and catalog data service

use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use laptop_storefront_catalog::{
    bootstrap, config, domain::schema::validate_product, service::{CatalogService, QuoteRequest}, store::ProductStore,
    CatalogError, Filter, SortOrder,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)] pub struct AppState { pub catalog: CatalogService }

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = config::load_app_config()?;
    let db = PgPoolOptions::new().max_connections(config.database_max_connections).connect(&config.database_url).await?;
    bootstrap::run(&db, &config).await?;
    let nats = match config.nats_url.as_deref() {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(e) => { tracing::warn!(error = %e, "NATS unavailable, catalog events disabled"); None }
        },
        None => None,
    };
    let state = AppState { catalog: CatalogService::new(ProductStore::new(db), nats) };

    let app = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "laptop-storefront-catalog"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/validate", post(validate_document))
        .route("/api/v1/products/:id", get(get_product).put(save_product))
        .route("/api/v1/products/:id/migrate-sizes", post(migrate_product_sizes))
        .route("/api/v1/admin/migrate-sizes", post(migrate_all_sizes))
        .route("/api/v1/quote", post(quote))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state);

    tracing::info!("🚀 Catalog service listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}

pub struct ApiError(CatalogError);

impl From<CatalogError> for ApiError { fn from(e: CatalogError) -> Self { Self(e) } }

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CatalogError::ProductNotFound => StatusCode::NOT_FOUND,
            CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::Pricing(_) | CatalogError::IdMismatch { .. } => StatusCode::BAD_REQUEST,
            CatalogError::StorageError(e) => { tracing::error!(error = %e, "storage failure"); StatusCode::INTERNAL_SERVER_ERROR }
        };
        let body = match &self.0 {
            CatalogError::Validation(v) => json!({"error": v.to_string(), "path": v.path}),
            other => json!({"error": other.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

/// Facets arrive comma-separated, e.g. `processor_brands=Intel,AMD`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>, pub category: Option<String>, pub subcategory: Option<String>, pub brand: Option<String>,
    pub color: Option<String>, pub size: Option<String>, pub min_price: Option<Decimal>, pub max_price: Option<Decimal>,
    pub processor_brands: Option<String>, pub gpu_brands: Option<String>, pub display_sizes: Option<String>,
    pub sort: Option<SortOrder>, pub include_archived: Option<bool>,
}

fn split_list<T: std::str::FromStr>(raw: Option<&str>, field: &str) -> Result<Vec<T>, (StatusCode, Json<Value>)> {
    raw.unwrap_or("").split(',').map(str::trim).filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|_| (StatusCode::BAD_REQUEST, Json(json!({"error": format!("invalid {field} value `{s}`")})))))
        .collect()
}

impl ListParams {
    fn into_filter(self) -> Result<Filter, (StatusCode, Json<Value>)> {
        Ok(Filter {
            processor_brands: split_list(self.processor_brands.as_deref(), "processor_brands")?,
            gpu_brands: split_list(self.gpu_brands.as_deref(), "gpu_brands")?,
            display_sizes: split_list(self.display_sizes.as_deref(), "display_sizes")?,
            search: self.search, category: self.category, subcategory: self.subcategory, brand: self.brand,
            color: self.color, size: self.size, min_price: self.min_price, max_price: self.max_price,
            sort: self.sort.unwrap_or_default(), include_archived: self.include_archived.unwrap_or(false),
        })
    }
}

async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Response {
    let filter = match p.into_filter() { Ok(f) => f, Err(e) => return e.into_response() };
    match s.catalog.list(&filter).await {
        Ok(products) => Json(json!({"data": products, "total": products.len()})).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!(s.catalog.get(&id).await?)))
}

async fn save_product(State(s): State<AppState>, Path(id): Path<String>, Json(raw): Json<Value>) -> Result<Json<Value>, ApiError> {
    let product = s.catalog.save_document(&id, &raw).await?;
    Ok(Json(json!(product)))
}

async fn validate_document(Json(raw): Json<Value>) -> Result<Json<Value>, ApiError> {
    let product = validate_product(&raw).map_err(CatalogError::from)?;
    Ok(Json(json!({"valid": true, "product": product})))
}

async fn migrate_product_sizes(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!(s.catalog.migrate_one(&id).await?)))
}

async fn migrate_all_sizes(State(s): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!(s.catalog.migrate_all().await?)))
}

async fn quote(State(s): State<AppState>, Json(r): Json<QuoteRequest>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!(s.catalog.quote(&r).await?)))
}
