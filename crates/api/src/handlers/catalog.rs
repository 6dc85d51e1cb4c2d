//! Handlers for the lookup catalogs: categories, locations, brands, suppliers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::handlers::{non_blank, required};
use crate::response::MessageResponse;
use crate::state::AppState;

/// Request body for `POST /marcas` and `POST /proveedores`.
#[derive(Debug, Deserialize, Validate)]
pub struct NamedEntryRequest {
    #[validate(
        required(message = "nombre is required"),
        length(max = 100),
        custom(function = "non_blank", message = "nombre is required")
    )]
    pub nombre: Option<String>,
}

impl NamedEntryRequest {
    fn into_name(self) -> AppResult<String> {
        self.validate()?;
        Ok(required(self.nombre, "nombre")?.trim().to_string())
    }
}

/// GET /api/categorias
pub async fn list_categories(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.list_categories().await?))
}

/// GET /api/ubicaciones
pub async fn list_locations(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.list_locations().await?))
}

/// GET /api/marcas
pub async fn list_brands(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.list_brands().await?))
}

/// POST /api/marcas
pub async fn create_brand(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NamedEntryRequest>,
) -> AppResult<impl IntoResponse> {
    let name = input.into_name()?;
    let brand = state.store.create_brand(&name).await?;

    tracing::info!(brand_id = brand.id, name = %brand.name, "Brand created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Marca agregada correctamente")),
    ))
}

/// GET /api/proveedores
pub async fn list_suppliers(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.list_suppliers().await?))
}

/// POST /api/proveedores
pub async fn create_supplier(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NamedEntryRequest>,
) -> AppResult<impl IntoResponse> {
    let name = input.into_name()?;
    let supplier = state.store.create_supplier(&name).await?;

    tracing::info!(supplier_id = supplier.id, name = %supplier.name, "Supplier created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Proveedor agregado correctamente")),
    ))
}
