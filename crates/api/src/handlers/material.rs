//! Handlers for `/materiales` (inventory master data).

use almacen_core::types::{DbId, Quantity};
use almacen_db::models::material::{MaterialChanges, MaterialFilter, MaterialRefs, NewMaterial};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::handlers::{non_blank, optional_text, required};
use crate::response::MessageResponse;
use crate::state::AppState;

/// Query parameters for `GET /materiales`.
#[derive(Debug, Deserialize)]
pub struct InventoryParams {
    pub descripcion: Option<String>,
    pub categoria: Option<DbId>,
}

/// Request body for `POST /materiales`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[serde(rename = "codigoMaterial")]
    #[validate(
        required(message = "codigoMaterial is required"),
        length(max = 50),
        custom(function = "non_blank", message = "codigoMaterial is required")
    )]
    pub code: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub fields: MaterialFields,
    #[serde(rename = "codigoInterno", default)]
    pub internal_code: bool,
}

/// Editable fields shared by create and update.
#[derive(Debug, Deserialize, Validate)]
pub struct MaterialFields {
    #[serde(rename = "descripcion")]
    #[validate(
        required(message = "descripcion is required"),
        custom(function = "non_blank", message = "descripcion is required")
    )]
    pub description: Option<String>,
    #[serde(rename = "unidadMedida")]
    #[validate(
        required(message = "unidadMedida is required"),
        custom(function = "non_blank", message = "unidadMedida is required")
    )]
    pub unit: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
    #[serde(rename = "stockActual")]
    pub stock_current: Option<Quantity>,
    #[serde(rename = "stockMinimo")]
    pub stock_minimum: Option<Quantity>,
    #[serde(rename = "imagen")]
    pub image_url: Option<String>,
    #[serde(rename = "categoria")]
    pub category_id: Option<DbId>,
    #[serde(rename = "ubicacion")]
    pub location_id: Option<DbId>,
    #[serde(rename = "marca")]
    pub brand_id: Option<DbId>,
    #[serde(rename = "proveedor")]
    pub supplier_id: Option<DbId>,
}

impl MaterialFields {
    /// On create, missing counters default to zero; an update must send both.
    fn into_changes(self, require_counters: bool) -> AppResult<MaterialChanges> {
        let (stock_current, stock_minimum) = if require_counters {
            (
                required(self.stock_current, "stockActual")?,
                required(self.stock_minimum, "stockMinimo")?,
            )
        } else {
            (
                self.stock_current.unwrap_or(0),
                self.stock_minimum.unwrap_or(0),
            )
        };

        Ok(MaterialChanges {
            description: required(self.description, "descripcion")?.trim().to_string(),
            unit: required(self.unit, "unidadMedida")?.trim().to_string(),
            color: optional_text(self.color),
            notes: optional_text(self.notes),
            stock_current,
            stock_minimum,
            image_url: optional_text(self.image_url),
            refs: MaterialRefs {
                category_id: self.category_id,
                location_id: self.location_id,
                brand_id: self.brand_id,
                supplier_id: self.supplier_id,
            },
        })
    }
}

/// GET /api/materiales?descripcion=&categoria=
pub async fn list_materials(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<InventoryParams>,
) -> AppResult<impl IntoResponse> {
    let filter = MaterialFilter {
        description: optional_text(params.descripcion),
        category_id: params.categoria,
    };
    let materials = state.store.list_materials(&filter).await?;
    Ok(Json(materials))
}

/// POST /api/materiales
pub async fn create_material(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateMaterialRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let code = required(input.code, "codigoMaterial")?.trim().to_string();
    let fields = input.fields.into_changes(false)?;
    let material = NewMaterial {
        code,
        description: fields.description,
        unit: fields.unit,
        color: fields.color,
        notes: fields.notes,
        stock_current: fields.stock_current,
        stock_minimum: fields.stock_minimum,
        image_url: fields.image_url,
        internal_code: input.internal_code,
        refs: fields.refs,
    };

    let created = state.store.create_material(material).await?;

    tracing::info!(material = %created.code, "Material created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Material agregado correctamente")),
    ))
}

/// PUT /api/materiales/{code}
///
/// Full update of the editable fields. A new `stockActual` below the reserved
/// stock is refused.
pub async fn update_material(
    State(state): State<AppState>,
    PathParam(code): PathParam<String>,
    JsonBody(input): JsonBody<MaterialFields>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let changes = input.into_changes(true)?;
    state.store.update_material(&code, changes).await?;

    tracing::info!(material = %code, "Material updated");

    Ok(Json(MessageResponse::new("Material actualizado correctamente")))
}

/// DELETE /api/materiales/{code}
///
/// Soft delete; refused while units of the material are reserved.
pub async fn delete_material(
    State(state): State<AppState>,
    PathParam(code): PathParam<String>,
) -> AppResult<impl IntoResponse> {
    state.store.deactivate_material(&code).await?;

    tracing::info!(material = %code, "Material deactivated");

    Ok(Json(MessageResponse::new("Material eliminado correctamente")))
}
