use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use mercurial_catalog::{SaveWarning, SkipReason};
use mercurial_core::{ImageUpload, ProductDraft, ProductRecord};

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// The admin form's save payload: the candidate record plus its image batch
/// as `data:` URIs, exactly as the browser encodes dropped files.
#[derive(Debug, Deserialize)]
pub(super) struct SubmitProductRequest {
    product: ProductDraft,
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SubmitProductResponse {
    product: ProductRecord,
    created: bool,
    warnings: Vec<SaveWarning>,
}

pub(super) async fn submit_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<SubmitProductRequest>,
) -> Result<Json<ApiResponse<SubmitProductResponse>>, ApiError> {
    let mut warnings = Vec::new();
    let mut uploads = Vec::new();
    for (index, raw) in request.images.iter().enumerate() {
        match ImageUpload::from_data_uri(raw) {
            Some(upload) => uploads.push(upload),
            None => {
                tracing::warn!(index, "discarding image payload that is not a data URI");
                warnings.push(SaveWarning::SkippedImage {
                    index,
                    reason: SkipReason::Undecodable,
                });
            }
        }
    }

    let outcome = state
        .store
        .upsert(request.product, uploads)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;
    warnings.extend(outcome.warnings);

    Ok(Json(ApiResponse {
        data: SubmitProductResponse {
            product: outcome.record,
            created: outcome.created,
            warnings,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<ProductRecord>>> {
    let products = state.store.load().await;
    Json(ApiResponse {
        data: products,
        meta: ResponseMeta::new(req_id.0),
    })
}
