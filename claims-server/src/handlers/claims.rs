use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse, ApiResult};
use crate::server::AppState;
use crate::types::PaginationParams;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use claims_service::{Claim, ClaimDetail, ClaimFilter, ClaimStatus, Flag, Note};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Query string for the claims listing
#[derive(Debug, Default, Deserialize)]
pub struct ListClaimsQuery {
    /// Matches claim id or patient name
    pub search: Option<String>,
    /// A claim status, or "all"
    pub status: Option<String>,
    pub insurer: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListClaimsQuery {
    fn filter(&self) -> ApiResult<ClaimFilter> {
        let status = match non_empty(&self.status) {
            None => None,
            Some(value) if value.eq_ignore_ascii_case("all") => None,
            Some(value) => Some(value.parse::<ClaimStatus>().map_err(ApiError::validation)?),
        };

        Ok(ClaimFilter {
            search: non_empty(&self.search).map(str::to_string),
            status,
            insurer: non_empty(&self.insurer).map(str::to_string),
            ..Default::default()
        })
    }

    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Everything known about one claim
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimView {
    pub claim: Claim,
    pub detail: Option<ClaimDetail>,
    pub cpt_codes: Vec<String>,
    pub underpayment: Decimal,
    pub flags: Vec<Flag>,
    pub notes: Vec<Note>,
}

/// List claims, newest discharge first
pub async fn list_claims(
    State(state): State<AppState>,
    Query(query): Query<ListClaimsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Claim>>>> {
    let filter = query.filter()?;
    let pagination = query.pagination();

    let claims = state.store.list_claims(&filter).await?;
    let metadata = pagination.to_metadata(claims.len());

    Ok(Json(api_success_with_meta(pagination.paginate(claims), metadata)))
}

/// Claim with its detail, underpayment, flags and notes
pub async fn get_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
) -> ApiResult<Json<ApiResponse<ClaimView>>> {
    let claim = state
        .store
        .get_claim(&claim_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("claim {}", claim_id)))?;

    let detail = state.store.get_detail(&claim_id).await?;
    let flags = state.store.list_flags(Some(&claim_id)).await?;
    let notes = state.store.list_notes(Some(&claim_id)).await?;

    Ok(Json(api_success(ClaimView {
        cpt_codes: detail.as_ref().map(ClaimDetail::cpt_codes_list).unwrap_or_default(),
        underpayment: claim.underpayment(),
        claim,
        detail,
        flags,
        notes,
    })))
}
