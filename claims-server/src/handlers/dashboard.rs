use crate::error::{api_success, ApiResponse, ApiResult};
use crate::server::AppState;
use axum::{
    extract::{Query, State},
    response::Json,
};
use claims_service::{DashboardFilter, DashboardQuery, DashboardReport};

/// Dashboard figures. Unparseable filter values are ignored rather than rejected.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<ApiResponse<DashboardReport>>> {
    let report = DashboardReport::load(state.store.as_ref(), DashboardFilter::from(&query)).await?;
    Ok(Json(api_success(report)))
}
