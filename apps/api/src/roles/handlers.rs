use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::RoleSummary;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RolesResponse {
    pub roles: Vec<RoleSummary>,
}

#[derive(Serialize)]
pub struct RoleExamplesResponse {
    pub role: String,
    pub examples: Vec<String>,
}

/// GET /roles
pub async fn handle_list_roles(State(state): State<AppState>) -> Json<RolesResponse> {
    let roles = state
        .roles
        .get_all_roles()
        .into_iter()
        .map(RoleSummary::from)
        .collect();
    Json(RolesResponse { roles })
}

/// GET /roles/:role_id
pub async fn handle_get_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> Result<Json<RoleSummary>, AppError> {
    if !state.roles.validate_role(&role_id) {
        return Err(AppError::NotFound(format!("Role '{role_id}' does not exist")));
    }
    state
        .roles
        .get_role_summary(&role_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Role '{role_id}' does not exist")))
}

/// GET /roles/:role_id/examples
/// Unknown roles get the default role's examples.
pub async fn handle_role_examples(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> Json<RoleExamplesResponse> {
    let examples = state.roles.get_role_examples(&role_id);
    Json(RoleExamplesResponse {
        role: role_id,
        examples,
    })
}
