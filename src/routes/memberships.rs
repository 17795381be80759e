use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::error::{AppError, StdResponse};
use crate::middleware::RequireAdmin;
use crate::models::{
    ApplicationReview, ApplicationStatus, CreateMembershipApplicationEntity,
    MembershipApplicationEntity,
};
use crate::state::AppState;

/// Defines routes with OpenAPI specs. Everything except submission and the
/// member lookup paths is gated behind the admin secret.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest(
            "/api/membership-applications",
            OpenApiRouter::new()
                .routes(utoipa_axum::routes!(create_application))
                .routes(utoipa_axum::routes!(list_applications))
                .routes(utoipa_axum::routes!(get_application))
                .routes(utoipa_axum::routes!(update_status))
                .routes(utoipa_axum::routes!(update_application))
                .routes(utoipa_axum::routes!(delete_application)),
        )
        .routes(utoipa_axum::routes!(member_lookup))
        .routes(utoipa_axum::routes!(member_verify))
}

fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::BadRequest(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Submit a membership application. It starts out `pending` and has no side
/// effects until a reviewer acts on it.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Memberships"],
    request_body = CreateMembershipApplicationEntity,
    responses(
        (status = 201, description = "Application submitted", body = StdResponse<MembershipApplicationEntity, String>),
        (status = 400, description = "A required identity field is missing")
    )
)]
async fn create_application(
    State(state): State<AppState>,
    Json(body): Json<CreateMembershipApplicationEntity>,
) -> Result<impl IntoResponse, AppError> {
    require(&body.first_name, "firstName")?;
    require(&body.last_name, "lastName")?;
    require(&body.email, "email")?;
    require(&body.phone, "phone")?;
    require(&body.date_of_birth, "dateOfBirth")?;
    require(&body.id_number, "idNumber")?;

    let application = state.store.create_application(body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(application),
            message: Some("Application submitted successfully"),
        },
    ))
}

/// Fetch all applications, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Memberships"],
    responses(
        (status = 200, description = "List applications", body = StdResponse<Vec<MembershipApplicationEntity>, String>),
        (status = 401, description = "Admin secret missing or wrong")
    )
)]
async fn list_applications(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let applications = state.store.list_applications().await?;

    Ok(StdResponse {
        data: Some(applications),
        message: Some("Get applications successfully"),
    })
}

/// Fetch a single application.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Memberships"],
    params(
        ("id" = Uuid, Path, description = "Application ID to fetch")
    ),
    responses(
        (status = 200, description = "Get application successfully", body = StdResponse<MembershipApplicationEntity, String>),
        (status = 401, description = "Admin secret missing or wrong"),
        (status = 404, description = "Application not found")
    )
)]
async fn get_application(
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let application = state
        .store
        .get_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Membership application".to_string()))?;

    Ok(StdResponse {
        data: Some(application),
        message: Some("Get application successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateStatusReq {
    status: String,
}

/// Change an application's status. The transition into `approved` issues
/// the member number and card; re-approving keeps the issued card.
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tags = ["Memberships"],
    params(
        ("id" = Uuid, Path, description = "Application ID to update")
    ),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status updated", body = StdResponse<MembershipApplicationEntity, String>),
        (status = 400, description = "Unknown status literal"),
        (status = 401, description = "Admin secret missing or wrong"),
        (status = 404, description = "Application not found")
    )
)]
async fn update_status(
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<UpdateStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let status: ApplicationStatus = body.status.parse()?;

    let application = state
        .store
        .review_application(
            id,
            ApplicationReview {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
        .map_err(|err| AppError::from_store(err, "Membership application"))?;

    if let Some(member_number) = &application.member_number {
        if application.status == ApplicationStatus::Approved {
            tracing::info!(
                member_number = %member_number,
                email = %application.email,
                "Member approved"
            );
        }
    }

    Ok(StdResponse {
        data: Some(application),
        message: Some("Updated application status successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ReviewApplicationReq {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    reviewed_by: Option<String>,
}

/// Review an application: optionally change its status and record reviewer
/// and notes in one call.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Memberships"],
    params(
        ("id" = Uuid, Path, description = "Application ID to review")
    ),
    request_body = ReviewApplicationReq,
    responses(
        (status = 200, description = "Application reviewed", body = StdResponse<MembershipApplicationEntity, String>),
        (status = 400, description = "Unknown status literal"),
        (status = 401, description = "Admin secret missing or wrong"),
        (status = 404, description = "Application not found")
    )
)]
async fn update_application(
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<ReviewApplicationReq>,
) -> Result<impl IntoResponse, AppError> {
    let status = body
        .status
        .as_deref()
        .map(str::parse::<ApplicationStatus>)
        .transpose()?;

    let application = state
        .store
        .review_application(
            id,
            ApplicationReview {
                status,
                reviewed_by: body.reviewed_by,
                notes: body.notes,
            },
        )
        .await
        .map_err(|err| AppError::from_store(err, "Membership application"))?;

    Ok(StdResponse {
        data: Some(application),
        message: Some("Reviewed application successfully"),
    })
}

/// Hard-delete an application. Orders are unaffected; there is no linkage
/// from orders to applications.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Memberships"],
    params(
        ("id" = Uuid, Path, description = "Application ID to delete")
    ),
    responses(
        (status = 204, description = "Deleted application"),
        (status = 401, description = "Admin secret missing or wrong")
    )
)]
async fn delete_application(
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state.store.delete_application(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct LookupQuery {
    q: Option<String>,
}

/// Public member-portal lookup by member number or email. Only approved
/// members are visible, so pending and rejected applicants cannot be
/// enumerated.
#[utoipa::path(
    get,
    path = "/api/member-lookup",
    tags = ["Memberships"],
    params(
        ("q" = String, Query, description = "Member number or email")
    ),
    responses(
        (status = 200, description = "Member found", body = StdResponse<MembershipApplicationEntity, String>),
        (status = 400, description = "Missing query"),
        (status = 404, description = "Member not found")
    )
)]
async fn member_lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupQuery>,
) -> Result<impl IntoResponse, AppError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;

    let member = state
        .store
        .find_member(query)
        .await?
        .ok_or_else(|| AppError::NotFound("Member".to_string()))?;

    Ok(StdResponse {
        data: Some(member),
        message: Some("Member found"),
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyQuery {
    member_number: Option<String>,
}

/// Staff verification by exact member number only.
#[utoipa::path(
    get,
    path = "/api/member-verify",
    tags = ["Memberships"],
    params(
        ("memberNumber" = String, Query, description = "Member number to verify")
    ),
    responses(
        (status = 200, description = "Member verified", body = StdResponse<MembershipApplicationEntity, String>),
        (status = 400, description = "Missing member number"),
        (status = 404, description = "Member not found")
    )
)]
async fn member_verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let member_number = params
        .member_number
        .as_deref()
        .map(str::trim)
        .filter(|number| !number.is_empty())
        .ok_or_else(|| AppError::BadRequest("Member number is required".to_string()))?;

    let member = state
        .store
        .verify_member(member_number)
        .await?
        .ok_or_else(|| AppError::NotFound("Member".to_string()))?;

    Ok(StdResponse {
        data: Some(member),
        message: Some("Member verified"),
    })
}
