use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::appointments as appointment_db;
use crate::errors::ApiError;
use crate::models::appointments::{CreateAppointment, UpdateAppointment};

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Appointment not found" }))
}

/// GET /api/auth/appointments/
///
/// Stale and duplicate bookings are cancelled before the list is read.
pub async fn get_appointments(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    let now = chrono::Utc::now().naive_utc();
    match appointment_db::list_for(db.get_ref(), &user.0, now).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch appointments: {e}"),
        })),
    }
}

/// POST /api/auth/appointments/
pub async fn create_appointment(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateAppointment>,
) -> Result<HttpResponse, ApiError> {
    let appointment = appointment_db::create(db.get_ref(), &user.0, body.into_inner()).await?;
    let mut resp = appointment_db::to_responses(db.get_ref(), vec![appointment]).await?;
    Ok(HttpResponse::Created().json(resp.pop()))
}

/// GET /api/auth/appointments/{id}/
pub async fn get_appointment(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> impl Responder {
    match appointment_db::get_scoped(db.get_ref(), &user.0, path.into_inner()).await {
        Ok(Some(a)) => match appointment_db::to_responses(db.get_ref(), vec![a]).await {
            Ok(mut resp) => HttpResponse::Ok().json(resp.pop()),
            Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            })),
        },
        Ok(None) => not_found(),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}

/// PUT/PATCH /api/auth/appointments/{id}/
pub async fn update_appointment(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateAppointment>,
) -> Result<HttpResponse, ApiError> {
    let appointment = appointment_db::get_scoped(db.get_ref(), &user.0, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;
    let updated = appointment_db::update(db.get_ref(), appointment, body.into_inner()).await?;
    let mut resp = appointment_db::to_responses(db.get_ref(), vec![updated]).await?;
    Ok(HttpResponse::Ok().json(resp.pop()))
}

/// DELETE /api/auth/appointments/{id}/
pub async fn delete_appointment(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let id = path.into_inner();
    match appointment_db::get_scoped(db.get_ref(), &user.0, id).await {
        Ok(Some(_)) => match appointment_db::delete(db.get_ref(), id).await {
            Ok(_) => HttpResponse::NoContent().finish(),
            Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to delete appointment: {e}"),
            })),
        },
        Ok(None) => not_found(),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}
