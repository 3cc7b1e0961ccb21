use chrono::NaiveDateTime;
use sea_orm::prelude::Expr;
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::authorization::can_access_pair;
use crate::db::{profiles, users as user_db};
use crate::errors::ApiError;
use crate::models::appointments::{
    self, AppointmentResponse, CreateAppointment, SessionType, Status, UpdateAppointment,
};
use crate::models::users::{self, Roles};

/// Decide which active appointments to cancel at `now`: anything already in
/// the past, then every active booking of a (client, professional) pair
/// except the earliest created one.
pub fn plan_cleanup(active: &[appointments::Model], now: NaiveDateTime) -> Vec<Uuid> {
    let today = now.date();
    let current_time = now.time();
    let mut cancel = Vec::new();
    let mut pairs: HashMap<(Uuid, Uuid), Vec<&appointments::Model>> = HashMap::new();

    for appt in active.iter().filter(|a| a.status.is_active()) {
        if appt.date < today || (appt.date == today && appt.time < current_time) {
            cancel.push(appt.id);
        } else {
            pairs
                .entry((appt.client_id, appt.professional_id))
                .or_default()
                .push(appt);
        }
    }

    for group in pairs.values_mut().filter(|g| g.len() > 1) {
        group.sort_by_key(|a| (a.created_at, a.id));
        cancel.extend(group.iter().skip(1).map(|a| a.id));
    }

    cancel
}

/// Cancel stale and duplicate active appointments. Returns how many changed.
pub async fn cleanup(db: &DatabaseConnection, now: NaiveDateTime) -> Result<u64, DbErr> {
    let active = appointments::Entity::find()
        .filter(appointments::Column::Status.is_in(Status::ACTIVE))
        .all(db)
        .await?;

    let to_cancel = plan_cleanup(&active, now);
    if to_cancel.is_empty() {
        return Ok(0);
    }

    let result = appointments::Entity::update_many()
        .col_expr(
            appointments::Column::Status,
            Expr::value(Status::Cancelled.to_value()),
        )
        .filter(appointments::Column::Id.is_in(to_cancel))
        .exec(db)
        .await?;

    tracing::info!(cancelled = result.rows_affected, "appointment cleanup");
    Ok(result.rows_affected)
}

fn scoped(user: &users::Model) -> Select<appointments::Entity> {
    let query = appointments::Entity::find();
    match user.role {
        Roles::Client => query.filter(appointments::Column::ClientId.eq(user.id)),
        Roles::Professional => query.filter(appointments::Column::ProfessionalId.eq(user.id)),
        Roles::Admin => query,
    }
}

/// Run the cleanup, then list the appointments `user` may see by date and time.
pub async fn list_for(
    db: &DatabaseConnection,
    user: &users::Model,
    now: NaiveDateTime,
) -> Result<Vec<AppointmentResponse>, DbErr> {
    cleanup(db, now).await?;

    let rows = scoped(user)
        .order_by_asc(appointments::Column::Date)
        .order_by_asc(appointments::Column::Time)
        .all(db)
        .await?;

    to_responses(db, rows).await
}

pub async fn to_responses(
    db: &DatabaseConnection,
    rows: Vec<appointments::Model>,
) -> Result<Vec<AppointmentResponse>, DbErr> {
    let names = user_db::users_by_ids(
        db,
        rows.iter().flat_map(|a| [a.client_id, a.professional_id]),
    )
    .await?;
    let photos =
        profiles::professional_photos(db, rows.iter().map(|a| a.professional_id).collect()).await?;

    Ok(rows
        .into_iter()
        .map(|a| AppointmentResponse {
            id: a.id,
            client: a.client_id,
            professional: a.professional_id,
            client_name: user_db::name_of(&names, a.client_id),
            professional_name: user_db::name_of(&names, a.professional_id),
            professional_image: photos.get(&a.professional_id).cloned().flatten(),
            date: a.date,
            time: a.time,
            status: a.status,
            session_type: a.session_type,
            notes: a.notes,
            created_at: a.created_at,
        })
        .collect())
}

/// Whether the pair already has a pending or upcoming appointment.
pub async fn has_active(
    db: &DatabaseConnection,
    client_id: Uuid,
    professional_id: Uuid,
) -> Result<bool, DbErr> {
    Ok(appointments::Entity::find()
        .filter(appointments::Column::ClientId.eq(client_id))
        .filter(appointments::Column::ProfessionalId.eq(professional_id))
        .filter(appointments::Column::Status.is_in(Status::ACTIVE))
        .one(db)
        .await?
        .is_some())
}

/// Book an appointment with the caller as client.
pub async fn create(
    db: &DatabaseConnection,
    client: &users::Model,
    input: CreateAppointment,
) -> Result<appointments::Model, ApiError> {
    if !user_db::is_professional(db, input.professional).await? {
        return Err(ApiError::bad_request("Selected user is not a professional."));
    }

    // Not locked: two concurrent requests can both pass this check.
    if has_active(db, client.id, input.professional).await? {
        return Err(ApiError::bad_request(
            "You already have an active appointment with this professional.",
        ));
    }

    let appointment = appointments::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(client.id),
        professional_id: Set(input.professional),
        date: Set(input.date),
        time: Set(input.time),
        status: Set(Status::Pending),
        session_type: Set(input.session_type.unwrap_or(SessionType::Video)),
        notes: Set(input.notes),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;

    tracing::info!(appointment_id = %appointment.id, "appointment booked");
    Ok(appointment)
}

/// Fetch an appointment if `user` is allowed to see it.
pub async fn get_scoped(
    db: &DatabaseConnection,
    user: &users::Model,
    id: Uuid,
) -> Result<Option<appointments::Model>, DbErr> {
    Ok(appointments::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|a| can_access_pair(user, a.client_id, a.professional_id)))
}

pub async fn update(
    db: &DatabaseConnection,
    appointment: appointments::Model,
    input: UpdateAppointment,
) -> Result<appointments::Model, DbErr> {
    let mut active: appointments::ActiveModel = appointment.into();

    if let Some(date) = input.date {
        active.date = Set(date);
    }
    if let Some(time) = input.time {
        active.time = Set(time);
    }
    if let Some(status) = input.status {
        active.status = Set(status);
    }
    if let Some(session_type) = input.session_type {
        active.session_type = Set(session_type);
    }
    if let Some(notes) = input.notes {
        active.notes = Set(Some(notes));
    }

    active.update(db).await
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    appointments::Entity::delete_by_id(id).exec(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn appt(
        client: Uuid,
        professional: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        created_minutes: i64,
    ) -> appointments::Model {
        appointments::Model {
            id: Uuid::new_v4(),
            client_id: client,
            professional_id: professional,
            date,
            time,
            status: Status::Pending,
            session_type: SessionType::Video,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
                + Duration::minutes(created_minutes),
        }
    }

    fn user(role: Roles, first: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: first.to_lowercase(),
            email: format!("{}@example.com", first.to_lowercase()),
            password_hash: "hash".into(),
            first_name: first.into(),
            last_name: String::new(),
            role,
            is_active: true,
            date_joined: Utc::now(),
            updated_at: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn at(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn past_appointments_are_cancelled() {
        let (c, p) = (Uuid::new_v4(), Uuid::new_v4());
        let yesterday = appt(c, p, day(9), at(15), 0);
        let earlier_today = appt(c, Uuid::new_v4(), day(10), at(11), 0);
        let later_today = appt(c, Uuid::new_v4(), day(10), at(13), 0);

        let plan = plan_cleanup(&[yesterday.clone(), earlier_today.clone(), later_today], now());
        assert_eq!(plan.len(), 2);
        assert!(plan.contains(&yesterday.id));
        assert!(plan.contains(&earlier_today.id));
    }

    #[test]
    fn duplicates_keep_earliest_created() {
        let (c, p) = (Uuid::new_v4(), Uuid::new_v4());
        let second = appt(c, p, day(12), at(9), 10);
        let first = appt(c, p, day(20), at(9), 0);
        let third = appt(c, p, day(11), at(9), 20);
        let other_pair = appt(c, Uuid::new_v4(), day(12), at(9), 5);

        let plan = plan_cleanup(
            &[second.clone(), first.clone(), third.clone(), other_pair.clone()],
            now(),
        );
        assert_eq!(plan.len(), 2);
        assert!(plan.contains(&second.id));
        assert!(plan.contains(&third.id));
        assert!(!plan.contains(&first.id));
        assert!(!plan.contains(&other_pair.id));
    }

    #[test]
    fn non_active_rows_are_ignored() {
        let mut done = appt(Uuid::new_v4(), Uuid::new_v4(), day(1), at(9), 0);
        done.status = Status::Completed;
        assert!(plan_cleanup(&[done], now()).is_empty());
    }

    #[tokio::test]
    async fn listing_cancels_past_pending_appointment() {
        let client = user(Roles::Client, "Sara");
        let pro = user(Roles::Professional, "Dawit");
        let past = appt(client.id, pro.id, day(1), at(10), 0);
        let mut cancelled = past.clone();
        cancelled.status = Status::Cancelled;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![past.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![cancelled]])
            .append_query_results([vec![client.clone(), pro.clone()]])
            .append_query_results([Vec::<crate::models::professional_profiles::Model>::new()])
            .into_connection();

        let listed = list_for(&db, &client, now()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, past.id);
        assert_eq!(listed[0].status, Status::Cancelled);
        assert_eq!(listed[0].client_name, "Sara");
        assert_eq!(listed[0].professional_name, "Dawit");

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("UPDATE"));
        assert!(log.contains("cancelled"));
    }

    #[tokio::test]
    async fn second_active_booking_is_rejected() {
        let client = user(Roles::Client, "Sara");
        let pro = user(Roles::Professional, "Dawit");
        let existing = appt(client.id, pro.id, day(20), at(10), 0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pro.clone()]])
            .append_query_results([vec![existing]])
            .into_connection();

        let err = create(
            &db,
            &client,
            CreateAppointment {
                professional: pro.id,
                date: day(21),
                time: at(10),
                session_type: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();

        match err {
            ApiError::BadRequest(msg) => assert_eq!(
                msg,
                "You already have an active appointment with this professional."
            ),
            other => panic!("unexpected error: {other:?}"),
        }

        let log = format!("{:?}", db.into_transaction_log());
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn booking_with_non_professional_is_rejected() {
        let client = user(Roles::Client, "Sara");
        let other_client = user(Roles::Client, "Hana");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![other_client.clone()]])
            .into_connection();

        let err = create(
            &db,
            &client,
            CreateAppointment {
                professional: other_client.id,
                date: day(21),
                time: at(10),
                session_type: Some(SessionType::Chat),
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
