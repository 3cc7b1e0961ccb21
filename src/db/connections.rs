use sea_orm::*;
use uuid::Uuid;

use crate::auth::authorization::can_access_pair;
use crate::db::users as user_db;
use crate::errors::ApiError;
use crate::models::connections::{self, ConnectionResponse, CreateConnection, Status};
use crate::models::users::{self, Roles};

fn scoped(user: &users::Model) -> Select<connections::Entity> {
    let query = connections::Entity::find();
    match user.role {
        Roles::Client => query.filter(connections::Column::ClientId.eq(user.id)),
        Roles::Professional => query.filter(connections::Column::ProfessionalId.eq(user.id)),
        Roles::Admin => query,
    }
}

pub async fn to_responses(
    db: &DatabaseConnection,
    rows: Vec<connections::Model>,
) -> Result<Vec<ConnectionResponse>, DbErr> {
    let names = user_db::users_by_ids(
        db,
        rows.iter().flat_map(|c| [c.client_id, c.professional_id]),
    )
    .await?;

    Ok(rows
        .into_iter()
        .map(|c| ConnectionResponse {
            id: c.id,
            client: c.client_id,
            professional: c.professional_id,
            client_name: user_db::name_of(&names, c.client_id),
            professional_name: user_db::name_of(&names, c.professional_id),
            status: c.status,
            created_at: c.created_at,
        })
        .collect())
}

pub async fn list_for(
    db: &DatabaseConnection,
    user: &users::Model,
) -> Result<Vec<ConnectionResponse>, DbErr> {
    let rows = scoped(user)
        .order_by_desc(connections::Column::CreatedAt)
        .all(db)
        .await?;
    to_responses(db, rows).await
}

pub async fn find_pair<C: ConnectionTrait>(
    conn: &C,
    client_id: Uuid,
    professional_id: Uuid,
) -> Result<Option<connections::Model>, DbErr> {
    connections::Entity::find()
        .filter(connections::Column::ClientId.eq(client_id))
        .filter(connections::Column::ProfessionalId.eq(professional_id))
        .one(conn)
        .await
}

/// Request a connection with the caller as client.
pub async fn create(
    db: &DatabaseConnection,
    client: &users::Model,
    input: CreateConnection,
) -> Result<connections::Model, ApiError> {
    if !user_db::is_professional(db, input.professional).await? {
        return Err(ApiError::bad_request("Selected user is not a professional."));
    }
    if find_pair(db, client.id, input.professional).await?.is_some() {
        return Err(ApiError::bad_request(
            "A connection with this professional already exists.",
        ));
    }

    let now = chrono::Utc::now();
    let connection = connections::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(client.id),
        professional_id: Set(input.professional),
        status: Set(Status::Pending),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(connection)
}

/// Create the pair's connection as accepted, or accept the existing one.
pub async fn accept_between<C: ConnectionTrait>(
    conn: &C,
    client_id: Uuid,
    professional_id: Uuid,
) -> Result<connections::Model, DbErr> {
    let now = chrono::Utc::now();
    match find_pair(conn, client_id, professional_id).await? {
        Some(existing) if existing.status == Status::Accepted => Ok(existing),
        Some(existing) => {
            let mut active: connections::ActiveModel = existing.into();
            active.status = Set(Status::Accepted);
            active.updated_at = Set(now);
            active.update(conn).await
        }
        None => {
            connections::ActiveModel {
                id: Set(Uuid::new_v4()),
                client_id: Set(client_id),
                professional_id: Set(professional_id),
                status: Set(Status::Accepted),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(conn)
            .await
        }
    }
}

pub async fn get_scoped(
    db: &DatabaseConnection,
    user: &users::Model,
    id: Uuid,
) -> Result<Option<connections::Model>, DbErr> {
    Ok(connections::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|c| can_access_pair(user, c.client_id, c.professional_id)))
}

pub async fn update_status(
    db: &DatabaseConnection,
    connection: connections::Model,
    status: Status,
) -> Result<connections::Model, DbErr> {
    let mut active: connections::ActiveModel = connection.into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    connections::Entity::delete_by_id(id).exec(db).await
}
