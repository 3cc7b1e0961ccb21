use sea_orm::*;
use uuid::Uuid;

use crate::db::users as user_db;
use crate::errors::ApiError;
use crate::models::journal_entries::{
    self, CreateJournalEntry, EntryType, JournalEntryResponse, JournalQuery, UpdateJournalEntry,
};
use crate::models::users;
use crate::storage::FileStorage;

const MEDIA_FOLDER: &str = "journal_media";

/// Entries authored by `professional_id`, newest first. `personal=true` keeps
/// entries not tied to a client; otherwise `client_id` narrows to one client.
pub async fn list(
    db: &DatabaseConnection,
    professional_id: Uuid,
    query: &JournalQuery,
) -> Result<Vec<JournalEntryResponse>, DbErr> {
    let mut select = journal_entries::Entity::find()
        .filter(journal_entries::Column::ProfessionalId.eq(professional_id));

    if query.personal() {
        select = select.filter(journal_entries::Column::ClientId.is_null());
    } else if let Some(client_id) = query.client_id {
        select = select.filter(journal_entries::Column::ClientId.eq(client_id));
    }

    let rows = select
        .order_by_desc(journal_entries::Column::CreatedAt)
        .all(db)
        .await?;
    to_responses(db, rows).await
}

pub async fn to_responses(
    db: &DatabaseConnection,
    rows: Vec<journal_entries::Model>,
) -> Result<Vec<JournalEntryResponse>, DbErr> {
    let names = user_db::users_by_ids(db, rows.iter().filter_map(|e| e.client_id)).await?;
    Ok(rows
        .into_iter()
        .map(|e| {
            let client_name = e.client_id.map(|id| user_db::name_of(&names, id));
            JournalEntryResponse::new(e, client_name)
        })
        .collect())
}

pub async fn create(
    db: &DatabaseConnection,
    storage: &dyn FileStorage,
    professional: &users::Model,
    input: CreateJournalEntry,
) -> Result<JournalEntryResponse, ApiError> {
    let client = match input.client {
        Some(id) => Some(
            user_db::get_user_by_id(db, id)
                .await?
                .ok_or_else(|| ApiError::bad_request("Client not found"))?,
        ),
        None => None,
    };

    let media_file = match &input.media_file {
        Some(file) => Some(storage.save(MEDIA_FOLDER, file).await?),
        None => None,
    };

    let now = chrono::Utc::now();
    let entry = journal_entries::ActiveModel {
        id: Set(Uuid::new_v4()),
        professional_id: Set(professional.id),
        client_id: Set(client.as_ref().map(|c| c.id)),
        title: Set(input.title),
        content: Set(input.content),
        media_file: Set(media_file),
        entry_type: Set(input.entry_type.unwrap_or(EntryType::Text)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    let client_name = client.map(|c| c.display_name());
    Ok(JournalEntryResponse::new(entry, client_name))
}

/// An entry, only if `professional_id` wrote it.
pub async fn get_own(
    db: &DatabaseConnection,
    professional_id: Uuid,
    id: Uuid,
) -> Result<journal_entries::Model, DbErr> {
    journal_entries::Entity::find_by_id(id)
        .filter(journal_entries::Column::ProfessionalId.eq(professional_id))
        .one(db)
        .await?
        .ok_or(DbErr::RecordNotFound("Journal entry not found".to_string()))
}

pub async fn update(
    db: &DatabaseConnection,
    entry: journal_entries::Model,
    input: UpdateJournalEntry,
) -> Result<journal_entries::Model, DbErr> {
    let mut active: journal_entries::ActiveModel = entry.into();
    if let Some(title) = input.title {
        active.title = Set(Some(title));
    }
    if let Some(content) = input.content {
        active.content = Set(Some(content));
    }
    if let Some(entry_type) = input.entry_type {
        active.entry_type = Set(entry_type);
    }
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    journal_entries::Entity::delete_by_id(id).exec(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::Roles;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn entry(professional_id: Uuid, client_id: Option<Uuid>) -> journal_entries::Model {
        let now = chrono::Utc::now();
        journal_entries::Model {
            id: Uuid::new_v4(),
            professional_id,
            client_id,
            title: Some("Session notes".into()),
            content: Some("Talked about sleep".into()),
            media_file: None,
            entry_type: EntryType::Text,
            created_at: now,
            updated_at: now,
        }
    }

    fn client(first: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: first.to_lowercase(),
            email: format!("{}@example.com", first.to_lowercase()),
            password_hash: "hash".into(),
            first_name: first.into(),
            last_name: String::new(),
            role: Roles::Client,
            is_active: true,
            date_joined: chrono::Utc::now(),
            updated_at: None,
        }
    }

    fn statements(db: DatabaseConnection) -> Vec<String> {
        db.into_transaction_log()
            .iter()
            .flat_map(|t| t.statements().iter().map(|s| s.sql.clone()))
            .collect()
    }

    #[tokio::test]
    async fn personal_entries_have_no_client() {
        let pro = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![entry(pro, None)]])
            .into_connection();

        let query = JournalQuery {
            client_id: Some(Uuid::new_v4()),
            personal: Some("true".into()),
        };
        let entries = list(&db, pro, &query).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].client_name, None);

        // personal wins over client_id, and no name lookup is needed
        let sql = statements(db);
        assert_eq!(sql.len(), 1);
        assert!(sql[0].contains(r#""journal_entries"."client_id" IS NULL"#));
        assert!(sql[0].contains(r#""created_at" DESC"#));
    }

    #[tokio::test]
    async fn client_filter_attaches_client_names() {
        let pro = Uuid::new_v4();
        let sara = client("Sara");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![entry(pro, Some(sara.id))]])
            .append_query_results([vec![sara.clone()]])
            .into_connection();

        let query = JournalQuery {
            client_id: Some(sara.id),
            personal: None,
        };
        let entries = list(&db, pro, &query).await.unwrap();
        assert_eq!(entries[0].client, Some(sara.id));
        assert_eq!(entries[0].client_name.as_deref(), Some("Sara"));

        let sql = statements(db);
        assert_eq!(sql.len(), 2);
        assert!(sql[0].contains(r#""journal_entries"."client_id" = $"#));
        assert!(!sql[0].contains("IS NULL"));
    }
}
