use crate::errors::ApiError;
use crate::models::users::{self, Roles};

pub fn require_role(user: &users::Model, role: Roles, message: &str) -> Result<(), ApiError> {
    if user.role == role {
        Ok(())
    } else {
        Err(ApiError::forbidden(message))
    }
}

pub fn require_admin(user: &users::Model) -> Result<(), ApiError> {
    require_role(user, Roles::Admin, "Permission denied")
}

/// Whether `user` may see a record between `client_id` and `professional_id`.
/// Clients and professionals see their own side; admins see everything.
pub fn can_access_pair(user: &users::Model, client_id: uuid::Uuid, professional_id: uuid::Uuid) -> bool {
    match user.role {
        Roles::Client => user.id == client_id,
        Roles::Professional => user.id == professional_id,
        Roles::Admin => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: Roles) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: "u".into(),
            email: "u@example.com".into(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role,
            is_active: true,
            date_joined: chrono::Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn pair_access_follows_role() {
        let client = user(Roles::Client);
        let pro = user(Roles::Professional);
        let admin = user(Roles::Admin);

        assert!(can_access_pair(&client, client.id, pro.id));
        assert!(!can_access_pair(&client, Uuid::new_v4(), pro.id));
        assert!(can_access_pair(&pro, client.id, pro.id));
        assert!(!can_access_pair(&pro, client.id, Uuid::new_v4()));
        assert!(can_access_pair(&admin, Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn admin_guard() {
        assert!(require_admin(&user(Roles::Admin)).is_ok());
        assert!(matches!(
            require_admin(&user(Roles::Client)),
            Err(ApiError::Forbidden(_))
        ));
    }
}
