use sea_orm::*;
use uuid::Uuid;

use crate::db::{notifications, profiles};
use crate::errors::ApiError;
use crate::models::notifications::{self as notification_model, CreateNotification, KIND_VERIFICATION};
use crate::models::professional_profiles::{self, ReviewVerification, VerificationStatus};
use crate::models::users::{self, Roles, UserProfile, UserResponse};

/// Professionals awaiting review (or in any given state), oldest signup first.
pub async fn list_professionals(
    db: &DatabaseConnection,
    status: Option<VerificationStatus>,
) -> Result<Vec<UserResponse>, DbErr> {
    let mut query = users::Entity::find()
        .filter(users::Column::Role.eq(Roles::Professional))
        .find_also_related(professional_profiles::Entity);
    if let Some(status) = status {
        query = query.filter(professional_profiles::Column::VerificationStatus.eq(status));
    }

    let rows = query
        .order_by_asc(users::Column::DateJoined)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(user, profile)| UserResponse::new(user, profile.map(UserProfile::Professional)))
        .collect())
}

/// Message sent to the professional once a decision is recorded.
pub fn decision_notice(profile: &professional_profiles::Model) -> (String, String) {
    match profile.verification_status {
        VerificationStatus::Verified => (
            "Verification Approved".to_string(),
            "Your profile has been verified. Clients can now find and book you.".to_string(),
        ),
        VerificationStatus::Rejected => {
            let reason = profile
                .rejection_reason_type
                .map(|r| r.label())
                .unwrap_or("Other");
            let detail = profile
                .rejection_reason
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .map(|d| format!(" {d}"))
                .unwrap_or_default();
            (
                "Verification Rejected".to_string(),
                format!("Your verification was rejected: {reason}.{detail}"),
            )
        }
        VerificationStatus::Pending => (
            "Verification Pending".to_string(),
            "Your verification is back under review.".to_string(),
        ),
    }
}

/// Record an admin decision on a professional and notify them.
pub async fn review(
    db: &DatabaseConnection,
    user_id: Uuid,
    input: ReviewVerification,
) -> Result<(UserResponse, notification_model::Model), ApiError> {
    if input.status == VerificationStatus::Rejected && input.rejection_reason_type.is_none() {
        return Err(ApiError::bad_request(
            "rejection_reason_type is required when rejecting",
        ));
    }

    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .filter(|u| u.role == Roles::Professional)
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;

    let txn = db.begin().await?;
    let profile = match profiles::sync_profile(&txn, &user).await? {
        UserProfile::Professional(p) => p,
        _ => return Err(ApiError::not_found("Professional not found")),
    };

    let mut active: professional_profiles::ActiveModel = profile.into();
    active.verification_status = Set(input.status);
    active.verified = Set(input.status == VerificationStatus::Verified);
    match input.status {
        VerificationStatus::Rejected => {
            active.rejection_reason_type = Set(input.rejection_reason_type);
            active.rejection_reason = Set(input.rejection_reason);
        }
        _ => {
            active.rejection_reason_type = Set(None);
            active.rejection_reason = Set(None);
        }
    }
    let profile = active.update(&txn).await?;

    let (title, message) = decision_notice(&profile);
    let notification = notifications::create(
        &txn,
        CreateNotification {
            user_id: user.id,
            title,
            message,
            kind: KIND_VERIFICATION,
            link: Some("/profile".to_string()),
        },
    )
    .await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, status = ?profile.verification_status, "verification reviewed");
    Ok((
        UserResponse::new(user, Some(UserProfile::Professional(profile))),
        notification,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::professional_profiles::RejectionReason;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn profile(status: VerificationStatus) -> professional_profiles::Model {
        professional_profiles::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            phone: None,
            dob: None,
            specialization: None,
            bio: None,
            location: "Global".into(),
            languages: "English".into(),
            id_type: None,
            id_number: None,
            issuing_authority: None,
            profile_photo: None,
            id_image: None,
            id_image_back: None,
            certificates: None,
            has_documents: false,
            rating: rust_decimal::Decimal::new(500, 2),
            review_count: 0,
            sessions_completed: 0,
            is_online: false,
            verification_status: status,
            rejection_reason_type: None,
            rejection_reason: None,
            verified: status == VerificationStatus::Verified,
            balance: rust_decimal::Decimal::ZERO,
            total_earnings: rust_decimal::Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn rejection_requires_reason_type() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = review(
            &db,
            Uuid::new_v4(),
            ReviewVerification {
                status: VerificationStatus::Rejected,
                rejection_reason_type: None,
                rejection_reason: Some("blurry".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(db.into_transaction_log().is_empty());
    }

    #[test]
    fn rejection_notice_names_reason() {
        let mut p = profile(VerificationStatus::Rejected);
        p.rejection_reason_type = Some(RejectionReason::InvalidId);
        p.rejection_reason = Some("The ID has expired.".into());
        let (title, message) = decision_notice(&p);
        assert_eq!(title, "Verification Rejected");
        assert_eq!(
            message,
            "Your verification was rejected: Invalid or Expired ID. The ID has expired."
        );
    }

    #[test]
    fn approval_notice() {
        let (title, _) = decision_notice(&profile(VerificationStatus::Verified));
        assert_eq!(title, "Verification Approved");
    }
}
