use sea_orm::prelude::Expr;
use sea_orm::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::db::{connections, notifications, users as user_db};
use crate::errors::ApiError;
use crate::models::appointments::SessionType;
use crate::models::notifications::{CreateNotification, KIND_SERVICE_PROPOSAL};
use crate::models::service_proposals::{
    self, CreateProposal, ProposalAction, ProposalResponse, ProposalStatus,
};
use crate::models::service_requests::{
    self, CreateServiceRequest, RequestStatus, ServiceRequestResponse,
};
use crate::models::users::{self, Roles};
use crate::models::notifications as notification_model;

fn request_link(request_id: Uuid) -> String {
    format!("/service-requests/{request_id}")
}

pub async fn create_request(
    db: &DatabaseConnection,
    client: &users::Model,
    input: CreateServiceRequest,
) -> Result<ServiceRequestResponse, ApiError> {
    if [&input.title, &input.category, &input.description]
        .iter()
        .any(|v| v.trim().is_empty())
    {
        return Err(ApiError::bad_request(
            "title, category and description are required",
        ));
    }

    let request = service_requests::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(client.id),
        title: Set(input.title.trim().to_string()),
        category: Set(input.category.trim().to_string()),
        description: Set(input.description),
        preferred_session_type: Set(input.preferred_session_type.unwrap_or(SessionType::Video)),
        budget: Set(input.budget),
        status: Set(RequestStatus::Open),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;

    Ok(to_response(request, client.display_name(), Vec::new(), &HashMap::new()))
}

fn to_response(
    request: service_requests::Model,
    client_name: String,
    proposals: Vec<service_proposals::Model>,
    names: &HashMap<Uuid, users::Model>,
) -> ServiceRequestResponse {
    let proposals: Vec<ProposalResponse> = proposals
        .into_iter()
        .map(|p| {
            let name = user_db::name_of(names, p.professional_id);
            ProposalResponse::new(p, name)
        })
        .collect();

    ServiceRequestResponse {
        id: request.id,
        client: request.client_id,
        client_name,
        category: request.category,
        title: request.title,
        description: request.description,
        preferred_session_type: request.preferred_session_type,
        budget: request.budget,
        status: request.status,
        created_at: request.created_at,
        proposals_count: proposals.len(),
        proposals,
    }
}

/// Requests visible to `user`. Clients see their own with every proposal;
/// professionals see open requests and those they proposed on, with only
/// their own proposals attached.
pub async fn list_requests(
    db: &DatabaseConnection,
    user: &users::Model,
) -> Result<Vec<ServiceRequestResponse>, DbErr> {
    let mut query = service_requests::Entity::find();
    let mut proposals_query = service_proposals::Entity::find();

    match user.role {
        Roles::Client => {
            query = query.filter(service_requests::Column::ClientId.eq(user.id));
        }
        Roles::Professional => {
            let mine = service_proposals::Entity::find()
                .filter(service_proposals::Column::ProfessionalId.eq(user.id))
                .all(db)
                .await?;
            let proposed: HashSet<Uuid> = mine.iter().map(|p| p.request_id).collect();
            query = query.filter(
                Condition::any()
                    .add(service_requests::Column::Status.eq(RequestStatus::Open))
                    .add(service_requests::Column::Id.is_in(proposed)),
            );
            proposals_query =
                proposals_query.filter(service_proposals::Column::ProfessionalId.eq(user.id));
        }
        Roles::Admin => {}
    }

    let requests = query
        .order_by_desc(service_requests::Column::CreatedAt)
        .all(db)
        .await?;
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let proposals = proposals_query
        .filter(service_proposals::Column::RequestId.is_in(requests.iter().map(|r| r.id)))
        .order_by_asc(service_proposals::Column::CreatedAt)
        .all(db)
        .await?;

    let names = user_db::users_by_ids(
        db,
        requests
            .iter()
            .map(|r| r.client_id)
            .chain(proposals.iter().map(|p| p.professional_id)),
    )
    .await?;

    let mut by_request: HashMap<Uuid, Vec<service_proposals::Model>> = HashMap::new();
    for p in proposals {
        by_request.entry(p.request_id).or_default().push(p);
    }

    Ok(requests
        .into_iter()
        .map(|r| {
            let client_name = user_db::name_of(&names, r.client_id);
            let proposals = by_request.remove(&r.id).unwrap_or_default();
            to_response(r, client_name, proposals, &names)
        })
        .collect())
}

/// Propose on an open request and notify its client.
pub async fn create_proposal(
    db: &DatabaseConnection,
    professional: &users::Model,
    input: CreateProposal,
) -> Result<(ProposalResponse, notification_model::Model), ApiError> {
    let request = service_requests::Entity::find_by_id(input.request)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Service request not found"))?;
    if request.status != RequestStatus::Open {
        return Err(ApiError::bad_request(
            "This request is no longer accepting proposals.",
        ));
    }

    let existing = service_proposals::Entity::find()
        .filter(service_proposals::Column::RequestId.eq(request.id))
        .filter(service_proposals::Column::ProfessionalId.eq(professional.id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::bad_request(
            "You have already submitted a proposal for this request.",
        ));
    }

    let txn = db.begin().await?;
    let proposal = service_proposals::ActiveModel {
        id: Set(Uuid::new_v4()),
        request_id: Set(request.id),
        professional_id: Set(professional.id),
        message: Set(input.message),
        status: Set(ProposalStatus::Pending),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await?;

    let notification = notifications::create(
        &txn,
        CreateNotification {
            user_id: request.client_id,
            title: "New Proposal".to_string(),
            message: format!(
                "{} sent a proposal for \"{}\".",
                professional.display_name(),
                request.title
            ),
            kind: KIND_SERVICE_PROPOSAL,
            link: Some(request_link(request.id)),
        },
    )
    .await?;
    txn.commit().await?;

    Ok((
        ProposalResponse::new(proposal, professional.display_name()),
        notification,
    ))
}

/// Accept or reject a proposal on one of the caller's requests. Accepting
/// rejects the other pending proposals, assigns the request and connects
/// the pair.
pub async fn act_on_proposal(
    db: &DatabaseConnection,
    client: &users::Model,
    proposal_id: Uuid,
    action: ProposalAction,
) -> Result<(ProposalResponse, notification_model::Model), ApiError> {
    let proposal = service_proposals::Entity::find_by_id(proposal_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Proposal not found"))?;
    let request = service_requests::Entity::find_by_id(proposal.request_id)
        .one(db)
        .await?
        .filter(|r| r.client_id == client.id)
        .ok_or_else(|| ApiError::not_found("Proposal not found"))?;

    if proposal.status != ProposalStatus::Pending {
        return Err(ApiError::bad_request("This proposal has already been handled."));
    }
    if action == ProposalAction::Accept && request.status != RequestStatus::Open {
        return Err(ApiError::bad_request("This request is no longer open."));
    }

    let professional_id = proposal.professional_id;
    let txn = db.begin().await?;

    let (status, title, verb) = match action {
        ProposalAction::Accept => (ProposalStatus::Accepted, "Proposal Accepted", "accepted"),
        ProposalAction::Reject => (ProposalStatus::Rejected, "Proposal Declined", "declined"),
    };

    let mut active: service_proposals::ActiveModel = proposal.into();
    active.status = Set(status);
    let proposal = active.update(&txn).await?;

    if action == ProposalAction::Accept {
        service_proposals::Entity::update_many()
            .col_expr(
                service_proposals::Column::Status,
                Expr::value(ProposalStatus::Rejected.to_value()),
            )
            .filter(service_proposals::Column::RequestId.eq(request.id))
            .filter(service_proposals::Column::Id.ne(proposal.id))
            .filter(service_proposals::Column::Status.eq(ProposalStatus::Pending))
            .exec(&txn)
            .await?;

        let mut assigned: service_requests::ActiveModel = request.clone().into();
        assigned.status = Set(RequestStatus::Assigned);
        assigned.update(&txn).await?;

        connections::accept_between(&txn, client.id, professional_id).await?;
    }

    let notification = notifications::create(
        &txn,
        CreateNotification {
            user_id: professional_id,
            title: title.to_string(),
            message: format!(
                "{} {verb} your proposal for \"{}\".",
                client.display_name(),
                request.title
            ),
            kind: KIND_SERVICE_PROPOSAL,
            link: Some(request_link(request.id)),
        },
    )
    .await?;
    txn.commit().await?;

    tracing::info!(proposal_id = %proposal.id, ?action, "proposal handled");

    let names = user_db::users_by_ids(db, [professional_id]).await?;
    let name = user_db::name_of(&names, professional_id);
    Ok((ProposalResponse::new(proposal, name), notification))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user(role: Roles) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: "u".into(),
            email: "u@example.com".into(),
            password_hash: "hash".into(),
            first_name: "Meron".into(),
            last_name: "T".into(),
            role,
            is_active: true,
            date_joined: chrono::Utc::now(),
            updated_at: None,
        }
    }

    fn request(client_id: Uuid, status: RequestStatus) -> service_requests::Model {
        service_requests::Model {
            id: Uuid::new_v4(),
            client_id,
            title: "Grief counselling".into(),
            category: "grief".into(),
            description: "Looking for weekly sessions".into(),
            preferred_session_type: SessionType::Video,
            budget: None,
            status,
            created_at: chrono::Utc::now(),
        }
    }

    fn proposal(request_id: Uuid, professional_id: Uuid) -> service_proposals::Model {
        service_proposals::Model {
            id: Uuid::new_v4(),
            request_id,
            professional_id,
            message: "I can help".into(),
            status: ProposalStatus::Pending,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn proposals_on_closed_requests_are_rejected() {
        let pro = user(Roles::Professional);
        let closed = request(Uuid::new_v4(), RequestStatus::Assigned);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![closed.clone()]])
            .into_connection();

        let err = create_proposal(
            &db,
            &pro,
            CreateProposal {
                request: closed.id,
                message: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_proposal_is_rejected() {
        let pro = user(Roles::Professional);
        let open = request(Uuid::new_v4(), RequestStatus::Open);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![open.clone()]])
            .append_query_results([vec![proposal(open.id, pro.id)]])
            .into_connection();

        let err = create_proposal(
            &db,
            &pro,
            CreateProposal {
                request: open.id,
                message: "again".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m)
            if m == "You have already submitted a proposal for this request."));
    }

    #[tokio::test]
    async fn only_the_owning_client_can_act() {
        let owner = user(Roles::Client);
        let stranger = user(Roles::Client);
        let open = request(owner.id, RequestStatus::Open);
        let p = proposal(open.id, Uuid::new_v4());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![p.clone()]])
            .append_query_results([vec![open]])
            .into_connection();

        let err = act_on_proposal(&db, &stranger, p.id, ProposalAction::Accept)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn blank_request_fields_are_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = create_request(
            &db,
            &user(Roles::Client),
            CreateServiceRequest {
                title: " ".into(),
                category: "anxiety".into(),
                description: "help".into(),
                preferred_session_type: None,
                budget: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
