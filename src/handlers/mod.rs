pub mod admin;
pub mod ai_chat;
pub mod appointments;
pub mod auth;
pub mod connections;
pub mod marketplace;
pub mod messaging;
pub mod payments;
pub mod users;
pub mod wellness;

use actix_web::web;

use crate::realtime::session;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            // ── Accounts ──
            .route("/register/", web::post().to(auth::register))
            .route("/login/", web::post().to(auth::login))
            .route("/token/refresh/", web::post().to(auth::refresh))
            .service(
                web::resource("/me/")
                    .route(web::get().to(auth::me))
                    .route(web::put().to(auth::update_me))
                    .route(web::patch().to(auth::update_me)),
            )
            // ── Directory ──
            .service(
                web::resource("/users/")
                    .route(web::get().to(users::get_users))
                    .route(web::patch().to(users::patch_user)),
            )
            .route("/users/detail/{id}/", web::get().to(users::get_user_detail))
            .route("/professionals/", web::get().to(users::get_professionals))
            .route("/clients/", web::get().to(users::get_clients))
            .route("/status/online/", web::post().to(users::set_online_status))
            .route("/zego-token/", web::get().to(users::zego_token))
            // ── Appointments ──
            .service(
                web::resource("/appointments/")
                    .route(web::get().to(appointments::get_appointments))
                    .route(web::post().to(appointments::create_appointment)),
            )
            .service(
                web::resource("/appointments/{id}/")
                    .route(web::get().to(appointments::get_appointment))
                    .route(web::put().to(appointments::update_appointment))
                    .route(web::patch().to(appointments::update_appointment))
                    .route(web::delete().to(appointments::delete_appointment)),
            )
            // ── Connections ──
            .service(
                web::resource("/connections/")
                    .route(web::get().to(connections::get_connections))
                    .route(web::post().to(connections::create_connection)),
            )
            .service(
                web::resource("/connections/{id}/")
                    .route(web::get().to(connections::get_connection))
                    .route(web::put().to(connections::update_connection))
                    .route(web::patch().to(connections::update_connection))
                    .route(web::delete().to(connections::delete_connection)),
            )
            // ── Messaging & notifications ──
            .route("/notifications/", web::get().to(messaging::get_notifications))
            .route(
                "/notifications/{id}/read/",
                web::post().to(messaging::mark_notification_read),
            )
            .service(
                web::resource("/messages/")
                    .route(web::get().to(messaging::get_conversation))
                    .route(web::post().to(messaging::send_message)),
            )
            .route("/live/initiate/", web::post().to(messaging::initiate_live_session))
            .route("/ws/", web::get().to(session::ws_connect))
            // ── Wellness ──
            .service(
                web::resource("/mood-updates/")
                    .route(web::get().to(wellness::get_mood_updates))
                    .route(web::post().to(wellness::create_mood_update)),
            )
            .service(
                web::resource("/journal-entries/")
                    .route(web::get().to(wellness::get_journal_entries))
                    .route(web::post().to(wellness::create_journal_entry)),
            )
            .service(
                web::resource("/journal-entries/{id}/")
                    .route(web::get().to(wellness::get_journal_entry))
                    .route(web::put().to(wellness::update_journal_entry))
                    .route(web::patch().to(wellness::update_journal_entry))
                    .route(web::delete().to(wellness::delete_journal_entry)),
            )
            // ── AI chat ──
            .route("/ai-chat/", web::post().to(ai_chat::ai_chat))
            .route("/chat-sessions/", web::get().to(ai_chat::get_sessions))
            .service(
                web::resource("/chat-sessions/{id}/")
                    .route(web::get().to(ai_chat::get_session))
                    .route(web::put().to(ai_chat::update_session))
                    .route(web::patch().to(ai_chat::update_session))
                    .route(web::delete().to(ai_chat::delete_session)),
            )
            // ── Payments & payouts ──
            .route("/payment/initialize/", web::post().to(payments::initialize_payment))
            .route("/payment/verify/{tx_ref}/", web::get().to(payments::verify_payment))
            .route(
                "/payment/callback/{tx_ref}/",
                web::post().to(payments::payment_callback),
            )
            .route("/payment/history/", web::get().to(payments::payment_history))
            .route("/payout/withdraw/", web::post().to(payments::request_withdrawal))
            .route("/payout/earnings/", web::get().to(payments::earnings))
            .route("/payout/banks/", web::get().to(payments::banks))
            // ── Marketplace ──
            .service(
                web::resource("/service-requests/")
                    .route(web::get().to(marketplace::get_service_requests))
                    .route(web::post().to(marketplace::create_service_request)),
            )
            .route("/service-proposals/", web::post().to(marketplace::create_proposal))
            .route(
                "/service-proposals/{id}/action/",
                web::post().to(marketplace::proposal_action),
            )
            // ── Verification review ──
            .route("/admin/professionals/", web::get().to(admin::get_professionals))
            .route(
                "/admin/professionals/{id}/verification/",
                web::post().to(admin::review_verification),
            ),
    );
}
