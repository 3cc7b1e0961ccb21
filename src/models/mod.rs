pub mod admin_profiles;
pub mod appointments;
pub mod chat_messages;
pub mod chat_sessions;
pub mod client_profiles;
pub mod connections;
pub mod direct_messages;
pub mod journal_entries;
pub mod mood_updates;
pub mod notifications;
pub mod payments;
pub mod professional_profiles;
pub mod service_proposals;
pub mod service_requests;
pub mod users;
pub mod withdrawals;
