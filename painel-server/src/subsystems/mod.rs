pub mod chat;
pub mod companies;
pub mod dashboard;
pub mod import;
pub mod intent;
pub mod projects;
