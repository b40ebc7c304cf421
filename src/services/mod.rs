pub mod activity_service;
pub mod folder_session;
pub mod graph_service;
pub mod navigator;
pub mod user_service;
