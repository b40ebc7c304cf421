pub mod activity;
pub mod navigation;
pub mod remote_item;
pub mod user;
