pub mod admin_commands;
pub mod file_commands;
pub mod navigation_commands;
pub mod notification_commands;
pub mod settings_commands;
