pub mod auth_plugin_switch_command;
pub mod authenticate_command;
pub mod command;
pub mod ssl_request_command;
