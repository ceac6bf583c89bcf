use crate::bytes::encrypt_password;
use crate::declar::auth_plugin_names::AuthPlugin;

/// Answer to an auth switch request: the auth response computed with the new challenge, sent as is.
pub struct AuthPluginSwitchCommand {
    pub auth_response: Vec<u8>,
}

impl AuthPluginSwitchCommand {
    pub fn new(password: &str, scramble: &[u8], auth_plugin: AuthPlugin) -> Self {
        Self {
            auth_response: encrypt_password(password, scramble, &auth_plugin),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.auth_response.clone()
    }
}
