//! Authorization rule rights
//!
//! Configuration exposes rights as three booleans while the API takes a
//! list of `AccessRights`. `manage` is only valid together with `listen`
//! and `send`.

use std::collections::HashMap;

use azurerm_core::resource::{Resource, Value};

use super::models::AccessRights;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RightsFlags {
    pub listen: bool,
    pub send: bool,
    pub manage: bool,
}

impl RightsFlags {
    pub fn new(listen: bool, send: bool, manage: bool) -> Self {
        Self {
            listen,
            send,
            manage,
        }
    }

    /// Read the flags from a resource; unset flags are false
    pub fn from_resource(resource: &Resource) -> Self {
        Self {
            listen: resource.get_bool("listen").unwrap_or(false),
            send: resource.get_bool("send").unwrap_or(false),
            manage: resource.get_bool("manage").unwrap_or(false),
        }
    }

    /// API rights for the set flags, in listen, send, manage order
    pub fn expand(&self) -> Vec<AccessRights> {
        let mut rights = Vec::with_capacity(3);
        if self.listen {
            rights.push(AccessRights::Listen);
        }
        if self.send {
            rights.push(AccessRights::Send);
        }
        if self.manage {
            rights.push(AccessRights::Manage);
        }
        rights
    }

    /// Flags from API rights. Unknown rights are logged and skipped.
    pub fn flatten(rights: &[AccessRights]) -> Self {
        let mut flags = Self::default();
        for right in rights {
            match right {
                AccessRights::Listen => flags.listen = true,
                AccessRights::Send => flags.send = true,
                AccessRights::Manage => flags.manage = true,
                AccessRights::Other(value) => {
                    tracing::warn!(right = %value, "ignoring unknown access right");
                }
            }
        }
        flags
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.listen && !self.send && !self.manage {
            return Err(
                "One of the `listen`, `send` or `manage` properties needs to be set".to_string(),
            );
        }
        if self.manage && !(self.listen && self.send) {
            return Err(
                "if `manage` is set both `listen` and `send` must be set to true too".to_string(),
            );
        }
        Ok(())
    }

    pub fn write_attributes(&self, attributes: &mut HashMap<String, Value>) {
        attributes.insert("listen".to_string(), Value::Bool(self.listen));
        attributes.insert("send".to_string(), Value::Bool(self.send));
        attributes.insert("manage".to_string(), Value::Bool(self.manage));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn expand_keeps_fixed_order() {
        assert_eq!(
            RightsFlags::new(true, true, true).expand(),
            vec![AccessRights::Listen, AccessRights::Send, AccessRights::Manage]
        );
        assert_eq!(
            RightsFlags::new(false, true, false).expand(),
            vec![AccessRights::Send]
        );
        assert!(RightsFlags::default().expand().is_empty());
    }

    #[test]
    fn flatten_ignores_unknown_rights() {
        let flags = RightsFlags::flatten(&[
            AccessRights::Other("Observe".to_string()),
            AccessRights::Listen,
        ]);
        assert_eq!(flags, RightsFlags::new(true, false, false));
    }

    #[test]
    fn validation_rejects_no_rights() {
        assert!(RightsFlags::new(false, false, false).validate().is_err());
    }

    #[test]
    fn validation_rejects_manage_without_listen_and_send() {
        assert!(RightsFlags::new(false, true, true).validate().is_err());
        assert!(RightsFlags::new(false, false, true).validate().is_err());
        assert!(RightsFlags::new(true, false, true).validate().is_err());
        assert!(RightsFlags::new(true, true, true).validate().is_ok());
    }

    #[test]
    fn flags_are_read_from_resource() {
        let resource = Resource::new("relay_hybrid_connection_authorization_rule", "r")
            .with_attribute("listen", Value::Bool(true));
        assert_eq!(
            RightsFlags::from_resource(&resource),
            RightsFlags::new(true, false, false)
        );
    }

    proptest! {
        #[test]
        fn flatten_inverts_expand(listen: bool, send: bool, manage: bool) {
            let flags = RightsFlags::new(listen, send, manage);
            prop_assert_eq!(RightsFlags::flatten(&flags.expand()), flags);
        }

        #[test]
        fn manage_without_listen_is_rejected(send: bool) {
            prop_assert!(RightsFlags::new(false, send, true).validate().is_err());
        }
    }
}
