//! Record builders

use dredger_api::{Configuration, ConfigurationSpec, ObjectKey};

/// A spec for `target` with the given content.
pub fn spec(
    target: &str,
    content: &str,
    create: bool,
    permission: Option<u32>,
) -> ConfigurationSpec {
    ConfigurationSpec {
        target_name: target.to_string(),
        content: content.to_string(),
        create,
        permission,
    }
}

/// A fresh, never-stored record in the `default` namespace.
pub fn configuration(name: &str, spec: ConfigurationSpec) -> Configuration {
    Configuration::new(&ObjectKey::namespaced("default", name), spec)
}
