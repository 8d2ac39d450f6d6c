use std::collections::HashMap;
use std::fs;
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use unic_langid::LanguageIdentifier;

/// Locale of every user-facing string. Option labels are not localized:
/// they are matching identity and live in the dialog graph's option table.
const LOCALE: &str = "ru";

/// Localization manager holding the loaded Fluent bundle. Uses the
/// concurrent bundle so the manager can live in a process-wide `OnceLock`.
pub struct LocalizationManager {
    bundle: FluentBundle<FluentResource>,
}

impl LocalizationManager {
    /// Load `locales/ru/main.ftl` relative to the working directory.
    pub fn new() -> Result<Self> {
        let locale: LanguageIdentifier = LOCALE.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);

        let resource_path = format!("./locales/{LOCALE}/main.ftl");
        let content = fs::read_to_string(&resource_path)
            .map_err(|e| anyhow!("cannot read {resource_path}: {e}"))?;
        let resource = FluentResource::try_new(content)
            .map_err(|(_, errors)| anyhow!("cannot parse {resource_path}: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("cannot load {resource_path}: {errors:?}"))?;

        Ok(Self { bundle })
    }

    /// Get a localized message
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        let msg = match self.bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut value = String::new();

        if let Some(args) = args {
            let fluent_args =
                FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))));
            let _ = self
                .bundle
                .write_pattern(&mut value, pattern, Some(&fluent_args), &mut vec![]);
        } else {
            let _ = self
                .bundle
                .write_pattern(&mut value, pattern, None, &mut vec![]);
        }

        value
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message(key, Some(&args_map))
    }
}

static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager
pub fn init_localization() -> Result<()> {
    let manager = LocalizationManager::new()?;
    let _ = LOCALIZATION_MANAGER.set(manager);
    Ok(())
}

fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER
        .get()
        .expect("Localization manager not initialized")
}

/// Convenience function to get a localized message
pub fn t(key: &str) -> String {
    get_localization_manager().get_message(key, None)
}

/// Convenience function to get a localized message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    get_localization_manager().get_message_with_args(key, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_bundle_and_resolves_keys() {
        init_localization().unwrap();

        let greeting = t("greeting");
        assert!(!greeting.is_empty());
        assert!(!greeting.starts_with("Missing translation"));
    }

    #[test]
    fn unknown_key_is_reported_not_panicked() {
        init_localization().unwrap();

        assert_eq!(
            t("definitely-not-a-key"),
            "Missing translation: definitely-not-a-key"
        );
    }

    #[test]
    fn arguments_are_substituted() {
        init_localization().unwrap();

        let message = t_args("admin-upload-saved", &[("key", "shampoo_color")]);
        assert!(message.contains("shampoo_color"));
    }
}
