//! Server Configuration

use std::path::PathBuf;

use retreat_core::FormVariant;
use retreat_payments::ProviderKind;

/// Where registrants and questions are kept
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetsBackend {
    Google,
    /// Process-local, lost on restart
    Memory,
}

/// Settings read once at startup
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Used to build provider callback URLs
    pub public_base_url: String,
    pub form_variant: FormVariant,
    /// Provider for card payments when the request names none
    pub card_provider: ProviderKind,
    pub sheets_backend: SheetsBackend,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            public_base_url: "http://localhost:3000".into(),
            form_variant: FormVariant::Basic,
            card_provider: ProviderKind::MercadoPago,
            sheets_backend: SheetsBackend::Google,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Unknown values fall back to the
    /// default with a warning.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |name: &str| get(name).filter(|v| !v.trim().is_empty());

        let form_variant = var("FORM_VARIANT").map_or(defaults.form_variant, |raw| {
            FormVariant::parse(raw.trim()).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown FORM_VARIANT, using basic");
                defaults.form_variant
            })
        });

        let card_provider = var("CARD_PROVIDER").map_or(defaults.card_provider, |raw| {
            ProviderKind::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown CARD_PROVIDER, using mercadopago");
                defaults.card_provider
            })
        });

        let sheets_backend = match var("SHEETS_BACKEND").as_deref().map(str::trim) {
            None | Some("google") => SheetsBackend::Google,
            Some("memory") => SheetsBackend::Memory,
            Some(other) => {
                tracing::warn!(value = %other, "Unknown SHEETS_BACKEND, using google");
                SheetsBackend::Google
            }
        };

        Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_base_url: var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            form_variant,
            card_provider,
            sheets_backend,
            static_dir: var("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.public_base_url, "http://localhost:3000");
        assert_eq!(config.form_variant, FormVariant::Basic);
        assert_eq!(config.card_provider, ProviderKind::MercadoPago);
        assert_eq!(config.sheets_backend, SheetsBackend::Google);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PUBLIC_BASE_URL", "https://retiro.example/"),
            ("FORM_VARIANT", "transport"),
            ("CARD_PROVIDER", "stripe"),
            ("SHEETS_BACKEND", "memory"),
        ]);
        assert_eq!(config.public_base_url, "https://retiro.example");
        assert_eq!(config.form_variant, FormVariant::Transport);
        assert_eq!(config.card_provider, ProviderKind::Stripe);
        assert_eq!(config.sheets_backend, SheetsBackend::Memory);
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let config = config(&[("FORM_VARIANT", "deluxe"), ("CARD_PROVIDER", "paypal")]);
        assert_eq!(config.form_variant, FormVariant::Basic);
        assert_eq!(config.card_provider, ProviderKind::MercadoPago);
    }
}
