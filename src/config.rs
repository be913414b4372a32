//! Typed settings read from the process environment.
//!
//! The snapshot is built once at startup and shared through `AppState`.
//! Every field has a default so a missing or malformed variable never
//! prevents the server from starting; use the `validate_*` reports to decide
//! whether a subsystem is usable.

use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_BUCKET: &str = "order-documents";
pub const DEFAULT_OUTPUT_DIR: &str = "./generated-documents";

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub service_role_key: String,
    pub database_url: String,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub bucket: String,
    /// Empty means "derive from the Supabase URL".
    pub public_url: String,
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct DocumentSettings {
    pub enabled: bool,
    pub receipts: bool,
    pub pick_slips: bool,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub enabled: bool,
    pub api_key: String,
    pub from: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub enabled: bool,
    pub secret: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DebugSettings {
    pub documents: bool,
    pub emails: bool,
    pub webhooks: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    pub storage: StorageSettings,
    pub documents: DocumentSettings,
    pub email: EmailSettings,
    pub webhooks: WebhookSettings,
    pub debug: DebugSettings,
}

/// Outcome of a subsystem configuration check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => v.trim().eq_ignore_ascii_case("true"),
        None => default,
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &str, default: bool| parse_bool(lookup(key), default);

        Settings {
            server: ServerSettings {
                host: string("SERVER_HOST", "0.0.0.0"),
                port: parse_number(lookup("SERVER_PORT"), 8080),
            },
            supabase: SupabaseSettings {
                url: string("SUPABASE_URL", "").trim_end_matches('/').to_string(),
                service_role_key: string("SUPABASE_SERVICE_ROLE_KEY", ""),
                database_url: string("SUPABASE_DATABASE_URL", ""),
            },
            storage: StorageSettings {
                bucket: string("STORAGE_BUCKET", DEFAULT_BUCKET),
                public_url: string("STORAGE_PUBLIC_URL", "")
                    .trim_end_matches('/')
                    .to_string(),
                output_dir: string("DOCUMENT_OUTPUT_DIR", DEFAULT_OUTPUT_DIR),
            },
            documents: DocumentSettings {
                enabled: flag("ENABLE_DOCUMENT_GENERATION", true),
                receipts: flag("ENABLE_RECEIPT_GENERATION", true),
                pick_slips: flag("ENABLE_PICK_SLIP_GENERATION", true),
                timeout_ms: parse_number(lookup("DOCUMENT_GENERATION_TIMEOUT_MS"), 30_000),
                max_retries: parse_number(lookup("MAX_DOCUMENT_RETRIES"), 3),
            },
            email: EmailSettings {
                enabled: flag("ENABLE_EMAIL_NOTIFICATIONS", false),
                api_key: string("EMAIL_API_KEY", ""),
                from: string("EMAIL_FROM", ""),
                timeout_ms: parse_number(lookup("EMAIL_TIMEOUT_MS"), 10_000),
                max_retries: parse_number(lookup("MAX_EMAIL_RETRIES"), 3),
            },
            webhooks: WebhookSettings {
                enabled: flag("ENABLE_WEBHOOK_PROCESSING", false),
                secret: string("WEBHOOK_SECRET", ""),
                timeout_ms: parse_number(lookup("WEBHOOK_TIMEOUT_MS"), 15_000),
            },
            debug: DebugSettings {
                documents: flag("DEBUG_DOCUMENTS", false),
                emails: flag("DEBUG_EMAILS", false),
                webhooks: flag("DEBUG_WEBHOOKS", false),
            },
        }
    }

    pub fn can_generate_documents(&self) -> bool {
        self.documents.enabled
    }

    pub fn can_generate_receipts(&self) -> bool {
        self.documents.enabled && self.documents.receipts
    }

    pub fn can_generate_pick_slips(&self) -> bool {
        self.documents.enabled && self.documents.pick_slips
    }

    pub fn can_send_emails(&self) -> bool {
        self.email.enabled
    }

    pub fn can_process_webhooks(&self) -> bool {
        self.webhooks.enabled
    }

    pub fn document_timeout(&self) -> Duration {
        Duration::from_millis(self.documents.timeout_ms)
    }

    /// Base URL public object links are built from.
    pub fn public_storage_base(&self) -> String {
        if self.storage.public_url.is_empty() {
            format!(
                "{}/storage/v1/object/public/{}",
                self.supabase.url, self.storage.bucket
            )
        } else {
            self.storage.public_url.clone()
        }
    }

    pub fn validate_email_config(&self) -> ValidationReport {
        let mut errors = Vec::new();
        if self.email.enabled {
            if self.email.api_key.is_empty() {
                errors.push("EMAIL_API_KEY is required when email notifications are enabled".to_string());
            }
            if self.email.from.is_empty() {
                errors.push("EMAIL_FROM is required when email notifications are enabled".to_string());
            } else if !self.email.from.contains('@') {
                errors.push(format!("EMAIL_FROM '{}' is not an email address", self.email.from));
            }
        }
        if self.email.timeout_ms == 0 {
            errors.push("EMAIL_TIMEOUT_MS must be greater than zero".to_string());
        }
        ValidationReport::from_errors(errors)
    }

    pub fn validate_webhook_config(&self) -> ValidationReport {
        let mut errors = Vec::new();
        if self.webhooks.enabled && self.webhooks.secret.is_empty() {
            errors.push("WEBHOOK_SECRET should be set when webhook processing is enabled".to_string());
        }
        if self.webhooks.timeout_ms == 0 {
            errors.push("WEBHOOK_TIMEOUT_MS must be greater than zero".to_string());
        }
        ValidationReport::from_errors(errors)
    }

    pub fn validate_storage_config(&self) -> ValidationReport {
        let mut errors = Vec::new();
        if self.supabase.url.is_empty() {
            errors.push("SUPABASE_URL is required for document storage".to_string());
        } else if !self.supabase.url.starts_with("http") {
            errors.push(format!("SUPABASE_URL '{}' must be an http(s) URL", self.supabase.url));
        }
        if self.supabase.service_role_key.is_empty() {
            errors.push("SUPABASE_SERVICE_ROLE_KEY is required for document storage".to_string());
        }
        if self.storage.bucket.trim().is_empty() {
            errors.push("STORAGE_BUCKET must not be empty".to_string());
        }
        ValidationReport::from_errors(errors)
    }
}
