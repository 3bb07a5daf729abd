use std::env;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_NOTIFICATION_BUFFER: usize = 256;

/// How strictly prescription delivery updates must follow
/// `pending -> accepted -> out_for_delivery -> delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOrdering {
    /// Any move is accepted, including skips and reversals.
    Permissive,
    /// Only the next step (or a repeat of the current one) is accepted.
    Sequential,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_host: String,
    pub api_port: u16,
    pub allow_double_booking: bool,
    pub delivery_ordering: DeliveryOrdering,
    pub seed_demo_data: bool,
    pub notification_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_HOST.to_string(),
            api_port: DEFAULT_PORT,
            allow_double_booking: false,
            delivery_ordering: DeliveryOrdering::Permissive,
            seed_demo_data: false,
            notification_buffer: DEFAULT_NOTIFICATION_BUFFER,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            api_host: env::var("API_HOST")
                .unwrap_or_else(|_| {
                    warn!("API_HOST not set, using default");
                    defaults.api_host.clone()
                }),
            api_port: match env::var("API_PORT") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("API_PORT '{}' is not a valid port, using {}", raw, DEFAULT_PORT);
                    DEFAULT_PORT
                }),
                Err(_) => defaults.api_port,
            },
            allow_double_booking: env_flag("ALLOW_DOUBLE_BOOKING", defaults.allow_double_booking),
            delivery_ordering: match env::var("DELIVERY_ORDERING") {
                Ok(raw) => parse_delivery_ordering(&raw).unwrap_or_else(|| {
                    warn!("DELIVERY_ORDERING '{}' not recognised, using permissive", raw);
                    DeliveryOrdering::Permissive
                }),
                Err(_) => defaults.delivery_ordering,
            },
            seed_demo_data: env_flag("SEED_DEMO_DATA", defaults.seed_demo_data),
            notification_buffer: match env::var("NOTIFICATION_BUFFER") {
                Ok(raw) => match raw.parse::<usize>() {
                    Ok(size) if size > 0 => size,
                    _ => {
                        warn!("NOTIFICATION_BUFFER '{}' is invalid, using {}", raw, DEFAULT_NOTIFICATION_BUFFER);
                        DEFAULT_NOTIFICATION_BUFFER
                    }
                },
                Err(_) => defaults.notification_buffer,
            },
        };

        if config.allow_double_booking {
            warn!("Double booking protection is disabled");
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn is_sequential_delivery(&self) -> bool {
        self.delivery_ordering == DeliveryOrdering::Sequential
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
            warn!("{} '{}' is not a boolean, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_delivery_ordering(raw: &str) -> Option<DeliveryOrdering> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "permissive" => Some(DeliveryOrdering::Permissive),
        "sequential" | "strict" => Some(DeliveryOrdering::Sequential),
        _ => None,
    }
}
