//! Bridge from `accessgate_config::Settings` to domain types.
//!
//! The config crate has no dependencies on other internal crates, so the
//! translation into clock boundaries, durations and provider settings
//! happens here, once.

use accessgate_config::{BoundarySetting, Settings};
use accessgate_core::ExpiryBoundary;
use accessgate_guard::BlacklistConfig;
use accessgate_llm::ProviderConfig;
use chrono::Duration;

/// Convert the `[expiry]` boundary.
#[must_use]
pub fn to_expiry_boundary(setting: BoundarySetting) -> ExpiryBoundary {
    match setting {
        BoundarySetting::Inclusive => ExpiryBoundary::Inclusive,
        BoundarySetting::Exclusive => ExpiryBoundary::Exclusive,
    }
}

/// Convert the `[blacklist]` section.
#[must_use]
pub fn to_blacklist_config(settings: &Settings) -> BlacklistConfig {
    BlacklistConfig {
        duration: Duration::hours(i64::from(settings.blacklist.duration_hours)),
        warning_ttl: settings
            .blacklist
            .warning_ttl_hours
            .map(|h| Duration::hours(i64::from(h))),
        boundary: to_expiry_boundary(settings.expiry.boundary),
    }
}

/// The spending window from `[spending]`.
#[must_use]
pub fn spending_window(settings: &Settings) -> Duration {
    Duration::days(i64::from(settings.spending.window_days))
}

/// The session idle timeout from `[session]`.
#[must_use]
pub fn session_ttl(settings: &Settings) -> Duration {
    Duration::minutes(i64::from(settings.session.idle_ttl_minutes))
}

/// Convert the `[llm]` section to a [`ProviderConfig`].
#[must_use]
pub fn to_provider_config(api_key: impl Into<String>, settings: &Settings) -> ProviderConfig {
    let llm = &settings.llm;
    let mut provider = ProviderConfig::new(api_key, llm.model.clone())
        .max_tokens(llm.max_tokens)
        .temperature(llm.temperature);
    if let Some(url) = &llm.base_url {
        provider = provider.base_url(url.clone());
    }
    provider
}
