//! Keyword price table for hardware requests.
//!
//! Entries are checked in order against the lower-cased item text and the
//! first hit wins, so more specific keywords come first.

use accessgate_core::Intent;

/// Cost used when no keyword matches.
pub const DEFAULT_HARDWARE_COST: f64 = 500.0;

const PRICE_TABLE: &[(&[&str], f64)] = &[
    (&["macbook pro"], 2500.0),
    (&["macbook air"], 1200.0),
    (&["macbook"], 2000.0),
    (&["thinkpad"], 1500.0),
    (&["4k monitor", "4k display"], 800.0),
    (&["monitor", "display"], 400.0),
    (&["iphone"], 1000.0),
    (&["ipad"], 800.0),
    (&["headset", "headphones"], 250.0),
    (&["keyboard"], 150.0),
    (&["mouse"], 80.0),
];

/// Estimated dollar cost of an item description.
#[must_use]
pub fn estimate_item_cost(item: &str) -> f64 {
    let item = item.to_lowercase();
    PRICE_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| item.contains(k)))
        .map_or(DEFAULT_HARDWARE_COST, |(_, price)| *price)
}

/// Estimated cost of a hardware intent, read from its target resource.
#[must_use]
pub fn estimate_hardware_cost(intent: &Intent) -> f64 {
    intent
        .target_resource
        .as_deref()
        .map_or(DEFAULT_HARDWARE_COST, estimate_item_cost)
}
