//! Built-in search patterns for Dutch company data

/// Dutch postal code, e.g. `1234 AB`
pub const ZIP: &str = r"\d{4}\s{0,1}[A-Z]{2}";

/// Chamber of Commerce (KvK) registration number, optionally dotted
pub const KVK: &str = r"\b([\d][\.]{0,1}){6,7}\d\b";

/// VAT (BTW) identification number, e.g. `NL123456789B01`
pub const BTW: &str = r"\bNL([\d][\.]{0,1}){9}B[\.]{0,1}([\d][\.]{0,1}){1}\d\b";

/// Names of every built-in preset
pub const PRESET_NAMES: &[&str] = &["zip", "kvk", "btw"];

/// Looks up a preset regex by name
pub fn preset(name: &str) -> Option<&'static str> {
    match name {
        "zip" => Some(ZIP),
        "kvk" => Some(KVK),
        "btw" => Some(BTW),
        _ => None,
    }
}
