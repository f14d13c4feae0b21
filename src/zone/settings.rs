//! Zone settings codec.
//!
//! Cloudflare exposes zone settings as a flat list of `{id, value, editable}`
//! entries. [`ZoneSettings`] is the structured form users write in the
//! resource; [`ZoneSettingsMap`] is the untyped `id -> value` form used to talk
//! to the API and to compute the minimal set of changes.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::warn;

use crate::cf_client::{ZoneSetting, ZoneSettingItem};

/// Setting ID to raw value
pub type ZoneSettingsMap = BTreeMap<String, Value>;

/// Declares the structured settings object together with its setting IDs and
/// both directions of the map conversion.
macro_rules! zone_settings {
    ($( $(#[$doc:meta])* $field:ident: $ty:ty => $id:ident = $wire:literal, )*) => {
        /// Setting identifiers understood by the zone settings API
        pub mod setting_id {
            $( pub const $id: &str = $wire; )*
        }

        /// Every setting ID the structured object knows about
        pub const SETTING_IDS: &[&str] = &[$( $wire ),*];

        #[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
        #[serde(rename_all = "camelCase")]
        pub struct ZoneSettings {
            $(
                $(#[$doc])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        /// Map the set fields of `settings` to their setting IDs; unset fields are skipped.
        pub fn zone_to_settings_map(settings: &ZoneSettings) -> ZoneSettingsMap {
            let mut map = ZoneSettingsMap::new();
            $(
                if let Some(value) = &settings.$field {
                    insert(&mut map, $wire, value);
                }
            )*
            map
        }

        /// Build the structured object from a map; unknown IDs and mistyped values are ignored.
        pub fn settings_map_to_zone(map: &ZoneSettingsMap) -> ZoneSettings {
            ZoneSettings {
                $( $field: extract(map, $wire), )*
            }
        }
    };
}

zone_settings! {
    advanced_ddos: String => ADVANCED_DDOS = "advanced_ddos",
    always_online: String => ALWAYS_ONLINE = "always_online",
    always_use_https: String => ALWAYS_USE_HTTPS = "always_use_https",
    automatic_https_rewrites: String => AUTOMATIC_HTTPS_REWRITES = "automatic_https_rewrites",
    brotli: String => BROTLI = "brotli",
    /// Seconds
    browser_cache_ttl: i64 => BROWSER_CACHE_TTL = "browser_cache_ttl",
    browser_check: String => BROWSER_CHECK = "browser_check",
    cache_level: String => CACHE_LEVEL = "cache_level",
    /// Seconds
    challenge_ttl: i64 => CHALLENGE_TTL = "challenge_ttl",
    ciphers: Vec<String> => CIPHERS = "ciphers",
    cname_flattening: String => CNAME_FLATTENING = "cname_flattening",
    development_mode: String => DEVELOPMENT_MODE = "development_mode",
    /// Seconds
    edge_cache_ttl: i64 => EDGE_CACHE_TTL = "edge_cache_ttl",
    email_obfuscation: String => EMAIL_OBFUSCATION = "email_obfuscation",
    hotlink_protection: String => HOTLINK_PROTECTION = "hotlink_protection",
    http2: String => HTTP2 = "http2",
    http3: String => HTTP3 = "http3",
    ip_geolocation: String => IP_GEOLOCATION = "ip_geolocation",
    ipv6: String => IPV6 = "ipv6",
    log_to_cloudflare: String => LOG_TO_CLOUDFLARE = "log_to_cloudflare",
    /// Megabytes
    max_upload: i64 => MAX_UPLOAD = "max_upload",
    min_tls_version: String => MIN_TLS_VERSION = "min_tls_version",
    minify: MinifySettings => MINIFY = "minify",
    mirage: String => MIRAGE = "mirage",
    mobile_redirect: MobileRedirectSettings => MOBILE_REDIRECT = "mobile_redirect",
    opportunistic_encryption: String => OPPORTUNISTIC_ENCRYPTION = "opportunistic_encryption",
    opportunistic_onion: String => OPPORTUNISTIC_ONION = "opportunistic_onion",
    orange_to_orange: String => ORANGE_TO_ORANGE = "orange_to_orange",
    origin_error_page_pass_thru: String => ORIGIN_ERROR_PAGE_PASS_THRU = "origin_error_page_pass_thru",
    polish: String => POLISH = "polish",
    prefetch_preload: String => PREFETCH_PRELOAD = "prefetch_preload",
    privacy_pass: String => PRIVACY_PASS = "privacy_pass",
    pseudo_ipv4: String => PSEUDO_IPV4 = "pseudo_ipv4",
    response_buffering: String => RESPONSE_BUFFERING = "response_buffering",
    rocket_loader: String => ROCKET_LOADER = "rocket_loader",
    security_header: SecurityHeaderSettings => SECURITY_HEADER = "security_header",
    security_level: String => SECURITY_LEVEL = "security_level",
    server_side_exclude: String => SERVER_SIDE_EXCLUDE = "server_side_exclude",
    sort_query_string_for_cache: String => SORT_QUERY_STRING_FOR_CACHE = "sort_query_string_for_cache",
    ssl: String => SSL = "ssl",
    tls13: String => TLS_1_3 = "tls_1_3",
    tls_client_auth: String => TLS_CLIENT_AUTH = "tls_client_auth",
    true_client_ip_header: String => TRUE_CLIENT_IP_HEADER = "true_client_ip_header",
    visitor_ip: String => VISITOR_IP = "visitor_ip",
    waf: String => WAF = "waf",
    webp: String => WEBP = "webp",
    websockets: String => WEBSOCKETS = "websockets",
    zero_rtt: String => ZERO_RTT = "0rtt",
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct MinifySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct MobileRedirectSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_subdomain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_uri: Option<bool>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct SecurityHeaderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_transport_security: Option<StrictTransportSecurity>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct StrictTransportSecurity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_subdomains: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nosniff: Option<bool>,
}

fn insert<T: Serialize>(map: &mut ZoneSettingsMap, id: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(value) => {
            map.insert(id.to_string(), normalize(value));
        }
        Err(e) => warn!("cannot encode zone setting {id}: {e}"),
    }
}

fn extract<T: DeserializeOwned>(map: &ZoneSettingsMap, id: &str) -> Option<T> {
    let value = map.get(id)?;
    serde_json::from_value(normalize(value.clone())).ok()
}

/// Turn floats holding whole numbers into integers, recursively.
///
/// The API reports some integer settings as floats; after this `300.0` and `300`
/// compare equal.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            // beyond 2^53 a float no longer identifies a single integer
            Some(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => Value::from(f as i64),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(fields) => Value::Object(fields.into_iter().map(|(k, v)| (k, normalize(v))).collect()),
        other => other,
    }
}

/// Current settings as a map, skipping settings the zone cannot change
pub fn settings_to_map(settings: Vec<ZoneSetting>) -> ZoneSettingsMap {
    settings
        .into_iter()
        .filter(|s| s.editable)
        .map(|s| (s.id, normalize(s.value)))
        .collect()
}

/// Whether `have` holds `want`; objects only compare the keys `want` sets.
fn holds(have: &Value, want: &Value) -> bool {
    match (have, want) {
        (Value::Object(have), Value::Object(want)) => want
            .iter()
            .all(|(key, value)| have.get(key).is_some_and(|h| holds(h, value))),
        _ => have == want,
    }
}

/// Desired settings whose value differs from the current one.
///
/// Keys that only exist in `current` are never reported, at the top level or
/// inside object valued settings.
pub fn get_changed_settings(current: &ZoneSettingsMap, desired: &ZoneSettingsMap) -> Vec<ZoneSettingItem> {
    desired
        .iter()
        .filter(|(id, value)| !current.get(*id).is_some_and(|have| holds(have, value)))
        .map(|(id, value)| ZoneSettingItem {
            id: id.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Copy every current setting missing from `desired`, including missing
/// sub-keys of object valued settings. Returns whether anything was copied.
pub fn late_initialize_settings(current: &ZoneSettingsMap, desired: &mut ZoneSettingsMap) -> bool {
    let mut changed = false;
    for (id, value) in current {
        match desired.get_mut(id) {
            None => {
                desired.insert(id.clone(), value.clone());
                changed = true;
            }
            Some(Value::Object(wanted)) => {
                if let Value::Object(have) = value {
                    changed |= merge_missing(wanted, have);
                }
            }
            Some(_) => {}
        }
    }
    changed
}

fn merge_missing(wanted: &mut Map<String, Value>, have: &Map<String, Value>) -> bool {
    let mut changed = false;
    for (key, value) in have {
        match wanted.get_mut(key) {
            None => {
                wanted.insert(key.clone(), value.clone());
                changed = true;
            }
            Some(Value::Object(nested)) => {
                if let Value::Object(nested_have) = value {
                    changed |= merge_missing(nested, nested_have);
                }
            }
            Some(_) => {}
        }
    }
    changed
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn full_settings() -> ZoneSettings {
        let on = || Some("on".to_string());
        ZoneSettings {
            advanced_ddos: on(),
            always_online: on(),
            always_use_https: on(),
            automatic_https_rewrites: on(),
            brotli: on(),
            browser_cache_ttl: Some(14400),
            browser_check: on(),
            cache_level: Some("aggressive".into()),
            challenge_ttl: Some(1800),
            ciphers: Some(vec!["ECDHE-RSA-AES128-GCM-SHA256".into()]),
            cname_flattening: Some("flatten_at_root".into()),
            development_mode: Some("off".into()),
            edge_cache_ttl: Some(7200),
            email_obfuscation: on(),
            hotlink_protection: on(),
            http2: on(),
            http3: on(),
            ip_geolocation: on(),
            ipv6: on(),
            log_to_cloudflare: on(),
            max_upload: Some(100),
            min_tls_version: Some("1.2".into()),
            minify: Some(MinifySettings {
                css: on(),
                html: Some("off".into()),
                js: on(),
            }),
            mirage: on(),
            mobile_redirect: Some(MobileRedirectSettings {
                status: Some("off".into()),
                mobile_subdomain: Some("m".into()),
                strip_uri: Some(false),
            }),
            opportunistic_encryption: on(),
            opportunistic_onion: on(),
            orange_to_orange: on(),
            origin_error_page_pass_thru: on(),
            polish: Some("lossless".into()),
            prefetch_preload: on(),
            privacy_pass: on(),
            pseudo_ipv4: Some("off".into()),
            response_buffering: on(),
            rocket_loader: on(),
            security_header: Some(SecurityHeaderSettings {
                strict_transport_security: Some(StrictTransportSecurity {
                    enabled: Some(true),
                    max_age: Some(86400),
                    include_subdomains: Some(true),
                    preload: Some(false),
                    nosniff: Some(true),
                }),
            }),
            security_level: Some("medium".into()),
            server_side_exclude: on(),
            sort_query_string_for_cache: on(),
            ssl: Some("strict".into()),
            tls13: Some("zrt".into()),
            tls_client_auth: on(),
            true_client_ip_header: on(),
            visitor_ip: on(),
            waf: on(),
            webp: on(),
            websockets: on(),
            zero_rtt: on(),
        }
    }

    #[test]
    fn full_settings_survive_a_round_trip() {
        let settings = full_settings();
        let map = zone_to_settings_map(&settings);
        assert_eq!(map.len(), SETTING_IDS.len());
        assert_eq!(settings_map_to_zone(&map), settings);
    }

    #[test]
    fn unset_fields_are_not_emitted() {
        let settings = ZoneSettings {
            zero_rtt: Some("on".into()),
            tls13: Some("off".into()),
            edge_cache_ttl: Some(300),
            ..Default::default()
        };
        let map = zone_to_settings_map(&settings);
        assert_json_eq!(
            json!(map),
            json!({ "0rtt": "on", "tls_1_3": "off", "edge_cache_ttl": 300 })
        );
    }

    #[test]
    fn float_numbers_from_the_api_compare_equal_to_integers() {
        let current = settings_to_map(vec![
            ZoneSetting {
                id: setting_id::EDGE_CACHE_TTL.into(),
                value: json!(7200.0),
                editable: true,
                modified_on: None,
            },
            ZoneSetting {
                id: setting_id::SECURITY_HEADER.into(),
                value: json!({ "strict_transport_security": { "max_age": 86400.0, "enabled": true } }),
                editable: true,
                modified_on: None,
            },
        ]);
        let desired = zone_to_settings_map(&ZoneSettings {
            edge_cache_ttl: Some(7200),
            security_header: Some(SecurityHeaderSettings {
                strict_transport_security: Some(StrictTransportSecurity {
                    enabled: Some(true),
                    max_age: Some(86400),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        });
        assert!(get_changed_settings(&current, &desired).is_empty());
        assert_eq!(settings_map_to_zone(&current).edge_cache_ttl, Some(7200));
    }

    #[test]
    fn non_editable_settings_are_dropped() {
        let current = settings_to_map(vec![ZoneSetting {
            id: setting_id::WAF.into(),
            value: json!("off"),
            editable: false,
            modified_on: None,
        }]);
        assert!(current.is_empty());
    }

    #[test]
    fn equal_maps_have_no_changes() {
        let map = zone_to_settings_map(&full_settings());
        assert!(get_changed_settings(&map, &map).is_empty());
    }

    #[test]
    fn single_difference_yields_single_item_with_desired_value() {
        let current = zone_to_settings_map(&full_settings());
        let mut desired = current.clone();
        desired.insert(setting_id::SSL.into(), json!("flexible"));

        let changed = get_changed_settings(&current, &desired);
        assert_eq!(changed, vec![ZoneSettingItem {
            id: "ssl".into(),
            value: json!("flexible"),
        }]);
    }

    #[test]
    fn keys_only_present_remotely_are_not_changes() {
        let mut current = ZoneSettingsMap::new();
        current.insert("some_future_setting".into(), json!("on"));
        current.insert(setting_id::IPV6.into(), json!("on"));
        let mut desired = ZoneSettingsMap::new();
        desired.insert(setting_id::IPV6.into(), json!("on"));
        assert!(get_changed_settings(&current, &desired).is_empty());
    }

    #[test]
    fn null_and_unmodelled_sub_keys_are_not_changes() {
        let mut current = ZoneSettingsMap::new();
        current.insert(
            setting_id::MOBILE_REDIRECT.into(),
            json!({ "status": "off", "mobile_subdomain": null, "strip_uri": false }),
        );
        current.insert(
            setting_id::MINIFY.into(),
            json!({ "css": "on", "html": "off", "js": "on", "future_asset": "on" }),
        );
        let desired = zone_to_settings_map(&ZoneSettings {
            mobile_redirect: Some(MobileRedirectSettings {
                status: Some("off".into()),
                mobile_subdomain: None,
                strip_uri: Some(false),
            }),
            minify: Some(MinifySettings {
                css: Some("on".into()),
                html: Some("off".into()),
                js: Some("on".into()),
            }),
            ..Default::default()
        });
        assert!(get_changed_settings(&current, &desired).is_empty());

        let desired = zone_to_settings_map(&ZoneSettings {
            mobile_redirect: Some(MobileRedirectSettings {
                status: Some("on".into()),
                mobile_subdomain: Some("m".into()),
                strip_uri: Some(false),
            }),
            ..Default::default()
        });
        let changed = get_changed_settings(&current, &desired);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].id, "mobile_redirect");
    }

    #[test]
    fn unknown_and_mistyped_values_are_ignored() {
        let mut map = ZoneSettingsMap::new();
        map.insert("some_future_setting".into(), json!("on"));
        map.insert(setting_id::MAX_UPLOAD.into(), json!("a lot"));
        map.insert(setting_id::BROTLI.into(), json!("on"));
        assert_eq!(settings_map_to_zone(&map), ZoneSettings {
            brotli: Some("on".into()),
            ..Default::default()
        });
    }

    #[test]
    fn late_initialize_fills_missing_keys_without_overwriting() {
        let mut current = ZoneSettingsMap::new();
        current.insert(setting_id::IPV6.into(), json!("on"));
        current.insert(setting_id::BROTLI.into(), json!("off"));
        current.insert(setting_id::MINIFY.into(), json!({ "css": "on", "html": "on", "js": "off" }));

        let mut desired = ZoneSettingsMap::new();
        desired.insert(setting_id::BROTLI.into(), json!("on"));
        desired.insert(setting_id::MINIFY.into(), json!({ "js": "on" }));

        assert!(late_initialize_settings(&current, &mut desired));
        assert_json_eq!(
            json!(desired),
            json!({
                "brotli": "on",
                "ipv6": "on",
                "minify": { "css": "on", "html": "on", "js": "on" }
            })
        );

        // everything is known now
        assert!(!late_initialize_settings(&current, &mut desired));
    }
}
