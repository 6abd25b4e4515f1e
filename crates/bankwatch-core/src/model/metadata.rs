// ── Type-dependent entity metadata ──
//
// The store keeps metadata as an open JSON object. At the data-access
// boundary it is split into the fields each tier actually uses plus an
// `extra` map, so unknown keys survive an edit untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::entity::EntityType;

// ── Device vocabularies ─────────────────────────────────────────────

/// Hardware class of a monitored device (`metadata.type` in the store).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DeviceKind {
    Atm,
    Pos,
    SecurityCamera,
    Server,
    Router,
    Printer,
    Other(String),
}

impl DeviceKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Atm => "ATM",
            Self::Pos => "POS",
            Self::SecurityCamera => "Security Camera",
            Self::Server => "Server",
            Self::Router => "Router",
            Self::Printer => "Printer",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DeviceKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ATM" => Self::Atm,
            "POS" => Self::Pos,
            "Security Camera" => Self::SecurityCamera,
            "Server" => Self::Server,
            "Router" => Self::Router,
            "Printer" => Self::Printer,
            _ => Self::Other(s),
        }
    }
}

impl From<DeviceKind> for String {
    fn from(k: DeviceKind) -> Self {
        match k {
            DeviceKind::Other(s) => s,
            other => other.as_str().to_owned(),
        }
    }
}

impl FromStr for DeviceKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

/// Operational status reported for a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceStatus {
    Online,
    Offline,
    Maintenance,
    #[default]
    Unknown,
}

impl DeviceStatus {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

// ── Per-tier metadata ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerMeta {
    /// Institution class, e.g. "Bank" or "Credit Union".
    pub kind: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub extra: Map<String, Value>,
}

/// Metadata shared by every intermediate tier (zone, nbg, ro, branch).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgUnitMeta {
    pub code: Option<String>,
    pub manager: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceMeta {
    pub kind: Option<DeviceKind>,
    pub status: Option<DeviceStatus>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    /// Free-form as written by the monitoring agents (usually RFC 3339).
    pub last_active: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub extra: Map<String, Value>,
}

/// Metadata of one entity, tagged by tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum Metadata {
    Customer(CustomerMeta),
    OrgUnit(OrgUnitMeta),
    Device(DeviceMeta),
}

impl Metadata {
    /// Empty metadata of the right variant for a tier.
    pub fn empty(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Customer => Self::Customer(CustomerMeta::default()),
            EntityType::Device => Self::Device(DeviceMeta::default()),
            EntityType::Zone | EntityType::Nbg | EntityType::Ro | EntityType::Branch => {
                Self::OrgUnit(OrgUnitMeta::default())
            }
        }
    }

    /// Interpret the store's JSON object for the given tier.
    ///
    /// `null`, missing, and non-object values yield empty metadata.
    /// Modelled keys stored as numbers or booleans are read as text but
    /// keep their stored form in `extra`, as do explicit nulls and
    /// non-canonical status spellings, so `to_value` writes back what was
    /// read. Anything the variant does not model lands in `extra`.
    pub fn from_value(entity_type: EntityType, value: Option<Value>) -> Self {
        let mut map = match value {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        match entity_type {
            EntityType::Customer => Self::Customer(CustomerMeta {
                kind: take_text(&mut map, "type"),
                country: take_text(&mut map, "country"),
                city: take_text(&mut map, "city"),
                description: take_text(&mut map, "description"),
                extra: map,
            }),
            EntityType::Device => {
                let kind = take_text(&mut map, "type").map(DeviceKind::from);
                let status = match take_text(&mut map, "status") {
                    Some(raw) => match raw.parse::<DeviceStatus>() {
                        Ok(status) => {
                            if raw != status.to_string() {
                                map.insert("status".into(), Value::String(raw));
                            }
                            Some(status)
                        }
                        Err(_) => {
                            // Keep unrecognised statuses verbatim.
                            map.entry("status").or_insert(Value::String(raw));
                            None
                        }
                    },
                    None => None,
                };
                Self::Device(DeviceMeta {
                    kind,
                    status,
                    ip_address: take_text(&mut map, "ip_address"),
                    location: take_text(&mut map, "location"),
                    last_active: take_text(&mut map, "last_active"),
                    version: take_text(&mut map, "version"),
                    description: take_text(&mut map, "description"),
                    extra: map,
                })
            }
            EntityType::Zone | EntityType::Nbg | EntityType::Ro | EntityType::Branch => {
                Self::OrgUnit(OrgUnitMeta {
                    code: take_text(&mut map, "code"),
                    manager: take_text(&mut map, "manager"),
                    address: take_text(&mut map, "address"),
                    city: take_text(&mut map, "city"),
                    country: take_text(&mut map, "country"),
                    description: take_text(&mut map, "description"),
                    extra: map,
                })
            }
        }
    }

    /// Render back into the store's open JSON object.
    pub fn to_value(&self) -> Value {
        let (mut map, fields): (Map<String, Value>, Vec<(&str, Option<String>)>) = match self {
            Self::Customer(m) => (
                m.extra.clone(),
                vec![
                    ("type", m.kind.clone()),
                    ("country", m.country.clone()),
                    ("city", m.city.clone()),
                    ("description", m.description.clone()),
                ],
            ),
            Self::OrgUnit(m) => (
                m.extra.clone(),
                vec![
                    ("code", m.code.clone()),
                    ("manager", m.manager.clone()),
                    ("address", m.address.clone()),
                    ("city", m.city.clone()),
                    ("country", m.country.clone()),
                    ("description", m.description.clone()),
                ],
            ),
            Self::Device(m) => (
                m.extra.clone(),
                vec![
                    ("type", m.kind.clone().map(String::from)),
                    ("status", m.status.as_ref().map(ToString::to_string)),
                    ("ip_address", m.ip_address.clone()),
                    ("location", m.location.clone()),
                    ("last_active", m.last_active.clone()),
                    ("version", m.version.clone()),
                    ("description", m.description.clone()),
                ],
            ),
        };

        for (key, value) in fields {
            let Some(v) = value else { continue };
            // An unchanged field keeps the stored spelling and JSON type.
            let stored = map.get(key).and_then(scalar_text);
            if stored.is_some_and(|s| s.eq_ignore_ascii_case(&v)) {
                continue;
            }
            map.insert(key.to_owned(), Value::String(v));
        }
        Value::Object(map)
    }

    /// Look up a field by its store key, typed or extra, as display text.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.to_value() {
            Value::Object(map) => map.get(key).and_then(scalar_text),
            _ => None,
        }
    }

    /// Set a field by its store key. Unmodelled keys go to `extra`.
    ///
    /// Reparses through the tier's schema, so `set("status", "offline")`
    /// on a device updates the typed status.
    pub fn set(&mut self, entity_type: EntityType, key: &str, value: &str) {
        let mut map = match self.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert(key.to_owned(), Value::String(value.to_owned()));
        *self = Self::from_value(entity_type, Some(Value::Object(map)));
    }

    /// City and country joined for the "Location" column.
    pub fn location(&self) -> Option<String> {
        let (city, country) = match self {
            Self::Customer(m) => (m.city.as_deref(), m.country.as_deref()),
            Self::OrgUnit(m) => (m.city.as_deref(), m.country.as_deref()),
            Self::Device(m) => return m.location.clone(),
        };
        match (city, country) {
            (Some(city), Some(country)) => Some(format!("{city}, {country}")),
            (Some(one), None) | (None, Some(one)) => Some(one.to_owned()),
            (None, None) => None,
        }
    }

    pub fn manager(&self) -> Option<&str> {
        match self {
            Self::OrgUnit(m) => m.manager.as_deref(),
            _ => None,
        }
    }

    /// The `type` sub-label (institution class or device kind).
    pub fn kind_label(&self) -> Option<String> {
        match self {
            Self::Customer(m) => m.kind.clone(),
            Self::Device(m) => m.kind.as_ref().map(ToString::to_string),
            Self::OrgUnit(_) => None,
        }
    }

    pub fn as_device(&self) -> Option<&DeviceMeta> {
        match self {
            Self::Device(m) => Some(m),
            _ => None,
        }
    }
}

/// Read a modelled key as text. Only strings leave the map; every other
/// JSON type stays behind so it is written back unchanged.
fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    if map.get(key).is_some_and(Value::is_string) {
        return match map.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
    }
    map.get(key).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn device_metadata_parses_typed_fields() {
        let meta = Metadata::from_value(
            EntityType::Device,
            Some(json!({
                "type": "ATM",
                "status": "offline",
                "ip_address": "10.0.4.17",
                "last_active": "2024-03-01T10:00:00Z",
                "serial": "NCR-6622"
            })),
        );
        let device = meta.as_device().unwrap();
        assert_eq!(device.kind, Some(DeviceKind::Atm));
        assert_eq!(device.status, Some(DeviceStatus::Offline));
        assert_eq!(device.ip_address.as_deref(), Some("10.0.4.17"));
        assert_eq!(device.extra.get("serial"), Some(&json!("NCR-6622")));
    }

    #[test]
    fn unknown_keys_survive_roundtrip() {
        let raw = json!({
            "code": "WZ-01",
            "manager": "R. Iyer",
            "cost_center": "4410",
            "tags": ["pilot", "urban"]
        });
        let meta = Metadata::from_value(EntityType::Zone, Some(raw.clone()));
        assert_eq!(meta.to_value(), raw);
    }

    #[test]
    fn unrecognised_status_is_preserved() {
        let raw = json!({ "status": "decommissioned" });
        let meta = Metadata::from_value(EntityType::Device, Some(raw.clone()));
        assert_eq!(meta.as_device().unwrap().status, None);
        assert_eq!(meta.to_value(), raw);
    }

    #[test]
    fn null_metadata_is_empty_variant() {
        assert_eq!(
            Metadata::from_value(EntityType::Branch, None),
            Metadata::empty(EntityType::Branch)
        );
        assert_eq!(
            Metadata::from_value(EntityType::Customer, Some(json!("oops"))),
            Metadata::empty(EntityType::Customer)
        );
    }

    #[test]
    fn numeric_scalars_become_text() {
        let meta = Metadata::from_value(EntityType::Branch, Some(json!({ "code": 1042 })));
        assert_eq!(meta.get("code").as_deref(), Some("1042"));
    }

    #[test]
    fn stored_json_types_survive_roundtrip() {
        let raw = json!({
            "version": 2,
            "status": "ONLINE",
            "ip_address": null,
            "code": true
        });
        let meta = Metadata::from_value(EntityType::Device, Some(raw.clone()));
        let device = meta.as_device().unwrap();
        assert_eq!(device.version.as_deref(), Some("2"));
        assert_eq!(device.status, Some(DeviceStatus::Online));
        assert_eq!(device.ip_address, None);
        assert_eq!(meta.to_value(), raw);
    }

    #[test]
    fn edited_fields_replace_stored_form() {
        let raw = json!({ "version": 2, "status": "ONLINE" });
        let mut meta = Metadata::from_value(EntityType::Device, Some(raw));
        meta.set(EntityType::Device, "version", "3");
        meta.set(EntityType::Device, "status", "offline");
        assert_eq!(meta.to_value(), json!({ "version": "3", "status": "offline" }));
        assert_eq!(meta.get("version").as_deref(), Some("3"));
    }

    #[test]
    fn set_reparses_typed_field() {
        let mut meta = Metadata::empty(EntityType::Device);
        meta.set(EntityType::Device, "status", "maintenance");
        meta.set(EntityType::Device, "rack", "B4");
        let device = meta.as_device().unwrap();
        assert_eq!(device.status, Some(DeviceStatus::Maintenance));
        assert_eq!(device.extra.get("rack"), Some(&json!("B4")));
    }

    #[test]
    fn location_joins_city_and_country() {
        let meta = Metadata::from_value(
            EntityType::Branch,
            Some(json!({ "city": "Pune", "country": "India" })),
        );
        assert_eq!(meta.location().as_deref(), Some("Pune, India"));
    }

    #[test]
    fn device_kind_other_roundtrips() {
        let kind = DeviceKind::from("Kiosk".to_owned());
        assert_eq!(kind, DeviceKind::Other("Kiosk".into()));
        assert_eq!(String::from(kind), "Kiosk");
    }
}
