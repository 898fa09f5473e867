use std::{fmt, ops::Deref};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Placeholder printed for string fields missing from a status response.
pub const NOT_AVAILABLE: &str = "N/A";

/// The envelope wrapped around every API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse<T> {
    #[serde(default, deserialize_with = "or_none")]
    pub status_code: Option<i64>,
    #[serde(default, deserialize_with = "or_none")]
    pub message: Option<String>,
    pub body: T,
}

/// The `body` of the list devices response.
///
/// Entries are kept as raw json; only the one being used gets decoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceList {
    pub device_list: Vec<Value>,
}

impl Deref for DeviceList {
    type Target = Vec<Value>;

    fn deref(&self) -> &Self::Target {
        &self.device_list
    }
}

/// A representation of a SwitchBot device as returned in the device list.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub hub_device_id: Option<String>,
}

pub type StatusBody = Map<String, Value>;

/// The status of a single device.
///
/// Every field decodes leniently: a missing or mistyped value becomes `None`
/// and the accessors substitute [NOT_AVAILABLE] or `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    #[serde(default, deserialize_with = "or_none")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub device_type: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub hub_device_id: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "or_none")]
    pub temperature: Option<f64>,
}

impl DeviceStatus {
    /// Decode the leaf fields of a status `body` object. Cannot fail.
    pub fn from_body(body: StatusBody) -> Self {
        serde_json::from_value(Value::Object(body)).unwrap_or_default()
    }

    pub fn device_id(&self) -> &str {
        self.device_id.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn device_type(&self) -> &str {
        self.device_type.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn hub_device_id(&self) -> &str {
        self.hub_device_id.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn humidity(&self) -> f64 {
        self.humidity.unwrap_or_default()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or_default()
    }

    /// Names of the fields that fell back to their default.
    pub fn defaulted_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.device_id.is_none() {
            fields.push("deviceId");
        }
        if self.device_type.is_none() {
            fields.push("deviceType");
        }
        if self.hub_device_id.is_none() {
            fields.push("hubDeviceId");
        }
        if self.humidity.is_none() {
            fields.push("humidity");
        }
        if self.temperature.is_none() {
            fields.push("temperature");
        }
        fields
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Device ID: {}", self.device_id())?;
        writeln!(f, "Device Type: {}", self.device_type())?;
        writeln!(f, "Hub Device ID: {}", self.hub_device_id())?;
        writeln!(f, "Humidity: {:.2}", self.humidity())?;
        writeln!(f, "Temperature: {:.2}°C", self.temperature())
    }
}

fn or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
