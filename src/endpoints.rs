use std::borrow::Cow;

use derive_builder::Builder;
use http::Method;

/// API version prefix shared by every endpoint.
pub const API_VERSION: &str = "v1.1";

/// A single REST endpoint, relative to the client's base url.
pub trait Endpoint {
    fn method(&self) -> Method;

    /// Path segments below the base url. Each one is percent-encoded on its
    /// own, so a segment can never introduce a `/`, `?` or `#`.
    fn segments(&self) -> Vec<Cow<'_, str>>;
}

/// An endpoint for getting the list of devices.
#[derive(Debug, Clone, Default)]
pub struct DevicesEndpoint;

impl Endpoint for DevicesEndpoint {
    fn method(&self) -> Method {
        Method::GET
    }

    fn segments(&self) -> Vec<Cow<'_, str>> {
        vec![API_VERSION.into(), "devices".into()]
    }
}

impl DevicesEndpoint {
    pub fn new() -> Self {
        Self
    }
}

/// An endpoint for getting the status of a particular device.
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct DeviceStatusEndpoint<'a> {
    #[builder(setter(into))]
    device_id: Cow<'a, str>,
}

impl<'a> Endpoint for DeviceStatusEndpoint<'a> {
    fn method(&self) -> Method {
        Method::GET
    }

    fn segments(&self) -> Vec<Cow<'_, str>> {
        vec![
            API_VERSION.into(),
            "devices".into(),
            Cow::Borrowed(self.device_id.as_ref()),
            "status".into(),
        ]
    }
}

impl<'a> DeviceStatusEndpoint<'a> {
    pub fn builder() -> DeviceStatusEndpointBuilder<'a> {
        DeviceStatusEndpointBuilder::default()
    }
}

impl<'a> DeviceStatusEndpointBuilder<'a> {
    // dot segments would be resolved away by the url and change the target
    fn validate(&self) -> Result<(), String> {
        match self.device_id.as_deref() {
            Some("") | Some(".") | Some("..") => Err("invalid device id".to_string()),
            _ => Ok(()),
        }
    }
}
