//! The single-shot "list devices, then report the first one" flow.
use std::io::Write;

use tracing::{debug, warn};

use crate::{
    client::{parse_device, parse_devices, parse_status, SwitchBotClient},
    error::Result,
    models::DeviceStatus,
};

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The account has no devices; the status call was skipped.
    NoDevices,
    /// The status of the first device was printed.
    Reported(DeviceStatus),
}

/// Lists devices, fetches the status of the first one and writes the
/// report to `out`.
///
/// Each call is signed separately. Missing containers abort the run while
/// missing leaf fields of the status fall back to their defaults.
pub fn run<W: Write>(client: &SwitchBotClient, out: &mut W) -> Result<Outcome> {
    let raw_devices = client.devices_raw()?;
    writeln!(
        out,
        "Response from /devices: {}",
        String::from_utf8_lossy(&raw_devices)
    )?;

    let devices = parse_devices(&raw_devices)?.body;
    let first = match devices.first() {
        Some(first) => first,
        None => {
            writeln!(out, "No devices found.")?;
            return Ok(Outcome::NoDevices);
        }
    };
    debug!("{} devices listed, using the first", devices.len());

    let device = parse_device(first)?;
    debug!(
        device_id = %device.device_id,
        device_name = ?device.device_name,
        device_type = ?device.device_type,
        hub_device_id = ?device.hub_device_id,
        "selected device"
    );
    writeln!(out, "Using deviceId: {}", device.device_id)?;

    let raw_status = client.device_status_raw(&device.device_id)?;
    writeln!(
        out,
        "Response from /devices/{{deviceId}}/status: {}",
        String::from_utf8_lossy(&raw_status)
    )?;

    let status = DeviceStatus::from_body(parse_status(&raw_status)?.body);
    let defaulted = status.defaulted_fields();
    if !defaulted.is_empty() {
        warn!(fields = ?defaulted, "status fields missing, using defaults");
    }

    write!(out, "{}", status)?;
    Ok(Outcome::Reported(status))
}
