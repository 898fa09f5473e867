use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::{
    auth::{AuthHeaders, Credentials},
    endpoints::{DeviceStatusEndpoint, DevicesEndpoint, Endpoint},
    error::{Result, SwitchBotError},
    models::{BaseResponse, Device, DeviceList, DeviceStatus, StatusBody},
};

/// A client for interacting with the SwitchBot API.
///
/// Every request is signed with freshly generated [AuthHeaders].
#[derive(Clone)]
pub struct SwitchBotClient {
    client: Client,
    api_url: Url,
    credentials: Credentials,
}

impl SwitchBotClient {
    /// Make a new [SwitchBotClient].
    ///
    /// This will fail if the provided `api_url` does not parse.
    pub fn new(api_url: &str, credentials: Credentials) -> Result<Self> {
        let mut api_url = Url::parse(api_url)?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            api_url,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Resolve an [Endpoint] against the base url.
    pub fn rest_endpoint(&self, endpoint: &impl Endpoint) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(endpoint.segments());
        Ok(url)
    }

    /// Issue a single GET with the given headers and return the raw body.
    ///
    /// Any status other than 200 is an [SwitchBotError::Api] and the body is
    /// dropped unread.
    pub fn get(&self, url: Url, auth: &AuthHeaders) -> Result<Bytes> {
        self.send(Method::GET, url, auth)
    }

    fn send(&self, method: Method, url: Url, auth: &AuthHeaders) -> Result<Bytes> {
        let mut headers = HeaderMap::new();
        auth.set_headers(&mut headers)?;

        debug!(%method, %url, "sending request");
        let rsp = self.client.request(method, url).headers(headers).send()?;
        let status = rsp.status();
        info!(
            "[switchbot api] status: {:?} {:?}",
            status,
            status.canonical_reason().unwrap_or_default()
        );

        if status != StatusCode::OK {
            return Err(SwitchBotError::Api { status });
        }

        rsp.bytes().map_err(|source| SwitchBotError::Read { source })
    }

    /// Query an [Endpoint] with a fresh set of auth headers.
    pub fn query_raw(&self, endpoint: &impl Endpoint) -> Result<Bytes> {
        let url = self.rest_endpoint(endpoint)?;
        let auth = self.credentials.headers();
        self.send(endpoint.method(), url, &auth)
    }

    /// Raw body of the list devices call.
    pub fn devices_raw(&self) -> Result<Bytes> {
        self.query_raw(&DevicesEndpoint::new())
    }

    /// Raw body of the device status call for `device_id`.
    pub fn device_status_raw(&self, device_id: &str) -> Result<Bytes> {
        let endpoint = DeviceStatusEndpoint::builder()
            .device_id(device_id)
            .build()
            .map_err(|_| SwitchBotError::InvalidDeviceId {
                device_id: device_id.to_string(),
            })?;
        self.query_raw(&endpoint)
    }

    /// Gets the [DeviceList] associated with the account.
    pub fn devices(&self) -> Result<DeviceList> {
        let bytes = self.devices_raw()?;
        Ok(parse_devices(&bytes)?.body)
    }

    /// Gets the [DeviceStatus] of the device with the given id.
    pub fn device_status(&self, device_id: &str) -> Result<DeviceStatus> {
        let bytes = self.device_status_raw(device_id)?;
        Ok(DeviceStatus::from_body(parse_status(&bytes)?.body))
    }
}

/// Parse a list devices response. `body.deviceList` must be present.
pub fn parse_devices(bytes: &[u8]) -> Result<BaseResponse<DeviceList>> {
    parse_response(bytes, "devices")
}

/// Parse a device status response. `body` must be an object.
pub fn parse_status(bytes: &[u8]) -> Result<BaseResponse<StatusBody>> {
    parse_response(bytes, "device status")
}

/// Decode a single raw device record from the device list.
pub fn parse_device(value: &Value) -> Result<Device> {
    serde_json::from_value(value.clone()).map_err(|source| SwitchBotError::Shape {
        source,
        typename: "device",
    })
}

fn parse_response<T>(bytes: &[u8], typename: &'static str) -> Result<BaseResponse<T>>
where
    T: DeserializeOwned,
{
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|source| SwitchBotError::Decode { source, typename })?;
    let response: BaseResponse<T> = serde_json::from_value(value)
        .map_err(|source| SwitchBotError::Shape { source, typename })?;

    info!(
        status_code = ?response.status_code,
        message = ?response.message,
        "[switchbot api] {} response",
        typename
    );

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const DEVICES_RESPONSE: &str = r#"
        {
            "statusCode": 100,
            "body": {
                "deviceList": [
                    {
                        "deviceId": "ABC123",
                        "deviceName": "Meter 7A",
                        "deviceType": "Meter",
                        "enableCloudService": true,
                        "hubDeviceId": "HUB001"
                    },
                    {
                        "deviceId": "DEF456",
                        "deviceName": "Hub Mini",
                        "deviceType": "Hub Mini",
                        "hubDeviceId": "000000000000"
                    }
                ],
                "infraredRemoteList": []
            },
            "message": "success"
        }"#;

    const STATUS_RESPONSE: &str = r#"
        {
            "statusCode": 100,
            "body": {
                "deviceId": "ABC123",
                "deviceType": "Meter",
                "hubDeviceId": "HUB001",
                "humidity": 55.5,
                "temperature": 21.3
            },
            "message": "success"
        }"#;

    fn fake_credentials() -> Credentials {
        Credentials::new(Some("foobarbaz".into()), Some("s3cret".into())).unwrap()
    }

    fn fake_client(server: &Server) -> SwitchBotClient {
        SwitchBotClient::new(&server.url(), fake_credentials()).unwrap()
    }

    #[test]
    fn rest_endpoint_keeps_base_path() {
        let client = SwitchBotClient::new("http://localhost:8080/proxy", fake_credentials()).unwrap();
        let url = client.rest_endpoint(&DevicesEndpoint::new()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/proxy/v1.1/devices");
    }

    #[test]
    fn rest_endpoint_escapes_device_id() {
        let client = SwitchBotClient::new(crate::API_BASE, fake_credentials()).unwrap();

        let endpoint = DeviceStatusEndpoint::builder()
            .device_id("a#b?c/../d")
            .build()
            .unwrap();
        let url = client.rest_endpoint(&endpoint).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.switch-bot.com/v1.1/devices/a%23b%3Fc%2F..%2Fd/status"
        );
    }

    #[test]
    fn dot_device_id_is_rejected_before_sending() {
        let mut server = Server::new();
        let client = fake_client(&server);

        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create();

        assert!(matches!(
            client.device_status_raw(".."),
            Err(SwitchBotError::InvalidDeviceId { .. })
        ));

        mock.assert();
    }

    #[test]
    fn truncated_body_is_read_error() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
                .unwrap();
        });

        let client =
            SwitchBotClient::new(&format!("http://{}", addr), fake_credentials()).unwrap();
        let result = client.devices_raw();
        handle.join().unwrap();

        assert!(matches!(result, Err(SwitchBotError::Read { .. })));
    }

    #[test]
    fn bad_url_is_rejected() {
        assert!(matches!(
            SwitchBotClient::new("not a url", fake_credentials()),
            Err(SwitchBotError::UrlParse { .. })
        ));
    }

    #[test]
    fn get_sends_auth_headers() {
        let mut server = Server::new();
        let client = fake_client(&server);

        let auth = AuthHeaders::at(client.credentials(), 1_700_000_000_000, "my-nonce");
        let mock = server
            .mock("GET", "/v1.1/devices")
            .match_header("Authorization", "foobarbaz")
            .match_header("Content-Type", "application/json")
            .match_header("charset", "utf-8")
            .match_header("t", "1700000000000")
            .match_header("sign", auth.sign.as_str())
            .match_header("nonce", "my-nonce")
            .with_status(200)
            .with_body("raw body")
            .create();

        let url = client.rest_endpoint(&DevicesEndpoint::new()).unwrap();
        let body = client.get(url, &auth).unwrap();
        assert_eq!(&body[..], b"raw body");

        mock.assert();
    }

    #[test]
    fn non_200_is_api_error() {
        let mut server = Server::new();
        let client = fake_client(&server);

        let mock = server
            .mock("GET", "/v1.1/devices")
            .with_status(404)
            .with_body(DEVICES_RESPONSE)
            .create();

        match client.devices_raw() {
            Err(SwitchBotError::Api { status }) => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected result: {:?}", other),
        }

        mock.assert();
    }

    #[test]
    fn other_success_codes_are_api_errors() {
        let mut server = Server::new();
        let client = fake_client(&server);

        let _mock = server
            .mock("GET", "/v1.1/devices")
            .with_status(204)
            .create();

        assert!(matches!(
            client.devices_raw(),
            Err(SwitchBotError::Api { .. })
        ));
    }

    #[test]
    fn unreachable_server_is_request_error() {
        let client = SwitchBotClient::new("http://127.0.0.1:1", fake_credentials()).unwrap();
        assert!(matches!(
            client.devices_raw(),
            Err(SwitchBotError::Request { .. })
        ));
    }

    #[test]
    fn devices() {
        let mut server = Server::new();
        let client = fake_client(&server);

        let mock = server
            .mock("GET", "/v1.1/devices")
            .match_header("Authorization", "foobarbaz")
            .match_header("sign", Matcher::Any)
            .match_header("nonce", Matcher::Any)
            .match_header("t", Matcher::Regex(r"^\d+$".into()))
            .with_status(200)
            .with_header("Content-Type", "application/json")
            .with_body(DEVICES_RESPONSE)
            .create();

        let devices = client.devices().unwrap();
        assert_eq!(devices.len(), 2);

        let first = parse_device(devices.first().unwrap()).unwrap();
        assert_eq!(first.device_id, "ABC123");
        assert_eq!(first.device_type.as_deref(), Some("Meter"));

        mock.assert();
    }

    #[test]
    fn device_status() {
        let mut server = Server::new();
        let client = fake_client(&server);

        let mock = server
            .mock("GET", "/v1.1/devices/ABC123/status")
            .match_header("Authorization", "foobarbaz")
            .with_status(200)
            .with_body(STATUS_RESPONSE)
            .create();

        let status = client.device_status("ABC123").unwrap();
        assert_eq!(status.device_id(), "ABC123");
        assert_eq!(status.humidity(), 55.5);
        assert_eq!(status.temperature(), 21.3);

        mock.assert();
    }

    #[test]
    fn invalid_json_is_decode_error() {
        assert!(matches!(
            parse_devices(b"<html>"),
            Err(SwitchBotError::Decode { .. })
        ));
    }

    #[test]
    fn missing_container_is_shape_error() {
        assert!(matches!(
            parse_devices(br#"{"body": {"infraredRemoteList": []}}"#),
            Err(SwitchBotError::Shape { .. })
        ));
        assert!(matches!(
            parse_status(br#"{"statusCode": 100, "body": []}"#),
            Err(SwitchBotError::Shape { .. })
        ));
        assert!(matches!(
            parse_status(br#"{"statusCode": 100}"#),
            Err(SwitchBotError::Shape { .. })
        ));
    }

    #[test]
    fn device_without_id_is_shape_error() {
        let value = serde_json::json!({"deviceName": "nameless"});
        assert!(matches!(
            parse_device(&value),
            Err(SwitchBotError::Shape { .. })
        ));
    }
}
