use thiserror::Error;

pub type Result<T> = std::result::Result<T, SwitchBotError>;

/// SwitchBotError enumerates all possible errors returned by this library
#[derive(Debug, Error)]
pub enum SwitchBotError {
    #[error("{} environment variable is not set", name)]
    Config { name: &'static str },

    #[error("failed to parse url: {}", source)]
    UrlParse {
        #[from]
        source: url::ParseError,
    },

    #[error("error setting auth headers: {}", source)]
    Auth {
        #[from]
        source: AuthError,
    },

    #[error("error executing HTTP request: {}", source)]
    Request {
        #[from]
        source: reqwest::Error,
    },

    #[error("device id {:?} cannot be used in a request path", device_id)]
    InvalidDeviceId { device_id: String },

    #[error("API request failed with status code {}", status.as_u16())]
    Api { status: reqwest::StatusCode },

    #[error("error reading response body: {}", source)]
    Read {
        #[source]
        source: reqwest::Error,
    },

    #[error("could not parse {} response as json: {}", typename, source)]
    Decode {
        #[source]
        source: serde_json::Error,
        typename: &'static str,
    },

    #[error("{} response is missing or not in expected format: {}", typename, source)]
    Shape {
        #[source]
        source: serde_json::Error,
        typename: &'static str,
    },

    #[error("failed to write output: {}", source)]
    Io {
        #[from]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("header value error: {}", source)]
    HeaderValue {
        #[from]
        source: http::header::InvalidHeaderValue,
    },
}
