use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AuthError, Result, SwitchBotError};

type HmacSha256 = Hmac<Sha256>;

/// Environment variable holding the account token.
pub const TOKEN_VAR: &str = "SWITCHBOT_TOKEN";

/// Environment variable holding the account secret.
pub const SECRET_VAR: &str = "SWITCHBOT_API_KEY";

const CHARSET: HeaderName = HeaderName::from_static("charset");
const TIMESTAMP: HeaderName = HeaderName::from_static("t");
const SIGN: HeaderName = HeaderName::from_static("sign");
const NONCE: HeaderName = HeaderName::from_static("nonce");

/// The long-lived token/secret pair issued by the SwitchBot app.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    secret: String,
}

impl Credentials {
    /// Make a new [Credentials].
    ///
    /// Fails with [SwitchBotError::Config] if either value is absent or empty.
    pub fn new(token: Option<String>, secret: Option<String>) -> Result<Self> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(SwitchBotError::Config { name: TOKEN_VAR })?;
        let secret = secret
            .filter(|s| !s.is_empty())
            .ok_or(SwitchBotError::Config { name: SECRET_VAR })?;

        Ok(Self { token, secret })
    }

    /// Read the credentials from [TOKEN_VAR] and [SECRET_VAR].
    pub fn from_env() -> Result<Self> {
        Self::new(
            std::env::var(TOKEN_VAR).ok(),
            std::env::var(SECRET_VAR).ok(),
        )
    }

    /// Generate a fresh header set for exactly one request.
    pub fn headers(&self) -> AuthHeaders {
        AuthHeaders::generate(self)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Per-request authentication headers.
///
/// A value must not be reused across requests; call [Credentials::headers]
/// immediately before each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub token: String,
    /// Milliseconds since the unix epoch.
    pub t: i64,
    pub nonce: String,
    pub sign: String,
}

impl AuthHeaders {
    /// Sign with the current time and a random v4 uuid nonce.
    pub fn generate(credentials: &Credentials) -> Self {
        let t = Utc::now().timestamp_millis();
        let nonce = Uuid::new_v4().to_string();
        debug!(t, %nonce, "generated auth headers");
        Self::at(credentials, t, nonce)
    }

    /// Sign with an explicit timestamp and nonce.
    pub fn at(credentials: &Credentials, t: i64, nonce: impl Into<String>) -> Self {
        let nonce = nonce.into();
        let sign = sign(&credentials.token, &credentials.secret, t, &nonce);
        Self {
            token: credentials.token.clone(),
            t,
            nonce,
            sign,
        }
    }

    /// The six header name/value pairs sent with a request.
    pub fn pairs(&self) -> [(HeaderName, String); 6] {
        [
            (AUTHORIZATION, self.token.clone()),
            (CONTENT_TYPE, "application/json".to_string()),
            (CHARSET, "utf-8".to_string()),
            (TIMESTAMP, self.t.to_string()),
            (SIGN, self.sign.clone()),
            (NONCE, self.nonce.clone()),
        ]
    }

    pub fn set_headers<'a>(
        &self,
        headers: &'a mut HeaderMap<HeaderValue>,
    ) -> std::result::Result<&'a mut HeaderMap<HeaderValue>, AuthError> {
        for (name, value) in self.pairs() {
            let mut header_value = HeaderValue::from_str(&value)?;
            if name == AUTHORIZATION || name == SIGN {
                header_value.set_sensitive(true);
            }
            headers.insert(name, header_value);
        }
        Ok(headers)
    }
}

/// Computes `base64(HMAC-SHA256(secret, token ++ t ++ nonce))`.
pub fn sign(token: &str, secret: &str, t: i64, nonce: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(signing_input(token, t, nonce).as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

fn signing_input(token: &str, t: i64, nonce: &str) -> String {
    format!("{}{}{}", token, t, nonce)
}
