//! Signed cookie holding the real token
//!
//! Cookie value: `base64url(timestamp "|" base64url(token) "|" base64url(mac))`
//! where `mac = HMAC-SHA256(secret, name "|" timestamp "|" base64url(token))`.
//! Binding the cookie name into the MAC stops a value issued under one name
//! from being replayed under another.

use crate::error::{Error, Result};
use crate::options::Options;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use cookie::Cookie;
use hmac::{Hmac, Mac};
use http::{header, HeaderMap};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub(crate) struct CookieStore {
    mac: HmacSha256,
}

impl CookieStore {
    pub(crate) fn new(secret: &[u8]) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::InvalidSecret);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::InvalidSecret)?;
        Ok(Self { mac })
    }

    /// Real token from the request's cookie
    pub(crate) fn get(&self, headers: &HeaderMap, opts: &Options) -> Result<Vec<u8>> {
        let value = read_cookie(headers, &opts.cookie_name).ok_or(Error::NoToken)?;
        self.decode(&opts.cookie_name, &value, opts.max_age.as_secs(), now())
    }

    /// `Set-Cookie` value carrying `token`
    pub(crate) fn set_cookie(&self, token: &[u8], opts: &Options) -> String {
        let value = self.encode(&opts.cookie_name, token, now());

        let mut builder = Cookie::build((opts.cookie_name.clone(), value))
            .path(opts.path.clone())
            .secure(opts.secure)
            .http_only(opts.http_only)
            .same_site(opts.same_site);

        if !opts.max_age.is_zero() {
            let seconds = i64::try_from(opts.max_age.as_secs()).unwrap_or(i64::MAX);
            builder = builder.max_age(cookie::time::Duration::seconds(seconds));
        }

        if let Some(domain) = &opts.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build().to_string()
    }

    pub(crate) fn encode(&self, name: &str, token: &[u8], timestamp: u64) -> String {
        let value = URL_SAFE_NO_PAD.encode(token);
        let mac = URL_SAFE_NO_PAD.encode(self.sign(name, timestamp, &value));
        URL_SAFE_NO_PAD.encode(format!("{}|{}|{}", timestamp, value, mac))
    }

    pub(crate) fn decode(&self, name: &str, encoded: &str, max_age: u64, now: u64) -> Result<Vec<u8>> {
        let decoded = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| Error::MalformedCookie)?;
        let decoded = String::from_utf8(decoded).map_err(|_| Error::MalformedCookie)?;

        let mut parts = decoded.splitn(3, '|');
        let (Some(timestamp), Some(value), Some(mac)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::MalformedCookie);
        };

        let timestamp: u64 = timestamp.parse().map_err(|_| Error::MalformedCookie)?;
        let mac = URL_SAFE_NO_PAD
            .decode(mac)
            .map_err(|_| Error::MalformedCookie)?;

        let mut expected = self.mac.clone();
        expected.update(signing_input(name, timestamp, value).as_bytes());
        expected
            .verify_slice(&mac)
            .map_err(|_| Error::BadSignature)?;

        if max_age > 0 && timestamp.saturating_add(max_age) < now {
            return Err(Error::ExpiredCookie);
        }

        URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|_| Error::MalformedCookie)
    }

    fn sign(&self, name: &str, timestamp: u64, value: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(signing_input(name, timestamp, value).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn signing_input(name: &str, timestamp: u64, value: &str) -> String {
    format!("{}|{}|{}", name, timestamp, value)
}

fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
