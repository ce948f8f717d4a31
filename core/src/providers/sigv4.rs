//! AWS Signature Version 4 request signing.

use chrono::{DateTime, Utc};
use ring::{digest, hmac};
use std::fmt::Write;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

pub struct Signer<'a> {
    credentials: &'a AwsCredentials,
    region: &'a str,
    service: &'a str,
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(digest::digest(&digest::SHA256, data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&key, data).as_ref().to_vec()
}

pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

impl<'a> Signer<'a> {
    pub fn new(credentials: &'a AwsCredentials, region: &'a str, service: &'a str) -> Self {
        Self {
            credentials,
            region,
            service,
        }
    }

    pub fn signing_key(&self, date: &str) -> Vec<u8> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac_sha256(secret.as_bytes(), date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }

    /// Headers to attach to the request, `authorization` included.
    ///
    /// `canonical_uri` must already be in canonical form; `headers` must hold
    /// every header to sign except `x-amz-date` and the session token.
    pub fn sign(
        &self,
        method: &str,
        canonical_uri: &str,
        headers: &[(&str, &str)],
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let mut signed: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
            .collect();
        signed.push(("x-amz-date".to_string(), amz_date.clone()));
        if let Some(token) = &self.credentials.session_token {
            signed.push(("x-amz-security-token".to_string(), token.clone()));
        }
        signed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut canonical_headers = String::new();
        for (k, v) in &signed {
            let _ = writeln!(canonical_headers, "{}:{}", k, v);
        }
        let signed_headers = signed
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method,
            canonical_uri,
            canonical_headers,
            signed_headers,
            sha256_hex(payload)
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&date),
            string_to_sign.as_bytes(),
        ));

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.credentials.access_key_id, scope, signed_headers, signature
        );

        let mut out: Vec<(String, String)> = signed
            .into_iter()
            .filter(|(k, _)| k != "host")
            .collect();
        out.push(("authorization".to_string(), authorization));
        out
    }
}
