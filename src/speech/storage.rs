//! Local object storage with signed download URLs.
//!
//! Objects live under the base directory at their slash-separated key:
//! ```text
//! {base_path}/
//! └── audio/
//!     ├── 20260301_083000_ab12cd34-....mp3
//!     └── 20260301_083000_ab12cd34-....mp3.type
//! ```
//! The `.type` sidecar holds the content type given at upload.
//!
//! Download URLs carry an expiry and a base64url HMAC-SHA256 signature over
//! `"{key}:{expires}"`, so they can be handed out without authentication.

use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{Result, SkratimeError};

type HmacSha256 = Hmac<Sha256>;

const CONTENT_TYPE_SUFFIX: &str = ".type";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A stored object read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// A time-limited download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Object store rooted at a local directory.
#[derive(Clone)]
pub struct ObjectStorage {
    base_path: PathBuf,
    signing_key: Vec<u8>,
    public_base_url: String,
    url_expiry_secs: u64,
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("base_path", &self.base_path)
            .field("public_base_url", &self.public_base_url)
            .field("url_expiry_secs", &self.url_expiry_secs)
            .finish_non_exhaustive()
    }
}

impl ObjectStorage {
    /// Create a store. The base directory is created if missing.
    pub fn new(
        base_path: impl Into<PathBuf>,
        signing_secret: &str,
        public_base_url: &str,
        url_expiry_secs: u64,
    ) -> Result<Self> {
        if signing_secret.is_empty() {
            return Err(SkratimeError::Config("storage signing secret is empty".into()));
        }
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            signing_key: signing_secret.as_bytes().to_vec(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            url_expiry_secs,
        })
    }

    /// Store bytes under `key`, replacing any existing object.
    pub async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, bytes).await?;
        tokio::fs::write(sidecar_path(&path), content_type).await?;

        tracing::debug!(key, size = bytes.len(), "Stored object");
        Ok(())
    }

    /// Read an object. Missing objects are `NotFound`.
    pub async fn get(&self, key: &str) -> Result<StoredObject> {
        let path = self.object_path(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SkratimeError::NotFound(format!("Object {key}")));
            }
            Err(e) => return Err(e.into()),
        };
        let content_type = tokio::fs::read_to_string(sidecar_path(&path))
            .await
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_CONTENT_TYPE.to_string());

        Ok(StoredObject { bytes, content_type })
    }

    /// Create a download URL valid for the configured lifetime from `now`.
    pub fn signed_url_at(&self, key: &str, now: DateTime<Utc>) -> Result<SignedUrl> {
        validate_key(key)?;
        let expires = now.timestamp() + self.url_expiry_secs as i64;
        let expires_at = Utc
            .timestamp_opt(expires, 0)
            .single()
            .ok_or_else(|| SkratimeError::Storage("expiry out of range".into()))?;

        let url = format!(
            "{}/media/{}?expires={}&signature={}",
            self.public_base_url,
            encode_key(key),
            expires,
            self.sign(key, expires)
        );
        Ok(SignedUrl { url, expires_at })
    }

    /// Check a download signature. Fails with `Permission` when the
    /// signature does not match or the URL has expired.
    pub fn verify(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SkratimeError::Permission("invalid signature".into()))?;

        self.mac(key, expires)
            .verify_slice(&provided)
            .map_err(|_| SkratimeError::Permission("invalid signature".into()))?;

        if now.timestamp() > expires {
            return Err(SkratimeError::Permission("link expired".into()));
        }
        Ok(())
    }

    fn sign(&self, key: &str, expires: i64) -> String {
        URL_SAFE_NO_PAD.encode(self.mac(key, expires).finalize().into_bytes())
    }

    fn mac(&self, key: &str, expires: i64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .expect("HMAC accepts any key length");
        mac.update(format!("{key}:{expires}").as_bytes());
        mac
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(key
            .split('/')
            .fold(self.base_path.clone(), |path, segment| path.join(segment)))
    }
}

/// Keys are relative, slash-separated paths of plain segments.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && !segment.ends_with(CONTENT_TYPE_SUFFIX)
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });

    if valid {
        Ok(())
    } else {
        Err(SkratimeError::Validation(format!("invalid object key: {key}")))
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(CONTENT_TYPE_SUFFIX);
    PathBuf::from(name)
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
