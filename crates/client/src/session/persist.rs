// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session persistence backends.
//!
//! On disk the session is JSON sealed with ChaCha20-Poly1305:
//! `session.bin` holds a 12-byte nonce followed by ciphertext and tag.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use super::Session;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Storage for the single persisted session record.
pub trait SessionBackend: Send + Sync {
    /// `Ok(None)` when nothing has been saved.
    fn load(&self) -> anyhow::Result<Option<Session>>;
    fn save(&self, session: &Session) -> anyhow::Result<()>;
    /// Delete the record. Succeeds if nothing was saved.
    fn clear(&self) -> anyhow::Result<()>;
}

/// 256-bit key sealing the session file.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Parse a standard-base64 encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> anyhow::Result<Self> {
        let bytes = STANDARD.decode(encoded.trim())?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            anyhow::anyhow!("session key must be {KEY_LEN} bytes, got {}", b.len())
        })?;
        Ok(Self(key))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Read the key file at `path`, creating it with a fresh key if absent.
    pub fn load_or_generate(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_base64(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let key = Self::generate();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                write_private(path, key.to_base64().as_bytes())?;
                tracing::info!(path = %path.display(), "generated session key");
                Ok(key)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Encrypted session file under the state directory.
#[derive(Debug)]
pub struct SealedFileBackend {
    path: PathBuf,
    key: SessionKey,
}

impl SealedFileBackend {
    pub fn new(path: PathBuf, key: SessionKey) -> Self {
        Self { path, key }
    }

    /// Backend at `<state_dir>/session.bin`.
    ///
    /// Uses `encoded_key` when given, otherwise `<state_dir>/session.key`
    /// (generated on first use).
    pub fn open(state_dir: &Path, encoded_key: Option<&str>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(state_dir)?;
        let key = match encoded_key {
            Some(encoded) => SessionKey::from_base64(encoded)?,
            None => SessionKey::load_or_generate(&state_dir.join("session.key"))?,
        };
        Ok(Self::new(state_dir.join("session.bin"), key))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key.0))
    }

    fn seal(&self, plaintext: &[u8]) -> anyhow::Result<Vec<u8>> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| anyhow::anyhow!("failed to seal session"))?;
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn unseal(&self, sealed: &[u8]) -> anyhow::Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            anyhow::bail!("session file truncated ({} bytes)", sealed.len());
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow::anyhow!("session file could not be decrypted (wrong key?)"))
    }
}

impl SessionBackend for SealedFileBackend {
    fn load(&self) -> anyhow::Result<Option<Session>> {
        let sealed = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let plaintext = self.unseal(&sealed)?;
        Ok(Some(serde_json::from_slice(&plaintext)?))
    }

    fn save(&self, session: &Session) -> anyhow::Result<()> {
        let json = serde_json::to_vec(session)?;
        write_private(&self.path, &self.seal(&json)?)
    }

    fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process backend for tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stored: Mutex<Option<Session>>,
}

impl MemoryBackend {
    /// What a restart would see.
    pub fn stored(&self) -> Option<Session> {
        self.stored.lock().ok().and_then(|guard| guard.clone())
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> anyhow::Result<Option<Session>> {
        let guard = self.stored.lock().map_err(|_| anyhow::anyhow!("memory backend poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> anyhow::Result<()> {
        let mut guard =
            self.stored.lock().map_err(|_| anyhow::anyhow!("memory backend poisoned"))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        let mut guard =
            self.stored.lock().map_err(|_| anyhow::anyhow!("memory backend poisoned"))?;
        *guard = None;
        Ok(())
    }
}

/// Write `bytes` to `path` atomically (unique tmp file + rename), owner-only.
fn write_private(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
