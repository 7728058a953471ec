//! At-rest encryption for any backend.
//!
//! Stored layout: `nonce (12 bytes) || ciphertext || auth_tag (16 bytes)`.

use std::time::SystemTime;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use bytes::Bytes;
use sha2::{Digest, Sha256};

use docfs_store::{Backend, ContainerPath, DocPath, EntryKind, Error, FileBackend};

/// Size of an AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Wraps a backend, encrypting content on write and decrypting it on read.
///
/// The key is the SHA-256 digest of the passphrase.  Listing, existence checks, deletes and
/// timestamps go straight to the inner backend.
pub struct EncryptedBackend<B> {
    inner: B,
    cipher: Aes256Gcm,
}

impl<B: Backend> EncryptedBackend<B> {
    pub fn new(inner: B, passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&digest));
        EncryptedBackend { inner, cipher }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, data)
            .map_err(|_| Error::Encryption {
                message: "encrypt error".to_string(),
            })?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        if data.len() < NONCE_SIZE {
            return Err(Error::Encryption {
                message: "data too short for nonce".to_string(),
            });
        }

        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Encryption {
                message: "decrypt error".to_string(),
            })
    }
}

impl<B: Backend> Backend for EncryptedBackend<B> {
    fn exists(&self, path: &DocPath) -> Result<bool, Error> {
        self.inner.exists(path)
    }

    fn get(&self, path: &DocPath) -> Result<Bytes, Error> {
        let data = self.inner.get(path)?;
        self.decrypt(&data).map(Bytes::from)
    }

    fn write(&self, path: &DocPath, data: Bytes) -> Result<(), Error> {
        let sealed = self.encrypt(&data)?;
        self.inner.write(path, Bytes::from(sealed))
    }

    fn delete(&self, path: &DocPath) -> Result<(), Error> {
        self.inner.delete(path)
    }

    fn list(&self, path: &ContainerPath) -> Result<Vec<String>, Error> {
        self.inner.list(path)
    }

    fn last_modified(&self, path: &DocPath) -> Result<SystemTime, Error> {
        self.inner.last_modified(path)
    }
}

impl<B: FileBackend> FileBackend for EncryptedBackend<B> {
    fn list_types(&self, path: &ContainerPath, kind: EntryKind) -> Result<Vec<String>, Error> {
        self.inner.list_types(path, kind)
    }
}
