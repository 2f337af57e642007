//! Snapshot encryption
//!
//! Payload layout is `IV || AES-CFB(base64(plaintext))`. The IV is one AES
//! block of fresh randomness per call; the key size selects AES-128, -192
//! or -256.
//!
//! This scheme provides confidentiality only. There is no authentication
//! tag, so a tampered payload is not reported as tampered: it decrypts to
//! garbage or fails at the base64 step.

use crate::error::CryptoError;
use aes::cipher::{AsyncStreamCipher, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use std::path::Path;
use zeroize::Zeroizing;

/// AES block size, which is also the IV size
pub const BLOCK_SIZE: usize = 16;

type Aes128CfbEnc = cfb_mode::Encryptor<Aes128>;
type Aes128CfbDec = cfb_mode::Decryptor<Aes128>;
type Aes192CfbEnc = cfb_mode::Encryptor<Aes192>;
type Aes192CfbDec = cfb_mode::Decryptor<Aes192>;
type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    fn from_len(len: usize) -> Result<Self, CryptoError> {
        match len {
            16 => Ok(KeySize::Aes128),
            24 => Ok(KeySize::Aes192),
            32 => Ok(KeySize::Aes256),
            _ => Err(CryptoError::InvalidKeyLength { len }),
        }
    }
}

/// Encrypted snapshot bytes: `IV || ciphertext`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    bytes: Vec<u8>,
}

impl EncryptedPayload {
    /// Wrap raw payload bytes, checking they can hold an IV
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() < BLOCK_SIZE {
            return Err(CryptoError::Framing {
                len: bytes.len(),
                min: BLOCK_SIZE,
            });
        }
        Ok(Self { bytes })
    }

    pub fn iv(&self) -> &[u8] {
        &self.bytes[..BLOCK_SIZE]
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.bytes[BLOCK_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a payload carries at least an IV
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Serialize the payload to a file, replacing its contents
    pub async fn write_to(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, &self.bytes).await
    }
}

/// Symmetric cipher for snapshot payloads
#[derive(Clone)]
pub struct Cipher {
    key: Zeroizing<Vec<u8>>,
    size: KeySize,
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Cipher {
    /// Create a cipher from raw key bytes (16, 24 or 32 bytes)
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let size = KeySize::from_len(key.len())?;
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
            size,
        })
    }

    /// Encrypt a plaintext snapshot
    ///
    /// The output is exactly `BLOCK_SIZE + base64_len(plaintext)` bytes.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedPayload, CryptoError> {
        let encoded = BASE64.encode(plaintext);

        let mut iv = [0u8; BLOCK_SIZE];
        rand::rng().fill_bytes(&mut iv);

        let mut bytes = Vec::with_capacity(BLOCK_SIZE + encoded.len());
        bytes.extend_from_slice(&iv);
        bytes.extend_from_slice(encoded.as_bytes());
        self.encrypt_in_place(&iv, &mut bytes[BLOCK_SIZE..])?;

        EncryptedPayload::from_bytes(bytes)
    }

    /// Decrypt a payload produced by [`Cipher::encrypt`]
    pub fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if payload.len() < BLOCK_SIZE {
            return Err(CryptoError::Framing {
                len: payload.len(),
                min: BLOCK_SIZE,
            });
        }

        let (iv, body) = payload.split_at(BLOCK_SIZE);
        let mut text = Zeroizing::new(body.to_vec());
        self.decrypt_in_place(iv, &mut text)?;

        Ok(BASE64.decode(text.as_slice())?)
    }

    fn encrypt_in_place(&self, iv: &[u8], buf: &mut [u8]) -> Result<(), CryptoError> {
        let invalid = |_| CryptoError::InvalidKeyLength {
            len: self.key.len(),
        };
        match self.size {
            KeySize::Aes128 => Aes128CfbEnc::new_from_slices(&self.key, iv)
                .map_err(invalid)?
                .encrypt(buf),
            KeySize::Aes192 => Aes192CfbEnc::new_from_slices(&self.key, iv)
                .map_err(invalid)?
                .encrypt(buf),
            KeySize::Aes256 => Aes256CfbEnc::new_from_slices(&self.key, iv)
                .map_err(invalid)?
                .encrypt(buf),
        }
        Ok(())
    }

    fn decrypt_in_place(&self, iv: &[u8], buf: &mut [u8]) -> Result<(), CryptoError> {
        let invalid = |_| CryptoError::InvalidKeyLength {
            len: self.key.len(),
        };
        match self.size {
            KeySize::Aes128 => Aes128CfbDec::new_from_slices(&self.key, iv)
                .map_err(invalid)?
                .decrypt(buf),
            KeySize::Aes192 => Aes192CfbDec::new_from_slices(&self.key, iv)
                .map_err(invalid)?
                .decrypt(buf),
            KeySize::Aes256 => Aes256CfbDec::new_from_slices(&self.key, iv)
                .map_err(invalid)?
                .decrypt(buf),
        }
        Ok(())
    }
}
