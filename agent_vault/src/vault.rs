// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_core::common::Shared;
use agent_core::common::Timestamp;
use agent_crypto::aead;
use agent_crypto::jwk::Jwk;
use agent_crypto::jwu;
use agent_crypto::kdf;
use agent_crypto::kdf::ShaHash;
use agent_did::Did;
use agent_did::DidJwk;
use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::envelope::CompactEnvelope;
use crate::envelope::ProtectedHeader;
use crate::envelope::VAULT_ALG;
use crate::error::Error;
use crate::error::Result;
use crate::store::MemVaultStore;
use crate::store::VaultStore;

/// The default PBKDF2-HMAC-SHA-512 work factor.
pub const DEFAULT_KEY_DERIVATION_WORK_FACTOR: u32 = 210_000;

const VAULT_UNLOCK_SALT_INFO: &[u8] = b"vault_unlock_salt";

/// The persisted, non-secret status of a vault.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultStatus {
  /// Whether the vault holds an identity.
  pub initialized: bool,
  /// When the vault was last backed up, if ever.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_backup: Option<Timestamp>,
  /// When the vault was last restored from a backup, if ever.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_restore: Option<Timestamp>,
}

impl Default for VaultStatus {
  fn default() -> Self {
    Self {
      initialized: false,
      last_backup: None,
      last_restore: None,
    }
  }
}

/// The secret content protected by the vault envelope.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultContent {
  /// The agent's own DID.
  pub did: Did,
  /// The private JWKs backing the DID's verification methods.
  pub private_keys: Vec<Jwk>,
}

/// A portable, encrypted copy of the vault.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultBackup {
  /// When the backup was produced.
  pub date_created: Timestamp,
  /// The size of `data` in bytes.
  pub size: usize,
  /// The compact envelope.
  pub data: String,
}

/// A password-protected container for the agent's root identity.
///
/// State machine: `Uninitialized -> Initialized+Locked <-> Initialized+Unlocked`.
/// The vault unlock key (VUK) is derived from the password with PBKDF2 over a
/// salt bound to the identity's public key, and exists in memory only while
/// the vault is unlocked.
pub struct IdentityVault<S: VaultStore = MemVaultStore> {
  store: S,
  work_factor: u32,
  unlock_key: Shared<Option<Zeroizing<Vec<u8>>>>,
  content: Shared<Option<VaultContent>>,
}

impl IdentityVault<MemVaultStore> {
  /// Creates a vault over an in-memory store with the default work factor.
  pub fn new() -> Self {
    Self::with_store(MemVaultStore::new())
  }
}

impl Default for IdentityVault<MemVaultStore> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S: VaultStore> IdentityVault<S> {
  /// Creates a vault over the given store with the default work factor.
  pub fn with_store(store: S) -> Self {
    Self::with_work_factor(store, DEFAULT_KEY_DERIVATION_WORK_FACTOR)
  }

  /// Creates a vault with an explicit PBKDF2 work factor.
  pub fn with_work_factor(store: S, work_factor: u32) -> Self {
    Self {
      store,
      work_factor,
      unlock_key: Shared::new(None),
      content: Shared::new(None),
    }
  }

  /// Returns the persisted vault status.
  pub async fn status(&self) -> Result<VaultStatus> {
    Ok(self.store.status().await?.unwrap_or_default())
  }

  /// Returns `true` once [`IdentityVault::initialize`] has succeeded.
  pub async fn is_initialized(&self) -> Result<bool> {
    Ok(self.status().await?.initialized)
  }

  /// Returns `true` while the unlock key is resident in memory.
  pub fn is_unlocked(&self) -> Result<bool> {
    Ok(self.unlock_key.read()?.is_some())
  }

  /// Initializes the vault: mints the agent DID from a fresh Ed25519 key and
  /// seals its private key under `password`. The vault is left unlocked.
  pub async fn initialize(&self, password: &str) -> Result<Did> {
    let private_key: Jwk = agent_crypto::signature::generate_ed25519()?;
    self.initialize_with_key(password, private_key).await
  }

  /// Initializes the vault with caller-provided key material.
  pub async fn initialize_with_key(&self, password: &str, private_key: Jwk) -> Result<Did> {
    if self.is_initialized().await? {
      return Err(Error::AlreadyInitialized);
    }

    let public_key: Jwk = private_key.to_public();
    let did: Did = DidJwk::encode(&public_key)?;

    let salt: Vec<u8> = derive_salt(&public_key)?;
    let unlock_key: Zeroizing<Vec<u8>> = derive_unlock_key(password, &salt, self.work_factor)?;

    let content: VaultContent = VaultContent {
      did: did.clone(),
      private_keys: vec![private_key],
    };

    let header: ProtectedHeader = ProtectedHeader::new(self.work_factor, &salt, public_key);
    let envelope: CompactEnvelope = seal(&header, &unlock_key, &content)?;

    self.store.set_envelope(envelope.to_string()).await?;
    self.store.set_status(VaultStatus {
      initialized: true,
      last_backup: None,
      last_restore: None,
    })
    .await?;

    *self.unlock_key.write()? = Some(unlock_key);
    *self.content.write()? = Some(content);

    log::debug!("vault initialized for {did}");
    Ok(did)
  }

  /// Recomputes the unlock key from `password` and decrypts the envelope.
  ///
  /// Fails with [`Error::InvalidPassword`] when the password does not
  /// authenticate against the stored envelope.
  pub async fn unlock(&self, password: &str) -> Result<()> {
    let envelope: CompactEnvelope = self.stored_envelope().await?;
    let (unlock_key, content) = open(&envelope, password)?;

    *self.unlock_key.write()? = Some(unlock_key);
    *self.content.write()? = Some(content);
    Ok(())
  }

  /// Discards the unlock key and the decrypted content.
  ///
  /// The key material is overwritten with zeros on drop. Persisted state is
  /// untouched and the vault can be unlocked again at any time.
  pub fn lock(&self) -> Result<()> {
    *self.unlock_key.write()? = None;
    *self.content.write()? = None;
    Ok(())
  }

  /// Re-encrypts the vault under a new password.
  ///
  /// Requires a successful unlock with `old_password`; on failure the vault
  /// state is left exactly as it was.
  pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
    let envelope: CompactEnvelope = self.stored_envelope().await?;
    let (_, content) = open(&envelope, old_password)?;

    let header: ProtectedHeader = envelope.header()?;
    let salt: Vec<u8> = header.salt()?;
    let unlock_key: Zeroizing<Vec<u8>> = derive_unlock_key(new_password, &salt, self.work_factor)?;

    let new_header: ProtectedHeader = ProtectedHeader::new(self.work_factor, &salt, header.wrapped_key.clone());
    let new_envelope: CompactEnvelope = seal(&new_header, &unlock_key, &content)?;

    self.store.set_envelope(new_envelope.to_string()).await?;

    *self.unlock_key.write()? = Some(unlock_key);
    *self.content.write()? = Some(content);
    Ok(())
  }

  /// Emits a portable backup of the sealed vault and records the event.
  pub async fn backup(&self) -> Result<VaultBackup> {
    let data: String = self.stored_envelope().await?.to_string();

    let mut status: VaultStatus = self.status().await?;
    status.last_backup = Some(Timestamp::now_utc());
    self.store.set_status(status).await?;

    Ok(VaultBackup {
      date_created: Timestamp::now_utc(),
      size: data.len(),
      data,
    })
  }

  /// Replaces the vault content from `backup` after validating `password`
  /// against it. On failure the persisted state is left unchanged.
  pub async fn restore(&self, backup: &VaultBackup, password: &str) -> Result<Did> {
    if !self.is_initialized().await? {
      return Err(Error::NotInitialized);
    }

    let envelope: CompactEnvelope = CompactEnvelope::parse(&backup.data)?;
    let (unlock_key, content) = open(&envelope, password)?;

    self.store.set_envelope(envelope.to_string()).await?;
    let mut status: VaultStatus = self.status().await?;
    status.initialized = true;
    status.last_restore = Some(Timestamp::now_utc());
    self.store.set_status(status).await?;

    let did: Did = content.did.clone();
    *self.unlock_key.write()? = Some(unlock_key);
    *self.content.write()? = Some(content);
    Ok(did)
  }

  /// Returns the agent DID. Requires an unlocked vault.
  pub fn did(&self) -> Result<Did> {
    Ok(self.contents()?.did)
  }

  /// Returns the decrypted vault content. Requires an unlocked vault.
  pub fn contents(&self) -> Result<VaultContent> {
    self.content.read()?.clone().ok_or(Error::Locked)
  }

  async fn stored_envelope(&self) -> Result<CompactEnvelope> {
    let stored: String = self.store.envelope().await?.ok_or(Error::NotInitialized)?;
    CompactEnvelope::parse(&stored)
  }
}

/// Derives the PBKDF2 salt from the identity's public signing key:
/// `utf8(alg) || 0x00 || HKDF-SHA-256(ikm = public key bytes, info = "vault_unlock_salt")`.
fn derive_salt(public_key: &Jwk) -> Result<Vec<u8>> {
  let key_bytes: Vec<u8> = jwu::decode_b64(&public_key.try_okp_params()?.x)?;
  let salt_input: Vec<u8> = kdf::hkdf(&key_bytes, None, Some(VAULT_UNLOCK_SALT_INFO), ShaHash::Sha256, 32)?;

  let mut salt: Vec<u8> = Vec::with_capacity(VAULT_ALG.len() + 1 + salt_input.len());
  salt.extend_from_slice(VAULT_ALG.as_bytes());
  salt.push(0x00);
  salt.extend_from_slice(&salt_input);
  Ok(salt)
}

fn derive_unlock_key(password: &str, salt: &[u8], iterations: u32) -> Result<Zeroizing<Vec<u8>>> {
  Ok(Zeroizing::new(kdf::pbkdf2(
    password.as_bytes(),
    salt,
    iterations,
    ShaHash::Sha512,
    32,
  )?))
}

fn seal(header: &ProtectedHeader, unlock_key: &[u8], content: &VaultContent) -> Result<CompactEnvelope> {
  let plaintext: Zeroizing<Vec<u8>> = Zeroizing::new(serde_json::to_vec(content)?);

  let mut nonce: [u8; aead::XCHACHA20_POLY1305_NONCE_LEN] = [0; aead::XCHACHA20_POLY1305_NONCE_LEN];
  rand::thread_rng().fill_bytes(&mut nonce);

  let header_bytes: Vec<u8> = serde_json::to_vec(header)?;
  let (ciphertext, tag) = aead::xchacha20poly1305_encrypt(unlock_key, &nonce, &plaintext, &header_bytes)?;

  CompactEnvelope::new(header, ciphertext, nonce.to_vec(), tag)
}

fn open(envelope: &CompactEnvelope, password: &str) -> Result<(Zeroizing<Vec<u8>>, VaultContent)> {
  let header: ProtectedHeader = envelope.header()?;
  let salt: Vec<u8> = header.salt()?;
  let unlock_key: Zeroizing<Vec<u8>> = derive_unlock_key(password, &salt, header.p2c)?;

  let plaintext: Zeroizing<Vec<u8>> = Zeroizing::new(
    aead::xchacha20poly1305_decrypt(
      &unlock_key,
      envelope.nonce(),
      envelope.ciphertext(),
      envelope.tag(),
      envelope.header_bytes(),
    )
    .map_err(|_| Error::InvalidPassword)?,
  );

  let content: VaultContent = serde_json::from_slice(&plaintext)?;
  Ok((unlock_key, content))
}
