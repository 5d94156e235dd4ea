// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;

use agent_core::common::Shared;
use agent_crypto::aead;
use agent_crypto::jwk::Jwk;
use agent_crypto::jwk::JwkParamsOct;
use agent_crypto::jwu;
use agent_crypto::key_wrap;
use agent_crypto::signature;
use async_trait::async_trait;
use rand::RngCore;

use crate::algorithm::KeyAlgorithm;
use crate::error::Error;
use crate::error::Result;
use crate::key_store::KeyStore;
use crate::key_store::MemKeyStore;
use crate::key_uri::KeyUri;

/// The key management capability the rest of the agent depends on.
///
/// Implementations own private key material exclusively; callers hold
/// [`KeyUri`]s. `verify` and `get_key_uri` are pure and take the public JWK
/// directly.
#[async_trait]
pub trait KeyManager: Send + Sync {
  /// Generates a new key for `algorithm` and returns its URI.
  async fn generate_key(&self, algorithm: KeyAlgorithm) -> Result<KeyUri>;

  /// Imports a private JWK, setting `kid` to the thumbprint when absent.
  async fn import_key(&self, jwk: Jwk) -> Result<KeyUri>;

  /// Exports the private JWK stored under `key_uri`.
  async fn export_key(&self, key_uri: &KeyUri) -> Result<Jwk>;

  /// Deletes the key stored under `key_uri`.
  async fn delete_key(&self, key_uri: &KeyUri) -> Result<()>;

  /// Returns the public members of the key stored under `key_uri`.
  async fn get_public_key(&self, key_uri: &KeyUri) -> Result<Jwk>;

  /// Computes the key URI of `jwk` without touching the store.
  fn get_key_uri(&self, jwk: &Jwk) -> Result<KeyUri> {
    Ok(KeyUri::from_jwk(jwk)?)
  }

  /// Signs `data` with the key stored under `key_uri`.
  async fn sign(&self, key_uri: &KeyUri, data: &[u8]) -> Result<Vec<u8>>;

  /// Verifies `signature` over `data` with a public JWK.
  ///
  /// The algorithm is inferred from the `kty`/`crv` members of the key.
  fn verify(&self, key: &Jwk, signature: &[u8], data: &[u8]) -> Result<bool> {
    Ok(signature::verify(key, signature, data)?)
  }

  /// Encrypts `plaintext` under the AES-GCM key stored under `key_uri`,
  /// returning the ciphertext with the 16-byte tag appended.
  async fn encrypt(&self, key_uri: &KeyUri, plaintext: &[u8], iv: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>>;

  /// Decrypts a ciphertext produced by [`KeyManager::encrypt`].
  async fn decrypt(&self, key_uri: &KeyUri, ciphertext: &[u8], iv: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>>;

  /// Wraps the material of `unwrapped_key` under the AES-KW key stored at
  /// `encryption_key_uri` (RFC 3394).
  async fn wrap_key(&self, encryption_key_uri: &KeyUri, unwrapped_key: &Jwk) -> Result<Vec<u8>>;

  /// Unwraps key material and returns it as a JWK tagged with
  /// `wrapped_key_algorithm`; `kid` is set to the thumbprint.
  async fn unwrap_key(
    &self,
    wrapped_key_bytes: &[u8],
    wrapped_key_algorithm: KeyAlgorithm,
    decryption_key_uri: &KeyUri,
  ) -> Result<Jwk>;
}

/// A [`KeyManager`] over a pluggable [`KeyStore`].
#[derive(Debug)]
pub struct LocalKeyManager<S: KeyStore = MemKeyStore> {
  store: S,
}

impl LocalKeyManager<MemKeyStore> {
  /// Creates a new `LocalKeyManager` over an in-memory store.
  pub fn new() -> Self {
    Self::with_store(MemKeyStore::new())
  }
}

impl<S: KeyStore> LocalKeyManager<S> {
  /// Creates a new `LocalKeyManager` over the given store.
  pub fn with_store(store: S) -> Self {
    Self { store }
  }

  async fn require(&self, key_uri: &KeyUri) -> Result<Jwk> {
    self
      .store
      .get(key_uri)
      .await?
      .ok_or_else(|| Error::KeyNotFound(key_uri.to_string()))
  }

  async fn store_keyed_by_thumbprint(&self, mut jwk: Jwk) -> Result<KeyUri> {
    let uri: KeyUri = KeyUri::from_jwk(&jwk)?;
    if jwk.kid().is_none() {
      jwk.set_kid(uri.thumbprint());
    }

    self.store.set(&uri, jwk).await?;
    Ok(uri)
  }
}

impl Default for LocalKeyManager<MemKeyStore> {
  fn default() -> Self {
    Self::new()
  }
}

fn generate_oct_jwk(algorithm: KeyAlgorithm) -> Result<Jwk> {
  // symmetric_key_len is Some for every caller of this helper
  let len: usize = algorithm
    .symmetric_key_len()
    .ok_or_else(|| Error::AlgorithmNotSupported(algorithm.to_string()))?;

  let mut bytes: Vec<u8> = vec![0; len];
  rand::thread_rng().fill_bytes(&mut bytes);

  let mut jwk: Jwk = Jwk::from_params(JwkParamsOct {
    k: Some(jwu::encode_b64(&bytes)),
  });
  jwk.set_alg(algorithm.to_string());
  Ok(jwk)
}

fn generate_jwk(algorithm: KeyAlgorithm) -> Result<Jwk> {
  match algorithm {
    KeyAlgorithm::Ed25519 => Ok(signature::generate_ed25519()?),
    KeyAlgorithm::Secp256k1 => Ok(signature::generate_secp256k1()?),
    KeyAlgorithm::Secp256r1 => Ok(signature::generate_p256()?),
    symmetric => generate_oct_jwk(symmetric),
  }
}

fn require_symmetric(jwk: &Jwk, check: impl Fn(KeyAlgorithm) -> bool) -> Result<Vec<u8>> {
  let alg: KeyAlgorithm = jwk
    .alg()
    .and_then(|name| name.parse().ok())
    .ok_or_else(|| Error::AlgorithmNotSupported(jwk.alg().unwrap_or("unset").to_owned()))?;

  if !check(alg) {
    return Err(Error::AlgorithmNotSupported(alg.to_string()));
  }

  Ok(jwk.try_oct_key()?)
}

#[async_trait]
impl<S: KeyStore> KeyManager for LocalKeyManager<S> {
  async fn generate_key(&self, algorithm: KeyAlgorithm) -> Result<KeyUri> {
    self.store_keyed_by_thumbprint(generate_jwk(algorithm)?).await
  }

  async fn import_key(&self, jwk: Jwk) -> Result<KeyUri> {
    if !jwk.is_private() {
      return Err(Error::CryptoError(agent_crypto::Error::InvalidJwk(
        "cannot import a public key",
      )));
    }

    self.store_keyed_by_thumbprint(jwk).await
  }

  async fn export_key(&self, key_uri: &KeyUri) -> Result<Jwk> {
    self.require(key_uri).await
  }

  async fn delete_key(&self, key_uri: &KeyUri) -> Result<()> {
    if !self.store.delete(key_uri).await? {
      return Err(Error::KeyNotFound(key_uri.to_string()));
    }
    Ok(())
  }

  async fn get_public_key(&self, key_uri: &KeyUri) -> Result<Jwk> {
    Ok(self.require(key_uri).await?.to_public())
  }

  async fn sign(&self, key_uri: &KeyUri, data: &[u8]) -> Result<Vec<u8>> {
    let jwk: Jwk = self.require(key_uri).await?;
    Ok(signature::sign(&jwk, data)?)
  }

  async fn encrypt(&self, key_uri: &KeyUri, plaintext: &[u8], iv: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>> {
    let jwk: Jwk = self.require(key_uri).await?;
    let key: Vec<u8> = require_symmetric(&jwk, |alg| alg.is_aes_gcm())?;

    let (mut ciphertext, tag) = aead::aes_gcm_encrypt(&key, iv, plaintext, aad.unwrap_or_default())?;
    ciphertext.extend_from_slice(&tag);
    Ok(ciphertext)
  }

  async fn decrypt(&self, key_uri: &KeyUri, ciphertext: &[u8], iv: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>> {
    let jwk: Jwk = self.require(key_uri).await?;
    let key: Vec<u8> = require_symmetric(&jwk, |alg| alg.is_aes_gcm())?;

    if ciphertext.len() < aead::AEAD_TAG_LEN {
      return Err(Error::CryptoError(agent_crypto::Error::InvalidTagLength(ciphertext.len())));
    }
    let (body, tag) = ciphertext.split_at(ciphertext.len() - aead::AEAD_TAG_LEN);

    Ok(aead::aes_gcm_decrypt(&key, iv, body, tag, aad.unwrap_or_default())?)
  }

  async fn wrap_key(&self, encryption_key_uri: &KeyUri, unwrapped_key: &Jwk) -> Result<Vec<u8>> {
    let kek_jwk: Jwk = self.require(encryption_key_uri).await?;
    let kek: Vec<u8> = require_symmetric(&kek_jwk, |alg| alg.is_key_wrap())?;
    let key: Vec<u8> = unwrapped_key.try_oct_key()?;

    Ok(key_wrap::aes_kw_wrap(&kek, &key)?)
  }

  async fn unwrap_key(
    &self,
    wrapped_key_bytes: &[u8],
    wrapped_key_algorithm: KeyAlgorithm,
    decryption_key_uri: &KeyUri,
  ) -> Result<Jwk> {
    if !wrapped_key_algorithm.is_symmetric() {
      return Err(Error::AlgorithmNotSupported(wrapped_key_algorithm.to_string()));
    }

    let kek_jwk: Jwk = self.require(decryption_key_uri).await?;
    let kek: Vec<u8> = require_symmetric(&kek_jwk, |alg| alg.is_key_wrap())?;
    let key: Vec<u8> = key_wrap::aes_kw_unwrap(&kek, wrapped_key_bytes)?;

    let mut jwk: Jwk = Jwk::from_params(JwkParamsOct {
      k: Some(jwu::encode_b64(&key)),
    });
    jwk.set_alg(wrapped_key_algorithm.to_string());
    let thumbprint: String = jwk.thumbprint_b64()?;
    jwk.set_kid(thumbprint);

    Ok(jwk)
  }
}

/// A [`KeyManager`] variant for test fixtures: keys passed to
/// [`DeterministicKeyManager::with_predefined_keys`] are returned, in order,
/// by `generate_key` before any random generation happens.
#[derive(Debug)]
pub struct DeterministicKeyManager {
  inner: LocalKeyManager<MemKeyStore>,
  predefined: Shared<VecDeque<Jwk>>,
}

impl DeterministicKeyManager {
  /// Creates a new `DeterministicKeyManager` with no predefined keys.
  pub fn new() -> Self {
    Self {
      inner: LocalKeyManager::new(),
      predefined: Shared::new(VecDeque::new()),
    }
  }

  /// Creates a manager that serves `keys`, in order, from `generate_key`.
  pub fn with_predefined_keys(keys: impl IntoIterator<Item = Jwk>) -> Self {
    Self {
      inner: LocalKeyManager::new(),
      predefined: Shared::new(keys.into_iter().collect()),
    }
  }

  /// Appends keys to the predefined queue.
  pub fn add_predefined_keys(&self, keys: impl IntoIterator<Item = Jwk>) -> Result<()> {
    self.predefined.write()?.extend(keys);
    Ok(())
  }
}

impl Default for DeterministicKeyManager {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl KeyManager for DeterministicKeyManager {
  async fn generate_key(&self, algorithm: KeyAlgorithm) -> Result<KeyUri> {
    let next: Option<Jwk> = self.predefined.write()?.pop_front();

    match next {
      Some(jwk) => self.inner.import_key(jwk).await,
      None => {
        log::debug!("predefined keys exhausted, generating {algorithm}");
        self.inner.generate_key(algorithm).await
      }
    }
  }

  async fn import_key(&self, jwk: Jwk) -> Result<KeyUri> {
    self.inner.import_key(jwk).await
  }

  async fn export_key(&self, key_uri: &KeyUri) -> Result<Jwk> {
    self.inner.export_key(key_uri).await
  }

  async fn delete_key(&self, key_uri: &KeyUri) -> Result<()> {
    self.inner.delete_key(key_uri).await
  }

  async fn get_public_key(&self, key_uri: &KeyUri) -> Result<Jwk> {
    self.inner.get_public_key(key_uri).await
  }

  async fn sign(&self, key_uri: &KeyUri, data: &[u8]) -> Result<Vec<u8>> {
    self.inner.sign(key_uri, data).await
  }

  async fn encrypt(&self, key_uri: &KeyUri, plaintext: &[u8], iv: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>> {
    self.inner.encrypt(key_uri, plaintext, iv, aad).await
  }

  async fn decrypt(&self, key_uri: &KeyUri, ciphertext: &[u8], iv: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>> {
    self.inner.decrypt(key_uri, ciphertext, iv, aad).await
  }

  async fn wrap_key(&self, encryption_key_uri: &KeyUri, unwrapped_key: &Jwk) -> Result<Vec<u8>> {
    self.inner.wrap_key(encryption_key_uri, unwrapped_key).await
  }

  async fn unwrap_key(
    &self,
    wrapped_key_bytes: &[u8],
    wrapped_key_algorithm: KeyAlgorithm,
    decryption_key_uri: &KeyUri,
  ) -> Result<Jwk> {
    self
      .inner
      .unwrap_key(wrapped_key_bytes, wrapped_key_algorithm, decryption_key_uri)
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_generate_sign_verify() {
    let manager: LocalKeyManager = LocalKeyManager::new();

    for algorithm in [KeyAlgorithm::Ed25519, KeyAlgorithm::Secp256k1, KeyAlgorithm::Secp256r1] {
      let uri: KeyUri = manager.generate_key(algorithm).await.unwrap();
      let public: Jwk = manager.get_public_key(&uri).await.unwrap();
      assert!(!public.is_private());

      let signature: Vec<u8> = manager.sign(&uri, b"message").await.unwrap();
      assert!(manager.verify(&public, &signature, b"message").unwrap());
      assert!(!manager.verify(&public, &signature, b"other").unwrap());
    }
  }

  #[tokio::test]
  async fn test_import_is_idempotent_and_sets_kid() {
    let manager: LocalKeyManager = LocalKeyManager::new();
    let jwk: Jwk = signature::generate_ed25519().unwrap();

    let first: KeyUri = manager.import_key(jwk.clone()).await.unwrap();
    let second: KeyUri = manager.import_key(jwk.clone()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(manager.get_key_uri(&jwk).unwrap(), first);

    let exported: Jwk = manager.export_key(&first).await.unwrap();
    assert_eq!(exported.kid(), Some(first.thumbprint()));
  }

  #[tokio::test]
  async fn test_import_rejects_public_keys() {
    let manager: LocalKeyManager = LocalKeyManager::new();
    let public: Jwk = signature::generate_ed25519().unwrap().to_public();
    assert!(manager.import_key(public).await.is_err());
  }

  #[tokio::test]
  async fn test_delete_and_missing_keys() {
    let manager: LocalKeyManager = LocalKeyManager::new();
    let uri: KeyUri = manager.generate_key(KeyAlgorithm::Ed25519).await.unwrap();

    manager.delete_key(&uri).await.unwrap();
    assert!(matches!(manager.delete_key(&uri).await, Err(Error::KeyNotFound(_))));
    assert!(matches!(manager.export_key(&uri).await, Err(Error::KeyNotFound(_))));
    assert!(matches!(manager.sign(&uri, b"data").await, Err(Error::KeyNotFound(_))));
  }

  #[tokio::test]
  async fn test_encrypt_decrypt_roundtrip() {
    let manager: LocalKeyManager = LocalKeyManager::new();
    let uri: KeyUri = manager.generate_key(KeyAlgorithm::A256Gcm).await.unwrap();
    let iv: [u8; 12] = [0; 12];

    let sealed: Vec<u8> = manager.encrypt(&uri, b"plaintext", &iv, Some(b"aad")).await.unwrap();
    assert_eq!(sealed.len(), b"plaintext".len() + aead::AEAD_TAG_LEN);

    let opened: Vec<u8> = manager.decrypt(&uri, &sealed, &iv, Some(b"aad")).await.unwrap();
    assert_eq!(opened, b"plaintext");

    assert!(manager.decrypt(&uri, &sealed, &iv, None).await.is_err());
  }

  #[tokio::test]
  async fn test_encrypt_requires_gcm_key() {
    let manager: LocalKeyManager = LocalKeyManager::new();
    let uri: KeyUri = manager.generate_key(KeyAlgorithm::A256Kw).await.unwrap();
    assert!(matches!(
      manager.encrypt(&uri, b"plaintext", &[0; 12], None).await,
      Err(Error::AlgorithmNotSupported(_))
    ));
  }

  #[tokio::test]
  async fn test_aes_kw_unwrap_fixture() {
    let manager: LocalKeyManager = LocalKeyManager::new();

    let kek: Jwk = serde_json::from_str(
      r#"{"kty":"oct","alg":"A256KW","k":"47Fn3ZXGbmntoAKErKN5-d7yuwMejCJtOqgAeq_Ojk0","kid":"izA6N7g3xmPWStB6Qe6BbGgfrXvrptzuH2eJ1wmdrtk"}"#,
    )
    .unwrap();
    let kek_uri: KeyUri = manager.import_key(kek).await.unwrap();

    let wrapped: Vec<u8> =
      hex::decode("8c55fb6fc4c7bb0b6b483df65ba52bee7ed6e0f861ac8097b2394f61067d1157901295aba72c514b").unwrap();

    let unwrapped: Jwk = manager
      .unwrap_key(&wrapped, KeyAlgorithm::A256Gcm, &kek_uri)
      .await
      .unwrap();

    assert_eq!(unwrapped.alg(), Some("A256GCM"));
    assert_eq!(unwrapped.kid(), Some("-TssSnJNgh10-YTwuBtyZTnv0LY6sdT-TQl9WFTSetI"));
    assert_eq!(
      unwrapped.try_oct_params().unwrap().k.as_deref(),
      Some("hX-1yAAU6aZCwGqViYfAhIiaTyu1PURMswoI4IQmiY4")
    );

    // wrapping the same key under the same KEK reproduces the ciphertext
    let rewrapped: Vec<u8> = manager.wrap_key(&kek_uri, &unwrapped).await.unwrap();
    assert_eq!(rewrapped, wrapped);
  }

  #[tokio::test]
  async fn test_wrap_unwrap_all_kw_algorithms() {
    let manager: LocalKeyManager = LocalKeyManager::new();

    for kw in [KeyAlgorithm::A128Kw, KeyAlgorithm::A192Kw, KeyAlgorithm::A256Kw] {
      let kek_uri: KeyUri = manager.generate_key(kw).await.unwrap();
      let content_uri: KeyUri = manager.generate_key(KeyAlgorithm::A128Gcm).await.unwrap();
      let content: Jwk = manager.export_key(&content_uri).await.unwrap();

      let wrapped: Vec<u8> = manager.wrap_key(&kek_uri, &content).await.unwrap();
      let unwrapped: Jwk = manager.unwrap_key(&wrapped, KeyAlgorithm::A128Gcm, &kek_uri).await.unwrap();

      assert_eq!(
        unwrapped.try_oct_params().unwrap().k,
        content.try_oct_params().unwrap().k
      );
    }
  }

  #[tokio::test]
  async fn test_deterministic_key_manager_serves_keys_in_order() {
    let first: Jwk = signature::generate_ed25519().unwrap();
    let second: Jwk = signature::generate_ed25519().unwrap();

    let manager: DeterministicKeyManager =
      DeterministicKeyManager::with_predefined_keys([first.clone(), second.clone()]);

    let uri_a: KeyUri = manager.generate_key(KeyAlgorithm::Ed25519).await.unwrap();
    let uri_b: KeyUri = manager.generate_key(KeyAlgorithm::Ed25519).await.unwrap();

    assert_eq!(uri_a, KeyUri::from_jwk(&first).unwrap());
    assert_eq!(uri_b, KeyUri::from_jwk(&second).unwrap());

    // exhausted queues fall back to random generation
    let uri_c: KeyUri = manager.generate_key(KeyAlgorithm::Ed25519).await.unwrap();
    assert_ne!(uri_c, uri_a);
    assert_ne!(uri_c, uri_b);
  }
}
