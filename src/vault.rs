use crate::{constants::VAULT_IV_LEN, error::VaultError};
use base64::{engine::general_purpose, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::{Digest, Sha256};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypts upstream passwords at rest as `<ivBase64>:<cipherBase64>` with AES-256-CBC
#[derive(Clone)]
pub struct CredentialVault {
  key: [u8; 32],
}

impl CredentialVault {
  pub fn new(secret: &str) -> Self {
    Self {
      key: derive_key(secret),
    }
  }

  pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
    let mut iv = [0u8; VAULT_IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);
    let cipher = Aes256CbcEnc::new_from_slices(&self.key, &iv)
      .map_err(|_| VaultError::EncryptionFailed)?
      .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    Ok(format!(
      "{}:{}",
      general_purpose::STANDARD.encode(iv),
      general_purpose::STANDARD.encode(cipher)
    ))
  }

  pub fn decrypt(&self, blob: &str) -> Result<String, VaultError> {
    let Some((iv_b64, cipher_b64)) = blob.split_once(':') else {
      return Err(VaultError::MalformedCredentialBlob);
    };
    if iv_b64.is_empty() || cipher_b64.is_empty() {
      return Err(VaultError::MalformedCredentialBlob);
    }
    let failed = || VaultError::DecryptionFailed {
      fingerprint: fingerprint(blob),
    };

    let iv = general_purpose::STANDARD.decode(iv_b64).map_err(|_| failed())?;
    if iv.len() != VAULT_IV_LEN {
      return Err(VaultError::MalformedCredentialBlob);
    }
    let cipher = general_purpose::STANDARD.decode(cipher_b64).map_err(|_| failed())?;
    let plain = Aes256CbcDec::new_from_slices(&self.key, &iv)
      .map_err(|_| failed())?
      .decrypt_padded_vec_mut::<Pkcs7>(&cipher)
      .map_err(|_| failed())?;
    String::from_utf8(plain).map_err(|_| failed())
  }
}

/// SHA-256 of the UTF-8 secret
pub fn derive_key(secret: &str) -> [u8; 32] {
  Sha256::digest(secret.as_bytes()).into()
}

/// Short identity of a blob for diagnostics
fn fingerprint(blob: &str) -> String {
  Sha256::digest(blob.as_bytes())
    .iter()
    .take(4)
    .map(|b| format!("{:02x}", b))
    .collect()
}
