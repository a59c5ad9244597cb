//! # セッション鍵とAES-256-GCM
//!
//! 1リクエスト／1レスポンスの組に限って使う使い捨ての対称鍵。
//! リクエストの暗号化（[`SessionKey::seal`]）は1つの鍵につき1回だけ許される。
//! nonceは暗号化のたびに内部で `OsRng` から生成し、呼び出し側からは受け取らない。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use bitacross_types::{AesOutput, RequestAesKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::CryptoError;

/// AES-256-GCMのnonce長
pub const NONCE_LEN: usize = 12;

/// 使い捨てのAES-256セッション鍵。ドロップ時にゼロ化される。
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; 32],
    /// リクエストの暗号化に使用済みか
    #[zeroize(skip)]
    sealed: AtomicBool,
}

impl SessionKey {
    /// OSの乱数生成器から新しい鍵を生成する。
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::from_bytes(key)
    }

    /// 既存の鍵バイト列から復元する（レスポンスを後から開く場合など）。
    pub fn from_bytes(bytes: RequestAesKey) -> Self {
        Self {
            key: bytes,
            sealed: AtomicBool::new(false),
        }
    }

    /// 鍵バイト列。コール本体に埋め込むために使う。
    pub fn as_bytes(&self) -> &RequestAesKey {
        &self.key
    }

    fn cipher(&self) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::EncryptError)
    }

    /// リクエスト平文を暗号化する。AADは空。
    ///
    /// 1つの鍵で暗号化できるのは1回だけで、2回目以降は
    /// [`CryptoError::SessionKeyReused`] になる。
    pub fn seal(&self, plaintext: &[u8]) -> Result<AesOutput, CryptoError> {
        self.seal_with_aad(plaintext, &[])
    }

    /// AAD付きで暗号化する。[`SessionKey::seal`] と同じく1回限り。
    pub fn seal_with_aad(&self, plaintext: &[u8], aad: &[u8]) -> Result<AesOutput, CryptoError> {
        if self.sealed.swap(true, Ordering::SeqCst) {
            return Err(CryptoError::SessionKeyReused);
        }
        self.encrypt(plaintext, aad)
    }

    /// ワーカー側でレスポンスを暗号化する。
    ///
    /// 1つのリクエストに対する状態更新は同じ鍵で複数回返されるため、
    /// 使用済みフラグは参照しない。
    pub fn seal_reply(&self, plaintext: &[u8]) -> Result<AesOutput, CryptoError> {
        self.encrypt(plaintext, &[])
    }

    fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<AesOutput, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
            .map_err(|_| CryptoError::EncryptError)?;
        Ok(AesOutput {
            ciphertext,
            aad: aad.to_vec(),
            nonce,
        })
    }

    /// [`AesOutput`] を復号する。認証タグが一致しない場合は平文を一切返さない。
    pub fn open(&self, output: &AesOutput) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::DecryptError)?;
        cipher
            .decrypt(
                Nonce::from_slice(&output.nonce),
                Payload {
                    msg: &output.ciphertext,
                    aad: &output.aad,
                },
            )
            .map_err(|_| CryptoError::DecryptError)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 暗号化→復号のラウンドトリップ
    #[test]
    fn test_seal_open_roundtrip() {
        let key = SessionKey::generate();
        let output = key.seal(b"direct call").unwrap();
        assert!(output.aad.is_empty());
        assert_eq!(output.ciphertext.len(), b"direct call".len() + 16);
        assert_eq!(key.open(&output).unwrap(), b"direct call");
    }

    /// 1つの鍵でリクエストを2回暗号化することはできない
    #[test]
    fn test_second_seal_is_rejected() {
        let key = SessionKey::generate();
        let first = key.seal(b"first").unwrap();
        assert!(matches!(key.seal(b"second"), Err(CryptoError::SessionKeyReused)));
        assert!(matches!(
            key.seal_with_aad(b"second", b"header"),
            Err(CryptoError::SessionKeyReused)
        ));
        // 使用済みでも復号はできる
        assert_eq!(key.open(&first).unwrap(), b"first");
    }

    /// 同じ鍵バイト列・同じ平文でもnonceと暗号文は毎回異なる
    #[test]
    fn test_nonce_is_fresh() {
        let bytes = *b"AES256Key-1234123412341234123412";
        let a = SessionKey::from_bytes(bytes).seal(b"same").unwrap();
        let b = SessionKey::from_bytes(bytes).seal(b"same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    /// ワーカー側のレスポンス暗号化は使用済みフラグに影響されない
    #[test]
    fn test_reply_sealing_is_independent() {
        let key = SessionKey::generate();
        key.seal(b"request").unwrap();
        let a = key.seal_reply(b"Submitted").unwrap();
        let b = key.seal_reply(b"InSidechainBlock").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_eq!(key.open(&b).unwrap(), b"InSidechainBlock");
    }

    /// 暗号文・タグ・nonce・AADのどのビットを反転しても復号は失敗する
    #[test]
    fn test_tampering_fails_closed() {
        let key = SessionKey::generate();
        let output = key.seal_with_aad(b"payload", b"header").unwrap();

        for i in 0..output.ciphertext.len() {
            let mut tampered = output.clone();
            tampered.ciphertext[i] ^= 0x01;
            assert!(matches!(key.open(&tampered), Err(CryptoError::DecryptError)));
        }

        let mut tampered = output.clone();
        tampered.nonce[0] ^= 0x80;
        assert!(key.open(&tampered).is_err());

        let mut tampered = output.clone();
        tampered.aad = b"Header".to_vec();
        assert!(key.open(&tampered).is_err());

        assert_eq!(key.open(&output).unwrap(), b"payload");
    }

    /// 別の鍵では復号できない
    #[test]
    fn test_wrong_key_fails() {
        let output = SessionKey::generate().seal(b"secret").unwrap();
        assert!(SessionKey::generate().open(&output).is_err());
    }

    /// Debug出力に鍵素材が含まれない
    #[test]
    fn test_debug_is_redacted() {
        let key = SessionKey::from_bytes([0xab; 32]);
        assert_eq!(format!("{key:?}"), "SessionKey(..)");
    }
}
