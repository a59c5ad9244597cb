//! # secp256k1 署名
//!
//! ダイレクトコールの署名ペイロードとダイジェスト、リカバリ可能署名、
//! 署名からのEVMアドレス復元。
//!
//! ```text
//! payload = encode(call) ‖ mrenclave ‖ shard
//! digest  = Keccak-256(BLAKE2b-256(payload))
//! sig     = r ‖ s ‖ v   (RFC6979, low-S, v ∈ {0, 1})
//! ```

use std::fmt;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha3::Keccak256;
use zeroize::Zeroize;

use crate::CryptoError;

type Blake2b256 = Blake2b<U32>;

/// リカバリ可能署名（`r ‖ s ‖ v`）
pub type RecoverableSignature = [u8; 65];

/// EVMアドレス
pub type EvmAddress = [u8; 20];

/// 署名対象のペイロードを組み立てる。
///
/// 現在の構成では mrenclave と shard は同じ値であり、エンクレーブ識別子を2回連結する。
/// ワーカーはこの形で検証するため、片方を省略してはならない。
pub fn signature_payload(encoded_call: &[u8], enclave: &[u8; 32]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(encoded_call.len() + 64);
    payload.extend_from_slice(encoded_call);
    payload.extend_from_slice(enclave);
    payload.extend_from_slice(enclave);
    payload
}

/// 署名ダイジェスト `Keccak-256(BLAKE2b-256(payload))`
pub fn signature_digest(payload: &[u8]) -> [u8; 32] {
    let inner = Blake2b256::digest(payload);
    keccak256(&inner)
}

/// Keccak-256ハッシュ計算。
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let result = Keccak256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// 公開鍵からEVMアドレスを導出する。
/// `Keccak-256(非圧縮公開鍵の先頭0x04を除いた64バイト)` の下位20バイト。
pub fn evm_address(key: &VerifyingKey) -> EvmAddress {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// 署名とダイジェストから署名者のEVMアドレスを復元する。
pub fn recover_address(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<EvmAddress, CryptoError> {
    let sig = Signature::from_slice(&signature[..64]).map_err(|_| CryptoError::RecoveryError)?;
    let recovery_id = RecoveryId::from_byte(signature[64]).ok_or(CryptoError::RecoveryError)?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryError)?;
    Ok(evm_address(&key))
}

/// 署名が期待するアドレスの鍵によるものかを検証する。
pub fn verify_signer(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
    expected: &EvmAddress,
) -> Result<(), CryptoError> {
    let recovered = recover_address(digest, signature)?;
    if &recovered != expected {
        return Err(CryptoError::SignerMismatch {
            expected: hex::encode(expected),
            recovered: hex::encode(recovered),
        });
    }
    Ok(())
}

/// コール署名用のsecp256k1秘密鍵
#[derive(Clone)]
pub struct SignerKey(SigningKey);

impl SignerKey {
    /// 新しい鍵をランダムに生成する。
    pub fn generate() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    /// 32バイトの秘密鍵から構築する。ゼロや曲線位数以上の値は拒否する。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidSigningKey)?;
        SigningKey::from_bytes(&k256::FieldBytes::from(bytes))
            .map(Self)
            .map_err(|_| CryptoError::InvalidSigningKey)
    }

    /// hex文字列（`0x` は任意）から構築する。
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(s.trim().trim_start_matches("0x"))
            .map_err(|_| CryptoError::InvalidSigningKey)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// 検証鍵
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.0.verifying_key()
    }

    /// 非圧縮公開鍵（先頭の0x04を除く64バイト）
    pub fn public_key_uncompressed(&self) -> [u8; 64] {
        let point = self.0.verifying_key().to_encoded_point(false);
        let mut out = [0u8; 64];
        out.copy_from_slice(&point.as_bytes()[1..]);
        out
    }

    /// この鍵のEVMアドレス
    pub fn evm_address(&self) -> EvmAddress {
        evm_address(self.0.verifying_key())
    }

    /// 32バイトのダイジェストにリカバリ可能署名を行う。
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id) = self
            .0
            .sign_prehash_recoverable(digest)
            .map_err(|e| CryptoError::SignError(e.to_string()))?;
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte();
        Ok(out)
    }
}

impl fmt::Debug for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignerKey(0x{})", hex::encode(self.evm_address()))
    }
}
