//! # シールド鍵（RSA-3072）
//!
//! ワーカーの `author_getShieldingKey` が返す公開鍵の解釈と、
//! セッション鍵のRSA-OAEPラップ／アンラップ。
//!
//! ## ワイヤ形式
//! `2バイトのフレーミング ‖ JSON {"n":[384バイト], "e":[4バイト]}`
//!
//! `n` と `e` はどちらもリトルエンディアンで格納されているため、
//! ビッグエンディアンに反転してからRSA鍵を構築する。
//! 反転はこのモジュールの [`ShieldingPublicKey::from_wire`] でのみ行う。
//! 先頭2バイトはワーカー側の外部プロトコル定数であり、解釈せずに読み捨てる。

use std::fmt;

use bitacross_codec::{Compact, Encode};
use rand::rngs::OsRng;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::aes::SessionKey;
use crate::CryptoError;

/// 読み捨てるフレーミングバイト数
const FRAMING_LEN: usize = 2;
/// 法 `n` のバイト長（RSA-3072）
pub const MODULUS_LEN: usize = 384;
/// 公開指数 `e` のバイト長
pub const EXPONENT_LEN: usize = 4;

/// JSON部分の表現（いずれもリトルエンディアン）
#[derive(Serialize, Deserialize)]
struct WireKey {
    n: Vec<u8>,
    e: Vec<u8>,
}

/// ワーカーのシールド公開鍵
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldingPublicKey(RsaPublicKey);

impl ShieldingPublicKey {
    /// `author_getShieldingKey` のレスポンス値から公開鍵を構築する。
    pub fn from_wire(value: &[u8]) -> Result<Self, CryptoError> {
        let json = value.get(FRAMING_LEN..).ok_or_else(|| {
            CryptoError::InvalidShieldingKey(format!("値が短すぎます: {}バイト", value.len()))
        })?;
        let wire: WireKey = serde_json::from_slice(json)
            .map_err(|e| CryptoError::InvalidShieldingKey(format!("JSONの解析に失敗: {e}")))?;

        if wire.n.len() != MODULUS_LEN {
            return Err(CryptoError::InvalidShieldingKey(format!(
                "nの長さが不正です: {}バイト",
                wire.n.len()
            )));
        }
        if wire.e.len() != EXPONENT_LEN {
            return Err(CryptoError::InvalidShieldingKey(format!(
                "eの長さが不正です: {}バイト",
                wire.e.len()
            )));
        }

        let mut n = wire.n;
        let mut e = wire.e;
        n.reverse();
        e.reverse();

        let key = RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
            .map_err(|e| CryptoError::InvalidShieldingKey(e.to_string()))?;
        Ok(Self(key))
    }

    /// ワーカーが返すのと同じワイヤ形式にエンコードする（モックワーカー・CLI用）。
    pub fn to_wire(&self) -> Result<Vec<u8>, CryptoError> {
        let wire = WireKey {
            n: le_bytes_padded(self.0.n(), MODULUS_LEN),
            e: le_bytes_padded(self.0.e(), EXPONENT_LEN),
        };
        let json =
            serde_json::to_vec(&wire).map_err(|e| CryptoError::InvalidShieldingKey(e.to_string()))?;
        let len = u32::try_from(json.len())
            .map_err(|_| CryptoError::InvalidShieldingKey(format!("JSONが長すぎます: {}バイト", json.len())))?;
        let mut out = Compact(len).encode();
        out.extend_from_slice(&json);
        Ok(out)
    }

    /// 法のバイト長
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// セッション鍵をRSA-OAEP（SHA-256 / MGF1-SHA-256、ラベルなし）でラップする。
    pub fn wrap_session_key(&self, key: &SessionKey) -> Result<Vec<u8>, CryptoError> {
        self.0
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_bytes())
            .map_err(|e| CryptoError::WrapError(e.to_string()))
    }
}

fn le_bytes_padded(value: &BigUint, len: usize) -> Vec<u8> {
    let mut bytes = value.to_bytes_le();
    bytes.resize(len.max(bytes.len()), 0);
    bytes
}

/// ワーカー側のシールド秘密鍵。テストとモックワーカーで封筒を開くために使う。
pub struct ShieldingPrivateKey(RsaPrivateKey);

impl ShieldingPrivateKey {
    /// PKCS#8 PEMから読み込む。
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CryptoError> {
        RsaPrivateKey::from_pkcs8_pem(pem)
            .map(Self)
            .map_err(|e| CryptoError::InvalidShieldingKey(e.to_string()))
    }

    /// 対応する公開鍵
    pub fn public_key(&self) -> ShieldingPublicKey {
        ShieldingPublicKey(self.0.to_public_key())
    }

    /// ラップされたセッション鍵を取り出す。
    /// パディング不正、または32バイト以外の鍵はエラーとする。
    pub fn unwrap_session_key(&self, wrapped: &[u8]) -> Result<SessionKey, CryptoError> {
        let mut plain = self
            .0
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map_err(|_| CryptoError::UnwrapError)?;
        let result = match <[u8; 32]>::try_from(plain.as_slice()) {
            Ok(bytes) => Ok(SessionKey::from_bytes(bytes)),
            Err(_) => Err(CryptoError::InvalidSessionKeyLength(plain.len())),
        };
        plain.zeroize();
        result
    }
}

impl fmt::Debug for ShieldingPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShieldingPrivateKey(..)")
    }
}
