//! # BitAcross 暗号処理
//!
//! ダイレクトコールの署名と、ワーカー宛て封筒の暗号化に必要な暗号プリミティブ。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | 対称暗号 | AES-256-GCM（12バイトnonce、AADは空） |
//! | セッション鍵のラップ | RSA-3072 OAEP（SHA-256 / MGF1-SHA-256） |
//! | 署名ダイジェスト | Keccak-256(BLAKE2b-256(payload)) |
//! | 署名 | secp256k1 ECDSA（リカバリ可能、65バイト） |

pub mod aes;
pub mod ecdsa;
pub mod shielding;

pub use aes::SessionKey;
pub use ecdsa::SignerKey;
pub use shielding::{ShieldingPrivateKey, ShieldingPublicKey};

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AES-GCM暗号化エラー
    #[error("AES-GCM暗号化に失敗しました")]
    EncryptError,
    /// AES-GCM復号エラー（認証タグ不一致を含む）
    #[error("AES-GCM復号に失敗しました")]
    DecryptError,
    /// 使用済みのセッション鍵で再びリクエストを暗号化しようとした
    #[error("セッション鍵は既にリクエストの暗号化に使用されています")]
    SessionKeyReused,
    /// RSA-OAEPによるセッション鍵のラップに失敗
    #[error("セッション鍵のラップに失敗しました: {0}")]
    WrapError(String),
    /// RSA-OAEPによるセッション鍵のアンラップに失敗
    #[error("セッション鍵のアンラップに失敗しました")]
    UnwrapError,
    /// アンラップした鍵の長さが32バイトでない
    #[error("セッション鍵の長さが不正です: {0}バイト")]
    InvalidSessionKeyLength(usize),
    /// シールド鍵の形式が不正
    #[error("シールド鍵が不正です: {0}")]
    InvalidShieldingKey(String),
    /// secp256k1秘密鍵が不正（ゼロ・範囲外・長さ不一致）
    #[error("署名鍵が不正です")]
    InvalidSigningKey,
    /// 署名の生成に失敗
    #[error("署名に失敗しました: {0}")]
    SignError(String),
    /// 署名から公開鍵を復元できない
    #[error("署名から公開鍵を復元できません")]
    RecoveryError,
    /// 復元したアドレスが期待する署名者と一致しない
    #[error("署名者が一致しません: expected=0x{expected}, recovered=0x{recovered}")]
    SignerMismatch {
        /// 期待したEVMアドレス（hex）
        expected: String,
        /// 署名から復元したEVMアドレス（hex）
        recovered: String,
    },
}
