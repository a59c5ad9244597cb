//! # BitAcross 共有型定義
//!
//! ワーカーとやり取りするダイレクトコール・封筒・レスポンスの型を
//! Rust構造体として提供する。
//!
//! ## エンコーディング規則
//! - ワイヤ表現: `parity-scale-codec` の derive によるSCALEエンコーディング。
//!   タグ付きユニオンの判別子は宣言順の位置（バリアントの並び順を変えてはならない）。
//!   デコードは位置付きエラーを返す [`bitacross_codec::decode_all`] を通して行う
//! - JSON表現: バイト列は `0x` プレフィックス付きhex、enumは `{"Variant": ...}` 形式

pub mod registry;
pub mod serde_hex;

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// リクエストごとのAES-256鍵（ワイヤ上は32バイト固定長）
pub type RequestAesKey = [u8; 32];

/// ワーカーの mrenclave / shard 識別子
pub type ShardIdentifier = [u8; 32];

/// 署名対象の事前ハッシュ済みEthereumメッセージ
pub type PrehashedEthereumMessage = [u8; 32];

/// Bitcoin署名対象のペイロード
pub type SignaturePayload = Vec<u8>;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// 呼び出し元の識別子。アカウント体系ごとのバリアントを持つ。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum Identity {
    /// Twitterハンドル
    Twitter(String),
    /// Discordハンドル
    Discord(String),
    /// GitHubハンドル
    Github(String),
    /// Substrateアカウント（32バイト公開鍵）
    Substrate(#[serde(with = "serde_hex")] [u8; 32]),
    /// EVMアドレス（20バイト）
    Evm(#[serde(with = "serde_hex")] [u8; 20]),
    /// Bitcoin圧縮公開鍵（33バイト）
    Bitcoin(#[serde(with = "serde_hex")] [u8; 33]),
    /// Solanaアカウント（32バイト公開鍵）
    Solana(#[serde(with = "serde_hex")] [u8; 32]),
    /// メールアドレス
    Email(String),
}

// ---------------------------------------------------------------------------
// ダイレクトコール
// ---------------------------------------------------------------------------

/// Bitcoin署名リクエストの使用ポリシー。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum SignBitcoinPayload {
    /// 導出鍵による署名
    Derived(#[serde(with = "serde_hex")] SignaturePayload),
    /// 使用不能コミットメント付きTaproot
    TaprootUnspendable(#[serde(with = "serde_hex")] SignaturePayload),
    /// スクリプトツリーのマークルルート付きTaproot
    TaprootSpendable(
        #[serde(with = "serde_hex")] SignaturePayload,
        #[serde(with = "serde_hex")] [u8; 32],
    ),
    /// 1つ以上の `(tweak, is_x_only)` を適用した鍵による署名
    WithTweaks(
        #[serde(with = "serde_hex")] SignaturePayload,
        #[serde(with = "serde_hex::tweaks")] Vec<([u8; 32], bool)>,
    ),
}

/// ワーカーに送る署名前の命令。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum DirectCall {
    /// Bitcoinペイロードへの署名要求
    SignBitcoin(
        Identity,
        #[serde(with = "serde_hex")] RequestAesKey,
        SignBitcoinPayload,
    ),
    /// Bitcoin署名が可能かの確認（鍵なし・固定ペイロード）
    CheckSignBitcoin(Identity),
    /// 32バイトの事前ハッシュ済みメッセージへのEthereum署名要求
    SignEthereum(
        Identity,
        #[serde(with = "serde_hex")] RequestAesKey,
        #[serde(with = "serde_hex")] PrehashedEthereumMessage,
    ),
}

impl DirectCall {
    /// 呼び出し元の識別子
    pub fn signer(&self) -> &Identity {
        match self {
            DirectCall::SignBitcoin(signer, ..)
            | DirectCall::CheckSignBitcoin(signer)
            | DirectCall::SignEthereum(signer, ..) => signer,
        }
    }
}

/// 曲線ファミリーごとの署名。
/// クライアントが生成するのは [`MultiSignature::Ethereum`] のみ。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum MultiSignature {
    /// Ed25519署名
    Ed25519(#[serde(with = "serde_hex")] [u8; 64]),
    /// Sr25519署名
    Sr25519(#[serde(with = "serde_hex")] [u8; 64]),
    /// secp256k1署名（blake2メッセージハッシュ）
    Ecdsa(#[serde(with = "serde_hex")] [u8; 65]),
    /// secp256k1リカバリ可能署名（keccak256メッセージハッシュ）
    Ethereum(#[serde(with = "serde_hex")] [u8; 65]),
    /// Bitcoinメッセージ署名
    Bitcoin(#[serde(with = "serde_hex")] [u8; 65]),
}

/// 署名済みダイレクトコール。AES暗号化の平文になる。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct DirectCallSigned {
    /// 署名対象のコール
    pub call: DirectCall,
    /// `call` のエンコード結果と enclave 識別子に対する署名
    pub signature: MultiSignature,
}

// ---------------------------------------------------------------------------
// 暗号化封筒
// ---------------------------------------------------------------------------

/// AES-256-GCMの出力。暗号文の末尾16バイトが認証タグ。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AesOutput {
    /// 暗号文（認証タグ付き）
    #[serde(with = "serde_hex")]
    pub ciphertext: Vec<u8>,
    /// 追加認証データ（通常は空）
    #[serde(with = "serde_hex")]
    pub aad: Vec<u8>,
    /// 12バイトのnonce
    #[serde(with = "serde_hex")]
    pub nonce: [u8; 12],
}

/// ワーカーに送る暗号化リクエスト（`bitacross_submitRequest` のパラメータ）。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AesRequest {
    /// 宛先ワーカーのshard
    #[serde(with = "serde_hex")]
    pub shard: ShardIdentifier,
    /// シールディング鍵（RSA-OAEP）で暗号化したリクエスト鍵
    #[serde(with = "serde_hex")]
    pub key: Vec<u8>,
    /// リクエスト鍵で暗号化した [`DirectCallSigned`]
    pub payload: AesOutput,
}

// ---------------------------------------------------------------------------
// RPCレスポンス
// ---------------------------------------------------------------------------

/// トッププール内でのトラステッドオペレーションの状態。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum TrustedOperationStatus {
    /// トッププールに投入済み
    Submitted,
    /// futureキューにある
    Future,
    /// readyキューにある
    Ready,
    /// ピアにブロードキャスト済み
    Broadcast,
    /// 指定ハッシュのサイドチェーンブロックに取り込まれた
    InSidechainBlock(#[serde(with = "serde_hex")] [u8; 32]),
    /// 取り込まれたブロックが巻き戻された
    Retracted,
    /// ファイナリティ待ちの上限に達した
    FinalityTimeout,
    /// ファイナライズ済み
    Finalized,
    /// 同じタグを持つ別オペレーションに置き換えられた
    Usurped,
    /// プールの上限により破棄された
    Dropped,
    /// 現在の状態では無効
    Invalid,
}

/// ダイレクトリクエストの処理結果ステータス。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum DirectRequestStatus {
    /// 正常に実行された
    Ok,
    /// トラステッドオペレーションの状態と、そのハッシュ
    TrustedOperationStatus(TrustedOperationStatus, #[serde(with = "serde_hex")] [u8; 32]),
    /// 実行できなかった（`value` に構造化エラーが入る）
    Error,
    /// 受理され処理中。指定ハッシュで後続の状態更新を購読できる
    Processing(#[serde(with = "serde_hex")] [u8; 32]),
}

impl DirectRequestStatus {
    /// `Error` 判別子を持つか
    pub fn is_error(&self) -> bool {
        matches!(self, DirectRequestStatus::Error)
    }
}

/// JSON-RPCレスポンスの `result` に入る戻り値。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct RpcReturnValue {
    /// メソッド固有の値（submitRequestの場合はエンコード済み [`AesOutput`]）
    #[serde(with = "serde_hex")]
    pub value: Vec<u8>,
    /// 後続の状態更新を購読するか
    pub do_watch: bool,
    /// 処理結果ステータス
    pub status: DirectRequestStatus,
}

/// ワーカーが `Error` ステータスと共に返す構造化エラー。
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// エラー種別
    pub kind: String,
    /// 人間向けの詳細
    pub detail: String,
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC 外殻
// ---------------------------------------------------------------------------

/// ワーカーが公開するRPCメソッド名
pub mod methods {
    /// RSA-3072シールディング公開鍵の取得
    pub const AUTHOR_GET_SHIELDING_KEY: &str = "author_getShieldingKey";
    /// mrenclave（= shard）の取得
    pub const STATE_GET_MRENCLAVE: &str = "state_getMrenclave";
    /// 集約Bitcoin公開鍵の取得
    pub const BITACROSS_AGGREGATED_PUBLIC_KEY: &str = "bitacross_aggregatedPublicKey";
    /// 暗号化ダイレクトコールの送信
    pub const BITACROSS_SUBMIT_REQUEST: &str = "bitacross_submitRequest";
}

/// JSON-RPC 2.0 リクエスト。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// 常に `"2.0"`
    pub jsonrpc: String,
    /// メソッド名
    pub method: String,
    /// パラメータ（hexエンコードされたプロトコルバイト列）
    pub params: Vec<String>,
    /// リクエストID
    pub id: u64,
}

impl RpcRequest {
    /// JSON-RPC 2.0 リクエストを作成する。
    pub fn new(method: &str, params: Vec<String>, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// 常に `"2.0"`
    pub jsonrpc: String,
    /// hexエンコードされた [`RpcReturnValue`]
    pub result: String,
    /// 対応するリクエストID
    pub id: u64,
}
