//! # エラー型
//!
//! ダイレクトコールの1回の実行で起こりうる失敗を種類ごとに表す。

use bitacross_codec::DecodeError;
use bitacross_crypto::CryptoError;
use bitacross_types::ErrorDetail;

/// トランスポート層のエラー。中身はトランスポート実装に依存する。
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// 接続が閉じられた
    #[error("接続が閉じられました")]
    Closed,
    /// その他の送受信失敗
    #[error("送受信に失敗: {0}")]
    Io(String),
}

/// ダイレクトコールのエラー型
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// ワイヤ表現のデコード失敗
    #[error("デコードに失敗: {0}")]
    Decode(#[from] DecodeError),
    /// 暗号処理の失敗
    #[error("暗号処理に失敗: {0}")]
    Crypto(#[from] CryptoError),
    /// トランスポートの失敗
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// ワーカーが構造化エラーを返した
    #[error("ワーカーがコールを拒否しました: {0}")]
    Protocol(ErrorDetail),
    /// ワーカーが暗号化されていないエラーメッセージを返した
    #[error("ワーカーエラー: {0}")]
    Worker(String),
    /// JSON-RPCの外側の封筒（JSON・hex・長さ）が不正
    #[error("レスポンスが不正です: {0}")]
    MalformedResponse(String),
    /// 署名検証に対応していない署名者・署名の組み合わせ
    #[error("対応していない署名者です: {0}")]
    UnsupportedSigner(String),
}
