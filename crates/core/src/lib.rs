//! # BitAcross ダイレクトコール
//!
//! ワーカーへのダイレクトコールを組み立て、署名し、暗号化して送信し、
//! 暗号化された結果を解釈する。
//!
//! ## 処理フロー
//! 1. コールを組み立てる（[`builder`]）
//! 2. エンコードしたコールをエンクレーブ識別子に束縛して署名する（[`signer`]）
//! 3. 署名済みコールをセッション鍵で暗号化し、鍵をシールド鍵でラップする（[`envelope`]）
//! 4. トランスポートで送信し、返ってきた値を復号・判別する（[`client`] / [`response`]）

pub mod builder;
pub mod client;
pub mod envelope;
pub mod error;
pub mod response;
pub mod signer;

pub use client::{DirectRpcClient, Transport};
pub use error::{CallError, TransportError};
pub use response::{decode_rpc_return_value, interpret, CallOutcome};
pub use signer::CallSigner;
