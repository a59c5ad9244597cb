//! # ダイレクトRPCクライアント
//!
//! ワーカーとJSON-RPC 2.0でやり取りし、シールド鍵とエンクレーブ識別子の取得から
//! コールの署名・封筒化・送信・結果の解釈までを1往復ずつ順に行う。
//!
//! 通信路は [`Transport`] として抽象化する。タイムアウトや再接続は
//! トランスポート実装の責務であり、クライアントは再試行しない。

use bitacross_codec::Encode;
use bitacross_crypto::{SessionKey, ShieldingPublicKey};
use bitacross_types::{methods, AesRequest, DirectCall, RpcRequest, RpcResponse, RpcReturnValue};

use crate::envelope;
use crate::error::{CallError, TransportError};
use crate::response::{self, CallOutcome};
use crate::signer::CallSigner;

/// ワーカーとの通信路の抽象インターフェース。
///
/// 1フレームが1つのJSON-RPCメッセージに対応する。
/// WebSocketやvsockなど、実際の通信方式は実装側で選択する。
#[async_trait::async_trait]
pub trait Transport: Send {
    /// フレームを送信する。
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;

    /// 次のフレームを受信する。
    async fn receive(&mut self) -> Result<Vec<u8>, TransportError>;
}

/// ダイレクトRPCクライアント
pub struct DirectRpcClient<T> {
    transport: T,
    next_id: u64,
}

impl<T: Transport> DirectRpcClient<T> {
    /// トランスポートからクライアントを構築する。
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: 1,
        }
    }

    /// 内部のトランスポートを取り出す。
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// JSON-RPCリクエストを1つ送り、対応するレスポンスを `RpcReturnValue` として返す。
    pub async fn call(
        &mut self,
        method: &str,
        params: Vec<String>,
    ) -> Result<RpcReturnValue, CallError> {
        let id = self.next_id;
        self.next_id += 1;

        let request = RpcRequest::new(method, params, id);
        let frame = serde_json::to_vec(&request)
            .map_err(|e| CallError::MalformedResponse(format!("リクエストのシリアライズに失敗: {e}")))?;
        tracing::debug!(method, id, "リクエストを送信します");
        self.transport.send(frame).await?;

        let reply = self.transport.receive().await?;
        let response: RpcResponse = serde_json::from_slice(&reply)
            .map_err(|e| CallError::MalformedResponse(format!("JSON-RPCレスポンスの解析に失敗: {e}")))?;
        if response.id != id {
            return Err(CallError::MalformedResponse(format!(
                "レスポンスIDが一致しません: expected={id}, actual={}",
                response.id
            )));
        }

        response::decode_rpc_return_value(&response.result)
    }

    /// 暗号化されないメソッドを呼び出し、値のバイト列を返す。
    async fn call_plain(&mut self, method: &str) -> Result<Vec<u8>, CallError> {
        let value = self.call(method, Vec::new()).await?;
        if value.status.is_error() {
            return Err(CallError::Worker(response::plain_error_message(&value.value)));
        }
        Ok(value.value)
    }

    /// ワーカーのシールド公開鍵を取得する。
    pub async fn shielding_key(&mut self) -> Result<ShieldingPublicKey, CallError> {
        let value = self.call_plain(methods::AUTHOR_GET_SHIELDING_KEY).await?;
        let key = ShieldingPublicKey::from_wire(&value)?;
        tracing::info!(modulus_len = key.size(), "シールド鍵を取得しました");
        Ok(key)
    }

    /// ワーカーのmrenclave（= shard）を取得する。
    pub async fn mrenclave(&mut self) -> Result<[u8; 32], CallError> {
        let value = self.call_plain(methods::STATE_GET_MRENCLAVE).await?;
        let mrenclave: [u8; 32] = value.as_slice().try_into().map_err(|_| {
            CallError::MalformedResponse(format!("mrenclaveの長さが不正です: {}バイト", value.len()))
        })?;
        tracing::info!(mrenclave = %hex::encode(mrenclave), "mrenclaveを取得しました");
        Ok(mrenclave)
    }

    /// 署名者集合の集約公開鍵（SEC1形式）を取得する。
    pub async fn aggregated_public_key(&mut self) -> Result<Vec<u8>, CallError> {
        self.call_plain(methods::BITACROSS_AGGREGATED_PUBLIC_KEY).await
    }

    /// 封筒を送信し、セッション鍵で結果を解釈する。
    pub async fn submit(
        &mut self,
        request: &AesRequest,
        session_key: &SessionKey,
    ) -> Result<CallOutcome, CallError> {
        let value = self
            .call(methods::BITACROSS_SUBMIT_REQUEST, vec![submit_param(request)])
            .await?;
        tracing::info!(status = ?value.status, do_watch = value.do_watch, "コールの結果を受信しました");
        response::interpret(session_key, value)
    }

    /// コールを1回実行する。
    ///
    /// シールド鍵とmrenclaveを取得し、新しいセッション鍵で `build` が組み立てた
    /// コールに署名して送信する。セッション鍵はこの呼び出しの終了時に破棄される。
    pub async fn execute<F>(&mut self, signer: &CallSigner, build: F) -> Result<CallOutcome, CallError>
    where
        F: FnOnce(&SessionKey) -> DirectCall + Send,
    {
        let shielding_key = self.shielding_key().await?;
        let mrenclave = self.mrenclave().await?;

        let session_key = SessionKey::generate();
        let call = build(&session_key);
        let signed = signer.sign(call, &mrenclave)?;
        let request = envelope::seal(&signed, &session_key, &shielding_key, mrenclave)?;

        self.submit(&request, &session_key).await
    }
}

/// `bitacross_submitRequest` のJSON-RPCリクエストを組み立てる（オフライン送信用）。
pub fn submit_request(request: &AesRequest, id: u64) -> RpcRequest {
    RpcRequest::new(methods::BITACROSS_SUBMIT_REQUEST, vec![submit_param(request)], id)
}

fn submit_param(request: &AesRequest) -> String {
    format!("0x{}", hex::encode(request.encode()))
}
