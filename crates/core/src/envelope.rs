//! # 封筒の暗号化
//!
//! 署名済みコールをセッション鍵でAES-GCM暗号化し、セッション鍵そのものは
//! ワーカーのシールド鍵でRSA-OAEPラップして [`AesRequest`] にまとめる。
//!
//! ワーカー側の処理（[`unseal_request`] / [`seal_return_value`]）は
//! テストやモックワーカーから同じ形式を再現するために提供する。

use bitacross_codec::{decode_all, Encode};
use bitacross_crypto::{SessionKey, ShieldingPrivateKey, ShieldingPublicKey};
use bitacross_types::{
    AesOutput, AesRequest, DirectCallSigned, DirectRequestStatus, RpcReturnValue, ShardIdentifier,
};

use crate::error::CallError;

/// 署名済みコールを封筒に入れる。
///
/// `session_key` はこの1回の暗号化で使用済みになり、同じ鍵での再送は
/// [`bitacross_crypto::CryptoError::SessionKeyReused`] で拒否される。
pub fn seal(
    signed: &DirectCallSigned,
    session_key: &SessionKey,
    shielding_key: &ShieldingPublicKey,
    shard: ShardIdentifier,
) -> Result<AesRequest, CallError> {
    let encoded = signed.encode();
    let payload = session_key.seal(&encoded)?;
    let key = shielding_key.wrap_session_key(session_key)?;
    tracing::debug!(
        call_len = encoded.len(),
        wrapped_key_len = key.len(),
        shard = %hex::encode(shard),
        "封筒を作成しました"
    );
    Ok(AesRequest {
        shard,
        key,
        payload,
    })
}

/// ワーカーが返した暗号文をセッション鍵で開く。
pub fn open(session_key: &SessionKey, output: &AesOutput) -> Result<Vec<u8>, CallError> {
    Ok(session_key.open(output)?)
}

/// 封筒を開き、セッション鍵と署名済みコールを取り出す（ワーカー側）。
pub fn unseal_request(
    shielding_key: &ShieldingPrivateKey,
    request: &AesRequest,
) -> Result<(SessionKey, DirectCallSigned), CallError> {
    let session_key = shielding_key.unwrap_session_key(&request.key)?;
    let plaintext = session_key.open(&request.payload)?;
    let signed = decode_all::<DirectCallSigned>(&plaintext)?;
    Ok((session_key, signed))
}

/// 結果をセッション鍵で暗号化し、レスポンス値を作る（ワーカー側）。
pub fn seal_return_value(
    session_key: &SessionKey,
    plaintext: &[u8],
    status: DirectRequestStatus,
) -> Result<RpcReturnValue, CallError> {
    let output = session_key.seal_reply(plaintext)?;
    Ok(RpcReturnValue {
        value: output.encode(),
        do_watch: false,
        status,
    })
}
