//! # レスポンスの解釈
//!
//! `bitacross_submitRequest` の結果（`RpcReturnValue` のhex）を復号し、
//! 成功結果か構造化エラーかを判別する。

use bitacross_codec::decode_all;
use bitacross_crypto::SessionKey;
use bitacross_types::{AesOutput, ErrorDetail, RpcReturnValue};

use crate::error::CallError;

/// コールの実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// 復号済みの結果バイト列
    Success(Vec<u8>),
    /// ワーカーが返した構造化エラー
    Failed(ErrorDetail),
}

impl CallOutcome {
    /// 成功なら結果を、失敗なら [`CallError::Protocol`] を返す。
    pub fn into_result(self) -> Result<Vec<u8>, CallError> {
        match self {
            CallOutcome::Success(bytes) => Ok(bytes),
            CallOutcome::Failed(detail) => Err(CallError::Protocol(detail)),
        }
    }
}

/// hex（`0x` は任意）から `RpcReturnValue` をデコードする。
pub fn decode_rpc_return_value(hex_value: &str) -> Result<RpcReturnValue, CallError> {
    let bytes = hex::decode(hex_value.trim().trim_start_matches("0x"))
        .map_err(|e| CallError::MalformedResponse(format!("hexのデコードに失敗: {e}")))?;
    Ok(decode_all(&bytes)?)
}

/// 暗号化されたレスポンス値を復号し、ステータスに従って結果を判別する。
///
/// - `Error` 以外（`Ok` / `TrustedOperationStatus` / `Processing`）:
///   復号したバイト列が結果。値が空の場合は空の結果とする
/// - `Error`: 復号したバイト列を [`ErrorDetail`] としてデコードする。
///   値が `AesOutput` として読めない場合は、封筒を開く前にワーカーが
///   拒否したものとして平文メッセージを [`CallError::Worker`] で返す
pub fn interpret(session_key: &SessionKey, value: RpcReturnValue) -> Result<CallOutcome, CallError> {
    if value.status.is_error() {
        let output = match decode_all::<AesOutput>(&value.value) {
            Ok(output) => output,
            Err(_) => {
                let message = String::from_utf8_lossy(&value.value).into_owned();
                tracing::warn!(message = %message, "暗号化されていないエラーを受信しました");
                return Err(CallError::Worker(message));
            }
        };
        let plaintext = session_key.open(&output)?;
        let detail = decode_all::<ErrorDetail>(&plaintext)?;
        tracing::warn!(kind = %detail.kind, detail = %detail.detail, "ワーカーがエラーを返しました");
        return Ok(CallOutcome::Failed(detail));
    }

    if value.value.is_empty() {
        tracing::debug!(status = ?value.status, "空の結果を受信しました");
        return Ok(CallOutcome::Success(Vec::new()));
    }

    let output = decode_all::<AesOutput>(&value.value)?;
    let plaintext = session_key.open(&output)?;
    Ok(CallOutcome::Success(plaintext))
}

/// 暗号化されないメソッドのエラー値（エンコードされた文字列）を読む。
pub(crate) fn plain_error_message(value: &[u8]) -> String {
    decode_all::<String>(value).unwrap_or_else(|_| String::from_utf8_lossy(value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::seal_return_value;
    use bitacross_codec::Encode;
    use bitacross_crypto::CryptoError;
    use bitacross_types::{DirectRequestStatus, TrustedOperationStatus};

    fn error_detail() -> ErrorDetail {
        ErrorDetail {
            kind: "SignerNotFound".to_string(),
            detail: "no relayer registered for identity".to_string(),
        }
    }

    /// Ok と TrustedOperationStatus は結果、Error は構造化エラーになる
    #[test]
    fn test_status_discrimination() {
        let key = SessionKey::generate();

        let ok = seal_return_value(&key, b"sig", DirectRequestStatus::Ok).unwrap();
        assert_eq!(interpret(&key, ok).unwrap(), CallOutcome::Success(b"sig".to_vec()));

        let in_block = seal_return_value(
            &key,
            b"sig",
            DirectRequestStatus::TrustedOperationStatus(
                TrustedOperationStatus::InSidechainBlock([1; 32]),
                [2; 32],
            ),
        )
        .unwrap();
        assert_eq!(
            interpret(&key, in_block).unwrap(),
            CallOutcome::Success(b"sig".to_vec())
        );

        let failed =
            seal_return_value(&key, &error_detail().encode(), DirectRequestStatus::Error).unwrap();
        let outcome = interpret(&key, failed).unwrap();
        assert_eq!(outcome, CallOutcome::Failed(error_detail()));
        assert!(matches!(
            outcome.into_result(),
            Err(CallError::Protocol(detail)) if detail == error_detail()
        ));
    }

    /// hex経由でデコードしても同じ結果になる
    #[test]
    fn test_decode_from_hex() {
        let key = SessionKey::generate();
        let value = seal_return_value(&key, b"payload", DirectRequestStatus::Ok).unwrap();
        let hex_value = format!("0x{}", hex::encode(value.encode()));

        let decoded = decode_rpc_return_value(&hex_value).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(decode_rpc_return_value(&hex_value[2..]).unwrap(), value);
        assert_eq!(
            interpret(&key, decoded).unwrap().into_result().unwrap(),
            b"payload"
        );
    }

    /// 不正なhex・切れたバイト列は型付きエラーになる
    #[test]
    fn test_malformed_return_values() {
        assert!(matches!(
            decode_rpc_return_value("0xzz"),
            Err(CallError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_rpc_return_value("0x0c0102"),
            Err(CallError::Decode(_))
        ));
    }

    /// 別のセッション鍵では結果を開けない
    #[test]
    fn test_wrong_session_key() {
        let value = seal_return_value(&SessionKey::generate(), b"x", DirectRequestStatus::Ok).unwrap();
        assert!(matches!(
            interpret(&SessionKey::generate(), value),
            Err(CallError::Crypto(CryptoError::DecryptError))
        ));
    }

    /// 封筒を開く前の拒否は平文メッセージとして返る
    #[test]
    fn test_unencrypted_error() {
        let value = RpcReturnValue {
            value: b"AesRequest construction error".to_vec(),
            do_watch: false,
            status: DirectRequestStatus::Error,
        };
        assert!(matches!(
            interpret(&SessionKey::generate(), value),
            Err(CallError::Worker(message)) if message == "AesRequest construction error"
        ));
    }

    /// 値が空の処理中ステータスは空の結果
    #[test]
    fn test_empty_value_in_progress() {
        let value = RpcReturnValue {
            value: vec![],
            do_watch: true,
            status: DirectRequestStatus::TrustedOperationStatus(
                TrustedOperationStatus::Submitted,
                [0; 32],
            ),
        };
        assert_eq!(
            interpret(&SessionKey::generate(), value).unwrap(),
            CallOutcome::Success(vec![])
        );
    }

    /// ワーカーが受理直後に返す Processing ステータスをデコードし、空の結果として扱う
    #[test]
    fn test_processing_status() {
        let mut bytes = vec![0x00, 0x01, 0x03];
        bytes.extend_from_slice(&[0xab; 32]);
        let value = decode_rpc_return_value(&hex::encode(&bytes)).unwrap();
        assert_eq!(
            value,
            RpcReturnValue {
                value: vec![],
                do_watch: true,
                status: DirectRequestStatus::Processing([0xab; 32]),
            }
        );
        assert!(!value.status.is_error());
        assert_eq!(
            interpret(&SessionKey::generate(), value).unwrap(),
            CallOutcome::Success(vec![])
        );

        let key = SessionKey::generate();
        let value = seal_return_value(&key, b"sig", DirectRequestStatus::Processing([1; 32])).unwrap();
        assert_eq!(interpret(&key, value).unwrap(), CallOutcome::Success(b"sig".to_vec()));
    }

    /// 暗号化されないメソッドのエラー文字列
    #[test]
    fn test_plain_error_message() {
        let encoded = "Could not get rsa pubkey".to_string().encode();
        assert_eq!(plain_error_message(&encoded), "Could not get rsa pubkey");
        assert_eq!(plain_error_message(b"\xff"), "\u{fffd}");
    }
}
