//! # コールビルダー
//!
//! ダイレクトコールを組み立てる純粋なコンストラクタ群。
//! I/O・エンコード・暗号処理は行わない。

use bitacross_crypto::SessionKey;
use bitacross_types::{
    DirectCall, DirectCallSigned, Identity, MultiSignature, PrehashedEthereumMessage,
    SignBitcoinPayload,
};

/// EVMアドレスの識別子
pub fn evm_identity(address: [u8; 20]) -> Identity {
    Identity::Evm(address)
}

/// 32バイトの事前ハッシュ済みメッセージへのEthereum署名要求。
/// セッション鍵はワーカーがレスポンスを暗号化するためにコール本体へ埋め込まれる。
pub fn sign_ethereum(
    identity: Identity,
    session_key: &SessionKey,
    message: PrehashedEthereumMessage,
) -> DirectCall {
    DirectCall::SignEthereum(identity, *session_key.as_bytes(), message)
}

/// Bitcoin署名要求
pub fn sign_bitcoin(
    identity: Identity,
    session_key: &SessionKey,
    payload: SignBitcoinPayload,
) -> DirectCall {
    DirectCall::SignBitcoin(identity, *session_key.as_bytes(), payload)
}

/// Bitcoin署名が可能かの確認
pub fn check_sign_bitcoin(identity: Identity) -> DirectCall {
    DirectCall::CheckSignBitcoin(identity)
}

/// 導出鍵による署名
pub fn derived(payload: Vec<u8>) -> SignBitcoinPayload {
    SignBitcoinPayload::Derived(payload)
}

/// 使用不可能なスクリプトパスを持つTaproot
pub fn taproot_unspendable(payload: Vec<u8>) -> SignBitcoinPayload {
    SignBitcoinPayload::TaprootUnspendable(payload)
}

/// マークルルート付きのTaproot
pub fn taproot_spendable(payload: Vec<u8>, merkle_root: [u8; 32]) -> SignBitcoinPayload {
    SignBitcoinPayload::TaprootSpendable(payload, merkle_root)
}

/// 任意のtweak列を適用する署名。空のリストも有効。
pub fn with_tweaks(payload: Vec<u8>, tweaks: Vec<([u8; 32], bool)>) -> SignBitcoinPayload {
    SignBitcoinPayload::WithTweaks(payload, tweaks)
}

/// コールと署名を組にする
pub fn signed(call: DirectCall, signature: MultiSignature) -> DirectCallSigned {
    DirectCallSigned { call, signature }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitacross_codec::Encode;

    /// セッション鍵のバイト列がコール本体に入る
    #[test]
    fn test_session_key_is_embedded() {
        let key = SessionKey::from_bytes([0x42; 32]);
        let identity = evm_identity([1; 20]);

        match sign_ethereum(identity.clone(), &key, [0; 32]) {
            DirectCall::SignEthereum(id, aes_key, _) => {
                assert_eq!(id, identity);
                assert_eq!(aes_key, [0x42; 32]);
            }
            other => panic!("unexpected call: {other:?}"),
        }

        match sign_bitcoin(identity, &key, derived(vec![1])) {
            DirectCall::SignBitcoin(_, aes_key, SignBitcoinPayload::Derived(bytes)) => {
                assert_eq!(aes_key, [0x42; 32]);
                assert_eq!(bytes, vec![1]);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    /// 確認コールは識別子のみを持つ
    #[test]
    fn test_check_sign_bitcoin() {
        let call = check_sign_bitcoin(evm_identity([3; 20]));
        assert_eq!(call.signer(), &Identity::Evm([3; 20]));
        assert_eq!(call.encode()[0], 1);
    }

    /// 各ペイロードのコンストラクタ
    #[test]
    fn test_payload_constructors() {
        assert_eq!(
            taproot_unspendable(vec![1]),
            SignBitcoinPayload::TaprootUnspendable(vec![1])
        );
        assert_eq!(
            taproot_spendable(vec![1], [2; 32]),
            SignBitcoinPayload::TaprootSpendable(vec![1], [2; 32])
        );
        assert_eq!(with_tweaks(vec![], vec![]).encode(), vec![3, 0, 0]);
    }

    /// signed はコールと署名をそのまま保持する
    #[test]
    fn test_signed() {
        let call = check_sign_bitcoin(evm_identity([3; 20]));
        let signed = signed(call.clone(), MultiSignature::Ethereum([7; 65]));
        assert_eq!(signed.call, call);
        assert_eq!(signed.signature, MultiSignature::Ethereum([7; 65]));
    }
}
