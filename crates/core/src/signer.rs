//! # コール署名
//!
//! エンコード済みコールをエンクレーブ識別子に束縛して署名する。
//! 署名はワーカー側で `Identity::Evm` の署名者と照合される。

use bitacross_codec::Encode;
use bitacross_crypto::ecdsa::{signature_digest, signature_payload, verify_signer};
use bitacross_crypto::SignerKey;
use bitacross_types::{DirectCall, DirectCallSigned, Identity, MultiSignature};

use crate::builder;
use crate::error::CallError;

/// コールの署名ダイジェストを計算する。
pub fn call_digest(call: &DirectCall, enclave: &[u8; 32]) -> [u8; 32] {
    signature_digest(&signature_payload(&call.encode(), enclave))
}

/// secp256k1鍵によるコール署名者
#[derive(Debug, Clone)]
pub struct CallSigner {
    key: SignerKey,
}

impl CallSigner {
    /// 署名鍵から構築する
    pub fn new(key: SignerKey) -> Self {
        Self { key }
    }

    /// この署名者の `Identity::Evm`
    pub fn identity(&self) -> Identity {
        builder::evm_identity(self.key.evm_address())
    }

    /// コールに署名し、署名済みコールを返す。
    pub fn sign(&self, call: DirectCall, enclave: &[u8; 32]) -> Result<DirectCallSigned, CallError> {
        let digest = call_digest(&call, enclave);
        let signature = self.key.sign_prehash(&digest)?;
        tracing::debug!(
            signer = %hex::encode(self.key.evm_address()),
            digest = %hex::encode(digest),
            "コールに署名しました"
        );
        Ok(builder::signed(call, MultiSignature::Ethereum(signature)))
    }
}

/// 署名済みコールの署名が、コール内の署名者によるものかを検証する。
pub fn verify(signed: &DirectCallSigned, enclave: &[u8; 32]) -> Result<(), CallError> {
    match (signed.call.signer(), &signed.signature) {
        (Identity::Evm(address), MultiSignature::Ethereum(signature)) => {
            let digest = call_digest(&signed.call, enclave);
            verify_signer(&digest, signature, address)?;
            Ok(())
        }
        (identity, signature) => Err(CallError::UnsupportedSigner(format!(
            "{identity:?} / {}",
            signature_kind(signature)
        ))),
    }
}

fn signature_kind(signature: &MultiSignature) -> &'static str {
    match signature {
        MultiSignature::Ed25519(_) => "Ed25519",
        MultiSignature::Sr25519(_) => "Sr25519",
        MultiSignature::Ecdsa(_) => "Ecdsa",
        MultiSignature::Ethereum(_) => "Ethereum",
        MultiSignature::Bitcoin(_) => "Bitcoin",
    }
}
