//! # サブコマンドの実装
//!
//! 各コマンドは標準出力に表示するJSON値を返す。

use anyhow::{anyhow, bail, Context};
use bitacross_core::{builder, client, envelope, CallOutcome, CallSigner};
use bitacross_crypto::{SessionKey, ShieldingPublicKey, SignerKey};
use bitacross_types::registry::{self, TypeName};
use bitacross_types::serde_hex::decode_hex;
use bitacross_types::{DirectCall, Identity, SignBitcoinPayload};
use serde_json::{json, Value};

/// SignBitcoinのペイロード種別
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BitcoinMode {
    Derived,
    TaprootUnspendable,
    TaprootSpendable,
    WithTweaks,
}

/// 封筒化の宛先ワーカー
pub struct Worker {
    shielding_key: ShieldingPublicKey,
    mrenclave: [u8; 32],
    id: u64,
}

impl Worker {
    /// `author_getShieldingKey` の結果hexとmrenclaveのhexから構築する。
    pub fn parse(shielding_key_result: &str, mrenclave: &str, id: u64) -> anyhow::Result<Self> {
        let value = bitacross_core::decode_rpc_return_value(shielding_key_result)
            .context("シールド鍵レスポンスのデコードに失敗")?;
        if value.status.is_error() {
            bail!("シールド鍵レスポンスがエラーステータスです");
        }
        Ok(Self {
            shielding_key: ShieldingPublicKey::from_wire(&value.value)?,
            mrenclave: fixed_hex::<32>(mrenclave, "mrenclave")?,
            id,
        })
    }
}

fn fixed_hex<const N: usize>(s: &str, what: &str) -> anyhow::Result<[u8; N]> {
    let bytes = decode_hex(s).with_context(|| format!("{what} のhexが不正です"))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow!("{what} は{N}バイトである必要があります: {len}バイト"))
}

fn load_signer(signer_key: &str) -> anyhow::Result<CallSigner> {
    Ok(CallSigner::new(SignerKey::from_hex(signer_key)?))
}

fn prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// 署名鍵のEVMアドレスと公開鍵
pub fn address(signer_key: &str) -> anyhow::Result<Value> {
    let key = SignerKey::from_hex(signer_key)?;
    Ok(json!({
        "address": prefixed(&key.evm_address()),
        "public_key": prefixed(&key.public_key_uncompressed()),
    }))
}

/// 新しいセッション鍵でコールを組み立て、署名・封筒化してJSON-RPCリクエストを返す。
fn seal_call<F>(signer_key: &str, worker: &Worker, build: F) -> anyhow::Result<Value>
where
    F: FnOnce(Identity, &SessionKey) -> DirectCall,
{
    let signer = load_signer(signer_key)?;
    let session_key = SessionKey::generate();
    let call = build(signer.identity(), &session_key);
    let signed = signer.sign(call, &worker.mrenclave)?;
    let request = envelope::seal(&signed, &session_key, &worker.shielding_key, worker.mrenclave)?;
    let rpc = client::submit_request(&request, worker.id);
    tracing::info!(id = worker.id, "コールを封筒化しました");

    Ok(json!({
        "request": serde_json::to_value(&rpc)?,
        "session_key": prefixed(session_key.as_bytes()),
    }))
}

/// SignEthereumコール
pub fn seal_sign_ethereum(signer_key: &str, worker: &Worker, message: &str) -> anyhow::Result<Value> {
    let message = fixed_hex::<32>(message, "message")?;
    seal_call(signer_key, worker, |identity, key| {
        builder::sign_ethereum(identity, key, message)
    })
}

/// SignBitcoinコール
pub fn seal_sign_bitcoin(
    signer_key: &str,
    worker: &Worker,
    payload: SignBitcoinPayload,
) -> anyhow::Result<Value> {
    seal_call(signer_key, worker, |identity, key| {
        builder::sign_bitcoin(identity, key, payload)
    })
}

/// 引数からSignBitcoinのペイロードを組み立てる。
pub fn bitcoin_payload(
    mode: BitcoinMode,
    payload: &str,
    merkle_root: Option<&str>,
    tweaks: &[String],
) -> anyhow::Result<SignBitcoinPayload> {
    let bytes = decode_hex(payload).context("payload のhexが不正です")?;
    if merkle_root.is_some() && mode != BitcoinMode::TaprootSpendable {
        bail!("--merkle-root は taproot-spendable でのみ指定できます");
    }
    if !tweaks.is_empty() && mode != BitcoinMode::WithTweaks {
        bail!("--tweak は with-tweaks でのみ指定できます");
    }

    Ok(match mode {
        BitcoinMode::Derived => builder::derived(bytes),
        BitcoinMode::TaprootUnspendable => builder::taproot_unspendable(bytes),
        BitcoinMode::TaprootSpendable => {
            let root = merkle_root.ok_or_else(|| anyhow!("--merkle-root が必要です"))?;
            builder::taproot_spendable(bytes, fixed_hex::<32>(root, "merkle-root")?)
        }
        BitcoinMode::WithTweaks => {
            let tweaks = tweaks
                .iter()
                .map(|t| parse_tweak(t))
                .collect::<anyhow::Result<Vec<_>>>()?;
            builder::with_tweaks(bytes, tweaks)
        }
    })
}

/// `<hex32>:<is_x_only>` 形式のtweak
fn parse_tweak(s: &str) -> anyhow::Result<([u8; 32], bool)> {
    let (tweak, x_only) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("tweakは <hex32>:<true|false> 形式で指定してください: {s}"))?;
    let x_only: bool = x_only
        .parse()
        .with_context(|| format!("is_x_only が不正です: {x_only}"))?;
    Ok((fixed_hex::<32>(tweak, "tweak")?, x_only))
}

/// `bitacross_submitRequest` の結果を開く。
pub fn open(session_key: &str, result: &str) -> anyhow::Result<Value> {
    let key = SessionKey::from_bytes(fixed_hex::<32>(session_key, "session-key")?);
    let value = bitacross_core::decode_rpc_return_value(result)?;
    let status = serde_json::to_value(&value.status)?;
    Ok(match bitacross_core::interpret(&key, value)? {
        CallOutcome::Success(bytes) => json!({
            "outcome": "success",
            "status": status,
            "result": prefixed(&bytes),
        }),
        CallOutcome::Failed(detail) => json!({
            "outcome": "failed",
            "status": status,
            "kind": detail.kind,
            "detail": detail.detail,
        }),
    })
}

/// hexを指定型としてデコードする。
pub fn decode(type_name: &str, hex_value: &str) -> anyhow::Result<Value> {
    let type_name: TypeName = type_name.parse()?;
    let bytes = decode_hex(hex_value).context("hexが不正です")?;
    Ok(registry::decode(type_name, &bytes)?)
}

/// JSONを指定型としてエンコードする。
pub fn encode(type_name: &str, json_value: &str) -> anyhow::Result<Value> {
    let type_name: TypeName = type_name.parse()?;
    let value: Value = serde_json::from_str(json_value).context("JSONが不正です")?;
    Ok(Value::String(prefixed(&registry::encode(type_name, &value)?)))
}
