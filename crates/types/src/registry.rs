//! # 型レジストリ
//!
//! ワイヤ上の型名と、その型のエンコード／デコード実装を対応付ける唯一の表。
//! 送受信側で同じスキーマを共有していることが前提であり、
//! 型を追加する場合は [`TypeName`] と `dispatch!` の両方に1行ずつ追加する。
//!
//! JSON表現の値と相互変換できるため、CLIやデバッグ時に
//! 任意のhexバイト列を型名指定で読み書きできる。

use std::fmt;
use std::str::FromStr;

use bitacross_codec::{decode_all, DecodeError};
use parity_scale_codec::{Decode, Encode, Input, Output};
use serde::de::DeserializeOwned;
use serde::{Deserializer, Serialize, Serializer};

use crate::serde_hex;

/// レジストリ操作のエラー型
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// 登録されていない型名
    #[error("未登録の型名です: {0}")]
    UnknownType(String),
    /// バイト列のデコードに失敗
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// JSON値と型の対応付けに失敗
    #[error("JSON値の変換に失敗: {0}")]
    Json(#[from] serde_json::Error),
}

/// レジストリに登録されたワイヤ型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    /// `[u8; 4]`
    U8Array4,
    /// `[u8; 12]`
    U8Array12,
    /// `[u8; 20]`
    U8Array20,
    /// `[u8; 32]`
    U8Array32,
    /// `[u8; 65]`
    U8Array65,
    /// `Vec<u8>`
    Bytes,
    /// [`crate::Identity`]
    Identity,
    /// [`crate::SignBitcoinPayload`]
    SignBitcoinPayload,
    /// [`crate::DirectCall`]
    DirectCall,
    /// [`crate::MultiSignature`]
    MultiSignature,
    /// [`crate::DirectCallSigned`]
    DirectCallSigned,
    /// [`crate::AesOutput`]
    AesOutput,
    /// [`crate::AesRequest`]
    AesRequest,
    /// [`crate::TrustedOperationStatus`]
    TrustedOperationStatus,
    /// [`crate::DirectRequestStatus`]
    DirectRequestStatus,
    /// [`crate::RpcReturnValue`]
    RpcReturnValue,
    /// [`crate::ErrorDetail`]
    ErrorDetail,
}

impl TypeName {
    /// 登録済みの全ての型
    pub const ALL: [TypeName; 17] = [
        TypeName::U8Array4,
        TypeName::U8Array12,
        TypeName::U8Array20,
        TypeName::U8Array32,
        TypeName::U8Array65,
        TypeName::Bytes,
        TypeName::Identity,
        TypeName::SignBitcoinPayload,
        TypeName::DirectCall,
        TypeName::MultiSignature,
        TypeName::DirectCallSigned,
        TypeName::AesOutput,
        TypeName::AesRequest,
        TypeName::TrustedOperationStatus,
        TypeName::DirectRequestStatus,
        TypeName::RpcReturnValue,
        TypeName::ErrorDetail,
    ];

    /// ワイヤ上の型名
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::U8Array4 => "[u8; 4]",
            TypeName::U8Array12 => "[u8; 12]",
            TypeName::U8Array20 => "[u8; 20]",
            TypeName::U8Array32 => "[u8; 32]",
            TypeName::U8Array65 => "[u8; 65]",
            TypeName::Bytes => "Vec<u8>",
            TypeName::Identity => "Identity",
            TypeName::SignBitcoinPayload => "SignBitcoinPayload",
            TypeName::DirectCall => "DirectCall",
            TypeName::MultiSignature => "MultiSignature",
            TypeName::DirectCallSigned => "DirectCallSigned",
            TypeName::AesOutput => "AesOutput",
            TypeName::AesRequest => "AesRequest",
            TypeName::TrustedOperationStatus => "TrustedOperationStatus",
            TypeName::DirectRequestStatus => "DirectRequestStatus",
            TypeName::RpcReturnValue => "RpcReturnValue",
            TypeName::ErrorDetail => "ErrorDetail",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeName {
    type Err = RegistryError;

    /// 空白の有無は区別しない（`[u8;32]` と `[u8; 32]` は同じ）。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        TypeName::ALL
            .into_iter()
            .find(|t| t.as_str().replace(' ', "") == wanted)
            .ok_or_else(|| RegistryError::UnknownType(s.to_string()))
    }
}

/// 固定長バイト配列のhex表現ラッパー
struct Fixed<const N: usize>([u8; N]);

impl<const N: usize> Serialize for Fixed<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_hex::serialize(&self.0, serializer)
    }
}

impl<'de, const N: usize> serde::Deserialize<'de> for Fixed<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_hex::deserialize(deserializer).map(Fixed)
    }
}

impl<const N: usize> Encode for Fixed<N> {
    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.encode_to(dest);
    }
}

impl<const N: usize> Decode for Fixed<N> {
    fn decode<I: Input>(input: &mut I) -> Result<Self, parity_scale_codec::Error> {
        <[u8; N]>::decode(input).map(Fixed)
    }
}

/// 可変長バイト列のhex表現ラッパー
#[derive(Encode, Decode)]
struct Bytes(Vec<u8>);

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_hex::serialize(&self.0, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_hex::deserialize(deserializer).map(Bytes)
    }
}

fn encode_as<T: Encode + DeserializeOwned>(value: &serde_json::Value) -> Result<Vec<u8>, RegistryError> {
    let typed: T = serde_json::from_value(value.clone())?;
    Ok(typed.encode())
}

fn decode_as<T: Decode + Serialize>(bytes: &[u8]) -> Result<serde_json::Value, RegistryError> {
    let typed: T = decode_all(bytes)?;
    Ok(serde_json::to_value(typed)?)
}

/// 型名から具象型を選び、`$f::<T>($arg)` を呼び出す。
macro_rules! dispatch {
    ($type_name:expr, $f:ident, $arg:expr) => {
        match $type_name {
            TypeName::U8Array4 => $f::<Fixed<4>>($arg),
            TypeName::U8Array12 => $f::<Fixed<12>>($arg),
            TypeName::U8Array20 => $f::<Fixed<20>>($arg),
            TypeName::U8Array32 => $f::<Fixed<32>>($arg),
            TypeName::U8Array65 => $f::<Fixed<65>>($arg),
            TypeName::Bytes => $f::<Bytes>($arg),
            TypeName::Identity => $f::<crate::Identity>($arg),
            TypeName::SignBitcoinPayload => $f::<crate::SignBitcoinPayload>($arg),
            TypeName::DirectCall => $f::<crate::DirectCall>($arg),
            TypeName::MultiSignature => $f::<crate::MultiSignature>($arg),
            TypeName::DirectCallSigned => $f::<crate::DirectCallSigned>($arg),
            TypeName::AesOutput => $f::<crate::AesOutput>($arg),
            TypeName::AesRequest => $f::<crate::AesRequest>($arg),
            TypeName::TrustedOperationStatus => $f::<crate::TrustedOperationStatus>($arg),
            TypeName::DirectRequestStatus => $f::<crate::DirectRequestStatus>($arg),
            TypeName::RpcReturnValue => $f::<crate::RpcReturnValue>($arg),
            TypeName::ErrorDetail => $f::<crate::ErrorDetail>($arg),
        }
    };
}

/// JSON値を指定型のワイヤ表現にエンコードする。
pub fn encode(type_name: TypeName, value: &serde_json::Value) -> Result<Vec<u8>, RegistryError> {
    dispatch!(type_name, encode_as, value)
}

/// ワイヤ表現を指定型としてデコードし、JSON値で返す。
/// 余剰バイトが残る場合もエラーとする。
pub fn decode(type_name: TypeName, bytes: &[u8]) -> Result<serde_json::Value, RegistryError> {
    dispatch!(type_name, decode_as, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// 空白の有無にかかわらず型名を解決できる
    #[test]
    fn test_parse_type_names() {
        assert_eq!("[u8; 32]".parse::<TypeName>().unwrap(), TypeName::U8Array32);
        assert_eq!("[u8;65]".parse::<TypeName>().unwrap(), TypeName::U8Array65);
        assert_eq!(
            "DirectCallSigned".parse::<TypeName>().unwrap(),
            TypeName::DirectCallSigned
        );
        assert!(matches!(
            "SignBitcoinError".parse::<TypeName>(),
            Err(RegistryError::UnknownType(_))
        ));
        for t in TypeName::ALL {
            assert_eq!(t.as_str().parse::<TypeName>().unwrap(), t);
        }
    }

    /// 固定長配列はプレフィックスなしで、長さ不一致は拒否される
    #[test]
    fn test_fixed_array_entries() {
        let bytes = encode(TypeName::U8Array4, &json!("0x01020304")).unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
        assert_eq!(decode(TypeName::U8Array4, &bytes).unwrap(), json!("0x01020304"));

        assert!(matches!(
            encode(TypeName::U8Array12, &json!("0x0102")),
            Err(RegistryError::Json(_))
        ));
        assert!(matches!(
            decode(TypeName::U8Array20, &[0u8; 19]),
            Err(RegistryError::Decode(_))
        ));
    }

    /// 複合型をJSONから組み立てて型付きデコードと一致させる
    #[test]
    fn test_rpc_return_value_via_registry() {
        let value = json!({
            "value": "0xdeadbeef",
            "do_watch": false,
            "status": "Error",
        });
        let bytes = encode(TypeName::RpcReturnValue, &value).unwrap();
        let typed: crate::RpcReturnValue = decode_all(&bytes).unwrap();
        assert_eq!(typed.value, vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(typed.status.is_error());
        assert_eq!(decode(TypeName::RpcReturnValue, &bytes).unwrap(), value);
    }

    /// DirectCall はバリアント名をキーとするJSONで表現される
    #[test]
    fn test_direct_call_json_shape() {
        let value = json!({
            "SignBitcoin": [
                {"Evm": "0x144fa896b5fabca9d352483f0741776d1f836094"},
                format!("0x{}", "11".repeat(32)),
                {"WithTweaks": ["0x0102", [[format!("0x{}", "22".repeat(32)), true]]]}
            ]
        });
        let bytes = encode(TypeName::DirectCall, &value).unwrap();
        assert_eq!(bytes[0], 0);
        assert_eq!(decode(TypeName::DirectCall, &bytes).unwrap(), value);
    }
}
