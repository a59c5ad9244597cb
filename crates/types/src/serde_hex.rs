//! バイト列フィールドの `0x` プレフィックス付きhex表現。
//!
//! `#[serde(with = "crate::serde_hex")]` で固定長配列・`Vec<u8>` の両方に使う。

use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

/// `0x` 付きhex文字列としてシリアライズする。
pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&format!("0x{}", hex::encode(value.as_ref())))
}

/// hex文字列（`0x` は任意）からデシリアライズする。
/// 固定長配列の場合は長さの不一致をエラーにする。
pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: TryFrom<Vec<u8>>,
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let bytes = decode_hex(&s).map_err(D::Error::custom)?;
    let len = bytes.len();
    T::try_from(bytes).map_err(|_| D::Error::custom(format!("バイト長が不正です: {len}")))
}

/// `0x` プレフィックスを許容してhexをデコードする。
pub fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.trim().trim_start_matches("0x"))
}

/// `(tweak, is_x_only)` のリストを `[["0x..", true], ...]` 形式で扱う。
pub mod tweaks {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct TweakRepr(#[serde(with = "crate::serde_hex")] [u8; 32], bool);

    pub fn serialize<S: Serializer>(value: &[([u8; 32], bool)], serializer: S) -> Result<S::Ok, S::Error> {
        let repr: Vec<TweakRepr> = value.iter().map(|(t, x)| TweakRepr(*t, *x)).collect();
        repr.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<([u8; 32], bool)>, D::Error> {
        let repr = Vec::<TweakRepr>::deserialize(deserializer)?;
        Ok(repr.into_iter().map(|TweakRepr(t, x)| (t, x)).collect())
    }
}
