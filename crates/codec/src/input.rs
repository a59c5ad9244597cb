//! デコード用の入力カーソル。
//!
//! `parity_scale_codec::Input` を実装し、読み取り位置（オフセット）と
//! 直前の読み取り開始位置を記録する。デコーダが失敗した時点の記録から
//! [`DecodeError`] の位置・種類を組み立てる。

use parity_scale_codec::Decode;

use crate::{DecodeError, DecodeErrorKind};

/// バイト列上の読み取りカーソル。
#[derive(Debug, Clone)]
pub struct TrackedInput<'a> {
    data: &'a [u8],
    offset: usize,
    /// 直前に成功した読み取りの開始位置
    last_read: usize,
    /// 残りバイト数を超える読み取りが要求された
    short_read: bool,
}

impl<'a> TrackedInput<'a> {
    /// 先頭から読み取るカーソルを作成する。
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            last_read: 0,
            short_read: false,
        }
    }

    /// 現在の読み取り位置
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 未読のバイト数
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// 全て読み終えたか
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// 現在位置から1つの値をデコードする。
    ///
    /// 失敗時の `expected` は、デコーダが報告した最も内側の型・フィールド名。
    /// 名前が得られない場合は `T` の型名になる。
    pub fn decode<T: Decode>(&mut self) -> Result<T, DecodeError> {
        T::decode(self).map_err(|err| self.error_from(&err, std::any::type_name::<T>()))
    }

    /// `parity_scale_codec::Error` を位置付きの [`DecodeError`] に変換する。
    fn error_from(&self, err: &parity_scale_codec::Error, fallback: &str) -> DecodeError {
        // chain-error 有効時の Display は外側から内側へ全ての説明を並べる
        let text = err.to_string();
        let expected = innermost_name(&text).unwrap_or(fallback);
        let last_byte = self.data.get(self.last_read).copied().unwrap_or_default();

        let (offset, kind) = if self.short_read || text.contains("Not enough data") {
            (
                self.offset,
                DecodeErrorKind::UnexpectedEof {
                    remaining: self.remaining(),
                },
            )
        } else if text.contains("variant doesn't exist") {
            (self.last_read, DecodeErrorKind::UnknownTag(last_byte))
        } else if text.contains("boolean") {
            (self.last_read, DecodeErrorKind::InvalidBool(last_byte))
        } else if text.contains("utf8") {
            (self.last_read, DecodeErrorKind::InvalidUtf8)
        } else if text.contains("Compact") {
            (self.last_read, DecodeErrorKind::NonCanonicalCompact)
        } else {
            (self.last_read, DecodeErrorKind::Malformed(text.trim().to_string()))
        };
        DecodeError::new(offset, expected, kind)
    }
}

impl parity_scale_codec::Input for TrackedInput<'_> {
    fn remaining_len(&mut self) -> Result<Option<usize>, parity_scale_codec::Error> {
        Ok(Some(self.remaining()))
    }

    /// 不足する場合は位置を進めずにエラーを返す。
    fn read(&mut self, into: &mut [u8]) -> Result<(), parity_scale_codec::Error> {
        let end = self.offset + into.len();
        let Some(chunk) = self.data.get(self.offset..end) else {
            self.short_read = true;
            return Err("Not enough data to fill buffer".into());
        };
        into.copy_from_slice(chunk);
        self.last_read = self.offset;
        self.offset = end;
        Ok(())
    }
}

/// エラー説明中の最後のバッククォート区間（= 最も内側の型・フィールド名）
fn innermost_name(text: &str) -> Option<&str> {
    let end = text.rfind('`')?;
    let start = text[..end].rfind('`')?;
    Some(&text[start + 1..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 説明文から最も内側の名前を取り出す
    #[test]
    fn test_innermost_name() {
        let text = "Could not decode `Outer::B.0`:\n\tCould not decode `Inner`, variant doesn't exist\n";
        assert_eq!(innermost_name(text), Some("Inner"));
        assert_eq!(innermost_name("Not enough data to fill buffer"), None);
    }

    /// 読み取り失敗では位置が進まない
    #[test]
    fn test_short_read_keeps_offset() {
        let mut input = TrackedInput::new(&[1, 2, 3]);
        let mut buf = [0u8; 2];
        parity_scale_codec::Input::read(&mut input, &mut buf).unwrap();
        assert_eq!(buf, [1, 2]);
        assert!(parity_scale_codec::Input::read(&mut input, &mut buf).is_err());
        assert_eq!(input.offset(), 2);
        assert_eq!(input.remaining(), 1);
    }
}
