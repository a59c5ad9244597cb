//! # BitAcross バイナリコーデック
//!
//! ワーカーとの間でやり取りする型は `parity-scale-codec` の derive で
//! SCALEエンコーディングする。このクレートはその薄いラッパーで、
//! デコード失敗を「どのバイト位置で・どの型を読んでいたか」付きの
//! [`DecodeError`] として返す。
//!
//! ## エンコーディング規則
//! | 型 | ワイヤ表現 |
//! |----|-----------|
//! | 固定長配列 `[u8; N]` | N バイトそのまま（長さプレフィックスなし） |
//! | 可変長バイト列・リスト | compact 整数の要素数 + 各要素 |
//! | 文字列 | compact 整数のバイト長 + UTF-8 |
//! | `bool` | 1バイト（0 または 1） |
//! | タグ付きユニオン | 1バイトの位置インデックス + 選択されたバリアント |
//! | レコード | 宣言順のフィールド連結（フィールド名なし） |
//!
//! タグは宣言順の位置で決まるため、送受信側でスキーマが一致している必要がある。
//! デコードは全域的で、不正・途中切れの入力は必ず [`DecodeError`] になる。

mod input;

pub use input::TrackedInput;
pub use parity_scale_codec::{Compact, Decode, Encode};

/// デコードエラーの種類
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    /// 入力が途中で終わっている
    #[error("入力が不足しています（残り: {remaining}バイト）")]
    UnexpectedEof {
        /// 失敗時点で残っていたバイト数
        remaining: usize,
    },
    /// タグ付きユニオンの未知の判別子
    #[error("未知のタグです: {0}")]
    UnknownTag(u8),
    /// 0/1 以外の bool 値
    #[error("不正なbool値です: {0}")]
    InvalidBool(u8),
    /// 文字列が UTF-8 として不正
    #[error("文字列がUTF-8として不正です")]
    InvalidUtf8,
    /// compact 整数が最短表現ではない、または範囲外
    #[error("compact整数が正規形ではありません")]
    NonCanonicalCompact,
    /// デコード完了後に余剰バイトが残っている
    #[error("末尾に{0}バイトの余剰データがあります")]
    TrailingBytes(usize),
    /// その他の不正なバイト列（デコーダの説明をそのまま保持）
    #[error("不正なバイト列です: {0}")]
    Malformed(String),
}

/// デコードエラー。
/// 失敗したバイト位置と、デコードしようとしていた型名を保持する。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{expected}のデコードに失敗しました (offset {offset}): {kind}")]
pub struct DecodeError {
    /// エラーが発生したバイト位置
    pub offset: usize,
    /// 期待していた型（またはフィールド）
    pub expected: String,
    /// エラーの種類
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    /// デコードエラーを作成する。
    pub fn new(offset: usize, expected: impl Into<String>, kind: DecodeErrorKind) -> Self {
        Self {
            offset,
            expected: expected.into(),
            kind,
        }
    }
}

/// バイト列全体を1つの値としてデコードする。
/// 余剰バイトが残っている場合はエラー。
pub fn decode_all<T: Decode>(bytes: &[u8]) -> Result<T, DecodeError> {
    let mut input = TrackedInput::new(bytes);
    let value = input.decode::<T>()?;
    if !input.is_empty() {
        return Err(DecodeError::new(
            input.offset(),
            std::any::type_name::<T>(),
            DecodeErrorKind::TrailingBytes(input.remaining()),
        ));
    }
    Ok(value)
}
