use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::id::ResourceId;
use crate::domain::error::DomainError;

/// 管理対象リソースのスキーマ。Book / Category が実装する。
///
/// `Payload` は create / update で送信するボディ（`id` を含まない）。
pub trait Resource:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Payload: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static;
    type Draft: DraftForm<Payload = Self::Payload>;

    /// REST上のベースパス（例: `/buku`）
    const BASE_PATH: &'static str;
    /// 通知文の先頭に使う表示名（例: `Buku`）
    const DISPLAY_NAME: &'static str;
    /// 失敗通知に使う小文字名詞（例: `buku`）
    const NOUN: &'static str;

    fn id(&self) -> ResourceId;

    /// 削除確認や詳細表示で使うラベル
    fn label(&self) -> String;

    /// 編集フォームへのコピー。`id` は含めない。
    fn to_draft(&self) -> Self::Draft;

    fn to_payload(&self) -> Self::Payload;

    /// 一覧表示用のカラム名（`id` を除く）
    fn columns() -> &'static [&'static str];

    /// `columns()` と同順のセル値
    fn cells(&self) -> Vec<String>;
}

/// 入力途中のフォーム。フィールド集合はスキーマごとに閉じている。
///
/// 値は入力ウィジェットが保持するテキストのまま格納し、
/// 数値への変換は `to_payload` まで遅延する。
pub trait DraftForm: Default + Clone + Debug + PartialEq + Send + Sync + 'static {
    type Payload;

    /// ワイヤ上のフィールド名
    const FIELDS: &'static [&'static str];

    fn set_field(&mut self, name: &str, value: String) -> Result<(), DomainError>;

    fn field(&self, name: &str) -> Option<&str>;

    fn to_payload(&self) -> Result<Self::Payload, DomainError>;

    /// スキーマ既定値（全フィールド空）か
    fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

/// 整数フィールドの変換。前後の空白は無視する。
pub(crate) fn parse_int<T>(field: &'static str, raw: &str) -> Result<T, DomainError>
where
    T: std::str::FromStr,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidField {
            field,
            reason: "value is required".to_string(),
        });
    }
    trimmed.parse::<T>().map_err(|_| DomainError::InvalidField {
        field,
        reason: format!("'{trimmed}' is not a valid number"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_accepts_padded_digits() {
        assert_eq!(parse_int::<i32>("tahun_terbit", " 2018 ").unwrap(), 2018);
    }

    #[test]
    fn parse_int_rejects_empty() {
        let err = parse_int::<u32>("stok", "  ").unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidField {
                field: "stok",
                reason: "value is required".to_string()
            }
        );
    }

    #[test]
    fn parse_int_rejects_negative_for_unsigned() {
        let err = parse_int::<u32>("stok", "-3").unwrap_err();
        assert!(err.to_string().contains("not a valid number"));
    }
}
