use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::ResourceId;
use super::resource::{parse_int, DraftForm, Resource};
use crate::domain::error::DomainError;

/// 蔵書。`/buku` で管理される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: ResourceId,
    pub judul: String,
    pub penulis: String,
    pub penerbit: String,
    pub tahun_terbit: i32,
    pub stok: u32,
}

/// create / update のリクエストボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPayload {
    pub judul: String,
    pub penulis: String,
    pub penerbit: String,
    pub tahun_terbit: i32,
    pub stok: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Judul,
    Penulis,
    Penerbit,
    TahunTerbit,
    Stok,
}

impl BookField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Judul => "judul",
            Self::Penulis => "penulis",
            Self::Penerbit => "penerbit",
            Self::TahunTerbit => "tahun_terbit",
            Self::Stok => "stok",
        }
    }
}

impl FromStr for BookField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "judul" => Ok(Self::Judul),
            "penulis" => Ok(Self::Penulis),
            "penerbit" => Ok(Self::Penerbit),
            "tahun_terbit" => Ok(Self::TahunTerbit),
            "stok" => Ok(Self::Stok),
            other => Err(DomainError::UnknownField {
                resource: Book::NOUN,
                name: other.to_string(),
            }),
        }
    }
}

/// 蔵書フォーム。数値フィールドも入力テキストのまま保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDraft {
    pub judul: String,
    pub penulis: String,
    pub penerbit: String,
    pub tahun_terbit: String,
    pub stok: String,
}

impl BookDraft {
    pub fn set(&mut self, field: BookField, value: String) {
        match field {
            BookField::Judul => self.judul = value,
            BookField::Penulis => self.penulis = value,
            BookField::Penerbit => self.penerbit = value,
            BookField::TahunTerbit => self.tahun_terbit = value,
            BookField::Stok => self.stok = value,
        }
    }

    pub fn get(&self, field: BookField) -> &str {
        match field {
            BookField::Judul => &self.judul,
            BookField::Penulis => &self.penulis,
            BookField::Penerbit => &self.penerbit,
            BookField::TahunTerbit => &self.tahun_terbit,
            BookField::Stok => &self.stok,
        }
    }
}

impl DraftForm for BookDraft {
    type Payload = BookPayload;

    const FIELDS: &'static [&'static str] = &["judul", "penulis", "penerbit", "tahun_terbit", "stok"];

    fn set_field(&mut self, name: &str, value: String) -> Result<(), DomainError> {
        let field = name.parse::<BookField>()?;
        self.set(field, value);
        Ok(())
    }

    fn field(&self, name: &str) -> Option<&str> {
        name.parse::<BookField>().ok().map(|f| self.get(f))
    }

    fn to_payload(&self) -> Result<BookPayload, DomainError> {
        Ok(BookPayload {
            judul: self.judul.clone(),
            penulis: self.penulis.clone(),
            penerbit: self.penerbit.clone(),
            tahun_terbit: parse_int(BookField::TahunTerbit.as_str(), &self.tahun_terbit)?,
            stok: parse_int(BookField::Stok.as_str(), &self.stok)?,
        })
    }
}

impl Resource for Book {
    type Payload = BookPayload;
    type Draft = BookDraft;

    const BASE_PATH: &'static str = "/buku";
    const DISPLAY_NAME: &'static str = "Buku";
    const NOUN: &'static str = "buku";

    fn id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> String {
        self.judul.clone()
    }

    fn to_draft(&self) -> BookDraft {
        BookDraft {
            judul: self.judul.clone(),
            penulis: self.penulis.clone(),
            penerbit: self.penerbit.clone(),
            tahun_terbit: self.tahun_terbit.to_string(),
            stok: self.stok.to_string(),
        }
    }

    fn to_payload(&self) -> BookPayload {
        BookPayload {
            judul: self.judul.clone(),
            penulis: self.penulis.clone(),
            penerbit: self.penerbit.clone(),
            tahun_terbit: self.tahun_terbit,
            stok: self.stok,
        }
    }

    fn columns() -> &'static [&'static str] {
        BookDraft::FIELDS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.judul.clone(),
            self.penulis.clone(),
            self.penerbit.clone(),
            self.tahun_terbit.to_string(),
            self.stok.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        Book {
            id: ResourceId::new(3),
            judul: "Laskar Pelangi".into(),
            penulis: "Andrea Hirata".into(),
            penerbit: "Bentang".into(),
            tahun_terbit: 2005,
            stok: 4,
        }
    }

    #[test]
    fn deserializes_wire_shape() {
        let book: Book = serde_json::from_str(
            r#"{"id":3,"judul":"Laskar Pelangi","penulis":"Andrea Hirata","penerbit":"Bentang","tahun_terbit":2005,"stok":4}"#,
        )
        .unwrap();
        assert_eq!(book, sample());
    }

    #[test]
    fn draft_from_book_excludes_id_and_stringifies_numbers() {
        let draft = sample().to_draft();
        assert_eq!(draft.tahun_terbit, "2005");
        assert_eq!(draft.stok, "4");
        assert_eq!(draft.to_payload().unwrap(), sample().to_payload());
    }

    #[test]
    fn set_field_by_wire_name() {
        let mut draft = BookDraft::default();
        draft.set_field("penerbit", "Gramedia".into()).unwrap();
        assert_eq!(draft.field("penerbit"), Some("Gramedia"));
        assert_eq!(draft.field("id"), None);
    }

    #[test]
    fn set_field_rejects_unknown_name() {
        let mut draft = BookDraft::default();
        let err = draft.set_field("id", "9".into()).unwrap_err();
        assert_eq!(
            err,
            DomainError::UnknownField {
                resource: "buku",
                name: "id".into()
            }
        );
        assert!(draft.is_blank());
    }

    #[test]
    fn payload_rejects_negative_stock() {
        let mut draft = sample().to_draft();
        draft.stok = "-1".into();
        let err = draft.to_payload().unwrap_err();
        assert!(matches!(err, DomainError::InvalidField { field: "stok", .. }));
    }

    #[test]
    fn payload_serializes_without_id() {
        let json = serde_json::to_value(sample().to_payload()).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["tahun_terbit"], 2005);
    }
}
