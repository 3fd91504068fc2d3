use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::ResourceId;
use super::resource::{DraftForm, Resource};
use crate::domain::error::DomainError;

/// 蔵書カテゴリ。`/kategori` で管理される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: ResourceId,
    pub nama: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub nama: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    Nama,
}

impl FromStr for CategoryField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nama" => Ok(Self::Nama),
            other => Err(DomainError::UnknownField {
                resource: Category::NOUN,
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    pub nama: String,
}

impl DraftForm for CategoryDraft {
    type Payload = CategoryPayload;

    const FIELDS: &'static [&'static str] = &["nama"];

    fn set_field(&mut self, name: &str, value: String) -> Result<(), DomainError> {
        match name.parse::<CategoryField>()? {
            CategoryField::Nama => self.nama = value,
        }
        Ok(())
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name.parse::<CategoryField>().ok()? {
            CategoryField::Nama => Some(self.nama.as_str()),
        }
    }

    fn to_payload(&self) -> Result<CategoryPayload, DomainError> {
        Ok(CategoryPayload {
            nama: self.nama.clone(),
        })
    }
}

impl Resource for Category {
    type Payload = CategoryPayload;
    type Draft = CategoryDraft;

    const BASE_PATH: &'static str = "/kategori";
    const DISPLAY_NAME: &'static str = "Kategori";
    const NOUN: &'static str = "kategori";

    fn id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> String {
        self.nama.clone()
    }

    fn to_draft(&self) -> CategoryDraft {
        CategoryDraft {
            nama: self.nama.clone(),
        }
    }

    fn to_payload(&self) -> CategoryPayload {
        CategoryPayload {
            nama: self.nama.clone(),
        }
    }

    fn columns() -> &'static [&'static str] {
        CategoryDraft::FIELDS
    }

    fn cells(&self) -> Vec<String> {
        vec![self.nama.clone()]
    }
}
