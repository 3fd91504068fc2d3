//! 表示層向けのテキスト投影。一覧表・詳細・フォーム・ダッシュボード。

use crate::domain::collection::Collection;
use crate::domain::model::id::ResourceId;
use crate::domain::model::resource::{DraftForm, Resource};

use super::controller::PendingDelete;
use super::stats::{BookStats, CategoryStats};

/// 一覧をMarkdownテーブルに変換する。空なら案内文を返す。
pub fn render_table<R: Resource>(collection: &Collection<R>) -> String {
    if collection.is_empty() {
        return format!(
            "Belum ada {}. Gunakan `form_open` untuk menambahkan.",
            R::NOUN
        );
    }

    let mut buf = String::new();
    buf.push_str(&format!(
        "Daftar {} ({} item)\n\n",
        R::DISPLAY_NAME,
        collection.len()
    ));

    let mut header = vec!["id"];
    header.extend_from_slice(R::columns());
    buf.push_str(&table_row(header.iter().map(|h| h.to_string())));
    buf.push_str(&table_row(header.iter().map(|_| "---".to_string())));

    for item in collection {
        let cells = std::iter::once(item.id().to_string()).chain(item.cells());
        buf.push_str(&table_row(cells));
    }
    buf.trim_end().to_string()
}

fn table_row(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |\n", cells.join(" | "))
}

/// 1件分の読み取り専用表示
pub fn render_detail<R: Resource>(item: &R) -> String {
    let mut buf = format!("Detail {} #{}\n", R::DISPLAY_NAME, item.id());
    for (name, value) in R::columns().iter().zip(item.cells()) {
        buf.push_str(&format!("- {name}: {value}\n"));
    }
    buf.trim_end().to_string()
}

/// 入力中のフォーム
pub fn render_draft<R: Resource>(draft: &R::Draft, editing: Option<ResourceId>) -> String {
    let mut buf = match editing {
        Some(id) => format!("Edit {} #{}\n", R::DISPLAY_NAME, id),
        None => format!("Tambah {} Baru\n", R::DISPLAY_NAME),
    };
    for name in <R::Draft as DraftForm>::FIELDS {
        let value = draft.field(name).unwrap_or_default();
        buf.push_str(&format!("- {name}: {value:?}\n"));
    }
    buf.trim_end().to_string()
}

pub fn render_pending_delete<R: Resource>(pending: &PendingDelete) -> String {
    format!(
        "Yakin ingin menghapus {} \"{}\" (#{})? Gunakan `delete_confirm` atau `delete_cancel`.",
        R::NOUN,
        pending.label,
        pending.id
    )
}

pub fn render_dashboard(books: &BookStats, categories: &CategoryStats) -> String {
    [
        "Ringkasan".to_string(),
        format!("- Total Buku: {}", books.total),
        format!("- Stok Tersedia: {}", books.stock_available),
        format!("- Buku Habis: {}", books.out_of_stock),
        format!("- Total Kategori: {}", categories.total),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::book::{Book, BookDraft};
    use crate::domain::model::category::Category;

    #[test]
    fn empty_table_shows_hint() {
        let col: Collection<Category> = Collection::new();
        assert_eq!(
            render_table(&col),
            "Belum ada kategori. Gunakan `form_open` untuk menambahkan."
        );
    }

    #[test]
    fn table_escapes_pipes() {
        let col = Collection::from_remote(vec![Category {
            id: ResourceId::new(1),
            nama: "A|B".into(),
        }]);
        assert!(render_table(&col).contains("| 1 | A\\|B |"));
    }

    #[test]
    fn draft_marks_edit_mode() {
        let draft = BookDraft {
            judul: "Dune".into(),
            ..Default::default()
        };
        let text = render_draft::<Book>(&draft, Some(ResourceId::new(4)));
        assert!(text.starts_with("Edit Buku #4"));
        assert!(text.contains("- judul: \"Dune\""));
        assert!(text.contains("- stok: \"\""));
    }
}
