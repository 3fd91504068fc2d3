//! 一覧から導出する集計値。読むたびに再計算し、別途キャッシュしない。

use serde::Serialize;

use crate::domain::collection::Collection;
use crate::domain::model::book::Book;
use crate::domain::model::category::Category;

pub fn count_matching<R, F>(items: &[R], pred: F) -> usize
where
    F: Fn(&R) -> bool,
{
    items.iter().filter(|&item| pred(item)).count()
}

pub fn sum_by<R, F>(items: &[R], f: F) -> u64
where
    F: Fn(&R) -> u64,
{
    items.iter().map(f).sum()
}

/// 蔵書一覧の集計（総数・在庫合計・在庫切れ数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookStats {
    pub total: usize,
    pub stock_available: u64,
    pub out_of_stock: usize,
}

impl BookStats {
    pub fn of(books: &Collection<Book>) -> Self {
        let items = books.items();
        Self {
            total: items.len(),
            stock_available: sum_by(items, |b| u64::from(b.stok)),
            out_of_stock: count_matching(items, |b| b.stok == 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub total: usize,
}

impl CategoryStats {
    pub fn of(categories: &Collection<Category>) -> Self {
        Self {
            total: categories.len(),
        }
    }
}
