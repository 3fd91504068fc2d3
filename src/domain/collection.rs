use std::collections::HashSet;

use super::model::id::ResourceId;
use super::model::resource::Resource;

/// 最後に同期したサーバー側一覧のローカル写し。
///
/// 順序はサーバーの返却順。同一IDのエントリは2つ以上存在しない。
/// 要素の追加・削除はサーバーからの全件取得でのみ行う。
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<R: Resource> {
    items: Vec<R>,
}

impl<R: Resource> Default for Collection<R> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<R: Resource> Collection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// サーバー応答から構築する。重複IDは先頭の出現のみ残す。
    pub fn from_remote(items: Vec<R>) -> Self {
        let mut seen = HashSet::with_capacity(items.len());
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            let id = item.id();
            if seen.insert(id) {
                kept.push(item);
            } else {
                tracing::warn!(resource = R::NOUN, %id, "duplicate id in listing, dropped");
            }
        }
        Self { items: kept }
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ResourceId) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.items.iter().map(|item| item.id())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.items.iter()
    }
}

impl<'a, R: Resource> IntoIterator for &'a Collection<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
