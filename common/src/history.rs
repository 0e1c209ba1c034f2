//! スキャン履歴
//!
//! 新しい順に最大 [`HISTORY_LIMIT`] 件を保持する。追加は AppStore からのみ。

use crate::types::ScanResult;
use std::collections::VecDeque;

/// 履歴の最大保持件数
pub const HISTORY_LIMIT: usize = 50;

/// 履歴1ページあたりの件数
pub const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanHistory {
    entries: VecDeque<ScanResult>,
}

/// ページ分割した履歴
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage<'a> {
    /// 1始まりのページ番号（範囲外指定は丸める）
    pub page: usize,
    pub total_pages: usize,
    pub items: Vec<&'a ScanResult>,
}

impl ScanHistory {
    pub(crate) fn push(&mut self, result: ScanResult) {
        self.entries.push_front(result);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 新しい順
    pub fn iter(&self) -> impl Iterator<Item = &ScanResult> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ScanResult> {
        self.entries.get(index)
    }

    pub fn latest(&self) -> Option<&ScanResult> {
        self.entries.front()
    }

    /// 品番または検査IDの部分一致（大文字小文字を無視）
    ///
    /// 空白のみのクエリは全件を返す。
    pub fn search(&self, query: &str) -> Vec<&ScanResult> {
        search_in(&self.entries, query)
    }

    /// 検索結果をページ分割
    pub fn page(&self, query: &str, page: usize, page_size: usize) -> HistoryPage<'_> {
        paginate(self.search(query), page, page_size)
    }
}

/// 任意の結果列を [`ScanHistory::search`] と同じ条件で絞り込む
pub fn search_in<'a, I>(items: I, query: &str) -> Vec<&'a ScanResult>
where
    I: IntoIterator<Item = &'a ScanResult>,
{
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return items.into_iter().collect();
    }

    items
        .into_iter()
        .filter(|r| {
            let part = r.part_number().map(str::to_lowercase);
            let id = r.inspection_id().map(str::to_lowercase);
            part.is_some_and(|p| p.contains(&query)) || id.is_some_and(|i| i.contains(&query))
        })
        .collect()
}

/// 結果列をページ分割
pub fn paginate(items: Vec<&ScanResult>, page: usize, page_size: usize) -> HistoryPage<'_> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    HistoryPage { page, total_pages, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BranchB, ExtractedFields, OcrVerification, Traceability};

    fn result(id: &str, part: &str) -> ScanResult {
        ScanResult {
            branch_b: Some(BranchB {
                ocr_verification: Some(OcrVerification {
                    extracted_fields: Some(ExtractedFields {
                        part_number: Some(part.to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            traceability: Some(Traceability {
                inspection_id: Some(id.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_push_keeps_newest_first_and_caps() {
        let mut history = ScanHistory::default();
        for i in 0..(HISTORY_LIMIT + 1) {
            history.push(result(&format!("INSP-{i}"), "SN74HC273N"));
        }

        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.latest().and_then(|r| r.inspection_id()), Some("INSP-50"));
        assert!(history.iter().all(|r| r.inspection_id() != Some("INSP-0")));
    }

    #[test]
    fn test_search_by_part_number_and_id() {
        let mut history = ScanHistory::default();
        history.push(result("INSP-1", "SN74HC273N"));
        history.push(result("INSP-2", "LM358N"));
        history.push(result("uuid-77", "NE555P"));

        assert_eq!(history.search("lm358").len(), 1);
        assert_eq!(history.search("insp-").len(), 2);
        assert_eq!(history.search("UUID").len(), 1);
        assert_eq!(history.search("   ").len(), 3);
        assert!(history.search("ATMEGA").is_empty());
    }

    #[test]
    fn test_search_skips_results_without_ids() {
        let mut history = ScanHistory::default();
        history.push(ScanResult::default());
        assert!(history.search("x").is_empty());
        assert_eq!(history.search("").len(), 1);
    }

    #[test]
    fn test_paginate_clamps_page() {
        let mut history = ScanHistory::default();
        for i in 0..7 {
            history.push(result(&format!("INSP-{i}"), "NE555P"));
        }

        let first = history.page("", 1, 3);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.items[0].inspection_id(), Some("INSP-6"));

        let last = history.page("", 99, 3);
        assert_eq!(last.page, 3);
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].inspection_id(), Some("INSP-0"));
    }

    #[test]
    fn test_paginate_empty() {
        let page = paginate(Vec::new(), 0, PAGE_SIZE);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }
}
