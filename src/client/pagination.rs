//! Page-button layout and the "showing X to Y of Z" range
//!
//! Pure functions of a [`PaginationInfo`]; nothing here recomputes the
//! server's totals.

use crate::core::query::PaginationInfo;
use serde::Serialize;

/// One slot in the page-button strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "lowercase")]
pub enum PageToken {
    Page(usize),
    Ellipsis,
}

/// Page buttons to render, with ellipses for collapsed ranges
///
/// Up to `max_visible` pages are shown outright. Beyond that the first and
/// last page are always present, with a window of `max_visible - 2` pages
/// centred on the current one and shifted to stay full near either end.
pub fn page_tokens(info: &PaginationInfo, max_visible: usize) -> Vec<PageToken> {
    let total_pages = info.total_pages;
    if total_pages == 0 {
        return Vec::new();
    }

    let max_visible = max_visible.max(3);
    if total_pages <= max_visible {
        return (1..=total_pages).map(PageToken::Page).collect();
    }

    let page = info.page.clamp(1, total_pages);
    let window = max_visible - 2;

    let mut start = page.saturating_sub(window / 2).max(2);
    let end = (start + window - 1).min(total_pages - 1);
    if end + 1 - start < window {
        start = (end + 1).saturating_sub(window).max(2);
    }

    let mut tokens = Vec::with_capacity(max_visible + 2);
    tokens.push(PageToken::Page(1));
    if start > 2 {
        tokens.push(PageToken::Ellipsis);
    }
    tokens.extend((start..=end).map(PageToken::Page));
    if end < total_pages - 1 {
        tokens.push(PageToken::Ellipsis);
    }
    tokens.push(PageToken::Page(total_pages));
    tokens
}

/// 1-based, inclusive range of results shown on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultRange {
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

impl ResultRange {
    pub fn of(info: &PaginationInfo) -> Self {
        let page = info.page.max(1);
        let end = page.saturating_mul(info.limit).min(info.total);
        let start = (page - 1)
            .saturating_mul(info.limit)
            .saturating_add(1)
            .min(end.max(1));
        Self {
            start,
            end,
            total: info.total,
        }
    }
}

/// Everything a pager control needs to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationView {
    pub current_page: usize,
    pub tokens: Vec<PageToken>,
    pub range: ResultRange,
    pub prev_page: Option<usize>,
    pub next_page: Option<usize>,
}

impl PaginationView {
    /// `None` when there are no results, so the pager is not rendered
    pub fn from_info(info: &PaginationInfo, max_visible: usize) -> Option<Self> {
        if info.total == 0 {
            return None;
        }

        Some(Self {
            current_page: info.page,
            tokens: page_tokens(info, max_visible),
            range: ResultRange::of(info),
            prev_page: info.has_prev.then(|| info.page - 1),
            next_page: info.has_next.then(|| info.page + 1),
        })
    }

    pub fn is_current(&self, token: &PageToken) -> bool {
        matches!(token, PageToken::Page(n) if *n == self.current_page)
    }
}
