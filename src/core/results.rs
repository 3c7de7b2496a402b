use std::collections::HashSet;

use crate::domain::model::AnalysisResult;

/// 結果篩選條件：文字比對搜尋字詞、翻譯、關鍵字（不分大小寫）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFilter {
    pub query: String,
    pub only_negative: bool,
}

impl ResultFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            only_negative: false,
        }
    }

    pub fn negatives_only(mut self) -> Self {
        self.only_negative = true;
        self
    }

    pub fn matches(&self, result: &AnalysisResult) -> bool {
        if self.only_negative && !result.is_negative() {
            return false;
        }

        let query = self.query.trim().to_lowercase();
        query.is_empty()
            || result.record.search_term.to_lowercase().contains(&query)
            || result.translation.to_lowercase().contains(&query)
            || result.record.keyword.to_lowercase().contains(&query)
    }
}

/// Editable view over one run's results. Edits never reorder entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    results: Vec<AnalysisResult>,
}

impl ResultSet {
    pub fn new(results: Vec<AnalysisResult>) -> Self {
        Self { results }
    }

    pub fn get(&self, id: usize) -> Option<&AnalysisResult> {
        self.results.iter().find(|result| result.id == id)
    }

    /// Flip one result's negative flag; returns the new value, or `None` for an unknown id.
    pub fn toggle_negative(&mut self, id: usize) -> Option<bool> {
        let result = self.results.iter_mut().find(|result| result.id == id)?;
        let recommendation = &mut result.analysis.recommendation;
        recommendation.is_negative = !recommendation.is_negative;
        tracing::debug!(
            "Toggled result {} to negative={}",
            id,
            recommendation.is_negative
        );
        Some(recommendation.is_negative)
    }

    /// 批次設定選取項目的否詞旗標，回傳實際被選到的筆數
    pub fn set_negative(&mut self, ids: &[usize], is_negative: bool) -> usize {
        let selected: HashSet<usize> = ids.iter().copied().collect();
        let mut touched = 0;
        for result in self.results.iter_mut().filter(|r| selected.contains(&r.id)) {
            result.analysis.recommendation.is_negative = is_negative;
            touched += 1;
        }
        touched
    }

    pub fn filter<'a>(&'a self, filter: &'a ResultFilter) -> impl Iterator<Item = &'a AnalysisResult> {
        self.results.iter().filter(move |result| filter.matches(result))
    }

    pub fn negatives(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.results.iter().filter(|result| result.is_negative())
    }

    pub fn tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a AnalysisResult> {
        self.results.iter().filter(move |result| result.has_tag(tag))
    }

    pub fn as_slice(&self) -> &[AnalysisResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_inner(self) -> Vec<AnalysisResult> {
        self.results
    }
}

impl From<Vec<AnalysisResult>> for ResultSet {
    fn from(results: Vec<AnalysisResult>) -> Self {
        Self::new(results)
    }
}
