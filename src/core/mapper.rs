use crate::domain::model::{CanonicalField, ColumnMapping, MappingConflict, MappingOutcome};

/// 各欄位的候選名稱，依序比對；同時涵蓋中文報表與英文匯出
const FIELD_ALIASES: [(CanonicalField, &[&str]); 13] = [
    (
        CanonicalField::SearchTerm,
        &["搜索字词", "搜索词", "search term", "query", "查询词"],
    ),
    (CanonicalField::Keyword, &["关键字", "关键词", "keyword", "kw"]),
    (
        CanonicalField::Campaign,
        &["推广计划", "广告系列", "campaign", "计划"],
    ),
    (
        CanonicalField::AdGroup,
        &["广告组", "ad group", "adgroup", "单元"],
    ),
    (
        CanonicalField::MatchType,
        &["匹配类型", "match type", "匹配方式"],
    ),
    (
        CanonicalField::Impressions,
        &["展现量", "展示次数", "impressions", "impr", "展现次数"],
    ),
    (CanonicalField::Clicks, &["点击次数", "点击量", "clicks"]),
    (CanonicalField::Cost, &["费用", "花费", "cost", "spend"]),
    (
        CanonicalField::Conversions,
        &["转化次数", "转化量", "conversions", "conv"],
    ),
    (
        CanonicalField::ConversionValue,
        &["转化价值", "转化值", "conversion value", "conv value", "所有转化价值"],
    ),
    (
        CanonicalField::Ctr,
        &["点击率", "ctr", "click through rate"],
    ),
    (
        CanonicalField::AvgCpc,
        &["平均点击费用", "平均cpc", "avg cpc", "average cpc", "平均每次点击费用"],
    ),
    (
        CanonicalField::ConversionRate,
        &["转化率", "conversion rate", "conv rate"],
    ),
];

/// Heuristic column → canonical field discovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapper;

impl FieldMapper {
    pub fn new() -> Self {
        Self
    }

    /// Build a fresh mapping from `columns`. Each field takes the first column
    /// matching its earliest alias (containment either way, case-insensitive).
    /// A column may end up bound to several fields; those are reported as conflicts.
    pub fn auto_map(&self, columns: &[String]) -> MappingOutcome {
        let candidates: Vec<(&str, String)> = columns
            .iter()
            .filter(|column| !column.trim().is_empty())
            .map(|column| (column.as_str(), column.to_lowercase()))
            .collect();

        let mut mapping = ColumnMapping::new();
        for (field, aliases) in FIELD_ALIASES.iter() {
            let matched = aliases.iter().find_map(|alias| {
                let alias = alias.to_lowercase();
                candidates
                    .iter()
                    .find(|(_, lowered)| lowered.contains(&alias) || alias.contains(lowered.as_str()))
                    .map(|(column, _)| *column)
            });

            if let Some(column) = matched {
                tracing::debug!("Mapped {} -> '{}'", field, column);
                mapping.set(*field, column);
            }
        }

        let conflicts = find_conflicts(&mapping);
        for conflict in &conflicts {
            tracing::warn!(
                "⚠️ Column '{}' was mapped to several fields: {}",
                conflict.column,
                conflict
                    .fields
                    .iter()
                    .map(CanonicalField::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        MappingOutcome { mapping, conflicts }
    }
}

fn find_conflicts(mapping: &ColumnMapping) -> Vec<MappingConflict> {
    let mut conflicts: Vec<MappingConflict> = Vec::new();
    for (field, column) in mapping.iter() {
        match conflicts.iter_mut().find(|c| c.column == column) {
            Some(conflict) => conflict.fields.push(field),
            None => conflicts.push(MappingConflict {
                column: column.to_string(),
                fields: vec![field],
            }),
        }
    }
    conflicts.retain(|conflict| conflict.fields.len() > 1);
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_maps_chinese_report_columns() {
        let outcome = FieldMapper::new().auto_map(&columns(&["搜索字词", "点击次数"]));

        assert_eq!(outcome.mapping.get(CanonicalField::SearchTerm), Some("搜索字词"));
        assert_eq!(outcome.mapping.get(CanonicalField::Clicks), Some("点击次数"));
        assert_eq!(outcome.mapping.len(), 2);
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn test_maps_full_google_ads_export() {
        let cols = columns(&[
            "搜索字词",
            "已添加/排除的关键字",
            "推广计划名称",
            "广告组名称",
            "关键字匹配类型",
            "展示次数",
            "点击次数",
            "费用",
            "转化次数",
            "转化价值",
            "点击率",
            "平均每次点击费用",
            "转化率",
        ]);
        let outcome = FieldMapper::new().auto_map(&cols);
        let mapping = &outcome.mapping;

        assert_eq!(mapping.get(CanonicalField::SearchTerm), Some("搜索字词"));
        assert_eq!(mapping.get(CanonicalField::Keyword), Some("已添加/排除的关键字"));
        assert_eq!(mapping.get(CanonicalField::Campaign), Some("推广计划名称"));
        assert_eq!(mapping.get(CanonicalField::AdGroup), Some("广告组名称"));
        assert_eq!(mapping.get(CanonicalField::MatchType), Some("关键字匹配类型"));
        assert_eq!(mapping.get(CanonicalField::Impressions), Some("展示次数"));
        assert_eq!(mapping.get(CanonicalField::Cost), Some("费用"));
        assert_eq!(mapping.get(CanonicalField::ConversionRate), Some("转化率"));
        assert!(mapping.missing_required().is_empty());

        // "平均点击费用" 包含欄位名 "费用"，所以平均點擊費用也被綁到費用欄
        assert_eq!(mapping.get(CanonicalField::AvgCpc), Some("费用"));
        assert_eq!(
            outcome.conflicts,
            vec![MappingConflict {
                column: "费用".to_string(),
                fields: vec![CanonicalField::Cost, CanonicalField::AvgCpc],
            }]
        );
    }

    #[test]
    fn test_maps_english_columns_case_insensitively() {
        let cols = columns(&["Search Term", "Keyword", "Clicks", "Cost", "Avg CPC"]);
        let mapping = FieldMapper::new().auto_map(&cols).mapping;

        assert_eq!(mapping.get(CanonicalField::SearchTerm), Some("Search Term"));
        assert_eq!(mapping.get(CanonicalField::Keyword), Some("Keyword"));
        assert_eq!(mapping.get(CanonicalField::AvgCpc), Some("Avg CPC"));
        assert!(mapping.get(CanonicalField::Campaign).is_none());
    }

    #[test]
    fn test_alias_containing_column_also_matches() {
        // "计划" 是 "推广计划" 的子字串
        let mapping = FieldMapper::new().auto_map(&columns(&["计划"])).mapping;
        assert_eq!(mapping.get(CanonicalField::Campaign), Some("计划"));
    }

    #[test]
    fn test_reports_column_bound_to_two_fields() {
        let outcome = FieldMapper::new().auto_map(&columns(&["cost", "conversion value"]));

        assert_eq!(
            outcome.mapping.get(CanonicalField::Conversions),
            Some("conversion value")
        );
        assert_eq!(
            outcome.mapping.get(CanonicalField::ConversionValue),
            Some("conversion value")
        );
        assert_eq!(
            outcome.conflicts,
            vec![MappingConflict {
                column: "conversion value".to_string(),
                fields: vec![CanonicalField::Conversions, CanonicalField::ConversionValue],
            }]
        );
    }

    #[test]
    fn test_blank_columns_never_match() {
        let outcome = FieldMapper::new().auto_map(&columns(&["", "  "]));
        assert!(outcome.mapping.is_empty());
    }

    #[test]
    fn test_auto_map_is_idempotent() {
        let cols = columns(&["搜索字词", "关键词", "费用", "点击次数", "广告组"]);
        let mapper = FieldMapper::new();
        assert_eq!(mapper.auto_map(&cols), mapper.auto_map(&cols));
    }
}
