use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

use crate::config::settings::{OutputFormat, OutputSettings};
use crate::domain::model::{AnalysisResult, RunReport};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, TriageError};

pub const RESULTS_JSON: &str = "results.json";
pub const RESULTS_TSV: &str = "results.tsv";

const TSV_HEADERS: [&str; 24] = [
    "id",
    "searchTerm",
    "translation",
    "keyword",
    "campaign",
    "adGroup",
    "matchType",
    "impressions",
    "clicks",
    "cost",
    "conversions",
    "conversionValue",
    "ctr",
    "avgCpc",
    "conversionRate",
    "semanticRelevance",
    "commercialValue",
    "isNegative",
    "confidence",
    "negativeKeyword",
    "negativeMatchType",
    "level",
    "reasonTags",
    "reasoning",
];

const NEGATIVE_HEADERS: [&str; 15] = [
    "搜索词",
    "翻译",
    "否词建议",
    "匹配类型",
    "应用层级",
    "推广计划",
    "广告组",
    "原因标签",
    "原因",
    "费用",
    "点击次数",
    "转化次数",
    "语义相关性",
    "商业价值",
    "置信度",
];

/// One rendered output file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// 匯出檔名帶日期，例如 negative_keywords_2025-07-15.csv
pub fn negative_keywords_file_name(date: chrono::NaiveDate) -> String {
    format!("negative_keywords_{}.csv", date.format("%Y-%m-%d"))
}

pub fn render_json(report: &RunReport) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(report)?)
}

pub fn render_tsv(results: &[AnalysisResult]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());
    writer.write_record(TSV_HEADERS)?;

    for result in results {
        let record = &result.record;
        let recommendation = &result.analysis.recommendation;
        writer.write_record([
            result.id.to_string(),
            single_line(&record.search_term),
            single_line(&result.translation),
            single_line(&record.keyword),
            single_line(&record.campaign),
            single_line(&record.ad_group),
            single_line(&record.match_type),
            record.impressions.to_string(),
            record.clicks.to_string(),
            record.cost.to_string(),
            record.conversions.to_string(),
            record.conversion_value.to_string(),
            record.ctr.to_string(),
            record.avg_cpc.to_string(),
            record.conversion_rate.to_string(),
            result.analysis.semantic_relevance.score.to_string(),
            result.analysis.commercial_value.score.to_string(),
            recommendation.is_negative.to_string(),
            recommendation.confidence.to_string(),
            single_line(&recommendation.negative_keyword),
            recommendation.match_type.as_str().to_string(),
            recommendation.level.as_str().to_string(),
            recommendation.reason_tags.join(","),
            single_line(&recommendation.reasoning),
        ])?;
    }

    finish(writer)
}

/// 只輸出被標為否詞的結果，欄位與介面匯出的否詞建議表一致
pub fn render_negative_csv<'a>(results: impl IntoIterator<Item = &'a AnalysisResult>) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(NEGATIVE_HEADERS)?;

    for result in results.into_iter().filter(|r| r.is_negative()) {
        let record = &result.record;
        let recommendation = &result.analysis.recommendation;
        writer.write_record([
            record.search_term.clone(),
            result.translation.clone(),
            recommendation.negative_keyword.clone(),
            recommendation.match_type.as_str().to_string(),
            recommendation.level.as_str().to_string(),
            record.campaign.clone(),
            record.ad_group.clone(),
            recommendation.reason_tags.join(", "),
            recommendation.reasoning.clone(),
            format!("¥{:.2}", record.cost),
            record.clicks.to_string(),
            record.conversions.to_string(),
            format!("{}%", result.analysis.semantic_relevance.score),
            format!("{}%", result.analysis.commercial_value.score),
            format!("{}%", recommendation.confidence),
        ])?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| TriageError::IoError(e.into_error()))
}

fn single_line(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}

/// Renders the configured formats and writes them (zipped or loose) through `Storage`.
pub struct ReportWriter<'a, S: Storage> {
    storage: &'a S,
    settings: &'a OutputSettings,
}

impl<'a, S: Storage> ReportWriter<'a, S> {
    pub fn new(storage: &'a S, settings: &'a OutputSettings) -> Self {
        Self { storage, settings }
    }

    pub fn render(&self, report: &RunReport, date: chrono::NaiveDate) -> Result<Vec<ReportFile>> {
        let mut files = Vec::new();
        for format in &self.settings.formats {
            let file = match format {
                OutputFormat::Json => ReportFile {
                    name: RESULTS_JSON.to_string(),
                    data: render_json(report)?,
                },
                OutputFormat::Tsv => ReportFile {
                    name: RESULTS_TSV.to_string(),
                    data: render_tsv(&report.results)?,
                },
                OutputFormat::Csv => ReportFile {
                    name: negative_keywords_file_name(date),
                    data: render_negative_csv(&report.results)?,
                },
            };
            files.push(file);
        }
        Ok(files)
    }

    /// 回傳輸出位置：壓縮時為 ZIP 路徑，否則為輸出目錄
    pub async fn write(&self, report: &RunReport) -> Result<String> {
        let date = chrono::Local::now().date_naive();
        let files = self.render(report, date)?;
        let output_path = self.settings.output_path.trim_end_matches('/');

        if self.settings.compress {
            tracing::debug!("Creating ZIP file with {} files", files.len());

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for file in &files {
                    zip.start_file::<_, ()>(file.name.as_str(), FileOptions::default())?;
                    zip.write_all(&file.data)?;
                }
                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            let archive = format!("{}/{}", output_path, self.settings.archive_name);
            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(&archive, &zip_data).await?;
            Ok(archive)
        } else {
            for file in &files {
                let path = format!("{}/{}", output_path, file.name);
                self.storage.write_file(&path, &file.data).await?;
            }
            Ok(output_path.to_string())
        }
    }
}
