use crate::domain::model::{CellValue, RawRow};
use crate::utils::error::{Result, TriageError};

const COMMENT_PREFIX: char = '#';
const QUOTE: char = '"';

/// Result of one parse pass over an exported report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Effective 1-based header line; 0 when the headerless path was taken.
    pub header_row: usize,
    pub rejected_lines: usize,
}

impl ParsedTable {
    /// 可供映射的欄位：以第一筆資料的欄位為準，略過空白名稱
    pub fn columns(&self) -> Vec<String> {
        match self.rows.first() {
            Some(row) => row
                .columns()
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Delimiter-sensing parser for CSV/TSV search term exports.
#[derive(Debug, Clone)]
pub struct TabularParser {
    /// 允許資料列比表頭少幾個尾端欄位
    trailing_tolerance: usize,
}

impl Default for TabularParser {
    fn default() -> Self {
        Self {
            trailing_tolerance: 2,
        }
    }
}

impl TabularParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trailing_tolerance(mut self, tolerance: usize) -> Self {
        self.trailing_tolerance = tolerance;
        self
    }

    /// Parse `text`, taking headers from the 1-based `header_row` counted after
    /// blank and `#` comment lines are dropped. 0 or out-of-range means headerless.
    pub fn parse(&self, text: &str, header_row: usize) -> Result<ParsedTable> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let lines: Vec<&str> = text
            .split('\n')
            .filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with(COMMENT_PREFIX)
            })
            .collect();

        if lines.is_empty() {
            return Err(TriageError::ParseError {
                message: "file is empty or contains only comment lines".to_string(),
            });
        }

        let (headers, start_row, effective_header) =
            if header_row > 0 && header_row <= lines.len() {
                let headers = split_line(lines[header_row - 1])
                    .into_iter()
                    .enumerate()
                    .map(|(index, header)| {
                        let cleaned = header.trim();
                        if cleaned.is_empty() {
                            synthetic_label(index)
                        } else {
                            cleaned.to_string()
                        }
                    })
                    .collect::<Vec<_>>();
                (headers, header_row, header_row)
            } else {
                if header_row > lines.len() {
                    tracing::warn!(
                        "Header row {} is beyond the {} data lines, parsing without a header",
                        header_row,
                        lines.len()
                    );
                }
                let width = split_line(lines[0]).len();
                ((0..width).map(synthetic_label).collect(), 0, 0)
            };

        tracing::debug!(
            "Parsed headers ({} columns, separator {}): {:?}",
            headers.len(),
            if lines[start_row.saturating_sub(1)].contains('\t') {
                "TAB"
            } else {
                "COMMA"
            },
            headers
        );

        let mut rows = Vec::with_capacity(lines.len().saturating_sub(start_row));
        let mut rejected_lines = 0;

        for line in &lines[start_row..] {
            let values = split_line(line);
            if values.len() + self.trailing_tolerance < headers.len() {
                rejected_lines += 1;
                continue;
            }

            let mut row = RawRow::new();
            for (index, header) in headers.iter().enumerate() {
                let value = values.get(index).map(String::as_str).unwrap_or("");
                row.insert(header.clone(), CellValue::coerce(value));
            }
            rows.push(row);
        }

        if rejected_lines > 0 {
            tracing::debug!(
                "Skipped {} lines with fewer than {} cells",
                rejected_lines,
                headers.len().saturating_sub(self.trailing_tolerance)
            );
        }

        Ok(ParsedTable {
            headers,
            rows,
            header_row: effective_header,
            rejected_lines,
        })
    }
}

fn synthetic_label(index: usize) -> String {
    format!("column {}", index + 1)
}

/// 每一行各自判斷分隔符：有 tab 用 tab，否則用逗號；引號內的分隔符不切割
fn split_line(line: &str) -> Vec<String> {
    let separator = if line.contains('\t') { '\t' } else { ',' };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        if ch == QUOTE {
            in_quotes = !in_quotes;
        } else if ch == separator && !in_quotes {
            cells.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    cells.push(current.trim().to_string());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, header_row: usize) -> ParsedTable {
        TabularParser::new().parse(text, header_row).unwrap()
    }

    #[test]
    fn test_comma_header_and_numeric_cells() {
        let table = parse("a,b,c\n1,2,3", 1);

        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.get("a"), Some(&CellValue::Number(1.0)));
        assert_eq!(row.get("b"), Some(&CellValue::Number(2.0)));
        assert_eq!(row.get("c"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_comment_lines_do_not_count_toward_header_row() {
        let table = parse("#comment\nx\ty\tz\n1\t2\t3", 1);

        assert_eq!(table.headers, vec!["x", "y", "z"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("z"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_currency_decoration_is_stripped() {
        let table = parse("term,cost\npcb,\"¥1,234.50\"", 1);
        assert_eq!(table.rows[0].get("cost"), Some(&CellValue::Number(1234.5)));
    }

    #[test]
    fn test_quoted_delimiter_is_not_a_boundary() {
        let table = parse("term,campaign\n\"pcb, fast\",\"Main\"", 1);
        assert_eq!(
            table.rows[0].get("term"),
            Some(&CellValue::Text("pcb, fast".to_string()))
        );
        assert_eq!(
            table.rows[0].get("campaign"),
            Some(&CellValue::Text("Main".to_string()))
        );
    }

    #[test]
    fn test_headerless_generates_labels_and_keeps_first_line() {
        let table = parse("pcb,10,2\npcba,20,3", 0);

        assert_eq!(table.header_row, 0);
        assert_eq!(table.headers, vec!["column 1", "column 2", "column 3"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0].get("column 1"),
            Some(&CellValue::Text("pcb".to_string()))
        );
    }

    #[test]
    fn test_header_row_beyond_line_count_falls_back_to_headerless() {
        let table = parse("a,b\n1,2", 5);
        assert_eq!(table.header_row, 0);
        assert_eq!(table.headers, vec!["column 1", "column 2"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_metadata_lines_above_header() {
        let text = "搜索字词报告\n2025年7月15日 - 2025年7月15日\n搜索字词,点击次数,费用\npcb services,125,¥1250.00";
        let table = parse(text, 3);

        assert_eq!(table.headers, vec!["搜索字词", "点击次数", "费用"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("费用"), Some(&CellValue::Number(1250.0)));
    }

    #[test]
    fn test_row_admission_tolerates_two_missing_trailing_cells() {
        let text = "a,b,c,d,e\n1,2,3\n1,2\n1,2,3,4,5";
        let table = parse(text, 1);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rejected_lines, 1);
        assert_eq!(
            table.rows[0].get("e"),
            Some(&CellValue::Text(String::new()))
        );
        assert_eq!(table.rows[1].get("e"), Some(&CellValue::Number(5.0)));
    }

    #[test]
    fn test_empty_header_gets_synthetic_label() {
        let table = parse("term,,cost\npcb,x,1", 1);
        assert_eq!(table.headers, vec!["term", "column 2", "cost"]);
    }

    #[test]
    fn test_mixed_cell_types_in_one_column() {
        let table = parse("term,cost\npcb,12.5\npcba,n/a", 1);
        assert_eq!(table.rows[0].get("cost"), Some(&CellValue::Number(12.5)));
        assert_eq!(
            table.rows[1].get("cost"),
            Some(&CellValue::Text("n/a".to_string()))
        );
    }

    #[test]
    fn test_crlf_and_bom_are_tolerated() {
        let table = parse("\u{feff}term,cost\r\npcb,3\r\n", 1);
        assert_eq!(table.headers, vec!["term", "cost"]);
        assert_eq!(table.rows[0].get("cost"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "# exported\nterm\tclicks\npcb\t3\npcba\t\"4\"";
        let first = parse(text, 1);
        let second = parse(text, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_or_comment_only_text_is_a_parse_error() {
        let parser = TabularParser::new();
        assert!(matches!(
            parser.parse("", 1),
            Err(TriageError::ParseError { .. })
        ));
        assert!(matches!(
            parser.parse("# only\n   \n#comments", 1),
            Err(TriageError::ParseError { .. })
        ));
    }

    #[test]
    fn test_columns_skip_blank_names() {
        let table = parse("term,cost\npcb,1", 1);
        assert_eq!(table.columns(), vec!["term", "cost"]);
        assert!(parse("term,cost", 1).columns().is_empty());
    }
}
