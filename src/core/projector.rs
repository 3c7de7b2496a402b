use crate::domain::model::{
    CanonicalField, CanonicalRecord, ColumnMapping, FieldKind, RawRow, UNKNOWN_CAMPAIGN,
};

/// Applies a column mapping to raw rows. Pure; one record per row, order kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordProjector;

impl RecordProjector {
    pub fn new() -> Self {
        Self
    }

    pub fn project(&self, rows: &[RawRow], mapping: &ColumnMapping) -> Vec<CanonicalRecord> {
        rows.iter().map(|row| self.project_row(row, mapping)).collect()
    }

    pub fn project_row(&self, row: &RawRow, mapping: &ColumnMapping) -> CanonicalRecord {
        let mut record = CanonicalRecord::default();

        for field in CanonicalField::ALL {
            let cell = mapping.get(field).and_then(|column| row.get(column));

            match field.kind() {
                FieldKind::Text => {
                    let text = cell.map(|value| value.as_text()).unwrap_or_default();
                    let text = if text.is_empty() && field == CanonicalField::Campaign {
                        UNKNOWN_CAMPAIGN.to_string()
                    } else {
                        text
                    };
                    record.set_text(field, text);
                }
                FieldKind::Numeric => {
                    record.set_number(field, cell.map(|value| value.as_number()).unwrap_or(0.0));
                }
            }
        }

        record
    }
}
