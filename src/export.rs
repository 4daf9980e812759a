use crate::store::Record;

/// List-valued fields are flattened with a delimiter distinct from the
/// field separator so exports stay one row per record.
pub const LIST_SEPARATOR: &str = ";";

pub fn join_list(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}

/// RFC4180 quoting: wrap when the value carries a comma, quote, or line
/// break, doubling embedded quotes.
pub fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serializes a collection in its canonical column order, header row first.
pub fn to_csv<R: Record>(records: &[R]) -> String {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(R::CSV_HEADERS.join(","));
    for record in records {
        let fields: Vec<String> = record
            .csv_row()
            .iter()
            .map(|value| csv_field(value))
            .collect();
        rows.push(fields.join(","));
    }
    rows.join("\n")
}
