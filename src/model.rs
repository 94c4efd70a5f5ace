use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Operator-facing placeholder for a header field no page matched.
pub const NOT_FOUND: &str = "Tidak ditemukan";

/// One extracted table row: ordered cells, blank/missing cells allowed.
pub type RawRow = Vec<Option<String>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDump {
    pub text: String,
    #[serde(default)]
    pub tables: Vec<Vec<RawRow>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDump {
    pub pages: Vec<PageDump>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    pub tax_invoice_number: Option<String>,
    pub seller_name: Option<String>,
    pub buyer_name: Option<String>,
    pub invoice_date: Option<String>,
}

pub fn or_not_found(field: &Option<String>) -> String {
    field.clone().unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Rows believed to belong to one logical line item: the row carrying the
/// item sequence number plus any continuation rows with wrapped text.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBlock {
    pub rows: Vec<RawRow>,
}

impl ItemBlock {
    pub fn concatenated_text(&self) -> String {
        let mut parts = Vec::new();
        for row in &self.rows {
            for cell in row.iter().flatten() {
                let cell = cell.replace('\n', " ");
                let cell = cell.trim();
                if !cell.is_empty() {
                    parts.push(cell.to_string());
                }
            }
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub tax_invoice_number: String,
    pub seller_name: String,
    pub buyer_name: String,
    pub invoice_date: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub tax_base: Decimal,
    pub tax_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnparsedBlock {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub items: Vec<LineItem>,
    pub unparsed: Vec<UnparsedBlock>,
    pub expected_item_count: usize,
    pub actual_item_count: usize,
    pub count_mismatch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpEntry {
    pub filename: String,
    pub sha256: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub document_count: usize,
    pub documents: Vec<DumpEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub rustc: String,
    pub cargo: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractPaths {
    pub input_root: String,
    pub out_dir: String,
    pub run_manifest_path: String,
    pub rows_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractCounts {
    pub documents_total: usize,
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub items_total: usize,
    pub unparsed_total: usize,
    pub count_mismatch_documents: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: ExtractPaths,
    pub counts: ExtractCounts,
    pub source_hashes: Vec<DumpEntry>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}
