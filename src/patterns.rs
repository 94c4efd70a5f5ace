use anyhow::{Context, Result};
use regex::Regex;

/// Indonesian month names, in calendar order, for invoice-date resolution.
pub const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

pub fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|month| month.eq_ignore_ascii_case(name))
        .map(|index| (index + 1) as u32)
}

/// The canonical pattern set for Faktur Pajak text. Historical variants of
/// this pipeline drifted apart pattern by pattern; every semantic field gets
/// exactly one named, tested regex here.
#[derive(Debug)]
pub struct InvoicePatterns {
    /// "Kode dan Nomor Seri Faktur Pajak : 010.000-20.12345678"
    pub invoice_number: Regex,
    /// Start of the buyer section; text before it is the seller section.
    pub buyer_section: Regex,
    /// "Nama : <value> Alamat", applied to the seller section only.
    pub name_before_alamat: Regex,
    /// "Pembeli ... Nama : <value> Alamat" anywhere in the page text.
    pub buyer_name: Regex,
    /// Literal "Alamat" leaking into a buyer-name capture.
    pub alamat_scrub: Regex,
    /// "Rp <price> x <qty> <unit>", tolerant of stray currency noise.
    pub price_qty: Regex,
    /// "Potongan Harga = Rp <number>"
    pub discount: Regex,
    /// Leading item sequence number plus optional code token.
    pub item_prefix: Regex,
    /// Trailing discount/luxury-tax annotations inside a description.
    pub annotation: Regex,
    /// Item sequence number at the start of a block-start cell.
    pub block_start_cell: Regex,
    /// Item-code column: digits only.
    pub digits_only: Regex,
    /// Structural item line used for the expected-count cross-check.
    pub expected_item_line: Regex,
    /// "<day> <month name> <year>" with Indonesian month names.
    pub invoice_date: Regex,
}

impl InvoicePatterns {
    pub fn new() -> Result<Self> {
        let months = MONTHS.join("|");

        Ok(Self {
            invoice_number: Regex::new(r"Kode dan Nomor Seri Faktur Pajak\s*:\s*([\d.\-]+)")
                .context("failed to compile invoice number regex")?,
            buyer_section: Regex::new(r"Pembeli")
                .context("failed to compile buyer section regex")?,
            name_before_alamat: Regex::new(r"(?s)Nama\s*:\s*(.+?)\s*Alamat")
                .context("failed to compile seller name regex")?,
            buyer_name: Regex::new(r"(?s)Pembeli.*?Nama\s*:\s*(.+?)\s*Alamat")
                .context("failed to compile buyer name regex")?,
            alamat_scrub: Regex::new(r"(?i)\bAlamat\b")
                .context("failed to compile alamat scrub regex")?,
            price_qty: Regex::new(r"(?i)Rp\s*~?\$?p?\s*([\d.,]+)\s*x\s*([\d.,]+)\s*(\w+)")
                .context("failed to compile price/quantity regex")?,
            discount: Regex::new(r"Potongan Harga\s*=\s*Rp\s*([\d.,]+)")
                .context("failed to compile discount regex")?,
            item_prefix: Regex::new(r"^\d+\s*[\w-]*\s*")
                .context("failed to compile item prefix regex")?,
            annotation: Regex::new(r"(?s)Potongan Harga.*|PPnBM.*")
                .context("failed to compile annotation regex")?,
            block_start_cell: Regex::new(r"^\d+")
                .context("failed to compile block start regex")?,
            digits_only: Regex::new(r"^\d+$")
                .context("failed to compile item code regex")?,
            expected_item_line: Regex::new(r"(?m)^\d{1,3}[ \t]+000000")
                .context("failed to compile expected item line regex")?,
            invoice_date: Regex::new(&format!(
                r"(?i)\b(\d{{1,2}})\s+({months})\s+(\d{{4}})\b"
            ))
            .context("failed to compile invoice date regex")?,
        })
    }
}
