use crate::model::{InvoiceHeader, PageDump};
use crate::patterns::{InvoicePatterns, month_number};

/// Recovers invoice number, seller name, and buyer name from page text.
/// Each field takes its first match across pages and is frozen afterwards;
/// later pages never overwrite it. The invoice date is resolved separately
/// by [`resolve_invoice_date`].
pub fn extract_header(patterns: &InvoicePatterns, pages: &[PageDump]) -> InvoiceHeader {
    let mut header = InvoiceHeader::default();

    for page in pages {
        let text = page.text.as_str();

        if header.tax_invoice_number.is_none() {
            if let Some(captures) = patterns.invoice_number.captures(text) {
                set_if_non_empty(&mut header.tax_invoice_number, &captures[1]);
            }
        }

        if header.seller_name.is_none() {
            // The seller section is everything before the buyer section.
            let seller_section = match patterns.buyer_section.find(text) {
                Some(found) => &text[..found.start()],
                None => text,
            };
            if let Some(captures) = patterns.name_before_alamat.captures(seller_section) {
                set_if_non_empty(&mut header.seller_name, captures[1].trim());
            }
        }

        if header.buyer_name.is_none() {
            if let Some(captures) = patterns.buyer_name.captures(text) {
                // A literal "Alamat" inside the capture means the boundary
                // was imprecise; strip it.
                let scrubbed = patterns.alamat_scrub.replace_all(captures[1].trim(), "");
                set_if_non_empty(&mut header.buyer_name, scrubbed.trim());
            }
        }
    }

    header
}

/// Single pass over all pages for a "<day> <month name> <year>" date,
/// normalized to dd/mm/yyyy. First match across the document wins.
pub fn resolve_invoice_date(patterns: &InvoicePatterns, pages: &[PageDump]) -> Option<String> {
    for page in pages {
        for captures in patterns.invoice_date.captures_iter(&page.text) {
            let day = captures[1].parse::<u32>().ok();
            let month = month_number(&captures[2]);
            let year = &captures[3];

            if let (Some(day), Some(month)) = (day, month) {
                return Some(format!("{day:02}/{month:02}/{year}"));
            }
        }
    }
    None
}

fn set_if_non_empty(field: &mut Option<String>, value: &str) {
    if !value.is_empty() {
        *field = Some(value.to_string());
    }
}
