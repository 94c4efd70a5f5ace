use crate::header::{extract_header, resolve_invoice_date};
use crate::item::{ParsedBlock, parse_block};
use crate::model::{DocumentDump, DocumentResult, LineItem, or_not_found};
use crate::patterns::InvoicePatterns;
use crate::rows::group_rows;

/// Runs the full extraction pipeline over one document: date resolution,
/// header recovery, the structural expected-count scan, then row grouping
/// and item parsing over all tables in page order. Every grouped block ends
/// up as exactly one line item or exactly one unparsed entry.
pub fn process_document(patterns: &InvoicePatterns, dump: &DocumentDump) -> DocumentResult {
    let mut header = extract_header(patterns, &dump.pages);
    header.invoice_date = resolve_invoice_date(patterns, &dump.pages);

    let expected_item_count = count_expected_items(patterns, dump);

    let mut all_rows = Vec::new();
    for page in &dump.pages {
        for table in &page.tables {
            all_rows.extend(table.iter().cloned());
        }
    }

    let blocks = group_rows(patterns, all_rows);

    let mut items = Vec::new();
    let mut unparsed = Vec::new();
    let mut last_description = String::new();

    for block in &blocks {
        match parse_block(patterns, block) {
            ParsedBlock::Item(mut draft) => {
                // A continuation-only block can lose its whole description to
                // the annotation scrub; it inherits the previous item's.
                if draft.description.is_empty() {
                    draft.description = last_description.clone();
                } else {
                    last_description = draft.description.clone();
                }

                items.push(LineItem {
                    tax_invoice_number: or_not_found(&header.tax_invoice_number),
                    seller_name: or_not_found(&header.seller_name),
                    buyer_name: or_not_found(&header.buyer_name),
                    invoice_date: or_not_found(&header.invoice_date),
                    description: draft.description,
                    quantity: draft.quantity,
                    unit: draft.unit,
                    unit_price: draft.unit_price,
                    discount: draft.discount,
                    total: draft.total,
                    tax_base: draft.tax_base,
                    tax_amount: draft.tax_amount,
                });
            }
            ParsedBlock::Unparsed(block) => unparsed.push(block),
        }
    }

    let actual_item_count = items.len();
    // Zero expected means the structural scan found nothing, which is not an
    // error signal.
    let count_mismatch = expected_item_count != 0 && expected_item_count != actual_item_count;

    DocumentResult {
        items,
        unparsed,
        expected_item_count,
        actual_item_count,
        count_mismatch,
    }
}

/// Independent cross-check: count item-shaped lines in the page text. This
/// never gates extraction; it only feeds the post-hoc consistency check.
fn count_expected_items(patterns: &InvoicePatterns, dump: &DocumentDump) -> usize {
    dump.pages
        .iter()
        .map(|page| patterns.expected_item_line.find_iter(&page.text).count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NOT_FOUND, PageDump, RawRow};
    use rust_decimal_macros::dec;

    fn patterns() -> InvoicePatterns {
        InvoicePatterns::new().unwrap()
    }

    fn row(cells: &[Option<&str>]) -> RawRow {
        cells
            .iter()
            .map(|cell| cell.map(ToOwned::to_owned))
            .collect()
    }

    fn sample_dump() -> DocumentDump {
        DocumentDump {
            pages: vec![PageDump {
                text: "Kode dan Nomor Seri Faktur Pajak : 010.000-20.12345678\n\
                       Nama : SOFIE FASHION INDONESIA\n\
                       Alamat : Jl. Industri No. 1\n\
                       Pembeli Barang Kena Pajak\n\
                       Nama : PT MAJU JAYA\n\
                       Alamat : Jl. Sudirman No. 2\n\
                       1 000000123456 Kain Katun\n\
                       2 000000123457 Benang Jahit\n\
                       Jakarta, 2 Agustus 2025"
                    .to_string(),
                tables: vec![vec![
                    row(&[
                        Some("1"),
                        Some("000001"),
                        Some("Kain Katun\nRp 100.000,00 x 5,00 Meter\nPotongan Harga = Rp 10.000,00"),
                    ]),
                    row(&[Some("2"), Some("000002"), Some("Benang Jahit")]),
                    row(&[None, None, Some("Rp 2.500,00 x 10,00 Roll")]),
                ]],
            }],
        }
    }

    #[test]
    fn end_to_end_single_document() {
        let result = process_document(&patterns(), &sample_dump());

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.unparsed.len(), 0);
        assert_eq!(result.expected_item_count, 2);
        assert_eq!(result.actual_item_count, 2);
        assert!(!result.count_mismatch);

        let first = &result.items[0];
        assert_eq!(first.tax_invoice_number, "010.000-20.12345678");
        assert_eq!(first.seller_name, "SOFIE FASHION INDONESIA");
        assert_eq!(first.buyer_name, "PT MAJU JAYA");
        assert_eq!(first.invoice_date, "02/08/2025");
        assert_eq!(first.description, "Kain Katun");
        assert_eq!(first.quantity, dec!(5.00));
        assert_eq!(first.unit, "Meter");
        assert_eq!(first.unit_price, dec!(100000.00));
        assert_eq!(first.discount, dec!(10000.00));
        assert_eq!(first.total, dec!(490000));
        assert_eq!(first.tax_base, dec!(441441.44));
        assert_eq!(first.tax_amount, dec!(48558.56));

        let second = &result.items[1];
        assert_eq!(second.description, "Benang Jahit");
        assert_eq!(second.total, dec!(25000.00));
    }

    #[test]
    fn reprocessing_is_byte_identical() {
        let patterns = patterns();
        let dump = sample_dump();

        let first = process_document(&patterns, &dump);
        let second = process_document(&patterns, &dump);
        assert_eq!(first, second);

        let first_json = serde_json::to_vec(&first).unwrap();
        let second_json = serde_json::to_vec(&second).unwrap();
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn block_without_price_pattern_lands_in_unparsed() {
        let dump = DocumentDump {
            pages: vec![PageDump {
                text: String::new(),
                tables: vec![vec![
                    row(&[Some("1"), Some("000001"), Some("Biaya administrasi")]),
                    row(&[Some("2"), Some("000002"), Some("Kain Rp 1.000,00 x 2,00 Meter")]),
                ]],
            }],
        };

        let result = process_document(&patterns(), &dump);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.unparsed.len(), 1);
        assert_eq!(result.unparsed[0].text, "1 000001 Biaya administrasi");
    }

    #[test]
    fn count_mismatch_is_advisory_and_items_survive() {
        let dump = DocumentDump {
            pages: vec![PageDump {
                text: "1 000000111 Kain\n2 000000222 Benang\n3 000000333 Kancing".to_string(),
                tables: vec![vec![
                    row(&[Some("1"), Some("000001"), Some("Kain Rp 1.000,00 x 1,00 Meter")]),
                    row(&[Some("2"), Some("000002"), Some("Benang Rp 500,00 x 2,00 Roll")]),
                ]],
            }],
        };

        let result = process_document(&patterns(), &dump);
        assert_eq!(result.expected_item_count, 3);
        assert_eq!(result.actual_item_count, 2);
        assert!(result.count_mismatch);
        assert_eq!(result.items[0].description, "Kain");
        assert_eq!(result.items[1].description, "Benang");
    }

    #[test]
    fn zero_expected_count_never_flags_a_mismatch() {
        let dump = DocumentDump {
            pages: vec![PageDump {
                text: "tanpa baris struktural".to_string(),
                tables: vec![vec![row(&[
                    Some("1"),
                    None,
                    Some("Kain Rp 1.000,00 x 1,00 Meter"),
                ])]],
            }],
        };

        let result = process_document(&patterns(), &dump);
        assert_eq!(result.expected_item_count, 0);
        assert_eq!(result.actual_item_count, 1);
        assert!(!result.count_mismatch);
    }

    #[test]
    fn missing_header_fields_surface_the_sentinel() {
        let dump = DocumentDump {
            pages: vec![PageDump {
                text: String::new(),
                tables: vec![vec![row(&[
                    Some("1"),
                    None,
                    Some("Kain Rp 1.000,00 x 1,00 Meter"),
                ])]],
            }],
        };

        let result = process_document(&patterns(), &dump);
        let item = &result.items[0];
        assert_eq!(item.tax_invoice_number, NOT_FOUND);
        assert_eq!(item.seller_name, NOT_FOUND);
        assert_eq!(item.buyer_name, NOT_FOUND);
        assert_eq!(item.invoice_date, NOT_FOUND);
    }

    #[test]
    fn empty_description_inherits_previous_item() {
        let dump = DocumentDump {
            pages: vec![PageDump {
                text: String::new(),
                tables: vec![vec![
                    row(&[Some("1"), Some("000001"), Some("Kain Katun Rp 1.000,00 x 1,00 Meter")]),
                    row(&[Some("2"), Some("000002"), Some("Rp 2.000,00 x 3,00 Meter")]),
                ]],
            }],
        };

        let result = process_document(&patterns(), &dump);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[1].description, "Kain Katun");
    }

    #[test]
    fn rows_flow_across_pages_in_page_order() {
        let dump = DocumentDump {
            pages: vec![
                PageDump {
                    text: String::new(),
                    tables: vec![vec![
                        row(&[Some("1"), Some("000001"), Some("Kain")]),
                        row(&[None, None, Some("Rp 1.000,00 x 1,00 Meter")]),
                    ]],
                },
                PageDump {
                    text: String::new(),
                    tables: vec![vec![row(&[
                        Some("2"),
                        Some("000002"),
                        Some("Benang Rp 500,00 x 4,00 Roll"),
                    ])]],
                },
            ],
        };

        let result = process_document(&patterns(), &dump);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].description, "Kain");
        assert_eq!(result.items[1].description, "Benang");
    }
}
