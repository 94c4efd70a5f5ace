use crate::model::{ItemBlock, RawRow};
use crate::patterns::InvoicePatterns;

/// Groups raw table rows into per-item blocks. A block starts on a row whose
/// first cell begins with the item sequence number; continuation rows (wrapped
/// description text, trailing charge annotations) attach to the open block.
/// Rows arriving before any block has started have no context and are dropped.
pub fn group_rows(patterns: &InvoicePatterns, rows: Vec<RawRow>) -> Vec<ItemBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<ItemBlock> = None;

    for row in rows {
        if is_blank_row(&row) {
            continue;
        }

        if is_block_start(patterns, &row) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            current = Some(ItemBlock { rows: vec![row] });
        } else if let Some(block) = current.as_mut() {
            block.rows.push(row);
        }
    }

    if let Some(block) = current.take() {
        blocks.push(block);
    }

    blocks
}

fn is_blank_row(row: &RawRow) -> bool {
    row.iter()
        .all(|cell| cell.as_deref().is_none_or(|text| text.trim().is_empty()))
}

/// A new item begins when the first cell starts with digits and the second
/// cell is blank or digits-only (the item-code column). The second condition
/// keeps wrapped continuation text that happens to start with a number from
/// opening a spurious block.
fn is_block_start(patterns: &InvoicePatterns, row: &RawRow) -> bool {
    let Some(first) = row.first().and_then(|cell| cell.as_deref()) else {
        return false;
    };
    if !patterns.block_start_cell.is_match(first.trim()) {
        return false;
    }

    match row.get(1).and_then(|cell| cell.as_deref()).map(str::trim) {
        None | Some("") => true,
        Some(code) => patterns.digits_only.is_match(code),
    }
}
