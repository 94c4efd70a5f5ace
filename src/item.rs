use rust_decimal::Decimal;

use crate::model::{ItemBlock, UnparsedBlock};
use crate::numeric::parse_number;
use crate::patterns::InvoicePatterns;

/// Gross-divisor for the 11% VAT rate: tax base = total / 1.11.
fn tax_divisor() -> Decimal {
    Decimal::new(111, 2)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub tax_base: Decimal,
    pub tax_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBlock {
    Item(ItemDraft),
    Unparsed(UnparsedBlock),
}

/// Parses one item block. A block without the "Rp <price> x <qty> <unit>"
/// pattern is demoted to an unparsed entry carrying its concatenated text
/// verbatim; that is a local condition, never fatal for the document.
pub fn parse_block(patterns: &InvoicePatterns, block: &ItemBlock) -> ParsedBlock {
    let text = block.concatenated_text();

    let Some(captures) = patterns.price_qty.captures(&text) else {
        return ParsedBlock::Unparsed(UnparsedBlock { text });
    };

    let match_start = captures.get(0).map_or(0, |m| m.start());
    let unit_price = captures
        .get(1)
        .and_then(|m| parse_number(m.as_str()).ok())
        .unwrap_or(Decimal::ZERO);
    let quantity = captures
        .get(2)
        .and_then(|m| parse_number(m.as_str()).ok())
        .unwrap_or(Decimal::ZERO);
    let unit = captures
        .get(3)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let discount = patterns
        .discount
        .captures(&text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_number(m.as_str()).ok())
        .unwrap_or(Decimal::ZERO);

    let description = clean_description(patterns, &text[..match_start]);

    let total = unit_price * quantity - discount;
    let tax_base_raw = total / tax_divisor();
    let tax_amount = (total - tax_base_raw).round_dp(2);
    let tax_base = tax_base_raw.round_dp(2);

    ParsedBlock::Item(ItemDraft {
        description,
        quantity,
        unit,
        unit_price,
        discount,
        total,
        tax_base,
        tax_amount,
    })
}

/// Everything before the price match, minus the leading sequence-number/code
/// tokens and any trailing discount/PPnBM annotation, whitespace-normalized.
fn clean_description(patterns: &InvoicePatterns, prefix: &str) -> String {
    let stripped = patterns.item_prefix.replace(prefix.trim_start(), "");
    let scrubbed = patterns.annotation.replace_all(&stripped, "");
    scrubbed.split_whitespace().collect::<Vec<_>>().join(" ")
}
