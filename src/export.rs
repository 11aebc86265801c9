// 📤 CSV export of a grocery list

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::models::grocery::format_quantity;
use crate::models::GroceryItem;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Item")]
    item: &'a str,
    #[serde(rename = "Quantity")]
    quantity: String,
    #[serde(rename = "Unit")]
    unit: &'a str,
    #[serde(rename = "Checked")]
    checked: bool,
    #[serde(rename = "Source")]
    source: &'a str,
}

/// Write items, in the order given, as CSV with a header row
pub fn write_items_csv<W: Write>(writer: W, items: &[GroceryItem]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for item in items {
        wtr.serialize(ExportRow {
            category: item.category.display_name(),
            item: &item.name,
            quantity: item.quantity.map(format_quantity).unwrap_or_default(),
            unit: item.unit.as_deref().unwrap_or(""),
            checked: item.checked,
            source: item.source.as_str(),
        })
        .context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV")?;
    Ok(())
}

pub fn export_items_csv(path: &Path, items: &[GroceryItem]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {:?}", path))?;
    write_items_csv(file, items)
}
