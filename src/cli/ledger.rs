use super::ui;
use crate::core::config::AppConfig;
use crate::core::currency::Currency;
use crate::core::ledger::{self, LedgerEntry, LedgerReport, StatementRecord};
use crate::providers::ConversionRouter;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::path::Path;
use tracing::{debug, info};

pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<StatementRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to read transactions file: {}", path.display()))?;

    reader
        .deserialize::<StatementRecord>()
        .enumerate()
        .map(|(i, row)| {
            row.with_context(|| format!("Invalid transaction on line {} of {}", i + 2, path.display()))
        })
        .collect()
}

pub fn write_entries<P: AsRef<Path>>(path: P, entries: &[LedgerEntry]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create ledger file: {}", path.display()))?;

    if entries.is_empty() {
        writer.write_record([
            "id",
            "date",
            "description",
            "amount_eur",
            "amount_usd",
            "amount_brl",
            "original_currency",
            "source_id",
            "category",
        ])?;
    }
    for entry in entries {
        writer
            .serialize(entry)
            .with_context(|| format!("Failed to write ledger entry {}", entry.id))?;
    }
    writer.flush()?;
    Ok(())
}

impl LedgerReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        let mut header = vec![
            ui::header_cell("Date"),
            ui::header_cell("Description"),
            ui::header_cell("Source"),
        ];
        header.extend(Currency::ALL.iter().map(|c| ui::header_cell(c.code())));
        table.set_header(header);

        for entry in &self.entries {
            let mut row = vec![
                Cell::new(entry.date),
                Cell::new(&entry.description),
                Cell::new(&entry.source_id),
            ];
            row.extend(Currency::ALL.iter().map(|c| {
                let amount = entry.amount_in(*c);
                if *c == entry.original_currency {
                    ui::native_amount_cell(amount)
                } else {
                    ui::amount_cell(amount)
                }
            }));
            table.add_row(row);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Ledger", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text("Transactions", ui::StyleType::TotalLabel),
            ui::style_text(&self.entries.len().to_string(), ui::StyleType::TotalValue)
        ));

        if !self.skipped.is_empty() {
            output.push_str(&format!(
                "\n{}: {}",
                ui::style_text("Skipped", ui::StyleType::TotalLabel),
                ui::style_text(&self.skipped.len().to_string(), ui::StyleType::Error)
            ));
            for skipped in &self.skipped {
                output.push_str(&format!(
                    "\n  {} {} {}",
                    skipped.id,
                    ui::style_text(&skipped.date.to_string(), ui::StyleType::Subtle),
                    ui::style_text(&skipped.reason, ui::StyleType::Error)
                ));
            }
        }

        output
    }
}

/// Reads statement records, backfills their amounts and writes the ledger.
pub async fn build_ledger(config: &AppConfig, input: &Path, output: &Path) -> Result<LedgerReport> {
    let records = read_records(input)?;
    debug!("Read {} transactions from {}", records.len(), input.display());

    let Some(window) = ledger::ledger_window(&records, config.lookback_days) else {
        info!("No transactions in {}", input.display());
        write_entries(output, &[])?;
        return Ok(LedgerReport::default());
    };
    let router = ConversionRouter::from_config(config, window)?;

    let pb = ui::new_progress_bar(records.len() as u64);
    pb.set_message("Converting transactions...");
    let report = ledger::backfill(&records, &router, |_| pb.inc(1)).await;
    pb.finish_and_clear();
    let report = report?;

    write_entries(output, &report.entries)?;
    info!(
        written = report.entries.len(),
        skipped = report.skipped.len(),
        "Wrote ledger to {}",
        output.display()
    );
    Ok(report)
}

pub async fn run(config: &AppConfig, input: &Path, output: &Path) -> Result<()> {
    let report = build_ledger(config, input, output).await?;
    println!("{}", report.display_as_table());
    Ok(())
}
