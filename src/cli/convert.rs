use super::ui;
use crate::core::config::AppConfig;
use crate::core::rate_table::FetchWindow;
use crate::providers::ConversionRouter;
use anyhow::Result;
use chrono::NaiveDate;

/// Converts a single amount with rates fetched just for `date`.
pub async fn convert(
    config: &AppConfig,
    date: NaiveDate,
    amount: f64,
    from: &str,
    to: &str,
) -> Result<f64> {
    let window = FetchWindow::padded(date, date, config.lookback_days);
    let router = ConversionRouter::from_config(config, window)?;
    Ok(router.convert_codes(date, amount, from, to).await?)
}

pub async fn run(config: &AppConfig, date: NaiveDate, amount: f64, from: &str, to: &str) -> Result<()> {
    let converted = convert(config, date, amount, from, to).await?;
    println!(
        "{} {} = {} {} {}",
        amount,
        from.trim().to_uppercase(),
        ui::style_text(&format!("{converted:.2}"), ui::StyleType::TotalValue),
        to.trim().to_uppercase(),
        ui::style_text(&format!("({date})"), ui::StyleType::Subtle),
    );
    Ok(())
}
