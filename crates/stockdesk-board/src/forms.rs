use anyhow::Result as AnyResult;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use stockdesk_core::Direction;
use stockdesk_platform::{StockInForm, StockOutForm};
use stockdesk_sheets::NewMovement;

pub fn validate_stock_in(form: &StockInForm, today: NaiveDate) -> AnyResult<NewMovement> {
    let (item_id, product_name) = validate_identity(&form.rm_id, &form.product_name)?;
    let quantity = validate_quantity(form.quantity)?;

    Ok(NewMovement {
        direction: Direction::In,
        item_id,
        product_name,
        quantity,
        date: form.date.unwrap_or(today),
        unit: form.unit.trim().to_string(),
        unit_cost: form.cost_per_unit.trim().to_string(),
        remarks: String::new(),
        distributed_to: String::new(),
    })
}

pub fn validate_stock_out(form: &StockOutForm, today: NaiveDate) -> AnyResult<NewMovement> {
    let (item_id, product_name) = validate_identity(&form.product_id, &form.product_name)?;
    let quantity = validate_quantity(form.quantity_out)?;

    Ok(NewMovement {
        direction: Direction::Out,
        item_id,
        product_name,
        quantity,
        date: form.date.unwrap_or(today),
        unit: String::new(),
        unit_cost: String::new(),
        remarks: form.remarks.trim().to_string(),
        distributed_to: form.distributed_to.trim().to_string(),
    })
}

fn validate_identity(item_id: &str, product_name: &str) -> AnyResult<(String, String)> {
    let item_id = item_id.trim().to_string();
    let product_name = product_name.trim().to_string();
    if item_id.is_empty() && product_name.is_empty() {
        anyhow::bail!("an item id or product name is required");
    }
    Ok((item_id, product_name))
}

fn validate_quantity(quantity: Decimal) -> AnyResult<Decimal> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        anyhow::bail!("quantity must not be negative");
    }
    Ok(quantity)
}
