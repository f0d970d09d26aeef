//! Invoice composition.

use super::meter::UtilityUsage;
use super::rates::RateTable;
use super::round2;
use super::water::resolve_water_charge;
use crate::models::{
    billing_period_for, BillableContract, InvoiceStatus, InvoiceType, MeterReading, NewInvoice,
};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

/// Days between bill date and due date.
const DUE_DAYS: i64 = 5;

/// Assemble the monthly invoice for one contract from its latest meter
/// reading. Pure computation: the caller persists the result, so there is
/// no partial-invoice failure mode here.
///
/// A contract whose room has no rent price bills rent at zero rather than
/// failing; the same goes for missing water configuration (metered) and
/// missing fixed prices (flat default). See the rate table for the
/// defaults.
pub fn compose_invoice(
    contract: &BillableContract,
    reading: &MeterReading,
    rates: &RateTable,
    bill_date: NaiveDate,
) -> NewInvoice {
    if reading.current_electricity < reading.prev_electricity
        || reading.current_water < reading.prev_water
    {
        tracing::warn!(
            contract_id = %contract.contract_id,
            room_number = %contract.room_number,
            prev_electricity = %reading.prev_electricity,
            current_electricity = %reading.current_electricity,
            prev_water = %reading.prev_water,
            current_water = %reading.current_water,
            "Meter moved backwards; usage clamped to zero"
        );
    }

    let rent_cost = contract.rent_price.unwrap_or(Decimal::ZERO);

    let electricity = UtilityUsage::from_pair(
        reading.prev_electricity,
        reading.current_electricity,
        rates.electricity_per_unit,
    );
    let elec_cost = round2(electricity.cost);

    let water = resolve_water_charge(contract.water(), reading, rates);
    let water_cost = round2(water.cost);

    let repair_cost = Decimal::ZERO;
    let deposit_cost = Decimal::ZERO;

    let total_cost = round2(rent_cost + elec_cost + water_cost + repair_cost + deposit_cost);

    NewInvoice {
        contract_id: contract.contract_id,
        invoice_type: InvoiceType::Monthly,
        status: InvoiceStatus::Unpaid,
        room_rent_cost: rent_cost,
        room_elec_cost: elec_cost,
        room_water_cost: water_cost,
        room_repair_cost: repair_cost,
        room_deposit_cost: deposit_cost,
        room_total_cost: total_cost,
        billing_period: billing_period_for(bill_date),
        bill_date,
        due_date: bill_date + Duration::days(DUE_DAYS),
    }
}
