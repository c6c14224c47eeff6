//! Fixed column sets for the three account reports

use crate::table::Table;
use crate::types::{Charge, ChargeType, ReportKind, Transaction, Transponder, Vehicle};
use chrono::NaiveDateTime;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Transponders: Tag, Style, Color, Status
pub fn transponder_table() -> Table<Transponder> {
    Table::new(ReportKind::Transponders.title())
        .column("Tag", |t: &Transponder| Some(t.tag_number.clone()))
        .column("Style", |t: &Transponder| Some(t.style.clone()))
        .column("Color", |t: &Transponder| Some(t.color.clone()))
        .column("Status", |t: &Transponder| Some(t.status.clone()))
}

/// Vehicles: Plate, State, Make, Model, Year, Color, Temporary, Start, End
pub fn vehicle_table() -> Table<Vehicle> {
    Table::new(ReportKind::Vehicles.title())
        .column("Plate", |v: &Vehicle| Some(v.plate_number.clone()))
        .column("State", |v: &Vehicle| Some(v.state.clone()))
        .column("Make", |v: &Vehicle| Some(v.make.clone()))
        .column("Model", |v: &Vehicle| Some(v.model.clone()))
        .column("Year", |v: &Vehicle| Some(v.year.clone()))
        .column("Color", |v: &Vehicle| Some(v.color.clone()))
        .column("Temporary", |v: &Vehicle| Some(v.temporary.to_string()))
        .column("Start", |v: &Vehicle| v.start_date.map(|d| d.to_string()))
        .column("End", |v: &Vehicle| v.end_date.map(|d| d.to_string()))
}

/// Transactions: Id, Date, Type, Transponder, Plate, Entry Plaza, Exit Plaza,
/// Entry Time, Exit Time, Charge
pub fn transaction_table() -> Table<Transaction> {
    Table::new(ReportKind::Transactions.title())
        .column("Id", |t: &Transaction| Some(t.transaction_id.clone()))
        .column("Date", |t: &Transaction| Some(t.post_date.to_string()))
        .column("Type", |t: &Transaction| Some(t.transaction_type.clone()))
        .column("Transponder", |t: &Transaction| t.transponder_number.clone())
        .column("Plate", |t: &Transaction| t.plate_number.clone())
        .column("Entry Plaza", |t: &Transaction| t.entry_plaza.clone())
        .column("Exit Plaza", |t: &Transaction| t.exit_plaza.clone())
        .column("Entry Time", |t: &Transaction| t.entry_date_time.map(format_date_time))
        .column("Exit Time", |t: &Transaction| t.exit_date_time.map(format_date_time))
        .column("Charge", |t: &Transaction| Some(format_charge(&t.charge)))
}

/// Debits carry a leading minus sign, credits are shown unsigned
pub fn format_charge(charge: &Charge) -> String {
    match charge.charge_type {
        ChargeType::Debit => format!("-{}", charge.amount),
        ChargeType::Credit => charge.amount.to_string(),
    }
}

fn format_date_time(value: NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}
