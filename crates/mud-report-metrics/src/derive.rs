use std::collections::BTreeMap;

use crate::coerce::{parse_number, parse_report_date, to_float};
use crate::model::{Cell, DerivedRow, DerivedTable, ExtractedDocument};
use crate::options::DeriveOptions;
use crate::template::{FieldKind, Family, Template, fields};

/// Names of computed columns.
pub mod columns {
    pub const GPM_TOTAL: &str = "GPM Total";
    pub const GPM_PER_SCREEN: &str = "GPM/Screen";
    pub const TOP_DECK_WEAR: &str = "Top Deck Wear";
    pub const BOTTOM_DECK_WEAR: &str = "Bottom Deck Wear";
    pub const TOP_DECK_STATUS: &str = "Top Deck Status";
    pub const BOTTOM_DECK_STATUS: &str = "Bottom Deck Status";
    pub const TOTAL_DILUTION: &str = "Total Dilution";
    pub const DISCARD_RATIO: &str = "Discard Ratio";
    pub const DSRE_PERCENT: &str = "DSRE%";
    pub const ROP: &str = "ROP";
    pub const CUTTING_RATIO: &str = "Cutting Ratio";
    pub const TOP_DECK_LOSS: &str = "Top Deck Loss";
    pub const BOTTOM_DECK_LOSS: &str = "Bottom Deck Loss";
    pub const STATUS: &str = "Status";
}

fn number(cells: &BTreeMap<String, Cell>, column: &str) -> f64 {
    cells
        .get(column)
        .and_then(Cell::as_number)
        .unwrap_or(0.0)
}

fn set_number(cells: &mut BTreeMap<String, Cell>, column: &str, value: f64) {
    cells.insert(column.to_string(), Cell::Number(value));
}

fn set_text(cells: &mut BTreeMap<String, Cell>, column: &str, value: &str) {
    cells.insert(column.to_string(), Cell::Text(value.to_string()));
}

fn derive_shaker(cells: &mut BTreeMap<String, Cell>, options: &DeriveOptions) {
    let guards = &options.guards;
    let gpm_total = fields::PUMP_GPM
        .iter()
        .map(|pump| number(cells, pump))
        .sum::<f64>();
    let per_screen = guards
        .screen_count
        .divide(gpm_total, number(cells, fields::SCREEN_COUNT));
    let top_deck = guards.api_screen.divide(
        gpm_total * number(cells, fields::YP),
        number(cells, fields::API_SCREEN),
    );
    let bottom_deck = (per_screen * options.bottom_deck_factor).min(options.wear_clip);

    set_number(cells, columns::GPM_TOTAL, gpm_total);
    set_number(cells, columns::GPM_PER_SCREEN, per_screen);
    set_number(cells, columns::TOP_DECK_WEAR, top_deck);
    set_number(cells, columns::BOTTOM_DECK_WEAR, bottom_deck);
    set_text(
        cells,
        columns::TOP_DECK_STATUS,
        options.top_deck_bands.classify(top_deck).label(),
    );
    set_text(
        cells,
        columns::BOTTOM_DECK_STATUS,
        options.bottom_deck_bands.classify(bottom_deck).label(),
    );
}

fn derive_dilution(
    cells: &mut BTreeMap<String, Cell>,
    additions: [&str; 3],
    options: &DeriveOptions,
) {
    let guards = &options.guards;
    let total_dilution = additions
        .iter()
        .map(|field| number(cells, field))
        .sum::<f64>();
    let loss = number(cells, fields::SCE_LOSS);
    let discard_ratio = guards
        .total_circulation
        .divide(loss, number(cells, fields::TOTAL_CIRCULATION));
    let guarded_loss = guards.sce_loss.guarded(loss);
    let dsre = ratio(total_dilution, total_dilution + guarded_loss) * 100.0;
    let rop = guards.drilling_hours.divide(
        number(cells, fields::DEPTH_DRILLED),
        number(cells, fields::DRILLING_HOURS),
    );
    let cutting_ratio = discard_ratio * 100.0;
    let top_deck_loss = loss * options.top_deck_loss_share;
    let bottom_deck_loss = loss * (1.0 - options.top_deck_loss_share);

    set_number(cells, columns::TOTAL_DILUTION, total_dilution);
    set_number(cells, columns::DISCARD_RATIO, discard_ratio);
    set_number(cells, columns::DSRE_PERCENT, dsre);
    set_number(cells, columns::ROP, rop);
    set_number(cells, columns::CUTTING_RATIO, cutting_ratio);
    set_number(cells, columns::TOP_DECK_LOSS, top_deck_loss);
    set_number(cells, columns::BOTTOM_DECK_LOSS, bottom_deck_loss);
    set_text(
        cells,
        columns::STATUS,
        options.cuttings_bands.classify(cutting_ratio).label(),
    );
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn derive_row(
    template: Template,
    document: &ExtractedDocument,
    options: &DeriveOptions,
) -> DerivedRow {
    let mut cells = BTreeMap::new();
    let mut defaulted = Vec::new();
    let mut unparsed = Vec::new();

    for (name, field) in document.record.iter() {
        if field.is_defaulted() {
            defaulted.push(name.to_string());
        }
        let cell = match template.field_kind(name) {
            Some(FieldKind::Numeric) => {
                if parse_number(&field.value).is_none() {
                    unparsed.push(name.to_string());
                }
                Cell::Number(to_float(&field.value))
            }
            Some(FieldKind::Text) | None => Cell::Text(field.value.clone()),
        };
        cells.insert(name.to_string(), cell);
    }

    match template.family() {
        Family::Shaker => derive_shaker(&mut cells, options),
        Family::Dilution { additions } => derive_dilution(&mut cells, additions, options),
    }

    let date = document
        .record
        .value(fields::DATE)
        .and_then(parse_report_date);

    DerivedRow {
        document: document.name.clone(),
        date,
        cells,
        defaulted,
        unparsed,
    }
}

/// Coerces each record and appends the template's computed columns.
///
/// Rows are ordered by report date; undated rows keep upload order after the
/// dated ones.
#[must_use]
pub fn derive(
    template: Template,
    documents: &[ExtractedDocument],
    options: &DeriveOptions,
) -> DerivedTable {
    let mut rows = documents
        .iter()
        .map(|document| derive_row(template, document, options))
        .collect::<Vec<_>>();
    rows.sort_by_key(|row| (row.date.is_none(), row.date));

    let columns = template
        .field_names()
        .into_iter()
        .chain(template.derived_columns().iter().copied())
        .map(str::to_string)
        .collect();

    DerivedTable {
        template,
        columns,
        rows,
    }
}
