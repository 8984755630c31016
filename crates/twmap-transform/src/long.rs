//! Row-per-observation sources.

use twmap_ingest::SourceTable;
use twmap_model::{Dimension, Observation};

use crate::context::{ObservationContext, first_filled, parse_value, resolve_columns};
use crate::error::Result;
use crate::shape::LongShape;

/// Map each record of a long-format table to its observations.
///
/// Records whose region cell is empty, or whose value cell does not parse,
/// are skipped. A configured roll-up adds one more observation per record.
pub fn observe_long(
    table: &SourceTable,
    shape: &LongShape,
    ctx: &ObservationContext<'_>,
) -> Result<Vec<Observation>> {
    let region_columns = resolve_columns(table, &shape.region)?;
    let dimension_columns: Vec<(Dimension, Vec<usize>)> = shape
        .dimensions
        .iter()
        .map(|(dimension, candidates)| Ok((*dimension, resolve_columns(table, candidates)?)))
        .collect::<Result<_>>()?;
    let value_column = match &shape.value {
        Some(column) => Some(resolve_columns(table, std::slice::from_ref(column))?),
        None => None,
    };

    let mut observations = Vec::with_capacity(table.len());
    let mut unresolved = 0usize;
    for record in &table.records {
        let Some(region) = first_filled(table, record, &region_columns)
            .and_then(|raw| ctx.region(raw))
        else {
            unresolved += 1;
            continue;
        };
        let value = match &value_column {
            Some(columns) => match first_filled(table, record, columns).and_then(parse_value) {
                Some(value) => value,
                None => continue,
            },
            None => 1.0,
        };

        let mut key = ctx.base_key(record);
        for (dimension, columns) in &dimension_columns {
            let cell = first_filled(table, record, columns).unwrap_or(shape.missing.as_str());
            key.set(*dimension, Some(cell.to_string()));
        }

        if let Some(rollup) = &shape.rollup {
            let rolled = key.clone().with(rollup.dimension, rollup.label.clone());
            observations.push(Observation::new(region.clone(), rolled, value));
        }
        observations.push(Observation::new(region, key, value));
    }

    if unresolved > 0 {
        tracing::debug!(source = %table.name, unresolved, "records without a usable region");
    }
    Ok(observations)
}
