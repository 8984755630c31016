use std::io::{self, Write};

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use twmap_core::{
    ColorKey, FilterCatalog, FilterSelection, RenderFrame, RenderSink, SourceSummary,
};

/// Prints each frame as a table followed by a legend line.
pub struct TableSink<W> {
    writer: W,
}

impl<W: Write> TableSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for TableSink<W> {
    type Error = io::Error;

    fn render(&mut self, frame: &RenderFrame<'_>) -> io::Result<()> {
        writeln!(self.writer, "Selection: {}", frame.selection)?;
        writeln!(self.writer, "{}", frame_table(frame))?;
        writeln!(
            self.writer,
            "Domain: {} - {}   Regions: {}/{}   Mean: {}   Total: {}",
            format_value(frame.domain.min),
            format_value(frame.domain.max),
            frame.with_data(),
            frame.features.len(),
            frame.summary.mean.map_or_else(|| "--".to_string(), format_value),
            format_value(frame.summary.total),
        )?;
        self.writer.flush()
    }
}

fn frame_table(frame: &RenderFrame<'_>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Region"),
        header_cell("Canonical id"),
        header_cell("Value"),
        header_cell("Color"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for feature in &frame.features {
        table.add_row(vec![
            dim_cell(feature.index),
            Cell::new(&feature.name),
            Cell::new(feature.region.as_str()),
            value_cell(feature.value),
            color_cell(feature.color),
        ]);
    }
    table
}

pub fn print_catalog(catalog: &FilterCatalog, default: Option<&FilterSelection>) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Dimension"), header_cell("Values")]);
    apply_table_style(&mut table);
    for dimension in catalog.dimensions() {
        table.add_row(vec![
            Cell::new(dimension)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(catalog.values(dimension).join(", ")),
        ]);
    }
    println!("{table}");
    match default {
        Some(selection) => println!("Default selection: {selection}"),
        None => println!("No data loaded."),
    }
}

pub fn print_sources(sources: &[SourceSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Rows"),
        header_cell("Skipped"),
        header_cell("Observations"),
        header_cell("Status"),
    ]);
    apply_table_style(&mut table);
    for column in 1..=3 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for source in sources {
        let status = match &source.error {
            None => Cell::new("loaded").fg(Color::Green),
            Some(error) => Cell::new(error).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&source.name),
            Cell::new(source.rows),
            dim_cell(source.skipped),
            Cell::new(source.observations),
            status,
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn value_cell(value: Option<f64>) -> Cell {
    match value {
        Some(value) => Cell::new(format_value(value)),
        None => dim_cell("--"),
    }
}

fn color_cell(color: ColorKey) -> Cell {
    match color {
        ColorKey::NoData => dim_cell("no data"),
        ColorKey::Ramp(position) => Cell::new(format!("{position:.2}")),
        ColorKey::Class(class) => Cell::new(format!("class {class}")),
    }
}

/// Integers without a fraction, everything else to two places.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
