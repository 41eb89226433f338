use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::chart::{ChartModel, format_price, format_thousands};

const ROW_HEIGHT: f32 = 18.0;

/// The aggregate behind a summary scene, one row per key.
pub fn summary_table(ui: &mut Ui, chart: &ChartModel) {
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in [chart.group_by.label(), "Avg. price", "Listings", "Country"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for mark in &chart.marks {
                body.row(ROW_HEIGHT, |mut row| {
                    row.col(|ui| {
                        ui.label(&mark.summary.key);
                    });
                    row.col(|ui| {
                        ui.label(format_price(mark.summary.avg_price));
                    });
                    row.col(|ui| {
                        ui.label(format_thousands(mark.summary.count as f64));
                    });
                    row.col(|ui| {
                        ui.label(mark.category().unwrap_or("–"));
                    });
                });
            }
        });
}
