use eframe::egui::{Align2, Color32, RichText, Ui};
use egui_plot::{
    Bar, BarChart, Line, MarkerShape, Plot, PlotPoint, PlotPoints, PlotUi, Points, Text,
    uniform_grid_spacer,
};

use crate::chart::{ChartModel, format_thousands};
use crate::color::ColorMap;
use crate::data::filter::CategoryFilter;
use crate::story::scene::MarkKind;
use crate::ui::NEUTRAL_FALLBACK;

const PLOT_HEIGHT: f32 = 520.0;
/// Extra pointer slack around point marks, in screen points.
const HOVER_SLACK: f32 = 2.0;

// ---------------------------------------------------------------------------
// Scene plot (central panel)
// ---------------------------------------------------------------------------

/// Draw one rendered scene with a tooltip for the mark under the pointer.
pub fn scene_plot(
    ui: &mut Ui,
    plot_id: usize,
    chart: &ChartModel,
    filter: &CategoryFilter,
    color_map: Option<&ColorMap>,
    show_annotations: bool,
) {
    let keys: Vec<String> = chart.marks.iter().map(|m| m.summary.key.clone()).collect();
    let n = chart.marks.len() as f64;

    let response = Plot::new(("scene_plot", plot_id))
        .height(PLOT_HEIGHT)
        .x_axis_label(chart.group_by.label())
        .y_axis_label(chart.metric.label())
        .include_x(-0.6)
        .include_x(n - 0.4)
        .include_y(0.0)
        .include_y(chart.y_max)
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            keys.get(idx as usize).cloned().unwrap_or_default()
        })
        .y_axis_formatter(|mark, _range| format_thousands(mark.value))
        .show_x(false)
        .show_y(false)
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            let hovered = hovered_mark(plot_ui, chart);

            // Hovering a mark previews its category like hovering the legend.
            let mut emphasis = filter.clone();
            if let Some(idx) = hovered {
                emphasis.set_hovered(chart.marks[idx].category());
            }

            draw_marks(plot_ui, chart, &emphasis, color_map);
            if show_annotations {
                draw_annotations(plot_ui, chart);
            }
            hovered
        });

    let Some(hovered) = response.inner else {
        return;
    };
    let mark = &chart.marks[hovered];
    response.response.on_hover_ui_at_pointer(|ui: &mut Ui| {
        let mut lines = mark.tooltip().into_iter();
        if let Some(first) = lines.next() {
            ui.strong(first);
        }
        for line in lines {
            ui.label(line);
        }
    });
}

fn hovered_mark(plot_ui: &PlotUi, chart: &ChartModel) -> Option<usize> {
    let pointer = plot_ui.pointer_coordinate()?;
    match chart.mark_kind {
        MarkKind::Bar => chart.bar_at(pointer.x, pointer.y),
        MarkKind::Point => {
            let pointer_screen = plot_ui.screen_from_plot(pointer);
            chart
                .marks
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let centre = plot_ui.screen_from_plot(PlotPoint::new(m.x, m.value));
                    (i, centre.distance(pointer_screen), m.radius)
                })
                .filter(|(_, dist, radius)| *dist <= radius + HOVER_SLACK)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _, _)| i)
        }
    }
}

fn draw_marks(
    plot_ui: &mut PlotUi,
    chart: &ChartModel,
    filter: &CategoryFilter,
    color_map: Option<&ColorMap>,
) {
    let color_of = |category: Option<&str>| -> Color32 {
        let base = color_map
            .map(|cm| cm.color_for(category))
            .unwrap_or(NEUTRAL_FALLBACK);
        base.gamma_multiply(filter.emphasis(category).opacity())
    };

    match chart.mark_kind {
        MarkKind::Point => {
            for mark in &chart.marks {
                let points = Points::new(vec![[mark.x, mark.value]])
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(mark.radius)
                    .color(color_of(mark.category()));
                plot_ui.points(points);
            }
        }
        MarkKind::Bar => {
            let bars: Vec<Bar> = chart
                .marks
                .iter()
                .map(|mark| {
                    Bar::new(mark.x, mark.value)
                        .width(chart.bar_width())
                        .fill(color_of(mark.category()))
                        .name(&mark.summary.key)
                })
                .collect();
            plot_ui.bar_chart(BarChart::new(bars));
        }
    }
}

fn draw_annotations(plot_ui: &mut PlotUi, chart: &ChartModel) {
    for note in &chart.annotations {
        let connector: PlotPoints = vec![note.label, note.anchor].into();
        plot_ui.line(Line::new(connector).color(Color32::GRAY).width(1.0));
        plot_ui.text(
            Text::new(
                PlotPoint::new(note.label[0], note.label[1]),
                RichText::new(&note.text).size(13.0),
            )
            .anchor(Align2::CENTER_BOTTOM),
        );
    }
}
