use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::render::{SignalChart, TernaryChart};

// ---------------------------------------------------------------------------
// Signal line chart
// ---------------------------------------------------------------------------

/// Paint a signal chart description produced by `render`.
pub fn signal_plot(ui: &mut Ui, chart: &SignalChart) {
    ui.label(RichText::new(&chart.title).strong());

    Plot::new("ecg_plot")
        .legend(Legend::default())
        .x_axis_label("Time (seconds)")
        .y_axis_label("Amplitude (mV)")
        .height(320.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let points: PlotPoints = series.points.iter().copied().collect();
                let line = Line::new(points)
                    .name(&series.name)
                    .color(series.color)
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}

// ---------------------------------------------------------------------------
// Ternary scatter chart
// ---------------------------------------------------------------------------

const SQRT_3_2: f64 = 0.866_025_403_784_438_6;

/// Barycentric projection onto a unit triangle: the first component's
/// vertex on top, the second bottom-left, the third bottom-right.
fn project(a: f64, _b: f64, c: f64) -> [f64; 2] {
    [0.5 * a + c, SQRT_3_2 * a]
}

/// Paint a ternary chart description: triangle frame, vertex labels, and
/// one marker series per class.
pub fn ternary_plot(ui: &mut Ui, chart: &TernaryChart, file_index: usize) {
    ui.label(RichText::new(&chart.title).strong());

    Plot::new(("ternary_plot", file_index))
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .height(360.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let frame: PlotPoints = vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [0.5, SQRT_3_2],
                [0.0, 0.0],
            ]
            .into();
            plot_ui.line(Line::new(frame).color(Color32::GRAY).width(1.0));

            plot_ui.text(Text::new(
                PlotPoint::new(0.5, SQRT_3_2 + 0.06),
                chart.axis_titles[0].clone(),
            ));
            plot_ui.text(Text::new(
                PlotPoint::new(-0.06, -0.05),
                chart.axis_titles[1].clone(),
            ));
            plot_ui.text(Text::new(
                PlotPoint::new(1.06, -0.05),
                chart.axis_titles[2].clone(),
            ));

            for series in &chart.series {
                let points: PlotPoints = series
                    .points
                    .iter()
                    .map(|p| project(p.a, p.b, p.c))
                    .collect();
                let mut markers = Points::new(points)
                    .color(series.style.color)
                    .shape(series.style.symbol)
                    .radius(series.style.size as f32 / 2.0)
                    .filled(true);
                if !series.placeholder {
                    markers = markers.name(&series.name);
                }
                plot_ui.points(markers);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_keeps_points_inside_the_triangle() {
        for &(a, b, c) in &[(1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0), (0.25, 0.25, 0.5)] {
            let [x, y] = project(a, b, c);
            assert!((0.0..=1.0).contains(&x));
            assert!((0.0..=SQRT_3_2).contains(&y));
        }
    }

    #[test]
    fn projection_maps_vertices() {
        assert_eq!(project(1.0, 0.0, 0.0), [0.5, SQRT_3_2]);
        assert_eq!(project(0.0, 1.0, 0.0), [0.0, 0.0]);
        assert_eq!(project(0.0, 0.0, 1.0), [1.0, 0.0]);
    }
}
