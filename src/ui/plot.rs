use chrono::DateTime;
use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::color::BatchColors;
use crate::data::align::{align, AlignedSeries, TimeAxisMode};
use crate::data::model::Channel;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Comparison plots (central panel)
// ---------------------------------------------------------------------------

/// Render the temperature plot and, optionally, the pressure plot below it.
pub fn comparison_plots(ui: &mut Ui, state: &AppState) {
    if state.registry.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Load batch exports to begin  (File → Open batch files…)");
        });
        return;
    }

    let selected = state.selected_batches();
    if selected.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Check at least one batch in the side panel.");
        });
        return;
    }

    let mode = state.time_axis_mode();
    let panes = if state.show_pressure { 2.0 } else { 1.0 };
    let pane_height = (ui.available_height() / panes - 8.0).max(120.0);

    let temperature = align(&selected, mode, Channel::Temperature);
    channel_plot(
        ui,
        Channel::Temperature,
        &temperature,
        &state.colors,
        mode,
        pane_height,
    );

    if state.show_pressure {
        let pressure = align(&selected, mode, Channel::Pressure);
        channel_plot(
            ui,
            Channel::Pressure,
            &pressure,
            &state.colors,
            mode,
            pane_height,
        );
    }
}

fn channel_plot(
    ui: &mut Ui,
    channel: Channel,
    series: &[AlignedSeries],
    colors: &BatchColors,
    mode: TimeAxisMode,
    height: f32,
) {
    let mut plot = Plot::new(format!("{channel}_plot"))
        .legend(Legend::default())
        .height(height)
        .x_axis_label(mode.axis_label())
        .y_axis_label(format!("{channel} ({})", channel.unit()))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if mode == TimeAxisMode::Absolute {
        // x-values are Unix seconds; render axis marks as calendar time.
        plot = plot.x_axis_formatter(|mark, _range| {
            DateTime::from_timestamp(mark.value as i64, 0)
                .map(|dt| dt.format("%d/%m %H:%M").to_string())
                .unwrap_or_default()
        });
    }

    plot.show(ui, |plot_ui| {
        for aligned in series {
            if aligned.is_empty() {
                continue;
            }
            let points: PlotPoints = aligned
                .x
                .iter()
                .zip(aligned.y.iter())
                .map(|(&xi, &yi)| [xi, yi])
                .collect();

            let line = Line::new(points)
                .name(&aligned.label)
                .color(colors.color_for(&aligned.label))
                .width(1.5);

            plot_ui.line(line);
        }
    });
}
