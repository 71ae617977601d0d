use egui::{Context, RichText};

use crate::controller::{CameraMode, ControlTarget, FrameReport};

const CONTROLS: [(&str, &str); 8] = [
    ("W / S", "Move forward / back"),
    ("A / D", "Turn left / right"),
    ("M", "Follow the player"),
    ("1 - 3", "Follow a cube"),
    ("0", "Stop following, reset view"),
    ("C", "Steer player / camera"),
    ("L", "Log camera and player state"),
    ("`", "Toggle debug overlay"),
];

/// Build the debug overlay and return egui output
pub fn build_overlay(ctx: &Context, raw_input: egui::RawInput, report: &FrameReport) -> egui::FullOutput {
    ctx.run(raw_input, |ctx| {
        draw_stats_window(ctx, report);
        draw_controls_window(ctx);
    })
}

fn small(text: impl Into<String>) -> RichText {
    RichText::new(text).small()
}

pub fn camera_mode_label(mode: CameraMode) -> String {
    match mode {
        CameraMode::Following(id) => format!("following {id}"),
        CameraMode::Free => "free".to_string(),
    }
}

pub fn control_label(control: ControlTarget) -> String {
    match control {
        ControlTarget::Entity(id) => format!("entity {id}"),
        ControlTarget::Camera => "camera".to_string(),
    }
}

fn draw_stats_window(ctx: &Context, report: &FrameReport) {
    let eye = report.camera_eye;
    let player = report.player_position;

    egui::Window::new("Stats")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(small(format!("FPS: {:.0} ({:.1} ms)", report.fps, report.dt * 1000.0)));
            ui.label(small(format!("Frame: {}", report.frame)));
            ui.separator();
            ui.label(small(format!("Camera: {}", camera_mode_label(report.camera_mode))));
            ui.label(small(format!("Eye: x: {:.1} y: {:.1} z: {:.1}", eye.x, eye.y, eye.z)));
            ui.label(small(format!(
                "Yaw: {:.1} Pitch: {:.1}",
                report.camera_yaw.to_degrees(),
                report.camera_pitch.to_degrees()
            )));
            ui.separator();
            ui.label(small(format!("Steering: {}", control_label(report.control))));
            ui.label(small(format!("Player: x: {:.1} y: {:.1} z: {:.1}", player.x, player.y, player.z)));
            ui.label(small(format!("Heading: {:.1}", report.player_yaw.to_degrees())));
        });
}

fn draw_controls_window(ctx: &Context) {
    egui::Window::new("Controls")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .resizable(false)
        .collapsible(true)
        .show(ctx, |ui| {
            egui::Grid::new("controls_grid").num_columns(2).show(ui, |ui| {
                for (keys, action) in CONTROLS {
                    ui.label(small(keys).strong());
                    ui.label(small(action));
                    ui.end_row();
                }
            });
        });
}
