// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewport panel - the rendered replay with caption and stats overlays.

use crate::viewport_renderer::ViewportRenderer;
use egui_wgpu::wgpu;
use glam::Mat4;
use flight_replay_core::{CameraLens, CameraMode, Frame};

/// GPU handles the viewport needs to render a frame
pub struct RenderContext<'a> {
    /// Scene renderer
    pub renderer: &'a mut ViewportRenderer,
    /// Graphics device
    pub device: &'a wgpu::Device,
    /// Graphics queue
    pub queue: &'a wgpu::Queue,
    /// egui renderer (for texture registration)
    pub egui_renderer: &'a mut egui_wgpu::Renderer,
}

/// The main 3D viewport panel
pub struct ViewportPanel {
    /// Flight path line visibility
    pub show_path: bool,
    /// Stats overlay visibility
    pub show_stats: bool,
}

impl ViewportPanel {
    /// Create a new viewport panel
    pub fn new() -> Self {
        Self {
            show_path: false,
            show_stats: true,
        }
    }

    /// Render the frame and show it filling the available space
    pub fn ui_with_renderer(
        &mut self,
        ui: &mut egui::Ui,
        frame: &Frame<'_>,
        camera_mode: CameraMode,
        lens: &CameraLens,
        aircraft_transform: Option<Mat4>,
        ctx: RenderContext<'_>,
    ) {
        let RenderContext {
            renderer,
            device,
            queue,
            egui_renderer,
        } = ctx;

        let available_size = ui.available_size();

        // Convert to pixels (accounting for scale factor)
        let pixels_per_point = ui.ctx().pixels_per_point();
        let width = (available_size.x * pixels_per_point) as u32;
        let height = (available_size.y * pixels_per_point) as u32;
        renderer.resize(device, [width.max(1), height.max(1)]);

        let aspect = available_size.x / available_size.y.max(1.0);
        renderer.update_frame(queue, &frame.view, lens, aspect, aircraft_transform);
        renderer.render(device, queue, self.show_path, frame.object.is_some());

        let texture_id = renderer.get_egui_texture_id(egui_renderer, device);

        let (response, painter) = ui.allocate_painter(available_size, egui::Sense::hover());
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(texture_id, response.rect, uv, egui::Color32::WHITE);

        self.draw_caption(&painter, response.rect, frame.description);
        self.draw_overlay(&painter, response.rect, frame, camera_mode);
    }

    fn draw_caption(&self, painter: &egui::Painter, rect: egui::Rect, description: &str) {
        let font = egui::FontId::proportional(18.0);
        let galley = painter.layout(
            description.to_string(),
            font,
            egui::Color32::WHITE,
            (rect.width() - 40.0).max(100.0),
        );

        let padding = egui::vec2(12.0, 8.0);
        let pos = egui::pos2(
            rect.center().x - galley.size().x * 0.5,
            rect.bottom() - galley.size().y - 24.0,
        );
        let background = egui::Rect::from_min_size(pos - padding, galley.size() + padding * 2.0);

        painter.rect_filled(background, 6.0, egui::Color32::from_black_alpha(170));
        painter.galley(pos, galley, egui::Color32::WHITE);
    }

    fn draw_overlay(&self, painter: &egui::Painter, rect: egui::Rect, frame: &Frame<'_>, camera_mode: CameraMode) {
        if !self.show_stats {
            return;
        }

        let margin = 10.0;
        let mut y = rect.top() + margin;
        let x = rect.left() + margin;
        let line_height = 16.0;
        let font = egui::FontId::monospace(12.0);
        let color = egui::Color32::from_rgb(20, 20, 20);

        let target = frame.object.map(|o| o.position);
        let mut lines = vec![
            format!("Camera: {}", camera_mode.name()),
            format!(
                "Eye: ({:.1}, {:.1}, {:.1})",
                frame.view.position.x, frame.view.position.y, frame.view.position.z
            ),
            format!("Range: {:.0}", frame.view.distance()),
            format!("Progress: {:.1}%", frame.progress * 100.0),
        ];
        match target {
            Some(position) => {
                lines.push(format!("Altitude: {:.1}", position.y));
                lines.push(format!(
                    "Aircraft: ({:.1}, {:.1}, {:.1})",
                    position.x, position.y, position.z
                ));
            }
            None => lines.push("Aircraft: not loaded".to_string()),
        }

        for line in lines {
            painter.text(egui::pos2(x, y), egui::Align2::LEFT_TOP, line, font.clone(), color);
            y += line_height;
        }
    }
}

impl Default for ViewportPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let panel = ViewportPanel::new();
        assert!(!panel.show_path);
        assert!(panel.show_stats);
    }
}
