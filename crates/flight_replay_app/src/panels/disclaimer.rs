// SPDX-License-Identifier: MIT OR Apache-2.0
//! One-shot disclaimer shown over the viewport at start-up.

const DISCLAIMER_TEXT: &str = "This is a simplified reconstruction for illustration only. \
The path, timing and camera positions are approximate and are not an official \
accident investigation product.";

/// Disclaimer overlay
#[derive(Debug, Default)]
pub struct DisclaimerPanel {
    acknowledged: bool,
}

impl DisclaimerPanel {
    /// Create a new, unacknowledged disclaimer
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the user has dismissed the disclaimer
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Dismiss the disclaimer. It never comes back.
    pub fn acknowledge(&mut self) {
        if !self.acknowledged {
            tracing::debug!("Disclaimer acknowledged");
            self.acknowledged = true;
        }
    }

    /// Show the overlay until it is acknowledged
    pub fn show(&mut self, ctx: &egui::Context) {
        if self.acknowledged {
            return;
        }

        let mut clicked = false;
        egui::Window::new("Disclaimer")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_max_width(360.0);
                ui.label(DISCLAIMER_TEXT);
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    clicked = ui.button("I understand").clicked();
                });
            });

        if clicked {
            self.acknowledge();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledge_is_one_shot() {
        let mut panel = DisclaimerPanel::new();
        assert!(!panel.is_acknowledged());
        panel.acknowledge();
        assert!(panel.is_acknowledged());
        panel.acknowledge();
        assert!(panel.is_acknowledged());
    }
}
