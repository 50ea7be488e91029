use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use scenes_core::RenderedItem;
use shared::domain::ViewId;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiErrorCategory;
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::{Phase, SlideshowState};

const MAX_UI_EVENTS_PER_FRAME: usize = 64;

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Storage => "Storage",
        UiErrorCategory::Template => "Template",
        UiErrorCategory::Missing => "Missing",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Error",
    }
}

pub struct ScenesApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<crate::controller::events::UiEvent>,
    state: SlideshowState,
    show_markup: bool,
}

impl ScenesApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<crate::controller::events::UiEvent>,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            state: SlideshowState::default(),
            show_markup: false,
        }
    }

    fn process_ui_events(&mut self) {
        for event in self.ui_rx.try_iter().take(MAX_UI_EVENTS_PER_FRAME) {
            self.state.reduce(event);
        }
    }

    fn send(&mut self, cmd: BackendCommand) {
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.state.status) {
            self.state.busy = true;
        }
    }

    fn click(&mut self, view_id: ViewId) {
        if self.state.busy || self.state.phase != Phase::Ready {
            return;
        }
        self.send(BackendCommand::Click { view_id });
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("scenes_top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Scenes");
                ui.separator();
                let enabled = self.state.phase == Phase::Ready && !self.state.busy;
                if ui
                    .add_enabled(enabled, egui::Button::new("Restart"))
                    .on_hover_text("Clear the mounted scene and replay from the opening line")
                    .clicked()
                {
                    self.send(BackendCommand::Restart);
                }
                if ui
                    .add_enabled(enabled, egui::Button::new("Next"))
                    .clicked()
                {
                    self.send(BackendCommand::Advance);
                }
                ui.checkbox(&mut self.show_markup, "Show markup");
            });
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("scenes_status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(err) = &self.state.last_error {
                    ui.colored_label(
                        egui::Color32::from_rgb(220, 80, 80),
                        format!("{}: {}", err_label(err.category()), err.message()),
                    );
                } else {
                    ui.label(&self.state.status);
                }
                if self.state.busy {
                    ui.spinner();
                }
            });
        });
    }

    fn show_scenes(&mut self, ctx: &egui::Context) {
        let mut clicked = None;
        egui::CentralPanel::default().show(ctx, |ui| match self.state.phase {
            Phase::Starting => {
                ui.centered_and_justified(|ui| ui.spinner());
            }
            Phase::Failed => {
                ui.centered_and_justified(|ui| {
                    ui.label("The slideshow could not start. Check the log and restart the app.");
                });
            }
            Phase::Ready if self.state.items.is_empty() => {
                ui.centered_and_justified(|ui| ui.label("No scene mounted"));
            }
            Phase::Ready => {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for item in &self.state.items {
                        if scene_card(ui, item, self.show_markup).clicked() {
                            clicked = Some(item.view_id);
                        }
                    }
                });
            }
        });
        if let Some(view_id) = clicked {
            self.click(view_id);
        }
    }
}

fn scene_card(ui: &mut egui::Ui, item: &RenderedItem, show_markup: bool) -> egui::Response {
    let frame = egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(16))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.monospace(&item.scene.img_class);
                ui.weak(format!("#{}", item.scene.scene_number));
            });
            let text = item.scene.instructions.as_deref().unwrap_or("");
            ui.add(egui::Label::new(egui::RichText::new(text).size(22.0)).selectable(false));
            if show_markup {
                ui.separator();
                ui.monospace(&item.html);
            }
        });
    frame
        .response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand)
}

impl eframe::App for ScenesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_top_bar(ctx);
        self.show_status_bar(ctx);
        self.show_scenes(ctx);

        if self.state.busy {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl Drop for ScenesApp {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(BackendCommand::Shutdown);
    }
}
