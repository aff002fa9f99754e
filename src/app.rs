// Copyright (C) 2025 Joshua Kesler
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::config::{Config, DEFAULT_THEME};
use crate::controller::{Notice, NoticeLevel};
use crate::controller::player::{PlaybackController, PlaybackState, PlayerEvent, PlayerSettings, RenderKind};
use crate::controller::recorder::{CaptureController, CaptureMode, RecorderEvent, RecordingState};
use crate::crop::{self, CropTool, ImageViewport};
use crate::devices::DeviceBackend;
use crate::keymap::{self, Action};
use crate::messages::{audio::AudioMessage, camera::CameraMessage, recorder::RecorderStatus};
use crate::player::FfmpegPlayer;
use crate::theme::ThemeRegistry;
use crossbeam_channel::Receiver;
use eframe::{egui, App, Frame};
use egui_extras::{Size, StripBuilder};
use image::RgbaImage;
use log::{debug, info, warn};

const CROP_COLOR: [u8; 3] = [0, 0, 177];
const CROP_FILL_ALPHA: u8 = 25;
const CROP_BORDER_ALPHA: u8 = 100;
const CROP_PREVIEW_MAX: f32 = 400.0;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];
const AUDIO_EXTENSIONS: [&str; 2] = ["mp3", "wav"];
const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Recorder,
    Player
}

/// Worker channels the UI drains every frame.
pub struct Inbox {
    pub camera_rx: Receiver<CameraMessage>,
    pub audio_rx: Receiver<AudioMessage>,
    pub rec_status: Receiver<RecorderStatus>
}

struct CroppedImage {
    image: RgbaImage,
    texture: egui::TextureHandle
}

pub struct MediaApp {
    inbox: Inbox,
    backend: DeviceBackend,
    recorder: CaptureController,
    player: PlaybackController,
    engine: FfmpegPlayer,
    themes: ThemeRegistry,
    theme: String,
    tab: Tab,
    camera_texture: Option<egui::TextureHandle>,
    photo_texture: Option<egui::TextureHandle>,
    image_texture: Option<(u64, egui::TextureHandle)>,
    video_texture: Option<(u64, egui::TextureHandle)>,
    crop: CropTool,
    cropped: Option<CroppedImage>,
    notices: Vec<Notice>,
    last_saved: Option<String>,
    fullscreen: bool
}

fn color_image(image: &RgbaImage) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied([image.width() as usize, image.height() as usize], image.as_raw())
}

/// Largest size with the texture's aspect ratio that fits `available`.
fn fit_size(texture: &egui::TextureHandle, available: egui::Vec2) -> egui::Vec2 {
    let size = texture.size_vec2();
    let scale = crop::fit_scale(size.x as u32, size.y as u32, available.x, available.y);
    size * scale
}

impl MediaApp {
    pub fn new(cc: &eframe::CreationContext, config: Config, backend: DeviceBackend, inbox: Inbox) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let themes = ThemeRegistry::load_dir(&config.themes_dir());
        let theme = if themes.apply(&cc.egui_ctx, &config.theme) {
            config.theme.clone()
        } else {
            themes.apply(&cc.egui_ctx, DEFAULT_THEME);
            String::from(DEFAULT_THEME)
        };

        let settings = PlayerSettings {
            seek_step: config.seek_step(),
            volume_step: config.volume_step,
            initial_volume: config.initial_volume()
        };

        let mut app = Self {
            inbox,
            backend,
            recorder: CaptureController::new(),
            player: PlaybackController::new(settings),
            engine: FfmpegPlayer::new(f32::from(settings.initial_volume) / 100.0),
            themes,
            theme,
            tab: Tab::Recorder,
            camera_texture: None,
            photo_texture: None,
            image_texture: None,
            video_texture: None,
            crop: CropTool::new(),
            cropped: None,
            notices: Vec::new(),
            last_saved: None,
            fullscreen: false
        };
        app.recorder.handle(RecorderEvent::NextMode, &mut app.backend);
        app
    }

    fn recorder_event(&mut self, event: RecorderEvent) {
        self.recorder.handle(event, &mut self.backend);
        if let Some(notice) = self.recorder.take_notice() {
            self.notices.push(notice);
        }
    }

    fn player_event(&mut self, event: PlayerEvent) {
        if matches!(event, PlayerEvent::Load(_)) {
            self.crop.cancel();
        }
        self.player.handle(event, &mut self.engine);
    }

    fn switch_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }
        self.tab = tab;
        match tab {
            Tab::Player => self.recorder_event(RecorderEvent::TabLeft),
            Tab::Recorder => {
                self.player_event(PlayerEvent::TabLeft);
                self.recorder_event(RecorderEvent::TabEntered);
            }
        }
        debug!("Switched to {:?} tab", tab);
    }

    fn drain_workers(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.inbox.camera_rx.try_recv() {
            match msg {
                CameraMessage::StreamStarted(format) => debug!("Camera stream: {}", format),
                CameraMessage::Frame { rgb, width, height } => {
                    let img = egui::ColorImage::from_rgb([width as usize, height as usize], &rgb);
                    match &mut self.camera_texture {
                        Some(texture) => texture.set(img, Default::default()),
                        None => self.camera_texture = Some(ctx.load_texture("camera", img, Default::default()))
                    }
                },
                CameraMessage::Photo(photo) => self.recorder_event(RecorderEvent::PhotoCaptured(photo)),
                CameraMessage::Error(e) => warn!("Camera: {}", e)
            }
        }

        while let Ok(msg) = self.inbox.audio_rx.try_recv() {
            match msg {
                AudioMessage::RecordingSaved(path) => {
                    info!("Audio saved: {}", path.display());
                    self.last_saved = Some(path.display().to_string());
                },
                AudioMessage::Error(e) => {
                    let recording_audio = self.recorder.mode() == CaptureMode::Audio && self.recorder.recording_state() != RecordingState::Stopped;
                    if recording_audio {
                        self.recorder_event(RecorderEvent::RecordingFailed(e));
                    } else {
                        warn!("Audio: {}", e);
                    }
                }
            }
        }

        while let Ok(status) = self.inbox.rec_status.try_recv() {
            match status {
                RecorderStatus::Started(path) => debug!("Recording to {}", path.display()),
                RecorderStatus::Saved(path) => self.last_saved = Some(path.display().to_string()),
                RecorderStatus::Error(e) => self.recorder_event(RecorderEvent::RecordingFailed(e))
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if self.tab != Tab::Player || !self.notices.is_empty() {
            return;
        }
        let presses: Vec<(egui::Key, egui::Modifiers)> = ctx.input(|i| {
            i.events.iter().filter_map(|e| match e {
                egui::Event::Key { key, pressed: true, modifiers, .. } => Some((*key, *modifiers)),
                _ => None
            }).collect()
        });
        for (key, modifiers) in presses {
            let Some(action) = keymap::lookup(key, modifiers) else { continue };
            if action == Action::LoadMedia {
                self.open_media();
            } else if let Some(event) = self.player.shortcut_event(action) {
                self.player_event(event);
            }
        }
    }

    fn open_media(&mut self) {
        let all: Vec<&str> = IMAGE_EXTENSIONS.iter().chain(&AUDIO_EXTENSIONS).chain(&VIDEO_EXTENSIONS).copied().collect();
        let choice = rfd::FileDialog::new()
            .set_title("Open Media")
            .add_filter("Media files", &all)
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .add_filter("Audio", &AUDIO_EXTENSIONS)
            .add_filter("Video", &VIDEO_EXTENSIONS)
            .pick_file();
        match choice {
            Some(path) => self.player_event(PlayerEvent::Load(path)),
            None => debug!("Open dialog cancelled")
        }
    }

    fn sync_textures(&mut self, ctx: &egui::Context) {
        match (self.recorder.photo(), &self.photo_texture) {
            (Some(photo), None) => {
                let img = egui::ColorImage::from_rgb([photo.width() as usize, photo.height() as usize], photo.as_raw());
                self.photo_texture = Some(ctx.load_texture("photo", img, Default::default()));
            },
            (None, Some(_)) => self.photo_texture = None,
            _ => {}
        }

        let revision = self.player.image_revision();
        if let Some(image) = self.player.image() {
            if self.image_texture.as_ref().map(|(r, _)| *r) != Some(revision) {
                self.image_texture = Some((revision, ctx.load_texture("image", color_image(image), Default::default())));
            }
        }

        let revision = self.engine.frame_revision();
        if self.video_texture.as_ref().map(|(r, _)| *r) != Some(revision) {
            self.video_texture = self.engine.frame().map(|frame| {
                let img = egui::ColorImage::from_rgba_unmultiplied([frame.width as usize, frame.height as usize], &frame.rgba);
                (revision, ctx.load_texture("video", img, Default::default()))
            });
        }
    }

    fn apply_fullscreen(&mut self, ctx: &egui::Context) {
        let wanted = self.tab == Tab::Player && self.player.view().fullscreen;
        if wanted != self.fullscreen {
            self.fullscreen = wanted;
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(wanted));
        }
    }

    fn show_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut tab = self.tab;
            ui.selectable_value(&mut tab, Tab::Recorder, "Recorder");
            ui.selectable_value(&mut tab, Tab::Player, "Player");
            self.switch_tab(tab);

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut selected = self.theme.clone();
                egui::ComboBox::from_id_salt("theme").selected_text(&selected).show_ui(ui, |ui| {
                    for name in self.themes.names() {
                        ui.selectable_value(&mut selected, name.clone(), name);
                    }
                });
                ui.label("Theme:");
                if selected != self.theme && self.themes.apply(ui.ctx(), &selected) {
                    self.theme = selected;
                }
            });
        });
    }

    fn show_recorder(&mut self, ui: &mut egui::Ui) {
        let view = self.recorder.view().clone();

        StripBuilder::new(ui)
            .size(Size::remainder())
            .size(Size::exact(24.0))
            .size(Size::exact(40.0))
            .vertical(|mut strip| {
                strip.cell(|ui| {
                    ui.centered_and_justified(|ui| {
                        let texture = if view.preview_visible {
                            self.photo_texture.as_ref()
                        } else if view.camera_visible {
                            self.camera_texture.as_ref()
                        } else {
                            None
                        };
                        match texture {
                            Some(texture) => {
                                let size = fit_size(texture, ui.available_size());
                                ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                            },
                            None if self.recorder.mode() == CaptureMode::Audio => {
                                let mic = self.backend.microphone_name().unwrap_or("No microphone found");
                                ui.label(egui::RichText::new(format!("🎤 {}", mic)).size(20.0));
                            },
                            None => {
                                let cam = self.backend.camera_name().map(|_| "Waiting for camera...").unwrap_or("No camera found");
                                ui.label(cam);
                            }
                        }
                    });
                });
                strip.cell(|ui| {
                    ui.horizontal_centered(|ui| {
                        if view.timer_visible {
                            let text = egui::RichText::new(self.recorder.timer_text()).monospace();
                            if self.recorder.recording_state() == RecordingState::Active {
                                ui.colored_label(egui::Color32::RED, text);
                            } else {
                                ui.label(text);
                            }
                        }
                        if let Some(saved) = &self.last_saved {
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                ui.label(format!("Saved: {}", saved));
                            });
                        }
                    });
                });
                strip.cell(|ui| {
                    ui.horizontal_centered(|ui| {
                        if ui.add_enabled(view.next_enabled, egui::Button::new("⟳")).on_hover_text("Next capture mode").clicked() {
                            self.recorder_event(RecorderEvent::NextMode);
                        }
                        if ui.add_enabled(view.capture_enabled, egui::Button::new(view.capture_icon.glyph())).on_hover_text("Capture").clicked() {
                            self.recorder_event(RecorderEvent::Capture);
                        }
                        if ui.add_enabled(view.save_enabled, egui::Button::new("💾")).on_hover_text("Save").clicked() {
                            self.recorder_event(RecorderEvent::Save);
                        }
                        if view.cancel_visible && ui.add_enabled(view.cancel_enabled, egui::Button::new("✖")).on_hover_text("Discard photo").clicked() {
                            self.recorder_event(RecorderEvent::Cancel);
                        }
                    });
                });
            });
    }

    fn show_image(&mut self, ui: &mut egui::Ui) {
        let Some((_, texture)) = &self.image_texture else { return };
        let available = ui.available_rect_before_wrap();
        let rect = egui::Rect::from_center_size(available.center(), fit_size(texture, available.size()));
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        egui::Image::new(texture).paint_at(ui, rect);

        let source_width = texture.size()[0].max(1) as f32;
        let viewport = ImageViewport { origin_x: rect.min.x, origin_y: rect.min.y, scale: rect.width() / source_width };
        let pointer = response.interact_pointer_pos().or_else(|| ui.input(|i| i.pointer.latest_pos()));

        if response.drag_started() {
            // egui reports the drag past its threshold; anchor at the pointer-down spot.
            let origin = ui.input(|i| i.pointer.press_origin()).or(pointer);
            if let (Some(origin), Some(pos)) = (origin, pointer) {
                self.crop.begin(viewport.to_image(origin.x, origin.y), viewport.to_image(pos.x, pos.y));
            }
        } else if response.dragged() && self.crop.is_pressed() {
            if let Some(pos) = pointer {
                if self.crop.drag(viewport.to_image(pos.x, pos.y)) {
                    ui.ctx().request_repaint();
                }
            }
        }

        if let Some(selection) = self.crop.selection() {
            let (x, y, w, h) = viewport.to_screen(selection);
            let sel = egui::Rect::from_min_size(egui::pos2(x, y), egui::vec2(w, h));
            let painter = ui.painter_at(rect);
            let [r, g, b] = CROP_COLOR;
            painter.rect_filled(sel, 0.0, egui::Color32::from_rgba_unmultiplied(r, g, b, CROP_FILL_ALPHA));
            let corners = [sel.left_top(), sel.right_top(), sel.right_bottom(), sel.left_bottom(), sel.left_top()];
            let border = egui::Stroke::new(2.0, egui::Color32::from_rgba_unmultiplied(r, g, b, CROP_BORDER_ALPHA));
            painter.extend(egui::Shape::dashed_line(&corners, border, 6.0, 4.0));
        }

        if response.drag_stopped() {
            let released = pointer.and_then(|pos| self.crop.release(viewport.to_image(pos.x, pos.y)));
            let cropped = match (released, self.player.image()) {
                (Some(selection), Some(image)) => crop::crop_image(image, selection),
                _ => None
            };
            if let Some(image) = cropped {
                debug!("Cropped {}x{}", image.width(), image.height());
                let texture = ui.ctx().load_texture("cropped", color_image(&image), Default::default());
                self.cropped = Some(CroppedImage { image, texture });
            }
        }
    }

    fn show_display(&mut self, ui: &mut egui::Ui) {
        match self.player.kind() {
            RenderKind::Image => self.show_image(ui),
            RenderKind::Video => {
                let visible = self.player.view().video_visible;
                ui.centered_and_justified(|ui| {
                    if let Some((_, texture)) = self.video_texture.as_ref().filter(|_| visible) {
                        let size = fit_size(texture, ui.available_size());
                        ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                    }
                });
            },
            RenderKind::Audio => {
                ui.centered_and_justified(|ui| {
                    let name = self.player.source().and_then(|p| p.file_name()).map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                    let suffix = if self.player.state() == PlaybackState::Paused { " (paused)" } else { "" };
                    ui.label(egui::RichText::new(format!("🎵 {}{}", name, suffix)).size(20.0));
                });
            },
            RenderKind::None => {
                ui.centered_and_justified(|ui| {
                    ui.label(Action::LoadMedia.hint());
                });
            }
        }
    }

    fn show_seek_bar(&mut self, ui: &mut egui::Ui) {
        let view = self.player.view().clone();
        ui.horizontal_centered(|ui| {
            ui.label(egui::RichText::new(&view.elapsed).monospace());
            let mut percent = view.seek_percent;
            let width = (ui.available_width() - 80.0).max(50.0);
            ui.spacing_mut().slider_width = width;
            let slider = ui.add_enabled(view.controls_enabled, egui::Slider::new(&mut percent, 0..=100).show_value(false));
            if slider.changed() {
                self.player_event(PlayerEvent::Seek(percent));
            }
            ui.label(egui::RichText::new(&view.total).monospace());
        });
    }

    fn show_transport(&mut self, ui: &mut egui::Ui) {
        let view = self.player.view().clone();
        let enabled = view.controls_enabled;
        ui.horizontal_centered(|ui| {
            if ui.button("📂").on_hover_text(Action::LoadMedia.hint()).clicked() {
                self.open_media();
            }
            if ui.add_enabled(enabled, egui::Button::new(view.toggle_icon.glyph())).on_hover_text(Action::TogglePlayback.hint()).clicked() {
                self.player_event(PlayerEvent::TogglePlayback);
            }
            if ui.add_enabled(enabled, egui::Button::new("⏪")).on_hover_text(Action::StepBack.hint()).clicked() {
                self.player_event(PlayerEvent::StepBack);
            }
            if ui.add_enabled(enabled, egui::Button::new("⏩")).on_hover_text(Action::StepForward.hint()).clicked() {
                self.player_event(PlayerEvent::StepForward);
            }
            if ui.add_enabled(enabled, egui::Button::new("⏮")).on_hover_text(Action::Restart.hint()).clicked() {
                self.player_event(PlayerEvent::Restart);
            }

            ui.separator();
            let mute_icon = if view.muted { "🔇" } else { "🔊" };
            if ui.add_enabled(enabled, egui::Button::new(mute_icon)).on_hover_text(Action::ToggleMute.hint()).clicked() {
                self.player_event(PlayerEvent::ToggleMute);
            }
            let mut volume = view.volume;
            ui.spacing_mut().slider_width = 100.0;
            if ui.add_enabled(enabled, egui::Slider::new(&mut volume, 0..=100).show_value(false)).changed() {
                self.player_event(PlayerEvent::SetVolume(volume));
            }
            ui.label(view.volume_label());

            if view.track_selector_visible {
                ui.separator();
                let current = view.audio_tracks.get(view.selected_track).cloned().unwrap_or_default();
                let mut selected = view.selected_track;
                egui::ComboBox::from_id_salt("audio_track").selected_text(current).show_ui(ui, |ui| {
                    for (i, label) in view.audio_tracks.iter().enumerate() {
                        ui.selectable_value(&mut selected, i, label);
                    }
                }).response.on_hover_text(Action::NextAudioTrack.hint());
                if selected != view.selected_track {
                    self.player_event(PlayerEvent::SelectTrack(selected));
                }
            }

            if self.player.kind() == RenderKind::Video {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⛶").on_hover_text(Action::ToggleFullscreen.hint()).clicked() {
                        self.player_event(PlayerEvent::ToggleFullscreen);
                    }
                });
            }
        });
    }

    fn show_player(&mut self, ui: &mut egui::Ui) {
        if self.fullscreen {
            self.show_display(ui);
            return;
        }
        StripBuilder::new(ui)
            .size(Size::remainder())
            .size(Size::exact(28.0))
            .size(Size::exact(40.0))
            .vertical(|mut strip| {
                strip.cell(|ui| self.show_display(ui));
                strip.cell(|ui| self.show_seek_bar(ui));
                strip.cell(|ui| self.show_transport(ui));
            });
    }

    fn show_cropped(&mut self, ctx: &egui::Context) {
        let Some(cropped) = &self.cropped else { return };
        let mut open = true;
        let mut save = false;
        let mut close = false;
        egui::Window::new("Cropped Image").open(&mut open).resizable(false).collapsible(false).show(ctx, |ui| {
            let size = fit_size(&cropped.texture, egui::vec2(CROP_PREVIEW_MAX, CROP_PREVIEW_MAX));
            ui.add(egui::Image::new(&cropped.texture).fit_to_exact_size(size));
            ui.horizontal(|ui| {
                save = ui.button("Save").clicked();
                close = ui.button("Close").clicked();
            });
        });

        if save {
            self.save_cropped();
        } else if close || !open {
            self.cropped = None;
        }
    }

    fn save_cropped(&mut self) {
        let Some(cropped) = &self.cropped else {
            self.notices.push(Notice::warning("Save Failed", "No cropped image to save."));
            return;
        };
        let choice = rfd::FileDialog::new()
            .set_title("Save Cropped Image")
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .add_filter("BMP", &["bmp"])
            .set_directory(self.backend.pictures_dir())
            .set_file_name("cropped_image.png")
            .save_file();
        let Some(path) = choice else {
            debug!("Save operation cancelled");
            return;
        };
        match crop::save_image(&cropped.image, &path) {
            Ok(()) => {
                info!("Cropped image saved at: {}", path.display());
                self.notices.push(Notice::info("Image Saved", "Cropped image has been saved successfully!"));
            },
            Err(e) => {
                warn!("{}", e);
                self.notices.push(Notice::warning("Save Failed", "Failed to save the cropped image."));
            }
        }
    }

    fn show_notices(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.notices.first() else { return };
        let mut dismissed = false;
        egui::Window::new(&notice.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                let text = egui::RichText::new(&notice.text);
                match notice.level {
                    NoticeLevel::Info => ui.label(text),
                    NoticeLevel::Warning => ui.label(text.color(ui.visuals().warn_fg_color))
                };
                dismissed = ui.button("OK").clicked();
            });
        if dismissed {
            self.notices.remove(0);
        }
    }
}

impl App for MediaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.drain_workers(ctx);
        self.handle_shortcuts(ctx);
        self.player_event(PlayerEvent::Tick);
        self.sync_textures(ctx);
        self.apply_fullscreen(ctx);

        if !self.fullscreen {
            egui::TopBottomPanel::top("header").show(ctx, |ui| self.show_header(ui));
        }
        egui::CentralPanel::default().show(ctx, |ui| {
            match self.tab {
                Tab::Recorder => self.show_recorder(ui),
                Tab::Player => self.show_player(ui)
            }
        });
        self.show_cropped(ctx);
        self.show_notices(ctx);

        ctx.request_repaint();
    }
}

impl Drop for MediaApp {
    fn drop(&mut self) {
        if let Some(kind) = self.recorder.mode().recording() {
            if self.recorder.recording_state() != RecordingState::Stopped {
                info!("Finishing {:?} recording before exit", kind);
                self.recorder_event(RecorderEvent::TabLeft);
            }
        }
        self.backend.shutdown();
    }
}
