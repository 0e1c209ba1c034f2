use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use eframe::egui::{self, Color32, FontData, FontDefinitions, FontFamily, RichText};
use ic_inspect_common::history::{paginate, search_in, HISTORY_LIMIT, PAGE_SIZE};
use ic_inspect_common::render::HistoryRow;
use ic_inspect_common::schedule::Applied;
use ic_inspect_common::viewport::{MAX_ZOOM, MIN_ZOOM};
use ic_inspect_common::{
    ApiClient, AppStore, DemoSource, FlowState, ImageRef, InspectionFlow, IssueCategory,
    IssueReport, JigCondition, Key, KeyOutcome, ReportSubmitter, ResultSource, ResultView,
    ScanPhase, ScanResult, ScanTimings, ScheduledScan, StationConfig, StreamStatus, Theme, Tone,
};
use tokio::runtime::Runtime;

use crate::io::{decode_image, read_image_file};
use crate::model::{DecodedImage, ImageSlot, Tab, UiMessage};
use crate::view::{history_table, result_panels, stats_panel, tone_color};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];
const MAX_TEXTURE_SIDE: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum HistorySource {
    #[default]
    Shift,
    Backend,
}

pub struct DesktopApp {
    runtime: Runtime,
    settings: StationConfig,
    store: AppStore,
    flow: InspectionFlow,
    client: Option<ApiClient>,
    demo_mode: bool,
    scan: Option<ScheduledScan>,
    tab: Tab,
    status: String,
    tx: Sender<UiMessage>,
    rx: Receiver<UiMessage>,
    pending_jobs: usize,
    textures: HashMap<ImageSlot, egui::TextureHandle>,
    generations: HashMap<ImageSlot, u64>,
    applied_theme: Option<Theme>,
    stream: Option<StreamStatus>,
    submitter: ReportSubmitter,
    report_error: Option<String>,
    issue_category: IssueCategory,
    issue_text: String,
    issue_status: String,
    history_source: HistorySource,
    history_query: String,
    history_page: usize,
    history_selected: Option<usize>,
    remote_history: Option<Vec<ScanResult>>,
}

impl DesktopApp {
    pub fn new(cc: &eframe::CreationContext<'_>, runtime: Runtime, settings: StationConfig) -> Self {
        let mut store = AppStore::new(settings.worker());
        store.set_theme(settings.theme);

        // Store changes can arrive between frames (e.g. from a finished scan).
        let ctx = cc.egui_ctx.clone();
        store.subscribe(move |_| ctx.request_repaint());

        let client = match ApiClient::new(&settings.base_url(), settings.timeout()) {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::error!("backend client unavailable: {err}");
                None
            }
        };

        let (tx, rx) = mpsc::channel();
        let mut app = Self {
            runtime,
            demo_mode: settings.demo_mode,
            settings,
            store,
            flow: InspectionFlow::new(),
            client,
            scan: None,
            tab: Tab::default(),
            status: String::new(),
            tx,
            rx,
            pending_jobs: 0,
            textures: HashMap::new(),
            generations: HashMap::new(),
            applied_theme: None,
            stream: None,
            submitter: ReportSubmitter::default(),
            report_error: None,
            issue_category: IssueCategory::default(),
            issue_text: String::new(),
            issue_status: String::new(),
            history_source: HistorySource::default(),
            history_query: String::new(),
            history_page: 1,
            history_selected: None,
            remote_history: None,
        };
        app.probe_stream();
        app
    }

    fn backend(&self) -> Option<ApiClient> {
        if self.demo_mode { None } else { self.client.clone() }
    }

    fn spawn_job<F>(&mut self, job: F)
    where
        F: std::future::Future<Output = UiMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.pending_jobs += 1;
        self.runtime.spawn(async move {
            let _ = tx.send(job.await);
        });
    }

    // ---- image selection ----

    fn pick_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.open_image(path);
        }
    }

    fn open_image(&mut self, path: PathBuf) {
        let image = match read_image_file(&path) {
            Ok(image) => image,
            Err(err) => {
                self.status = format!("Load failed: {err:#}");
                return;
            }
        };
        if !self.flow.select_image(&mut self.store, image.clone()) {
            self.status = "Cannot change image while scanning".to_string();
            return;
        }
        self.textures.clear();
        self.next_generation(ImageSlot::Registered);
        self.status = format!("Selected {}", path.display());
        if let ImageRef::Bytes { data, .. } = image {
            self.decode_in_background(ImageSlot::Selected, data);
        }
    }

    fn clear_image(&mut self) {
        if self.flow.clear_image(&mut self.store) {
            self.textures.clear();
            self.status.clear();
        }
    }

    fn next_generation(&mut self, slot: ImageSlot) -> u64 {
        let generation = self.generations.entry(slot).or_insert(0);
        *generation += 1;
        *generation
    }

    fn decode_in_background(&mut self, slot: ImageSlot, data: Arc<[u8]>) {
        let generation = self.next_generation(slot);
        let sender = self.tx.clone();
        self.pending_jobs += 1;

        std::thread::spawn(move || {
            let message = match decode_image(&data, MAX_TEXTURE_SIDE) {
                Ok(image) => UiMessage::Decoded { slot, generation, image },
                Err(err) => UiMessage::DecodeFailed { slot, generation, message: format!("{err:#}") },
            };
            let _ = sender.send(message);
        });
    }

    fn fetch_registered_image(&mut self) {
        let Some(ImageRef::Url(url)) = self.store.snapshot().registered_image.clone() else {
            return;
        };
        let Some(client) = self.backend() else {
            return;
        };
        let generation = self.next_generation(ImageSlot::Registered);
        self.spawn_job(async move {
            let slot = ImageSlot::Registered;
            let decoded = client
                .fetch_image(&url)
                .await
                .map_err(|e| e.to_string())
                .and_then(|bytes| decode_image(&bytes, MAX_TEXTURE_SIDE).map_err(|e| format!("{e:#}")));
            match decoded {
                Ok(image) => UiMessage::Decoded { slot, generation, image },
                Err(message) => UiMessage::DecodeFailed { slot, generation, message },
            }
        });
    }

    // ---- scanning ----

    fn press(&mut self, key: Key) {
        match self.flow.handle_key(&mut self.store, key) {
            KeyOutcome::SelectImage => self.pick_image(),
            KeyOutcome::ScanStarted => self.launch_scan(),
            KeyOutcome::NextScan => {
                self.textures.remove(&ImageSlot::Registered);
                self.status = "Ready for next scan".to_string();
            }
            KeyOutcome::Ignored => {}
        }
    }

    fn start_scan(&mut self) {
        if self.flow.start_scan(&mut self.store) {
            self.launch_scan();
        }
    }

    fn next_scan(&mut self) {
        self.press(Key::Enter);
    }

    /// Runs the timed phases for a scan already started on the flow.
    fn launch_scan(&mut self) {
        let Some(image) = self.flow.selected_image().cloned() else {
            return;
        };
        let source: Arc<dyn ResultSource> = if self.demo_mode {
            Arc::new(DemoSource::new(self.settings.station_id.clone()))
        } else {
            match &self.client {
                Some(client) => Arc::new(client.clone()),
                None => {
                    self.flow.abort_scan(&mut self.store);
                    self.status = "Backend client unavailable; enable demo mode".to_string();
                    return;
                }
            }
        };

        self.status = format!("Scanning {}", image.name());
        self.scan = Some(ScheduledScan::spawn(
            self.runtime.handle(),
            ScanTimings::default(),
            source,
            image,
        ));
    }

    fn poll_scan(&mut self) {
        let Some(scan) = self.scan.as_mut() else {
            return;
        };

        let mut finished = None;
        while let Some(event) = scan.try_next() {
            match ScheduledScan::apply(event, &mut self.flow, &mut self.store) {
                Applied::Pending => {}
                Applied::Done => {
                    finished = Some(Ok(()));
                    break;
                }
                Applied::Failed(err) => {
                    finished = Some(Err(err));
                    break;
                }
            }
        }

        match finished {
            Some(Ok(())) => {
                self.scan = None;
                self.status = match self.flow.result() {
                    Some(result) => format!("Result: {}", result.status()),
                    None => String::new(),
                };
                self.fetch_registered_image();
            }
            Some(Err(err)) => {
                self.scan = None;
                self.status = format!("Scan failed: {err}");
            }
            None => {}
        }
    }

    // ---- backend jobs ----

    fn probe_stream(&mut self) {
        let Some(client) = self.backend() else {
            self.stream = None;
            return;
        };
        self.stream = None;
        self.spawn_job(async move { UiMessage::Stream(client.probe_stream().await) });
    }

    fn load_remote_history(&mut self) {
        let Some(client) = self.backend() else {
            self.status = "Backend history needs a backend connection".to_string();
            return;
        };
        self.spawn_job(async move { UiMessage::RemoteHistory(client.scan_history(HISTORY_LIMIT).await) });
    }

    fn submit_report(&mut self) {
        let Some(client) = self.backend() else {
            self.report_error = Some("Reports cannot be sent in demo mode".to_string());
            return;
        };
        let Some(report) = self.submitter.begin(&self.store.snapshot()) else {
            return;
        };
        self.report_error = None;
        self.spawn_job(async move {
            UiMessage::ReportDone { outcome: client.submit_report(&report).await.map(|_| ()) }
        });
    }

    fn send_issue(&mut self) {
        let Some(client) = self.backend() else {
            self.issue_status = "Issues cannot be sent in demo mode".to_string();
            return;
        };
        let issue = IssueReport::new(&self.store.snapshot(), self.issue_category, self.issue_text.trim());
        self.issue_status = "Sending...".to_string();
        self.spawn_job(async move {
            let outcome = client.report_issue(&issue).await.map(|_| ());
            UiMessage::IssueDone { outcome }
        });
    }

    fn poll_messages(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.rx.try_recv() {
            self.pending_jobs = self.pending_jobs.saturating_sub(1);
            match msg {
                UiMessage::Decoded { slot, generation, image } => {
                    if self.generations.get(&slot) == Some(&generation) {
                        self.install_texture(ctx, slot, image);
                    }
                }
                UiMessage::DecodeFailed { slot, generation, message } => {
                    if self.generations.get(&slot) == Some(&generation) {
                        tracing::warn!(?slot, "image not shown: {message}");
                        if slot == ImageSlot::Selected {
                            self.status = format!("Preview failed: {message}");
                        }
                    }
                }
                UiMessage::ReportDone { outcome } => {
                    self.submitter.finish(&outcome);
                    self.report_error = outcome.err().map(|e| format!("Submit failed: {e}"));
                }
                UiMessage::IssueDone { outcome } => {
                    self.issue_status = match outcome {
                        Ok(()) => {
                            self.issue_text.clear();
                            "Issue reported".to_string()
                        }
                        Err(err) => format!("Issue not sent: {err}"),
                    };
                }
                UiMessage::Stream(status) => self.stream = Some(status),
                UiMessage::RemoteHistory(result) => match result {
                    Ok(results) => {
                        self.remote_history = Some(results);
                        self.history_selected = None;
                    }
                    Err(err) => self.status = format!("History failed: {err}"),
                },
            }
        }
    }

    fn install_texture(&mut self, ctx: &egui::Context, slot: ImageSlot, image: DecodedImage) {
        let color_image = egui::ColorImage::from_rgba_unmultiplied(image.size, &image.pixels);
        let name = match slot {
            ImageSlot::Selected => "selected-image",
            ImageSlot::Registered => "registered-image",
        };
        let texture = ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR);
        self.textures.insert(slot, texture);
    }

    // ---- input ----

    fn handle_input(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| i.raw.dropped_files.iter().filter_map(|f| f.path.clone()).collect());
        if let Some(path) = dropped.into_iter().next() {
            self.tab = Tab::Inspect;
            self.open_image(path);
        }

        if self.tab != Tab::Inspect || ctx.wants_keyboard_input() {
            return;
        }
        let (space, enter) = ctx.input(|i| (i.key_pressed(egui::Key::Space), i.key_pressed(egui::Key::Enter)));
        if space {
            self.press(Key::Space);
        } else if enter {
            self.press(Key::Enter);
        }
    }

    fn apply_theme(&mut self, ctx: &egui::Context) {
        let theme = self.store.snapshot().theme;
        if self.applied_theme != Some(theme) {
            ctx.set_visuals(match theme {
                Theme::Dark => egui::Visuals::dark(),
                Theme::Light => egui::Visuals::light(),
            });
            self.applied_theme = Some(theme);
        }
    }

    // ---- panels ----

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                let idle = !self.flow.is_scanning();
                if ui.add_enabled(idle, egui::Button::new("Select Image…")).clicked() {
                    self.pick_image();
                    ui.close_menu();
                }
                let has_image = self.flow.selected_image().is_some();
                if ui.add_enabled(idle && has_image, egui::Button::new("Clear Image")).clicked() {
                    self.clear_image();
                    ui.close_menu();
                }
            });

            ui.separator();
            let theme = self.store.snapshot().theme;
            let label = match theme {
                Theme::Dark => "☀ Light",
                Theme::Light => "🌙 Dark",
            };
            if ui.button(label).clicked() {
                self.store.set_theme(theme.toggled());
            }

            if ui.checkbox(&mut self.demo_mode, "Demo mode").changed() {
                self.probe_stream();
            }

            ui.separator();
            self.stream_indicator(ui);

            if !self.status.is_empty() {
                ui.separator();
                ui.label(RichText::new(&self.status).color(Color32::from_gray(170)));
            }
        });
    }

    fn stream_indicator(&mut self, ui: &mut egui::Ui) {
        if self.demo_mode {
            ui.label(RichText::new("● Demo").color(tone_color(Tone::Attention)));
            return;
        }
        let mut retry = false;
        match &self.stream {
            None => {
                ui.label(RichText::new("● Checking stream…").color(tone_color(Tone::Neutral)));
            }
            Some(StreamStatus::Available { url, .. }) => {
                ui.label(RichText::new("● Live").color(tone_color(Tone::Pass)))
                    .on_hover_text(url.as_str());
            }
            Some(StreamStatus::Unavailable(reason)) => {
                ui.label(RichText::new("● Stream unavailable").color(tone_color(Tone::Fail)))
                    .on_hover_text(reason.as_str());
                retry = ui.small_button("Retry").clicked();
            }
        }
        if retry {
            self.probe_stream();
        }
    }

    fn inspect_tab(&mut self, ui: &mut egui::Ui) {
        let scanning = self.flow.is_scanning();
        let has_image = self.flow.selected_image().is_some();
        let has_result = self.flow.result().is_some();

        ui.horizontal(|ui| {
            if ui.add_enabled(!scanning, egui::Button::new("Select Image")).clicked() {
                self.pick_image();
            }
            if ui
                .add_enabled(!scanning && has_image && !has_result, egui::Button::new("Scan  [Space]"))
                .clicked()
            {
                self.start_scan();
            }
            if ui.add_enabled(has_result, egui::Button::new("Next Scan  [Enter]")).clicked() {
                self.next_scan();
            }

            ui.separator();
            let viewport = *self.flow.viewport();
            if ui.add_enabled(viewport.zoom() > MIN_ZOOM, egui::Button::new("−")).clicked() {
                self.flow.viewport_mut().zoom_out();
            }
            ui.label(format!("{:.0}%", viewport.zoom() * 100.0));
            if ui.add_enabled(viewport.zoom() < MAX_ZOOM, egui::Button::new("+")).clicked() {
                self.flow.viewport_mut().zoom_in();
            }
            if ui.add_enabled(viewport.is_zoomed(), egui::Button::new("Reset")).clicked() {
                self.flow.viewport_mut().reset();
            }
        });
        ui.add_space(6.0);

        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            self.image_view(ui);
            ui.add_space(8.0);

            if let Some(result) = self.flow.result() {
                let view = ResultView::from(result);
                result_panels(ui, &view, self.textures.get(&ImageSlot::Registered));
            }
        });
    }

    fn image_view(&mut self, ui: &mut egui::Ui) {
        let height = (ui.available_height() * 0.6).clamp(280.0, 560.0);
        let size = egui::vec2(ui.available_width(), height);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 8.0, ui.visuals().extreme_bg_color);

        let Some(texture) = self.textures.get(&ImageSlot::Selected) else {
            let hint = if self.flow.selected_image().is_some() {
                "Loading image…"
            } else {
                "Press Space or drop an image to begin"
            };
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                hint,
                egui::FontId::proportional(18.0),
                ui.visuals().weak_text_color(),
            );
            return;
        };

        // Fit to the frame, then apply zoom and pan.
        let viewport = self.flow.viewport_mut();
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll > 0.0 {
                viewport.zoom_in();
            } else if scroll < 0.0 {
                viewport.zoom_out();
            }
        }
        if response.double_clicked() {
            viewport.reset();
        }
        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                viewport.begin_drag((pos.x, pos.y));
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                viewport.drag_to((pos.x, pos.y));
            }
        }
        if response.drag_stopped() {
            viewport.end_drag();
        }
        if viewport.is_zoomed() {
            let icon = if viewport.is_dragging() {
                egui::CursorIcon::Grabbing
            } else {
                egui::CursorIcon::Grab
            };
            response.on_hover_cursor(icon);
        }

        let texture_size = texture.size_vec2();
        let fit = (rect.width() / texture_size.x).min(rect.height() / texture_size.y);
        let (pan_x, pan_y) = viewport.pan();
        let center = rect.center() + egui::vec2(pan_x, pan_y);
        let image_rect = egui::Rect::from_center_size(center, texture_size * fit * viewport.zoom());
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(texture.id(), image_rect, uv, Color32::WHITE);

        match self.flow.state() {
            FlowState::Scanning { phase: ScanPhase::Flash, .. } => {
                painter.rect_filled(rect, 8.0, Color32::from_white_alpha(210));
            }
            FlowState::Scanning { phase: ScanPhase::Processing, .. } => {
                painter.rect_filled(rect, 8.0, Color32::from_black_alpha(140));
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Analyzing…",
                    egui::FontId::proportional(22.0),
                    Color32::WHITE,
                );
            }
            _ => {}
        }
    }

    fn history_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.history_source, HistorySource::Shift, "This shift");
            let backend = ui.selectable_value(&mut self.history_source, HistorySource::Backend, "Backend");
            if backend.clicked() && self.remote_history.is_none() {
                self.load_remote_history();
            }
            if self.history_source == HistorySource::Backend && ui.button("Refresh").clicked() {
                self.load_remote_history();
            }
            ui.separator();
            ui.label("Search");
            let search = ui.add(
                egui::TextEdit::singleline(&mut self.history_query)
                    .hint_text("Part number or inspection ID")
                    .desired_width(240.0),
            );
            if search.changed() {
                self.history_page = 1;
                self.history_selected = None;
            }
        });
        ui.separator();

        let state = self.store.snapshot();
        let items: Vec<&ScanResult> = match self.history_source {
            HistorySource::Shift => search_in(state.scan_history.iter(), &self.history_query),
            HistorySource::Backend => search_in(self.remote_history.iter().flatten(), &self.history_query),
        };
        let page = paginate(items, self.history_page, PAGE_SIZE);
        self.history_page = page.page;

        ui.horizontal(|ui| {
            if ui.add_enabled(page.page > 1, egui::Button::new("◀")).clicked() {
                self.history_page -= 1;
                self.history_selected = None;
            }
            ui.label(format!("Page {} / {}", page.page, page.total_pages));
            if ui.add_enabled(page.page < page.total_pages, egui::Button::new("▶")).clicked() {
                self.history_page += 1;
                self.history_selected = None;
            }
        });

        if page.items.is_empty() {
            ui.label(RichText::new("No scans yet").weak());
            return;
        }

        let rows: Vec<HistoryRow> = page.items.iter().map(|r| HistoryRow::from(*r)).collect();
        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            if let Some(index) = history_table(ui, &rows, self.history_selected) {
                self.history_selected = Some(index);
            }
            if let Some(result) = self.history_selected.and_then(|i| page.items.get(i)) {
                ui.separator();
                result_panels(ui, &ResultView::from(*result), None);
            }
        });
    }

    fn report_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("End of Shift Report");
        ui.add_space(4.0);

        if self.submitter.is_submitted() {
            ui.colored_label(tone_color(Tone::Pass), "✔ Report submitted");
            if ui.button("Start new report").clicked() {
                self.submitter.start_over();
            }
        } else {
            let preview = self.submitter.build_report(&self.store.snapshot());
            egui::Grid::new("report_preview").num_columns(2).show(ui, |ui| {
                let rows = [
                    ("Operator", preview.operator_name.clone()),
                    ("Shift", preview.shift_id.clone()),
                    ("Date", format!("{} {}", preview.date, preview.time)),
                    ("Scanned", preview.total_scanned.to_string()),
                    ("Pass / Fail", format!("{} / {}", preview.pass_count, preview.fail_count)),
                    ("Fakes Found", preview.fakes_found.to_string()),
                ];
                for (label, value) in rows {
                    ui.label(RichText::new(label).weak());
                    ui.label(value);
                    ui.end_row();
                }
            });
            ui.add_space(6.0);

            ui.add_enabled_ui(!self.submitter.is_submitting(), |ui| {
                ui.label("Anomalies / notes");
                ui.add(
                    egui::TextEdit::multiline(&mut self.submitter.form.anomalies_note)
                        .desired_rows(4)
                        .desired_width(f32::INFINITY),
                );
                egui::ComboBox::from_label("Jig condition")
                    .selected_text(self.submitter.form.jig_condition.label())
                    .show_ui(ui, |ui| {
                        for jig in JigCondition::ALL {
                            ui.selectable_value(&mut self.submitter.form.jig_condition, jig, jig.label());
                        }
                    });
            });

            ui.horizontal(|ui| {
                if ui.add_enabled(!self.submitter.is_submitting(), egui::Button::new("Submit Report")).clicked() {
                    self.submit_report();
                }
                if self.submitter.is_submitting() {
                    ui.spinner();
                }
            });
            if let Some(err) = &self.report_error {
                ui.colored_label(tone_color(Tone::Fail), err);
            }
        }

        ui.add_space(16.0);
        ui.separator();
        ui.heading("Report an Issue");
        egui::ComboBox::from_label("Category")
            .selected_text(self.issue_category.label())
            .show_ui(ui, |ui| {
                for category in IssueCategory::ALL {
                    ui.selectable_value(&mut self.issue_category, category, category.label());
                }
            });
        ui.add(
            egui::TextEdit::multiline(&mut self.issue_text)
                .hint_text("What happened?")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        ui.horizontal(|ui| {
            let ready = !self.issue_text.trim().is_empty();
            if ui.add_enabled(ready, egui::Button::new("Send Issue")).clicked() {
                self.send_issue();
            }
            if !self.issue_status.is_empty() {
                ui.label(&self.issue_status);
            }
        });
    }
}

pub fn configure_fonts(ctx: &egui::Context) {
    let mut fonts = FontDefinitions::default();
    let candidates = [
        r"C:\Windows\Fonts\meiryo.ttc",
        "/System/Library/Fonts/Hiragino Sans GB.ttc",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    ];

    let Some(data) = candidates.iter().find_map(|path| std::fs::read(path).ok()) else {
        return;
    };
    fonts.font_data.insert("cjk".to_string(), FontData::from_owned(data));
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        // Appended so the default Latin glyphs stay primary.
        fonts.families.entry(family).or_default().push("cjk".to_string());
    }
    ctx.set_fonts(fonts);
}

impl eframe::App for DesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages(ctx);
        self.poll_scan();
        self.apply_theme(ctx);
        self.handle_input(ctx);

        if self.scan.is_some() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else if self.pending_jobs > 0 {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| self.top_bar(ui));

        egui::SidePanel::left("shift").resizable(false).min_width(200.0).show(ctx, |ui| {
            stats_panel(ui, &self.store.snapshot());
            ui.add_space(12.0);
            ui.label(RichText::new(format!("State: {}", self.flow.state().name())).weak());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Inspect, "Inspect");
                ui.selectable_value(&mut self.tab, Tab::History, "History");
                ui.selectable_value(&mut self.tab, Tab::Report, "Report");
            });
            ui.separator();
            match self.tab {
                Tab::Inspect => self.inspect_tab(ui),
                Tab::History => self.history_tab(ui),
                Tab::Report => self.report_tab(ui),
            }
        });
    }
}
