//! Drawing for result panels, history and shift stats.

use eframe::egui::{self, Color32, RichText};
use ic_inspect_common::render::{
    Badge, BranchAView, BranchBView, Field, HistoryRow, StatusView, TraceabilityView,
};
use ic_inspect_common::{AppState, ResultView, Tone};

pub fn tone_color(tone: Tone) -> Color32 {
    match tone {
        Tone::Pass => Color32::from_rgb(64, 186, 112),
        Tone::Fail => Color32::from_rgb(226, 76, 76),
        Tone::Attention => Color32::from_rgb(246, 196, 69),
        Tone::Neutral => Color32::from_gray(150),
    }
}

fn pass_tone(passed: bool) -> Tone {
    if passed { Tone::Pass } else { Tone::Fail }
}

fn card<R>(ui: &mut egui::Ui, accent: Color32, add_contents: impl FnOnce(&mut egui::Ui) -> R) -> R {
    egui::Frame::group(ui.style())
        .stroke(egui::Stroke::new(1.0, accent))
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(egui::Margin::same(10.0))
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            add_contents(ui)
        })
        .inner
}

fn fields_grid(ui: &mut egui::Ui, id: &str, fields: &[Field], badges: &[&Badge]) {
    if fields.is_empty() && badges.is_empty() {
        return;
    }
    egui::Grid::new(id).num_columns(2).striped(true).show(ui, |ui| {
        for field in fields {
            ui.label(RichText::new(field.label).weak());
            ui.label(&field.value);
            ui.end_row();
        }
        for badge in badges {
            ui.label(RichText::new(badge.label).weak());
            ui.label(RichText::new(&badge.value).strong().color(tone_color(badge.tone)));
            ui.end_row();
        }
    });
}

fn flag_list(ui: &mut egui::Ui, flags: &[&str], clear_text: &str) {
    if flags.is_empty() {
        ui.colored_label(tone_color(Tone::Pass), format!("✔ {clear_text}"));
    }
    for flag in flags {
        ui.colored_label(tone_color(Tone::Attention), format!("⚠ {flag}"));
    }
}

pub fn status_banner(ui: &mut egui::Ui, status: &StatusView) {
    let color = tone_color(status.tone);
    card(ui, color, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new(status.status.as_str()).size(28.0).strong().color(color));
            ui.add_space(16.0);
            ui.label(RichText::new(format!("Confidence {}", status.confidence_percent())).size(16.0));
        });
        ui.add(egui::ProgressBar::new(status.confidence.clamp(0.0, 1.0) as f32).fill(color));
        if let Some(reason) = &status.reason {
            ui.label(RichText::new(reason).color(color));
        }
    });
}

pub fn result_panels(
    ui: &mut egui::Ui,
    view: &ResultView,
    registered: Option<&egui::TextureHandle>,
) {
    status_banner(ui, &view.status);
    ui.add_space(8.0);

    ui.columns(2, |columns| {
        if let Some(a) = &view.branch_a {
            branch_a_panel(&mut columns[0], a, registered);
        }
        if let Some(b) = &view.branch_b {
            branch_b_panel(&mut columns[1], b);
        }
    });

    if let Some(t) = &view.traceability {
        ui.add_space(8.0);
        traceability_panel(ui, t);
    }
}

fn branch_a_panel(ui: &mut egui::Ui, a: &BranchAView, registered: Option<&egui::TextureHandle>) {
    let color = tone_color(pass_tone(a.passed));
    card(ui, color, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Branch A · Physical Integrity");
            ui.label(RichText::new(if a.passed { "PASS" } else { "FAIL" }).strong().color(color));
        });

        let gauge_tone = if a.suspicious { Tone::Fail } else { Tone::Pass };
        ui.label(format!(
            "Anomaly Score {:.3} / threshold {} ({})",
            a.anomaly_score,
            a.threshold,
            if a.suspicious { "Suspicious" } else { "Normal" }
        ));
        ui.add(egui::ProgressBar::new(a.gauge as f32).fill(tone_color(gauge_tone)));

        if let Some(t) = &a.texture {
            egui::Grid::new("texture_grid").num_columns(2).show(ui, |ui| {
                ui.label(RichText::new("Anomalous Regions").weak());
                ui.label(t.anomalous_regions.to_string());
                ui.end_row();
                ui.label(RichText::new("Max Entropy Patch").weak());
                ui.label(&t.max_entropy);
                ui.end_row();
            });
        }

        if let Some(flags) = &a.physical_flags {
            flag_list(ui, flags, "No physical anomalies detected");
        }

        if a.preprocessed_image_url.is_some() {
            ui.separator();
            ui.label(RichText::new("Preprocessed Image").weak());
            match registered {
                Some(texture) => {
                    let width = ui.available_width().min(320.0);
                    let aspect = texture.aspect_ratio().max(0.01);
                    ui.add(egui::Image::new(texture).fit_to_exact_size(egui::vec2(width, width / aspect)));
                }
                None => {
                    ui.label(RichText::new("Image not available").italics().weak());
                }
            }
        }
    });
}

fn branch_b_panel(ui: &mut egui::Ui, b: &BranchBView) {
    let color = tone_color(pass_tone(b.passed));
    card(ui, color, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Branch B · Data & Marking");
            ui.label(RichText::new(if b.passed { "PASS" } else { "FAIL" }).strong().color(color));
        });

        if let Some(ocr) = &b.ocr {
            egui::CollapsingHeader::new("B1 · OCR & Text Verification")
                .default_open(true)
                .show(ui, |ui| {
                    let badges: Vec<&Badge> = ocr.matches.iter().collect();
                    fields_grid(ui, "ocr_grid", &ocr.fields, &badges);
                    if let Some(confidence) = &ocr.confidence {
                        ui.label(format!("OCR Confidence {confidence}"));
                    }
                });
        }

        if let Some(ds) = &b.datasheet {
            egui::CollapsingHeader::new("B2 · Datasheet & Rule Extraction")
                .default_open(true)
                .show(ui, |ui| {
                    let mut badges = vec![&ds.status];
                    badges.extend(ds.rule_parsing.as_ref());
                    let mut fields = ds.source.clone();
                    fields.extend(ds.marking_rules.iter().flatten().cloned());
                    fields_grid(ui, "datasheet_grid", &fields, &badges);
                    if let Some(url) = &ds.source_url {
                        ui.hyperlink_to("Open datasheet", url);
                    }
                });
        }

        if let Some(layout) = &b.layout {
            egui::CollapsingHeader::new("B3 · Layout & Position Check")
                .default_open(true)
                .show(ui, |ui| {
                    let deviations = layout.deviations.clone().unwrap_or_default();
                    fields_grid(ui, "layout_grid", &deviations, &[&layout.check]);
                    if let Some(flags) = &layout.flags {
                        flag_list(ui, flags, "No layout anomalies");
                    }
                });
        }
    });
}

fn traceability_panel(ui: &mut egui::Ui, t: &TraceabilityView) {
    card(ui, tone_color(Tone::Neutral), |ui| {
        ui.heading("Traceability");
        let mut fields = t.fields.clone();
        fields.extend(t.image_references.iter().flatten().cloned());
        if let Some(rule) = &t.rule_id {
            fields.push(Field { label: "Rule Source", value: rule.clone() });
        }
        if let Some(comments) = &t.override_comments {
            fields.push(Field { label: "Comments", value: comments.clone() });
        }
        let badges: Vec<&Badge> = t.override_status.iter().collect();
        fields_grid(ui, "trace_grid", &fields, &badges);
    });
}

pub fn stats_panel(ui: &mut egui::Ui, state: &AppState) {
    let stats = state.shift_stats;
    ui.heading("Shift");
    ui.label(format!("{} · {}", state.worker.name, state.worker.shift_id));
    ui.separator();

    egui::Grid::new("stats_grid").num_columns(2).show(ui, |ui| {
        let rows = [
            ("Scanned", stats.total_scanned, Tone::Neutral),
            ("Pass", stats.pass_count, Tone::Pass),
            ("Fail", stats.fail_count, Tone::Fail),
            ("Fakes Found", stats.fakes_found, Tone::Fail),
            ("Review Needed", stats.review_needed, Tone::Attention),
        ];
        for (label, value, tone) in rows {
            ui.label(label);
            ui.label(RichText::new(value.to_string()).strong().color(tone_color(tone)));
            ui.end_row();
        }
    });

    let rate = stats.pass_rate_percent();
    ui.add(egui::ProgressBar::new(rate as f32 / 100.0).text(format!("Pass rate {rate}%")));
}

/// Returns the clicked row index.
pub fn history_table(ui: &mut egui::Ui, rows: &[HistoryRow], selected: Option<usize>) -> Option<usize> {
    let mut clicked = None;
    egui::Grid::new("history_grid")
        .num_columns(5)
        .striped(true)
        .min_col_width(80.0)
        .show(ui, |ui| {
            for header in ["Status", "Inspection ID", "Part Number", "Time", "Reason"] {
                ui.label(RichText::new(header).strong());
            }
            ui.end_row();

            for (index, row) in rows.iter().enumerate() {
                let tone = ic_inspect_common::render::status_tone(row.status);
                let label = RichText::new(row.status.as_str()).color(tone_color(tone));
                if ui.selectable_label(selected == Some(index), label).clicked() {
                    clicked = Some(index);
                }
                ui.label(&row.inspection_id);
                ui.label(&row.part_number);
                ui.label(&row.timestamp);
                ui.label(&row.reason);
                ui.end_row();
            }
        });
    clicked
}
