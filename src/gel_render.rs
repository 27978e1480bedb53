//! SVG rendering of the electrophoresis result gel.

use crate::DNA_LADDERS;
use crate::engine::{EngineError, ErrorCode};
use std::collections::BTreeSet;
use svg::Document;
use svg::node::element::{Line, Rectangle, Text};

const SVG_WIDTH: f32 = 760.0;
const SVG_HEIGHT: f32 = 560.0;
const GEL_LEFT: f32 = 80.0;
const GEL_RIGHT: f32 = SVG_WIDTH - 150.0;
const GEL_TOP: f32 = 70.0;
const GEL_BOTTOM: f32 = SVG_HEIGHT - 80.0;

#[derive(Clone, Debug)]
pub struct GelBand {
    pub bp: usize,
    pub intensity: f32,
}

#[derive(Clone, Debug)]
pub struct GelLane {
    pub name: String,
    pub is_ladder: bool,
    pub bands: Vec<GelBand>,
}

#[derive(Clone, Debug)]
pub struct GelLayout {
    pub lanes: Vec<GelLane>,
    pub range_min_bp: usize,
    pub range_max_bp: usize,
}

impl GelLayout {
    pub fn from_lanes(lanes: Vec<GelLane>) -> Result<Self, EngineError> {
        if lanes.is_empty() {
            return Err(EngineError {
                code: ErrorCode::InvalidInput,
                message: "Gel layout needs at least one lane".to_string(),
            });
        }
        let bps: Vec<usize> = lanes
            .iter()
            .flat_map(|lane| lane.bands.iter().map(|band| band.bp))
            .filter(|bp| *bp > 0)
            .collect();
        if bps.is_empty() {
            return Err(EngineError {
                code: ErrorCode::InvalidInput,
                message: "Gel layout needs at least one band with bp > 0".to_string(),
            });
        }
        let min_band = bps.iter().copied().min().unwrap_or(1);
        let max_band = bps.iter().copied().max().unwrap_or(min_band);
        let range_min_bp = ((min_band as f64) * 0.72).floor().max(1.0) as usize;
        let mut range_max_bp = ((max_band as f64) * 1.30).ceil().max(2.0) as usize;
        if range_max_bp <= range_min_bp {
            range_max_bp = range_min_bp + 1;
        }
        Ok(Self {
            lanes,
            range_min_bp,
            range_max_bp,
        })
    }

    /// Log-scaled migration: short fragments run far, long fragments stay
    /// near the wells.
    pub fn y_for_bp(&self, bp: usize, top: f32, bottom: f32) -> f32 {
        let min_bp = self.range_min_bp.max(1) as f64;
        let max_bp = self.range_max_bp.max(self.range_min_bp + 1) as f64;
        let bp = bp.clamp(self.range_min_bp.max(1), self.range_max_bp.max(2)) as f64;
        let log_min = min_bp.log10();
        let log_max = max_bp.log10();
        let denom = (log_max - log_min).max(1e-6);
        let f = ((log_max - bp.log10()) / denom) as f32;
        top + f.clamp(0.0, 1.0) * (bottom - top)
    }
}

fn ladder_lane(ladder_name: &str) -> Result<GelLane, EngineError> {
    let ladder = DNA_LADDERS.get(ladder_name).ok_or_else(|| EngineError {
        code: ErrorCode::NotFound,
        message: format!("Unknown DNA ladder '{ladder_name}'"),
    })?;
    let max_strength = ladder
        .bands()
        .iter()
        .filter_map(|band| band.relative_strength)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let bands = ladder
        .bands()
        .iter()
        .map(|band| {
            let raw = band.relative_strength.unwrap_or(1.0).max(0.1);
            GelBand {
                bp: band.length_bp().round().max(1.0) as usize,
                intensity: (raw / max_strength).clamp(0.18, 1.0) as f32,
            }
        })
        .collect();
    Ok(GelLane {
        name: ladder.name().to_string(),
        is_ladder: true,
        bands,
    })
}

fn sample_lane(name: &str, bands: &[(usize, f32)]) -> GelLane {
    GelLane {
        name: name.to_string(),
        is_ladder: false,
        bands: bands
            .iter()
            .map(|(bp, intensity)| GelBand {
                bp: *bp,
                intensity: *intensity,
            })
            .collect(),
    }
}

/// The result gel of the simulated run: marker, PCR product, negative and
/// positive controls, two samples.
pub fn result_gel_layout(ladder_name: &str) -> Result<GelLayout, EngineError> {
    let lanes = vec![
        ladder_lane(ladder_name)?,
        sample_lane("PCR product", &[(3500, 0.9)]),
        sample_lane("Negative control", &[]),
        sample_lane("Positive control", &[(3500, 0.95)]),
        sample_lane("Sample 1", &[(3600, 0.7), (2800, 0.7)]),
        sample_lane("Sample 2", &[(3400, 0.75)]),
    ];
    GelLayout::from_lanes(lanes)
}

pub fn render_gel_svg(layout: &GelLayout) -> Document {
    let gel_width = GEL_RIGHT - GEL_LEFT;
    let gel_height = GEL_BOTTOM - GEL_TOP;
    let lane_gap = gel_width / (layout.lanes.len() as f32 + 1.0);

    let mut doc = Document::new()
        .set("viewBox", (0, 0, SVG_WIDTH, SVG_HEIGHT))
        .set("width", SVG_WIDTH)
        .set("height", SVG_HEIGHT)
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", SVG_WIDTH)
                .set("height", SVG_HEIGHT)
                .set("fill", "#f9fafb"),
        )
        .add(
            Rectangle::new()
                .set("x", GEL_LEFT)
                .set("y", GEL_TOP)
                .set("width", gel_width)
                .set("height", gel_height)
                .set("rx", 10)
                .set("ry", 10)
                .set("fill", "#111315"),
        )
        .add(
            Text::new("Agarose Gel Electrophoresis Results")
                .set("x", SVG_WIDTH / 2.0)
                .set("y", 40.0)
                .set("text-anchor", "middle")
                .set("font-family", "monospace")
                .set("font-size", 18)
                .set("fill", "#0f172a"),
        );

    // bp scale from the ladder bands, thinned to avoid overlapping labels
    let mut tick_bps = BTreeSet::new();
    for lane in layout.lanes.iter().filter(|l| l.is_ladder) {
        for band in &lane.bands {
            tick_bps.insert(band.bp);
        }
    }
    if tick_bps.is_empty() {
        tick_bps.insert(layout.range_min_bp);
        tick_bps.insert(layout.range_max_bp);
    }
    let mut accepted_ticks: Vec<usize> = vec![];
    let mut last_y: Option<f32> = None;
    for bp in tick_bps.iter().rev() {
        let y = layout.y_for_bp(*bp, GEL_TOP, GEL_BOTTOM);
        if last_y.map(|v| (v - y).abs() >= 16.0).unwrap_or(true) {
            accepted_ticks.push(*bp);
            last_y = Some(y);
        }
    }
    for bp in accepted_ticks {
        let y = layout.y_for_bp(bp, GEL_TOP, GEL_BOTTOM);
        doc = doc
            .add(
                Line::new()
                    .set("x1", GEL_LEFT)
                    .set("y1", y)
                    .set("x2", GEL_RIGHT)
                    .set("y2", y)
                    .set("stroke", "#2d3238")
                    .set("stroke-width", 1),
            )
            .add(
                Text::new(format!("{bp} bp"))
                    .set("x", GEL_RIGHT + 12.0)
                    .set("y", y + 4.0)
                    .set("font-family", "monospace")
                    .set("font-size", 12)
                    .set("fill", "#374151"),
            );
    }

    for (lane_idx, lane) in layout.lanes.iter().enumerate() {
        let x = GEL_LEFT + lane_gap * (lane_idx as f32 + 1.0);
        let lane_fill = if lane.is_ladder { "#1a2028" } else { "#1f252e" };
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", x - 30.0)
                    .set("y", GEL_TOP + 10.0)
                    .set("width", 60.0)
                    .set("height", gel_height - 20.0)
                    .set("rx", 6)
                    .set("ry", 6)
                    .set("fill", lane_fill),
            )
            // loading well
            .add(
                Rectangle::new()
                    .set("x", x - 18.0)
                    .set("y", GEL_TOP + 12.0)
                    .set("width", 36.0)
                    .set("height", 8.0)
                    .set("rx", 2)
                    .set("ry", 2)
                    .set("fill", "#e5e7eb")
                    .set("opacity", 0.35),
            )
            .add(
                Text::new(lane.name.clone())
                    .set("x", x)
                    .set("y", GEL_BOTTOM + 26.0)
                    .set("text-anchor", "middle")
                    .set("font-family", "monospace")
                    .set("font-size", 12)
                    .set("fill", "#0f172a"),
            );

        for band in &lane.bands {
            let y = layout.y_for_bp(band.bp, GEL_TOP + 24.0, GEL_BOTTOM - 14.0);
            let width = if lane.is_ladder {
                28.0 + 16.0 * band.intensity
            } else {
                34.0 + 20.0 * band.intensity
            };
            let height = if lane.is_ladder {
                2.5 + 2.5 * band.intensity
            } else {
                3.0 + 3.0 * band.intensity
            };
            let fill = if lane.is_ladder { "#e5e7eb" } else { "#f59e0b" };
            doc = doc.add(
                Rectangle::new()
                    .set("x", x - width * 0.5)
                    .set("y", y - height * 0.5)
                    .set("width", width)
                    .set("height", height)
                    .set("rx", 2)
                    .set("ry", 2)
                    .set("fill", fill)
                    .set("opacity", (0.42 + 0.58 * band.intensity).clamp(0.35, 1.0)),
            );
        }
    }

    doc
}

pub fn write_gel_svg(layout: &GelLayout, path: &str) -> Result<(), EngineError> {
    let doc = render_gel_svg(layout);
    svg::save(path, &doc).map_err(|e| EngineError {
        code: ErrorCode::Io,
        message: format!("Could not write gel SVG '{path}': {e}"),
    })
}
