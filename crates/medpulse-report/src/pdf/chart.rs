//! Pie charts drawn as vector polygons.

use std::f32::consts::PI;

use super::layout::{text_width, Font, Layout, Rgb, MARGIN, PAGE_WIDTH};

const PALETTE: &[Rgb] = &[
    (0.12, 0.47, 0.71),
    (1.00, 0.50, 0.05),
    (0.17, 0.63, 0.17),
    (0.84, 0.15, 0.16),
    (0.58, 0.40, 0.74),
    (0.55, 0.34, 0.29),
    (0.89, 0.47, 0.76),
];

/// Maximum angle covered by one straight edge of the arc approximation.
const ARC_STEP: f32 = PI / 36.0;

/// One polygon per non-zero count: the centre followed by points along
/// the slice's arc. Slices start at twelve o'clock and run clockwise.
pub fn slice_polygons(counts: &[usize], cx: f32, cy: f32, radius: f32) -> Vec<Vec<(f32, f32)>> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut polygons = Vec::new();
    let mut start = PI / 2.0;
    for &count in counts {
        if count == 0 {
            continue;
        }
        let sweep = 2.0 * PI * count as f32 / total as f32;
        let steps = (sweep / ARC_STEP).ceil().max(1.0) as usize;
        let mut points = Vec::with_capacity(steps + 2);
        points.push((cx, cy));
        for i in 0..=steps {
            let angle = start - sweep * i as f32 / steps as f32;
            points.push((cx + radius * angle.cos(), cy + radius * angle.sin()));
        }
        polygons.push(points);
        start -= sweep;
    }
    polygons
}

/// Percentage label, one decimal place.
pub fn share_label(label: &str, count: usize, total: usize) -> String {
    let pct = if total == 0 { 0.0 } else { 100.0 * count as f32 / total as f32 };
    format!("{label} ({pct:.1}%)")
}

/// Draws a titled pie with a legend underneath, inside a column of
/// `width` points starting at `left`, below `top`.
pub fn draw_pie(layout: &mut Layout, title: &str, entries: &[(String, usize)], left: f32, top: f32, width: f32) {
    let title_x = left + (width - text_width(title, 12.0)).max(0.0) / 2.0;
    layout.text_at(title_x, top - 14.0, title, Font::Bold, 12.0);

    let radius = (width / 2.0 - 20.0).min(80.0);
    let cx = left + width / 2.0;
    let cy = top - 30.0 - radius;

    let counts: Vec<usize> = entries.iter().map(|(_, n)| *n).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        layout.text_at(cx - 20.0, cy, "No data", Font::Italic, 10.0);
        return;
    }

    let polygons = slice_polygons(&counts, cx, cy, radius);
    let visible = entries.iter().filter(|(_, n)| *n > 0);
    let mut legend_y = cy - radius - 20.0;
    for (i, ((label, count), polygon)) in visible.zip(&polygons).enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        layout.fill_polygon(polygon, color);
        layout.fill_rect(left + 10.0, legend_y, 8.0, 8.0, color);
        layout.text_at(left + 22.0, legend_y, &share_label(label, *count, total), Font::Regular, 9.0);
        legend_y -= 13.0;
    }
}

/// Height a pie with `entries` legend rows needs.
pub fn pie_height(entries: usize, width: f32) -> f32 {
    let radius = (width / 2.0 - 20.0).min(80.0);
    30.0 + 2.0 * radius + 20.0 + 13.0 * entries as f32
}

/// Two pies side by side under the current cursor.
pub fn draw_pie_pair(layout: &mut Layout, left: (&str, &[(String, usize)]), right: (&str, &[(String, usize)])) {
    let column = (PAGE_WIDTH - 2.0 * MARGIN) / 2.0;
    let rows = left.1.len().max(right.1.len());
    let top = layout.reserve(pie_height(rows, column));
    draw_pie(layout, left.0, left.1, MARGIN, top, column);
    draw_pie(layout, right.0, right.1, MARGIN + column, top, column);
    layout.ln(10.0);
}
