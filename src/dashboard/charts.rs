//! Inline SVG charts
//!
//! Each chart is a standalone `<svg>` element sized in user units and scaled
//! by CSS, so the page needs no script to draw them.

use std::f64::consts::PI;

/// One labelled value
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub label: String,
    pub value: u64,
}

impl Datum {
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

const PALETTE: &[&str] = &[
    "#d1495b", "#edae49", "#00798c", "#30638e", "#66a182", "#8d6a9f", "#e07a5f", "#3d405b",
];

const BAR_WIDTH: f64 = 640.0;
const BAR_LABEL_WIDTH: f64 = 190.0;
const BAR_ROW: f64 = 30.0;

const LINE_WIDTH: f64 = 720.0;
const LINE_HEIGHT: f64 = 280.0;
const LINE_PAD: f64 = 40.0;

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn colour(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

fn max_value(data: &[Datum]) -> u64 {
    data.iter().map(|d| d.value).max().unwrap_or(0).max(1)
}

/// Horizontal bar chart, one row per datum in the given order
pub fn bar_chart(title: &str, data: &[Datum]) -> String {
    let height = BAR_ROW * data.len() as f64 + 10.0;
    let track = BAR_WIDTH - BAR_LABEL_WIDTH - 50.0;
    let max = max_value(data) as f64;

    let mut svg = format!(
        "<svg class=\"chart bar\" viewBox=\"0 0 {} {}\" role=\"img\" aria-label=\"{}\">\n",
        BAR_WIDTH,
        height,
        escape_html(title)
    );
    for (i, datum) in data.iter().enumerate() {
        let y = 5.0 + BAR_ROW * i as f64;
        let width = (datum.value as f64 / max * track).max(1.0);
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>\n",
            BAR_LABEL_WIDTH - 8.0,
            y + 18.0,
            escape_html(&datum.label)
        ));
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}: {}</title></rect>\n",
            BAR_LABEL_WIDTH,
            y + 4.0,
            width,
            BAR_ROW - 8.0,
            colour(i),
            escape_html(&datum.label),
            datum.value
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\">{}</text>\n",
            BAR_LABEL_WIDTH + width + 6.0,
            y + 18.0,
            datum.value
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

/// Pie chart with a legend
pub fn pie_chart(title: &str, data: &[Datum]) -> String {
    let (cx, cy, r) = (150.0, 150.0, 130.0);
    let total: u64 = data.iter().map(|d| d.value).sum();

    let mut svg = format!(
        "<svg class=\"chart pie\" viewBox=\"0 0 560 {}\" role=\"img\" aria-label=\"{}\">\n",
        300.0_f64.max(24.0 * data.len() as f64 + 20.0),
        escape_html(title)
    );

    let slices: Vec<(usize, &Datum)> = data.iter().enumerate().filter(|(_, d)| d.value > 0).collect();
    if slices.len() == 1 {
        let (i, datum) = slices[0];
        svg.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"><title>{}: {}</title></circle>\n",
            cx,
            cy,
            r,
            colour(i),
            escape_html(&datum.label),
            datum.value
        ));
    } else if total > 0 {
        let mut angle = -PI / 2.0;
        for (i, datum) in slices {
            let sweep = datum.value as f64 / total as f64 * 2.0 * PI;
            let (x1, y1) = (cx + r * angle.cos(), cy + r * angle.sin());
            angle += sweep;
            let (x2, y2) = (cx + r * angle.cos(), cy + r * angle.sin());
            let large = if sweep > PI { 1 } else { 0 };
            svg.push_str(&format!(
                "<path d=\"M {cx} {cy} L {x1:.2} {y1:.2} A {r} {r} 0 {large} 1 {x2:.2} {y2:.2} Z\" fill=\"{}\" stroke=\"#fff\"><title>{}: {}</title></path>\n",
                colour(i),
                escape_html(&datum.label),
                datum.value
            ));
        }
    }

    for (i, datum) in data.iter().enumerate() {
        let y = 20.0 + 24.0 * i as f64;
        let share = if total == 0 {
            0.0
        } else {
            datum.value as f64 * 100.0 / total as f64
        };
        svg.push_str(&format!(
            "<rect x=\"320\" y=\"{:.1}\" width=\"14\" height=\"14\" fill=\"{}\"/>\n<text x=\"342\" y=\"{:.1}\">{} ({:.1}%)</text>\n",
            y,
            colour(i),
            y + 12.0,
            escape_html(&datum.label),
            share
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

/// Line chart over evenly spaced points, first and last label on the x axis
pub fn line_chart(title: &str, data: &[Datum]) -> String {
    let max = max_value(data) as f64;
    let plot_w = LINE_WIDTH - 2.0 * LINE_PAD;
    let plot_h = LINE_HEIGHT - 2.0 * LINE_PAD;
    let step = if data.len() > 1 {
        plot_w / (data.len() - 1) as f64
    } else {
        0.0
    };

    let points: Vec<(f64, f64)> = data
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let x = if data.len() > 1 {
                LINE_PAD + step * i as f64
            } else {
                LINE_PAD + plot_w / 2.0
            };
            let y = LINE_PAD + plot_h - d.value as f64 / max * plot_h;
            (x, y)
        })
        .collect();

    let mut svg = format!(
        "<svg class=\"chart line\" viewBox=\"0 0 {} {}\" role=\"img\" aria-label=\"{}\">\n",
        LINE_WIDTH,
        LINE_HEIGHT,
        escape_html(title)
    );
    svg.push_str(&format!(
        "<line x1=\"{p}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"#999\"/>\n<line x1=\"{p}\" y1=\"{p}\" x2=\"{p}\" y2=\"{b}\" stroke=\"#999\"/>\n",
        p = LINE_PAD,
        b = LINE_PAD + plot_h,
        r = LINE_PAD + plot_w
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>\n",
        LINE_PAD - 6.0,
        LINE_PAD + 4.0,
        max as u64
    ));

    if points.len() > 1 {
        let path: Vec<String> = points.iter().map(|(x, y)| format!("{:.1},{:.1}", x, y)).collect();
        svg.push_str(&format!(
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
            path.join(" "),
            colour(2)
        ));
    }
    for ((x, y), datum) in points.iter().zip(data) {
        svg.push_str(&format!(
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3.5\" fill=\"{}\"><title>{}: {}</title></circle>\n",
            x,
            y,
            colour(2),
            escape_html(&datum.label),
            datum.value
        ));
    }

    if let (Some(first), Some(last)) = (data.first(), data.last()) {
        let bottom = LINE_PAD + plot_h + 20.0;
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\">{}</text>\n",
            LINE_PAD,
            bottom,
            escape_html(&first.label)
        ));
        if data.len() > 1 {
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>\n",
                LINE_PAD + plot_w,
                bottom,
                escape_html(&last.label)
            ));
        }
    }
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Sana'a\" & co</b>"),
            "&lt;b&gt;&quot;Sana&#39;a&quot; &amp; co&lt;/b&gt;"
        );
    }

    #[test]
    fn test_bar_chart_rows() {
        let svg = bar_chart("Countries", &[Datum::new("Syria", 4), Datum::new("Iraq", 2)]);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains("Syria: 4"));
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn test_pie_single_slice_is_circle() {
        let svg = pie_chart("Violations", &[Datum::new("Torture", 3)]);
        assert!(svg.contains("<circle"));
        assert!(!svg.contains("<path"));
        assert!(svg.contains("Torture (100.0%)"));
    }

    #[test]
    fn test_pie_slices() {
        let svg = pie_chart(
            "Violations",
            &[Datum::new("Torture", 3), Datum::new("Other", 1)],
        );
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("Other (25.0%)"));
    }

    #[test]
    fn test_line_chart_axis_labels() {
        let svg = line_chart(
            "Timeline",
            &[
                Datum::new("2024-01-02", 1),
                Datum::new("2024-01-05", 3),
                Datum::new("2024-02-01", 2),
            ],
        );
        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains(">2024-01-02</text>"));
        assert!(svg.contains(">2024-02-01</text>"));
    }

    #[test]
    fn test_line_chart_single_point() {
        let svg = line_chart("Timeline", &[Datum::new("2024-03-01", 5)]);
        assert!(!svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 1);
    }
}
