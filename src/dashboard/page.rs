//! Dashboard HTML page
//!
//! A single self-contained document: sidebar filter form, the three result
//! sets as inline SVG charts, a world choropleth drawn by D3 from the country
//! counts, and export links.

use serde_json::json;

use super::charts::{bar_chart, escape_html, line_chart, pie_chart, Datum};
use super::export::{file_name, ExportFormat, ExportKind};
use crate::analytics::{AnalyticsFilter, CountBucket, DashboardData};
use crate::models::dates::DAY_FORMAT;
use crate::models::ViolationType;

/// Shown in place of a chart when its result set is empty
pub const NO_DATA: &str = "No data for selected filters.";

const WORLD_GEOJSON: &str =
    "https://raw.githubusercontent.com/holtzy/D3-graph-gallery/master/DATA/world.geojson";

/// Where export links point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportLinks {
    /// `/export/...` routes of the running dashboard, keeping the filter
    Served,
    /// Sibling files written by `export --out`
    Files,
}

fn data_for(kind: ExportKind, rows: &[CountBucket]) -> Vec<Datum> {
    rows.iter()
        .map(|b| Datum::new(kind.display_key(&b.key), b.count))
        .collect()
}

pub fn render_page(filter: &AnalyticsFilter, data: &DashboardData, links: ExportLinks) -> String {
    let mut html = String::with_capacity(16 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str("<title>Human Rights Dashboard</title>\n<style>\n");
    html.push_str(INLINE_CSS);
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str(&sidebar(filter));

    html.push_str("<main>\n<h1>Human Rights Dashboard</h1>\n");
    html.push_str(&format!(
        "<p class=\"range\">{} to {}</p>\n",
        filter.from.format(DAY_FORMAT),
        filter.to.format(DAY_FORMAT)
    ));

    // Violations by type
    html.push_str("<section id=\"violations\">\n<h2>Violations by Type</h2>\n");
    if data.violations.is_empty() {
        html.push_str(&no_data());
    } else {
        let rows = data_for(ExportKind::Violations, &data.violations);
        html.push_str(&bar_chart("Violations by type", &rows));
        html.push_str("<h3>Violation Distribution</h3>\n");
        html.push_str(&pie_chart("Violation distribution", &rows));
    }
    html.push_str("</section>\n");

    // Violations by country
    html.push_str("<section id=\"countries\">\n<h2>Violations by Country</h2>\n");
    if data.countries.is_empty() {
        html.push_str(&no_data());
    } else {
        let rows = data_for(ExportKind::Countries, &data.countries);
        html.push_str(&bar_chart("Reports by country", &rows));
        html.push_str("<h3>Map of Violations by Country</h3>\n");
        html.push_str(&choropleth(&data.countries));
    }
    html.push_str("</section>\n");

    // Timeline
    html.push_str("<section id=\"timeline\">\n<h2>Reports Timeline</h2>\n");
    if data.timeline.is_empty() {
        html.push_str(&no_data());
    } else {
        let rows = data_for(ExportKind::Timeline, &data.timeline);
        html.push_str(&line_chart("Reports per day", &rows));
    }
    html.push_str("</section>\n");

    html.push_str(&downloads(filter, data, links));

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn no_data() -> String {
    format!("<p class=\"notice\">{}</p>\n", NO_DATA)
}

fn sidebar(filter: &AnalyticsFilter) -> String {
    let mut html = String::from("<aside>\n<h2>Filters</h2>\n<form method=\"get\" action=\"/\">\n");

    html.push_str("<label for=\"violation_type\">Violation Type</label>\n");
    html.push_str("<select id=\"violation_type\" name=\"violation_type\">\n<option value=\"\">All</option>\n");
    for violation in ViolationType::ALL {
        let selected = if filter.violation_type == Some(*violation) {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            violation.as_str(),
            selected,
            violation.label()
        ));
    }
    html.push_str("</select>\n");

    html.push_str(&format!(
        "<label for=\"country\">Country</label>\n<input id=\"country\" name=\"country\" type=\"text\" value=\"{}\">\n",
        escape_html(filter.country.as_deref().unwrap_or_default())
    ));
    html.push_str(&format!(
        "<label for=\"from\">From Date</label>\n<input id=\"from\" name=\"from\" type=\"date\" value=\"{}\">\n",
        filter.from.format(DAY_FORMAT)
    ));
    html.push_str(&format!(
        "<label for=\"to\">To Date</label>\n<input id=\"to\" name=\"to\" type=\"date\" value=\"{}\">\n",
        filter.to.format(DAY_FORMAT)
    ));
    html.push_str("<button type=\"submit\">Apply</button>\n</form>\n</aside>\n");
    html
}

/// Country counts as a JSON literal safe to embed in a script element
fn country_json(countries: &[CountBucket]) -> String {
    let rows: Vec<_> = countries
        .iter()
        .map(|b| json!({ "country": b.key, "count": b.count }))
        .collect();
    serde_json::Value::Array(rows)
        .to_string()
        .replace("</", "<\\/")
}

fn choropleth(countries: &[CountBucket]) -> String {
    format!(
        r##"<div id="map"></div>
<script src="https://d3js.org/d3.v7.min.js"></script>
<script>
const counts = {data};
const max = Math.max(1, ...counts.map(c => c.count));
const lookup = new Map(counts.map(c => [c.country.toLowerCase(), c.count]));
const width = 800, height = 450;
const svg = d3.select("#map").append("svg").attr("viewBox", `0 0 ${{width}} ${{height}}`);
const projection = d3.geoNaturalEarth1().scale(150).translate([width / 2, height / 2]);
const path = d3.geoPath().projection(projection);
const shade = d3.scaleSequential(d3.interpolateOrRd).domain([0, max]);
d3.json("{geojson}").then(world => {{
  svg.selectAll("path")
    .data(world.features)
    .join("path")
    .attr("d", path)
    .attr("fill", d => {{
      const n = lookup.get(d.properties.name.toLowerCase());
      return n ? shade(n) : "#ddd";
    }})
    .attr("stroke", "white")
    .attr("stroke-width", 0.5)
    .append("title")
    .text(d => {{
      const n = lookup.get(d.properties.name.toLowerCase());
      return n ? `${{d.properties.name}}: ${{n}}` : d.properties.name;
    }});
}});
</script>
"##,
        data = country_json(countries),
        geojson = WORLD_GEOJSON
    )
}

fn downloads(filter: &AnalyticsFilter, data: &DashboardData, links: ExportLinks) -> String {
    let mut html = String::from("<section id=\"downloads\">\n<h2>Download Data</h2>\n<ul>\n");
    let query = filter.to_query();

    let mut any = false;
    for kind in ExportKind::ALL {
        if kind.rows(data).is_empty() {
            continue;
        }
        any = true;
        for format in ExportFormat::ALL {
            let name = file_name(kind, format);
            let href = match links {
                ExportLinks::Served => format!("/export/{}?{}", name, query),
                ExportLinks::Files => name.clone(),
            };
            html.push_str(&format!(
                "<li><a href=\"{}\" download>{}</a></li>\n",
                escape_html(&href),
                name
            ));
        }
    }
    if !any {
        html.push_str(&format!("<li>{}</li>\n", NO_DATA));
    }

    html.push_str("</ul>\n</section>\n");
    html
}

const INLINE_CSS: &str = r#"
body { margin: 0; display: flex; font-family: -apple-system, "Segoe UI", Roboto, sans-serif; color: #222; }
aside { width: 240px; min-height: 100vh; padding: 1rem; background: #f4f5f7; box-sizing: border-box; }
aside label { display: block; margin-top: 0.8rem; font-size: 0.85rem; font-weight: 600; }
aside input, aside select { width: 100%; padding: 0.3rem; box-sizing: border-box; }
aside button { margin-top: 1rem; width: 100%; padding: 0.5rem; }
main { flex: 1; padding: 1rem 2rem; max-width: 960px; }
section { margin-bottom: 2rem; }
.range { color: #666; }
.notice { padding: 0.6rem 1rem; background: #e8f1fb; border-left: 4px solid #30638e; }
.chart { width: 100%; height: auto; font-size: 12px; }
#map svg { width: 100%; height: auto; }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> AnalyticsFilter {
        AnalyticsFilter::parse(Some("2024-01-01"), Some("2024-05-31"), None, None).unwrap()
    }

    #[test]
    fn test_empty_data_shows_notice_everywhere() {
        let html = render_page(&filter(), &DashboardData::default(), ExportLinks::Served);
        assert_eq!(html.matches(NO_DATA).count(), 4);
        assert!(!html.contains("<svg"));
        assert!(!html.contains("d3.v7"));
    }

    #[test]
    fn test_full_page() {
        let data = DashboardData {
            violations: vec![CountBucket::new("unlawful_killing", 2)],
            countries: vec![CountBucket::new("Syria", 2)],
            timeline: vec![CountBucket::new("2024-03-01", 2)],
        };
        let html = render_page(&filter(), &data, ExportLinks::Served);
        assert!(!html.contains(NO_DATA));
        assert!(html.contains("Unlawful Killing"));
        assert!(html.contains(r#""country":"Syria""#));
        assert!(html.contains(r#""count":2"#));
        assert!(html.contains(r##"d3.select("#map").append("svg")"##));
        assert!(html.contains(r##"return n ? shade(n) : "#ddd";"##));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(html.contains("/export/violations.csv?from=2024-01-01&amp;to=2024-05-31"));
        assert!(html.contains("value=\"2024-05-31\""));
    }

    #[test]
    fn test_file_links() {
        let data = DashboardData {
            countries: vec![CountBucket::new("Iraq", 1)],
            ..Default::default()
        };
        let html = render_page(&filter(), &data, ExportLinks::Files);
        assert!(html.contains("href=\"countries.xlsx\""));
        assert!(!html.contains("violations.csv"));
    }

    #[test]
    fn test_country_names_are_escaped() {
        let filter = AnalyticsFilter::parse(None, None, Some("torture"), Some("<x>")).unwrap();
        let html = render_page(&filter, &DashboardData::default(), ExportLinks::Served);
        assert!(html.contains("value=\"&lt;x&gt;\""));
        assert!(html.contains("<option value=\"torture\" selected>"));

        let json = country_json(&[CountBucket::new("</script>", 1)]);
        assert!(!json.contains("</script>"));
    }
}
