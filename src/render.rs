use crate::models::{Evaluation, Location};
use crate::report::{AccessibilityData, ReportData, ReportRequest, VolunteerData};
use crate::stats::{accessibility_summary, format_rate, rate, volunteer_summary};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

const MAX_LOCATION_ROWS: usize = 20;
const MAX_EVALUATION_ROWS: usize = 15;
const MAX_VOLUNTEER_ROWS: usize = 20;

const LOW_ACCESSIBILITY_RATE: f64 = 50.0;
const LOW_AVAILABILITY_RATE: f64 = 70.0;
const LOW_EVALUATION_COUNT: u64 = 10;

#[derive(Debug, Serialize)]
struct MapMarker {
    lat: f64,
    lng: f64,
    label: String,
    rating: f64,
    color: &'static str,
    status: &'static str,
}

#[derive(Debug, PartialEq)]
struct MapView {
    center_lat: f64,
    center_lng: f64,
    zoom: u8,
}

/// Renders a self-contained HTML document for an already collected report.
pub fn render_report(
    request: &ReportRequest,
    data: &ReportData,
    generated_at: DateTime<Utc>,
) -> String {
    let title = request.report_type.title();
    let date = generated_at.format("%B %-d, %Y").to_string();
    let heatmap = request.options.include_heatmap && data.accessibility().is_some();

    let mut html = String::with_capacity(32 * 1024);
    html.push_str(
        &REPORT_HEAD
            .replace("{{TITLE}}", title)
            .replace("{{MAP_CSS}}", if heatmap { LEAFLET_CSS } else { "" }),
    );
    html.push_str(&render_header(title, &date, request));

    if let Some(accessibility) = data.accessibility() {
        html.push_str(&render_accessibility(accessibility, heatmap));
    }
    if let Some(volunteers) = data.volunteers() {
        html.push_str(&render_volunteers(volunteers));
    }
    if let ReportData::Full {
        accessibility,
        volunteers,
    } = data
    {
        html.push_str(&render_executive_summary(accessibility, volunteers));
    }

    html.push_str(&REPORT_FOOTER.replace("{{DATE}}", &date));
    if let Some(accessibility) = data.accessibility().filter(|_| heatmap) {
        if !accessibility.locations.is_empty() {
            html.push_str(&render_map_script(&accessibility.locations));
        }
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn render_header(title: &str, date: &str, request: &ReportRequest) -> String {
    let period = if request.start_date.is_some() || request.end_date.is_some() {
        format!(
            "Period: {} to {}",
            esc(request.start_date.as_deref().unwrap_or("Beginning")),
            esc(request.end_date.as_deref().unwrap_or("Today"))
        )
    } else {
        "All available data".to_string()
    };

    format!(
        "<div class=\"header\">\n  <h1 class=\"title\">{title}</h1>\n  \
         <p class=\"subtitle\">Generated on {date}</p>\n  \
         <p class=\"subtitle\" id=\"period\">{period}</p>\n</div>\n"
    )
}

fn render_accessibility(data: &AccessibilityData, heatmap: bool) -> String {
    let summary = accessibility_summary(&data.locations);
    let mut out = String::new();
    out.push_str("<div class=\"section\" id=\"accessibility\">\n");
    out.push_str("<h2 class=\"section-title\">Accessibility Analysis</h2>\n");
    out.push_str("<div class=\"stats-grid\">\n");
    out.push_str(&stat_card("total-locations", summary.total, "Total locations"));
    out.push_str(&stat_card("accessible-locations", summary.accessible, "Accessible locations"));
    out.push_str(&stat_card(
        "non-accessible-locations",
        summary.non_accessible,
        "Non-accessible locations",
    ));
    out.push_str(&stat_card("total-evaluations", data.evaluations.count(), "Total evaluations"));
    out.push_str("</div>\n");

    if heatmap {
        out.push_str(MAP_SECTION);
        if data.locations.is_empty() {
            out.push_str(
                "<div id=\"heatmap\" class=\"map-empty\">No locations to display on the map</div>\n",
            );
        } else {
            out.push_str("<div id=\"heatmap\"></div>\n");
        }
        out.push_str("</div>\n");
    }

    out.push_str("<h3>Location details</h3>\n");
    out.push_str(
        "<table class=\"table\" id=\"locations\">\n<thead><tr><th>Location</th><th>Coordinates</th>\
         <th>Rating</th><th>Status</th></tr></thead>\n<tbody>\n",
    );
    for location in data.locations.iter().take(MAX_LOCATION_ROWS) {
        let level = location.accessibility();
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{:.4}, {:.4}</td><td>{}/5</td><td>{}</td></tr>",
            esc(&location.label()),
            location.latitude,
            location.longitude,
            location.rating,
            badge(level.badge_class(), level.label()),
        );
    }
    out.push_str("</tbody>\n</table>\n");

    if !data.evaluations.evaluations.is_empty() {
        out.push_str("<h3>Recent evaluations</h3>\n");
        out.push_str(
            "<table class=\"table\" id=\"evaluations\">\n<thead><tr><th>Location</th><th>User</th>\
             <th>Assessment</th><th>Date</th></tr></thead>\n<tbody>\n",
        );
        for evaluation in data.evaluations.evaluations.iter().take(MAX_EVALUATION_ROWS) {
            let assessment = if evaluation.accessible {
                badge("badge-green", "Accessible")
            } else {
                badge("badge-red", "Not accessible")
            };
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                esc(&evaluated_location_label(evaluation)),
                esc(&author_label(evaluation)),
                assessment,
                esc(&evaluation_date(&evaluation.timestamp)),
            );
        }
        out.push_str("</tbody>\n</table>\n");
    }

    out.push_str("</div>\n");
    out
}

fn render_volunteers(data: &VolunteerData) -> String {
    let summary = volunteer_summary(&data.volunteers);
    let mut out = String::new();
    out.push_str("<div class=\"section\" id=\"volunteers\">\n");
    out.push_str("<h2 class=\"section-title\">Volunteer Analysis</h2>\n");
    out.push_str("<div class=\"stats-grid\">\n");
    out.push_str(&stat_card("total-volunteers", summary.total, "Total volunteers"));
    out.push_str(&stat_card("available-volunteers", summary.available, "Available"));
    out.push_str(&stat_card("unavailable-volunteers", summary.unavailable, "Unavailable"));
    out.push_str(&stat_card(
        "average-rating",
        format!("{:.1}", summary.average_rating),
        "Average rating",
    ));
    out.push_str("</div>\n");

    if !data.regions.is_empty() {
        out.push_str("<h3>Distribution by region</h3>\n");
        out.push_str(
            "<table class=\"table\" id=\"regions\">\n<thead><tr><th>Region</th><th>Volunteers</th>\
             <th>% Available</th><th>Average rating</th></tr></thead>\n<tbody>\n",
        );
        for region in &data.regions {
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{:.1}%</td><td>{:.1}/5</td></tr>",
                esc(&region.region),
                region.count,
                region.percent_available,
                region.average_rating,
            );
        }
        out.push_str("</tbody>\n</table>\n");
    }

    out.push_str("<h3>Volunteer roster</h3>\n");
    out.push_str(
        "<table class=\"table\" id=\"roster\">\n<thead><tr><th>ID</th><th>Status</th>\
         <th>Rating</th></tr></thead>\n<tbody>\n",
    );
    for volunteer in data.volunteers.iter().take(MAX_VOLUNTEER_ROWS) {
        let status = if volunteer.available {
            badge("badge-green", "Available")
        } else {
            badge("badge-red", "Unavailable")
        };
        let _ = writeln!(
            out,
            "<tr><td>Volunteer #{}</td><td>{}</td><td>{:.1}/5</td></tr>",
            volunteer.id, status, volunteer.rating,
        );
    }
    out.push_str("</tbody>\n</table>\n</div>\n");
    out
}

fn render_executive_summary(accessibility: &AccessibilityData, volunteers: &VolunteerData) -> String {
    let locations = accessibility.locations.len();
    let accessible = accessibility_summary(&accessibility.locations).accessible;
    let total_volunteers = volunteers.volunteers.len();
    let available = volunteer_summary(&volunteers.volunteers).available;
    let evaluations = accessibility.evaluations.count();

    let accessibility_rate = format_rate(accessible, locations);
    let availability_rate = format_rate(available, total_volunteers);

    let mut out = String::new();
    out.push_str("<div class=\"section\" id=\"summary\">\n");
    out.push_str("<h2 class=\"section-title\">Executive Summary</h2>\n");
    out.push_str("<div class=\"stats-grid\">\n");
    out.push_str(&stat_card(
        "accessibility-rate",
        format!("{accessibility_rate}%"),
        "Accessibility rate",
    ));
    out.push_str(&stat_card(
        "availability-rate",
        format!("{availability_rate}%"),
        "Availability rate",
    ));
    out.push_str(&stat_card("period-evaluations", evaluations, "Evaluations in period"));
    out.push_str(&stat_card("total-records", locations + total_volunteers, "Total records"));
    out.push_str("</div>\n");

    out.push_str("<h3>Key indicators</h3>\n<ul>\n");
    let _ = writeln!(
        out,
        "<li><strong>Location coverage:</strong> {locations} locations registered</li>"
    );
    let _ = writeln!(
        out,
        "<li><strong>Volunteer network:</strong> {total_volunteers} volunteers registered</li>"
    );
    let _ = writeln!(
        out,
        "<li><strong>Engagement:</strong> {evaluations} evaluations submitted</li>"
    );
    let _ = writeln!(
        out,
        "<li><strong>Quality:</strong> {accessibility_rate}% of locations are accessible</li>"
    );
    out.push_str("</ul>\n");

    out.push_str("<h3>Recommendations</h3>\n<ul id=\"recommendations\">\n");
    out.push_str(if one_decimal(rate(accessible, locations)) < LOW_ACCESSIBILITY_RATE {
        "<li class=\"warn\">&#9888; Low accessibility rate: invest in improving locations</li>\n"
    } else {
        "<li class=\"ok\">&#10004; Accessibility rate is satisfactory: keep the current standard</li>\n"
    });
    out.push_str(if one_decimal(rate(available, total_volunteers)) < LOW_AVAILABILITY_RATE {
        "<li class=\"warn\">&#9888; Increase availability: engage more volunteers</li>\n"
    } else {
        "<li class=\"ok\">&#10004; Good availability across the volunteer network</li>\n"
    });
    out.push_str(if evaluations < LOW_EVALUATION_COUNT {
        "<li class=\"warn\">&#9888; Increase evaluations: encourage users to rate more locations</li>\n"
    } else {
        "<li class=\"ok\">&#10004; Healthy volume of evaluations collected</li>\n"
    });
    out.push_str("</ul>\n</div>\n");
    out
}

fn render_map_script(locations: &[Location]) -> String {
    let markers: Vec<MapMarker> = locations
        .iter()
        .map(|location| {
            let level = location.accessibility();
            MapMarker {
                lat: location.latitude,
                lng: location.longitude,
                label: location.label(),
                rating: location.rating,
                color: level.color(),
                status: level.label(),
            }
        })
        .collect();
    let view = map_view(locations);
    let markers_json = serde_json::to_string(&markers)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/");

    MAP_SCRIPT
        .replace("{{MARKERS}}", &markers_json)
        .replace("{{CENTER_LAT}}", &view.center_lat.to_string())
        .replace("{{CENTER_LNG}}", &view.center_lng.to_string())
        .replace("{{ZOOM}}", &view.zoom.to_string())
}

fn map_view(locations: &[Location]) -> MapView {
    let count = locations.len().max(1) as f64;
    let center_lat = locations.iter().map(|l| l.latitude).sum::<f64>() / count;
    let center_lng = locations.iter().map(|l| l.longitude).sum::<f64>() / count;

    let range = span(locations.iter().map(|l| l.latitude))
        .max(span(locations.iter().map(|l| l.longitude)));

    let zoom = if range > 1.0 {
        8
    } else if range > 0.1 {
        10
    } else if range > 0.01 {
        12
    } else {
        14
    };

    MapView {
        center_lat,
        center_lng,
        zoom,
    }
}

fn span(values: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min.is_finite() { max - min } else { 0.0 }
}

fn stat_card(key: &str, value: impl std::fmt::Display, label: &str) -> String {
    format!(
        "<div class=\"stat-card\" data-stat=\"{key}\"><div class=\"stat-number\">{value}</div>\
         <div class=\"stat-label\">{label}</div></div>\n"
    )
}

fn badge(class: &str, text: &str) -> String {
    format!("<span class=\"{class}\">{text}</span>")
}

fn evaluated_location_label(evaluation: &Evaluation) -> String {
    match evaluation.location.description.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("Location {}", evaluation.location_id),
    }
}

fn author_label(evaluation: &Evaluation) -> String {
    match evaluation.user.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("User {}", evaluation.user.id),
    }
}

fn evaluation_date(timestamp: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return parsed.format("%Y-%m-%d").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d").to_string();
    }
    timestamp.to_string()
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn esc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const LEAFLET_CSS: &str = r#"<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" integrity="sha256-p4NxAoJBhIIN+hmNHrzRCf9tD/miZyoHS5obTRR9BMY=" crossorigin="" />"#;

const REPORT_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  {{MAP_CSS}}
  <style>
    body { font-family: Arial, sans-serif; margin: 40px; line-height: 1.6; color: #333; }
    .header { text-align: center; border-bottom: 2px solid #4F46E5; padding-bottom: 20px; margin-bottom: 30px; }
    .title { color: #4F46E5; font-size: 24px; margin: 0; }
    .subtitle { color: #666; font-size: 14px; margin: 5px 0; }
    .section { margin: 30px 0; }
    .section-title { color: #374151; font-size: 18px; font-weight: bold; border-bottom: 1px solid #E5E7EB; padding-bottom: 5px; }
    .stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin: 20px 0; }
    .stat-card { background: #F9FAFB; padding: 15px; border-radius: 8px; border-left: 4px solid #4F46E5; }
    .stat-number { font-size: 24px; font-weight: bold; color: #4F46E5; }
    .stat-label { font-size: 12px; color: #666; text-transform: uppercase; }
    .table { width: 100%; border-collapse: collapse; margin: 20px 0; }
    .table th, .table td { border: 1px solid #E5E7EB; padding: 8px; text-align: left; }
    .table th { background: #F9FAFB; font-weight: bold; }
    .badge-green, .badge-red, .badge-yellow { color: white; padding: 2px 8px; border-radius: 12px; font-size: 12px; }
    .badge-green { background: #10B981; }
    .badge-red { background: #EF4444; }
    .badge-yellow { background: #F59E0B; }
    .warn { color: #B45309; }
    .ok { color: #047857; }
    .footer { margin-top: 50px; text-align: center; font-size: 12px; color: #666; border-top: 1px solid #E5E7EB; padding-top: 20px; }
    .map-container { margin: 30px 0; }
    .map-title { color: #374151; font-size: 16px; font-weight: bold; margin-bottom: 10px; }
    .map-info { background: #F9FAFB; padding: 15px; border-radius: 8px; margin-bottom: 20px; border-left: 4px solid #4F46E5; }
    .map-empty { display: flex; align-items: center; justify-content: center; background: #f5f5f5; color: #666; }
    .map-legend { background: white; padding: 10px; border-radius: 5px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); font-size: 12px; line-height: 1.4; }
    .legend-item { display: flex; align-items: center; margin: 3px 0; }
    .legend-color { width: 16px; height: 16px; border-radius: 50%; margin-right: 8px; border: 2px solid white; box-shadow: 0 0 3px rgba(0,0,0,0.3); }
    #heatmap { height: 500px; width: 100%; border: 2px solid #E5E7EB; border-radius: 8px; }
  </style>
</head>
<body>
"#;

const MAP_SECTION: &str = r#"<div class="map-container">
<h3 class="map-title">Accessibility map</h3>
<div class="map-info">
  <strong>Map legend:</strong><br>
  Green markers: accessible locations (rating 4-5)<br>
  Yellow markers: partially accessible locations (rating 3-3.9)<br>
  Red markers: non-accessible locations (rating 0-2.9)<br>
  Click a marker for location details
</div>
"#;

const REPORT_FOOTER: &str = r#"<div class="footer">
  <p>Report generated by the accessibility administration system on {{DATE}}</p>
  <p>This document was produced automatically and reflects the data available at generation time.</p>
</div>
"#;

const MAP_SCRIPT: &str = r#"<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" integrity="sha256-20nQCchB9co0qIjJZRGuk2/Z9VM+kNiyxNV1lvTlZBo=" crossorigin=""></script>
<script>
  document.addEventListener('DOMContentLoaded', function () {
    const markers = {{MARKERS}};
    const map = L.map('heatmap').setView([{{CENTER_LAT}}, {{CENTER_LNG}}], {{ZOOM}});

    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      attribution: '&copy; OpenStreetMap contributors'
    }).addTo(map);

    const escapeHtml = (text) => String(text)
      .replace(/&/g, '&amp;')
      .replace(/</g, '&lt;')
      .replace(/>/g, '&gt;');

    markers.forEach(function (marker) {
      const icon = L.divIcon({
        className: 'custom-marker',
        html: `<div style="background-color: ${marker.color}; width: 20px; height: 20px; border-radius: 50%; border: 3px solid white; box-shadow: 0 0 5px rgba(0,0,0,0.3); display: flex; align-items: center; justify-content: center; color: white; font-weight: bold; font-size: 10px;">${Math.round(marker.rating)}</div>`,
        iconSize: [26, 26],
        iconAnchor: [13, 13]
      });
      const popup = `<div>
          <strong>${escapeHtml(marker.label)}</strong><br>
          <strong>Rating:</strong> ${marker.rating}/5<br>
          <strong>Status:</strong> <span style="color: ${marker.color};">${marker.status}</span><br>
          <strong>Coordinates:</strong> ${marker.lat.toFixed(4)}, ${marker.lng.toFixed(4)}
        </div>`;
      L.marker([marker.lat, marker.lng], { icon: icon }).addTo(map).bindPopup(popup);
    });

    const legend = L.control({ position: 'bottomright' });
    legend.onAdd = function () {
      const div = L.DomUtil.create('div', 'map-legend');
      div.innerHTML = `
        <div style="font-weight: bold; margin-bottom: 8px;">Legend</div>
        <div class="legend-item"><div class="legend-color" style="background-color: #10B981;"></div><span>Accessible (4-5)</span></div>
        <div class="legend-item"><div class="legend-color" style="background-color: #F59E0B;"></div><span>Partial (3-3.9)</span></div>
        <div class="legend-item"><div class="legend-color" style="background-color: #EF4444;"></div><span>Not accessible (0-2.9)</span></div>`;
      return div;
    };
    legend.addTo(map);
    L.control.scale({ position: 'bottomleft' }).addTo(map);
  });
</script>
"#;
