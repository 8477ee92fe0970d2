use crate::render::esc;
use crate::stats::DashboardSummary;
use crate::storage::ReportSummary;
use std::fmt::Write;

pub fn render_login(error: Option<&str>) -> String {
    let error = error
        .map(|message| format!("<p class=\"status\" data-type=\"error\">{}</p>", esc(message)))
        .unwrap_or_default();
    page("Sign in", false, &LOGIN_BODY.replace("{{ERROR}}", &error))
}

pub fn render_dashboard(user: &str, summary: &DashboardSummary) -> String {
    let mut regions = String::new();
    for region in &summary.regions {
        let _ = writeln!(
            regions,
            "<tr><td>{}</td><td>{}</td><td>{:.1}%</td><td>{:.1}</td></tr>",
            esc(&region.region),
            region.count,
            region.percent_available,
            region.average_rating
        );
    }
    if regions.is_empty() {
        regions.push_str("<tr><td colspan=\"4\">No regional statistics yet.</td></tr>");
    }

    let body = DASHBOARD_BODY
        .replace("{{USER}}", &esc(user))
        .replace("{{LOCATIONS}}", &summary.locations.total.to_string())
        .replace("{{ACCESSIBLE}}", &summary.locations.accessible.to_string())
        .replace("{{NOT_ACCESSIBLE}}", &summary.locations.non_accessible.to_string())
        .replace("{{AVAILABLE}}", &summary.volunteers.available.to_string())
        .replace("{{VOLUNTEERS}}", &summary.volunteers.total.to_string())
        .replace("{{REGIONS}}", &regions);
    page("Dashboard", true, &body)
}

pub fn render_reports(reports: &[ReportSummary], flash: Option<&str>) -> String {
    let mut rows = String::new();
    for report in reports {
        let id = esc(&report.id);
        let _ = writeln!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{} KB</td>\
             <td><a href=\"/api/reports/{id}/download\">Download</a>\
             <form method=\"post\" action=\"/reports/{id}/delete\" class=\"inline\">\
             <button class=\"link\" type=\"submit\">Delete</button></form></td></tr>",
            esc(&report.title),
            report.report_type.as_str(),
            report.generated_at.format("%Y-%m-%d %H:%M UTC"),
            report.size_kb,
        );
    }
    if rows.is_empty() {
        rows.push_str("<tr><td colspan=\"5\">No reports generated yet.</td></tr>");
    }

    let flash = flash
        .map(|message| format!("<p class=\"status\" data-type=\"ok\">{}</p>", esc(message)))
        .unwrap_or_default();
    let body = REPORTS_BODY
        .replace("{{FLASH}}", &flash)
        .replace("{{ROWS}}", &rows);
    page("Reports", true, &body)
}

fn page(title: &str, with_nav: bool, body: &str) -> String {
    LAYOUT_HTML
        .replace("{{TITLE}}", title)
        .replace("{{NAV}}", if with_nav { NAV_HTML } else { "" })
        .replace("{{BODY}}", body)
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} | Accessibility Admin</title>
  <style>
    :root {
      --bg: #f3f4f8;
      --ink: #1f2937;
      --muted: #6b7280;
      --accent: #4f46e5;
      --ok: #10b981;
      --bad: #ef4444;
      --card: #ffffff;
      --shadow: 0 12px 32px rgba(31, 41, 55, 0.08);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Trebuchet MS", sans-serif;
    }

    nav {
      display: flex;
      gap: 18px;
      align-items: center;
      padding: 16px 32px;
      background: var(--card);
      box-shadow: var(--shadow);
    }

    nav a {
      color: var(--ink);
      text-decoration: none;
      font-weight: 600;
    }

    nav form {
      margin-left: auto;
    }

    main {
      width: min(960px, 100%);
      margin: 32px auto;
      padding: 0 18px;
      display: grid;
      gap: 24px;
    }

    h1 {
      margin: 0;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .stat, .card {
      background: var(--card);
      border-radius: 14px;
      padding: 18px;
      box-shadow: var(--shadow);
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      display: block;
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent);
    }

    .stat .value.ok {
      color: var(--ok);
    }

    .stat .value.bad {
      color: var(--bad);
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      text-align: left;
      padding: 8px;
      border-bottom: 1px solid #e5e7eb;
    }

    label {
      display: block;
      font-size: 0.9rem;
      margin-bottom: 4px;
    }

    input, select {
      width: 100%;
      padding: 8px 10px;
      border: 1px solid #d1d5db;
      border-radius: 8px;
    }

    .checks label {
      display: flex;
      gap: 8px;
      align-items: center;
    }

    .checks input {
      width: auto;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    button.link {
      background: none;
      color: var(--bad);
      padding: 0 0 0 12px;
    }

    form.inline {
      display: inline;
    }

    .grid-2 {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
    }

    .status[data-type="error"] {
      color: var(--bad);
    }

    .status[data-type="ok"] {
      color: var(--ok);
    }
  </style>
</head>
<body>
  {{NAV}}
  <main>
    {{BODY}}
  </main>
</body>
</html>
"#;

const NAV_HTML: &str = r#"<nav>
    <a href="/">Dashboard</a>
    <a href="/reports">Reports</a>
    <form method="post" action="/logout"><button type="submit">Sign out</button></form>
  </nav>"#;

const LOGIN_BODY: &str = r#"<section class="card">
      <h1>Accessibility Admin</h1>
      <p>Sign in with your administrator account.</p>
      {{ERROR}}
      <form method="post" action="/login" class="grid-2">
        <div>
          <label for="email">Email</label>
          <input id="email" name="email" type="email" required />
        </div>
        <div>
          <label for="password">Password</label>
          <input id="password" name="password" type="password" required />
        </div>
        <div>
          <button type="submit">Sign in</button>
        </div>
      </form>
    </section>"#;

const DASHBOARD_BODY: &str = r#"<header>
      <h1>Dashboard</h1>
      <p>Signed in as {{USER}}.</p>
    </header>

    <section class="panel">
      <div class="stat">
        <span class="label">Locations</span>
        <span id="locations" class="value">{{LOCATIONS}}</span>
      </div>
      <div class="stat">
        <span class="label">Accessible</span>
        <span id="accessible" class="value ok">{{ACCESSIBLE}}</span>
      </div>
      <div class="stat">
        <span class="label">Not accessible</span>
        <span id="not-accessible" class="value bad">{{NOT_ACCESSIBLE}}</span>
      </div>
      <div class="stat">
        <span class="label">Available volunteers</span>
        <span id="available" class="value">{{AVAILABLE}} / {{VOLUNTEERS}}</span>
      </div>
    </section>

    <section class="card">
      <h2>Volunteers by region</h2>
      <table>
        <thead><tr><th>Region</th><th>Volunteers</th><th>% Available</th><th>Average rating</th></tr></thead>
        <tbody>
          {{REGIONS}}
        </tbody>
      </table>
    </section>"#;

const REPORTS_BODY: &str = r#"<header>
      <h1>Reports</h1>
      <p>Generate HTML reports for partner organisations and public bodies.</p>
      {{FLASH}}
    </header>

    <section class="card">
      <form method="post" action="/reports/generate">
        <div class="grid-2">
          <div>
            <label for="report_type">Report type</label>
            <select id="report_type" name="report_type">
              <option value="accessibility">Accessibility</option>
              <option value="volunteers">Volunteers</option>
              <option value="full" selected>Full system</option>
            </select>
          </div>
          <div>
            <label for="start_date">Start date</label>
            <input id="start_date" name="start_date" type="date" />
          </div>
          <div>
            <label for="end_date">End date</label>
            <input id="end_date" name="end_date" type="date" />
          </div>
        </div>
        <div class="grid-2 checks">
          <label><input type="checkbox" name="include_accessible_locations" checked /> Accessible locations</label>
          <label><input type="checkbox" name="include_non_accessible_locations" checked /> Non-accessible locations</label>
          <label><input type="checkbox" name="include_heatmap" /> Accessibility map</label>
          <label><input type="checkbox" name="include_regional_stats" checked /> Regional statistics</label>
          <label><input type="checkbox" name="include_ranking" /> Rating ranking</label>
          <label><input type="checkbox" name="include_availability_history" /> Availability history</label>
        </div>
        <p><button type="submit">Generate report</button></p>
      </form>
    </section>

    <section class="card">
      <h2>Generated reports</h2>
      <table>
        <thead><tr><th>Title</th><th>Type</th><th>Generated</th><th>Size</th><th></th></tr></thead>
        <tbody>
          {{ROWS}}
        </tbody>
      </table>
    </section>"#;
