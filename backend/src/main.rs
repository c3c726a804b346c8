use std::env;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use dashboard_core::{payload_scatter, success_pie, DashboardView, Figure};
use launch_data::{LaunchTable, PayloadRange, SiteFilter};

// Overrides the fixed relative dataset path without changing clients.
const DATA_PATH_ENV: &str = "LAUNCH_DATA_PATH";
const DEFAULT_DATA_PATH: &str = "spacex_launch_dash.csv";
const ADDR_ENV: &str = "DASHBOARD_ADDR";
const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Clone)]
struct ServerState {
    table: Arc<LaunchTable>,
    view: Arc<DashboardView>,
}

#[derive(Debug, serde::Deserialize)]
struct PieParams {
    site: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ScatterParams {
    site: Option<String>,
    low: Option<f64>,
    high: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Summary {
    records: usize,
    sites: Vec<String>,
    min_payload_kg: f64,
    max_payload_kg: f64,
    total_successes: usize,
}

/// Missing `site` means the sentinel, matching the page's default selection.
fn site_filter_from_param(site: Option<&str>) -> SiteFilter {
    match site {
        Some(value) => SiteFilter::parse(value),
        None => SiteFilter::All,
    }
}

/// Missing bounds default to the global bounds, matching the slider's default
/// full-range selection.
fn range_from_params(bounds: PayloadRange, low: Option<f64>, high: Option<f64>) -> PayloadRange {
    PayloadRange::new(low.unwrap_or(bounds.low), high.unwrap_or(bounds.high))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_path = env::var(DATA_PATH_ENV).unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());
    let table = match LaunchTable::from_csv_path(&data_path) {
        Ok(table) => table,
        Err(err) => {
            error!(%err, path = %data_path, "failed to load launch dataset");
            std::process::exit(1);
        }
    };
    let bounds = table.payload_bounds();
    info!(
        records = table.len(),
        sites = table.sites().len(),
        min_payload_kg = bounds.low,
        max_payload_kg = bounds.high,
        "loaded launch dataset"
    );

    let view = DashboardView::from_table(&table);
    let state = ServerState {
        table: Arc::new(table),
        view: Arc::new(view),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/api/view", get(view_handler))
        .route("/api/pie-chart", get(pie_chart_handler))
        .route("/api/scatter-chart", get(scatter_chart_handler))
        .route("/api/summary", get(summary_handler))
        .with_state(state);

    let addr = env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|err| panic!("bind {addr}: {err}"));
    info!(%addr, "dashboard listening");
    axum::serve(listener, app).await.expect("server failed");
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn view_handler(State(state): State<ServerState>) -> Json<DashboardView> {
    Json(state.view.as_ref().clone())
}

async fn pie_chart_handler(
    State(state): State<ServerState>,
    Query(params): Query<PieParams>,
) -> Json<Figure> {
    let site = site_filter_from_param(params.site.as_deref());
    debug!(?site, "recomputing pie chart");
    Json(success_pie(&state.table, &site))
}

async fn scatter_chart_handler(
    State(state): State<ServerState>,
    Query(params): Query<ScatterParams>,
) -> Json<Figure> {
    let site = site_filter_from_param(params.site.as_deref());
    let range = range_from_params(state.table.payload_bounds(), params.low, params.high);
    debug!(?site, ?range, "recomputing scatter chart");
    Json(payload_scatter(&state.table, &site, range))
}

async fn summary_handler(State(state): State<ServerState>) -> Json<Summary> {
    let table = &state.table;
    let bounds = table.payload_bounds();
    Json(Summary {
        records: table.len(),
        sites: table.sites().to_vec(),
        min_payload_kg: bounds.low,
        max_payload_kg: bounds.high,
        total_successes: table.total_successes(),
    })
}

const INDEX_HTML: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>SpaceX Launch Records Dashboard</title>
    <script src="https://cdn.plot.ly/plotly-2.32.0.min.js"></script>
    <style>
      body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 960px; padding: 1rem; }
      h1 { text-align: center; color: #503d36; font-size: 40px; }
      .control { margin: 1rem 0; }
      .control label { display: block; margin-bottom: 0.25rem; }
      select { min-width: 16rem; padding: 0.25rem; }
      .range-pair input[type="range"] { width: 100%; }
      .range-values { color: #555; font-size: 0.9rem; }
    </style>
  </head>
  <body>
    <h1 id="page-title"></h1>
    <div class="control">
      <label for="site-dropdown">Launch Site:</label>
      <select id="site-dropdown"></select>
    </div>
    <div id="success-pie-chart"></div>
    <div class="control range-pair">
      <label>Payload range (Kg):</label>
      <input type="range" id="payload-slider-low" />
      <input type="range" id="payload-slider-high" />
      <div class="range-values" id="payload-slider-values"></div>
    </div>
    <div id="success-payload-scatter-chart"></div>
    <script>
      // The page holds no chart logic: it renders the declarative view
      // definition and refetches whichever chart a binding names when one of
      // that binding's inputs changes.
      const widgets = {};

      function currentQuery(chartId, view) {
        const params = new URLSearchParams();
        params.set("site", widgets[view.dropdown.id].value);
        const binding = view.bindings.find((b) => b.chart === chartId);
        if (binding.inputs.includes(view.slider.id)) {
          params.set("low", widgets[view.slider.id].low.value);
          params.set("high", widgets[view.slider.id].high.value);
        }
        return params;
      }

      async function renderChart(chartId, view) {
        const chart = view.charts.find((c) => c.id === chartId);
        const resp = await fetch(chart.endpoint + "?" + currentQuery(chartId, view));
        const figure = await resp.json();
        Plotly.react(chartId, figure.data, figure.layout);
      }

      function wireDropdown(view) {
        const select = document.getElementById(view.dropdown.id);
        for (const option of view.dropdown.options) {
          const el = document.createElement("option");
          el.value = option;
          el.textContent = option === "ALL" ? "All Sites" : option;
          select.appendChild(el);
        }
        select.value = view.dropdown.default;
        widgets[view.dropdown.id] = select;
      }

      function wireSlider(view) {
        const low = document.getElementById("payload-slider-low");
        const high = document.getElementById("payload-slider-high");
        const values = document.getElementById("payload-slider-values");
        for (const input of [low, high]) {
          input.min = view.slider.min;
          input.max = view.slider.max;
          input.step = view.slider.step;
        }
        low.value = view.slider.default[0];
        high.value = view.slider.default[1];
        const show = () => {
          values.textContent = low.value + " kg - " + high.value + " kg";
        };
        show();
        widgets[view.slider.id] = { low, high, show };
      }

      function bindInputs(view) {
        const elementsFor = (inputId) =>
          inputId === view.slider.id
            ? [widgets[inputId].low, widgets[inputId].high]
            : [widgets[inputId]];
        for (const binding of view.bindings) {
          for (const inputId of binding.inputs) {
            for (const el of elementsFor(inputId)) {
              el.addEventListener("change", () => {
                if (inputId === view.slider.id) widgets[inputId].show();
                renderChart(binding.chart, view);
              });
            }
          }
        }
      }

      async function boot() {
        const view = await (await fetch("/api/view")).json();
        document.getElementById("page-title").textContent = view.title;
        document.title = view.title;
        wireDropdown(view);
        wireSlider(view);
        bindInputs(view);
        for (const chart of view.charts) renderChart(chart.id, view);
      }

      boot();
    </script>
  </body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_site_param_means_all() {
        assert_eq!(site_filter_from_param(None), SiteFilter::All);
        assert_eq!(site_filter_from_param(Some("ALL")), SiteFilter::All);
        assert_eq!(
            site_filter_from_param(Some("KSC LC-39A")),
            SiteFilter::parse("KSC LC-39A")
        );
    }

    #[test]
    fn missing_bounds_default_to_full_range() {
        let bounds = PayloadRange::new(500.0, 6000.0);
        assert_eq!(range_from_params(bounds, None, None), bounds);
        assert_eq!(
            range_from_params(bounds, Some(1000.0), None),
            PayloadRange::new(1000.0, 6000.0)
        );
        assert_eq!(
            range_from_params(bounds, None, Some(2500.0)),
            PayloadRange::new(500.0, 2500.0)
        );
    }
}
