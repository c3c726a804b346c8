use launch_data::{LaunchTable, Outcome, PayloadRange, SiteFilter, ALL_SITES};
use serde::Serialize;

/// Widget and chart element ids. These four identities are the entire contract
/// between the rendered page and the chart API.
pub const SITE_DROPDOWN_ID: &str = "site-dropdown";
pub const PAYLOAD_SLIDER_ID: &str = "payload-slider";
pub const PIE_CHART_ID: &str = "success-pie-chart";
pub const SCATTER_CHART_ID: &str = "success-payload-scatter-chart";

/// Slider granularity in kilograms.
pub const PAYLOAD_STEP_KG: f64 = 100.0;

pub const SUCCESS_COLOR: &str = "green";
pub const FAILURE_COLOR: &str = "red";

/// Rotating marker palette for booster-category traces.
const CATEGORY_PALETTE: [&str; 6] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3",
];

/// Category label for records with no booster version category.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// A Plotly-shaped figure: trace list plus layout. Serialized as-is to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: FigureLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        marker: Option<Marker>,
    },
    Scatter {
        x: Vec<f64>,
        y: Vec<f64>,
        mode: &'static str,
        name: String,
        marker: Marker,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

impl Marker {
    fn slice_colors(colors: Vec<&'static str>) -> Self {
        Self {
            colors: Some(colors),
            color: None,
        }
    }

    fn point_color(color: &'static str) -> Self {
        Self {
            colors: None,
            color: Some(color),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureLayout {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
}

impl FigureLayout {
    fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            xaxis: None,
            yaxis: None,
        }
    }
}

/// Proportion-chart handler: pure function of (dataset, selected site).
///
/// `ALL` groups the whole table by site and sizes one slice per site by its
/// success count (zero-success sites keep a zero-sized slice). A concrete site
/// yields one slice per outcome present, success green and failure red.
pub fn success_pie(table: &LaunchTable, site: &SiteFilter) -> Figure {
    match site {
        SiteFilter::All => {
            let labels: Vec<String> = table.sites().to_vec();
            let values: Vec<f64> = table
                .sites()
                .iter()
                .map(|s| {
                    table
                        .records()
                        .iter()
                        .filter(|r| r.site == *s && r.outcome == Outcome::Success)
                        .count() as f64
                })
                .collect();
            Figure {
                data: vec![Trace::Pie {
                    labels,
                    values,
                    marker: None,
                }],
                layout: FigureLayout::titled("Total Successful Launches by Site"),
            }
        }
        SiteFilter::Site(name) => {
            let mut successes = 0usize;
            let mut failures = 0usize;
            for record in table.filtered(site, None) {
                match record.outcome {
                    Outcome::Success => successes += 1,
                    Outcome::Failure => failures += 1,
                }
            }

            let mut labels = Vec::new();
            let mut values = Vec::new();
            let mut colors = Vec::new();
            for (count, outcome, color) in [
                (successes, Outcome::Success, SUCCESS_COLOR),
                (failures, Outcome::Failure, FAILURE_COLOR),
            ] {
                if count > 0 {
                    labels.push(outcome.label().to_string());
                    values.push(count as f64);
                    colors.push(color);
                }
            }

            Figure {
                data: vec![Trace::Pie {
                    labels,
                    values,
                    marker: Some(Marker::slice_colors(colors)),
                }],
                layout: FigureLayout::titled(format!(
                    "Total Success vs Failure for site {name}"
                )),
            }
        }
    }
}

/// Scatter-chart handler: pure function of (dataset, selected site, payload range).
///
/// Keeps records whose payload mass lies in the closed interval, then applies
/// the site filter, and emits one markers trace per booster category in first
/// appearance order. Records without a category land in the "Unknown" trace.
/// An inverted range matches nothing and so yields an empty figure.
pub fn payload_scatter(table: &LaunchTable, site: &SiteFilter, range: PayloadRange) -> Figure {
    let mut categories: Vec<(String, Vec<f64>, Vec<f64>)> = Vec::new();
    for record in table.filtered(site, Some(&range)) {
        let category = record
            .booster_category
            .as_deref()
            .unwrap_or(UNKNOWN_CATEGORY);
        let entry = match categories.iter_mut().find(|(name, _, _)| name == category) {
            Some(entry) => entry,
            None => {
                categories.push((category.to_string(), Vec::new(), Vec::new()));
                categories.last_mut().unwrap()
            }
        };
        entry.1.push(record.payload_mass_kg);
        entry.2.push(record.outcome.as_u8() as f64);
    }

    let data = categories
        .into_iter()
        .enumerate()
        .map(|(i, (name, x, y))| Trace::Scatter {
            x,
            y,
            mode: "markers",
            name,
            marker: Marker::point_color(CATEGORY_PALETTE[i % CATEGORY_PALETTE.len()]),
        })
        .collect();

    Figure {
        data,
        layout: FigureLayout {
            title: "Payload vs Launch Success".to_string(),
            xaxis: Some(Axis {
                title: "Payload Mass (kg)".to_string(),
            }),
            yaxis: Some(Axis {
                title: "Launch Outcome".to_string(),
            }),
        },
    }
}

/// Declarative page description: the two controls, the two chart containers,
/// and which widget changes recompute which chart. The page's wiring script is
/// driven entirely by this value; it holds no logic of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub dropdown: Dropdown,
    pub slider: RangeSlider,
    pub charts: Vec<ChartContainer>,
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dropdown {
    pub id: &'static str,
    pub options: Vec<String>,
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSlider {
    pub id: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Default selection: the full range.
    pub default: [f64; 2],
    /// Tick labels rendered at these values.
    pub marks: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartContainer {
    pub id: &'static str,
    pub endpoint: &'static str,
}

/// Maps a set of input widget ids to the chart they recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub inputs: Vec<&'static str>,
    pub chart: &'static str,
}

impl DashboardView {
    pub fn from_table(table: &LaunchTable) -> Self {
        let bounds = table.payload_bounds();
        let mut options = vec![ALL_SITES.to_string()];
        options.extend(table.sites().iter().cloned());

        Self {
            title: "SpaceX Launch Records Dashboard".to_string(),
            dropdown: Dropdown {
                id: SITE_DROPDOWN_ID,
                options,
                default: ALL_SITES.to_string(),
            },
            slider: RangeSlider {
                id: PAYLOAD_SLIDER_ID,
                min: bounds.low,
                max: bounds.high,
                step: PAYLOAD_STEP_KG,
                default: [bounds.low, bounds.high],
                marks: vec![bounds.low, bounds.high],
            },
            charts: vec![
                ChartContainer {
                    id: PIE_CHART_ID,
                    endpoint: "/api/pie-chart",
                },
                ChartContainer {
                    id: SCATTER_CHART_ID,
                    endpoint: "/api/scatter-chart",
                },
            ],
            bindings: vec![
                Binding {
                    inputs: vec![SITE_DROPDOWN_ID],
                    chart: PIE_CHART_ID,
                },
                Binding {
                    inputs: vec![SITE_DROPDOWN_ID, PAYLOAD_SLIDER_ID],
                    chart: SCATTER_CHART_ID,
                },
            ],
        }
    }
}
