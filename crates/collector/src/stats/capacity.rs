use rubrik_client::{ApiVersion, CdmClient};
use rubrik_metrics::{CapacitySample, ExporterMetrics};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{error::CollectorError, events::model::decode, labels::NULL_LABEL, poller::Poller};

const REPORT_TEMPLATE: &str = "ObjectProtectionSummary";
const REPORT_LOOKUP_ENDPOINT: &str =
    "/report?report_template=ObjectProtectionSummary&report_type=Canned";
const FIRST_PAGE_LIMIT: u32 = 100;
const NEXT_PAGE_LIMIT: u32 = 1000;

/// Object types whose storage consumption is exported.
pub const CAPACITY_OBJECT_TYPES: [&str; 5] = [
    "LinuxFileset",
    "WindowsFileset",
    "ShareFileset",
    "ManagedVolume",
    "WindowsVolumeGroup",
];

#[derive(Debug, Deserialize)]
struct ReportList {
    #[serde(default)]
    data: Vec<ReportSummary>,
}

#[derive(Debug, Deserialize)]
struct ReportSummary {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportTable {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data_grid: Vec<Vec<Value>>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    cursor: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapacityRow {
    pub object_id: String,
    pub object_name: String,
    pub location: String,
    pub local_bytes: f64,
    pub archive_bytes: f64,
}

impl CapacityRow {
    fn from_cells(columns: &[String], cells: &[Value]) -> Self {
        let mut row = CapacityRow {
            object_id: NULL_LABEL.to_owned(),
            object_name: NULL_LABEL.to_owned(),
            location: NULL_LABEL.to_owned(),
            local_bytes: 0.0,
            archive_bytes: 0.0,
        };

        for (column, cell) in columns.iter().zip(cells) {
            match column.as_str() {
                "ObjectId" | "ObjectLinkingId" => row.object_id = text(cell),
                "ObjectName" => row.object_name = text(cell),
                "Location" => row.location = text(cell),
                "LocalStorage" => row.local_bytes = number(cell),
                "ArchiveStorage" => row.archive_bytes = number(cell),
                _ => {}
            }
        }
        row
    }
}

fn text(cell: &Value) -> String {
    match cell {
        Value::String(value) => value.clone(),
        Value::Null => NULL_LABEL.to_owned(),
        other => other.to_string(),
    }
}

/// Report cells carry numbers as strings; anything unparsable counts as zero.
fn number(cell: &Value) -> f64 {
    match cell {
        Value::Number(value) => value.as_f64().unwrap_or(0.0),
        Value::String(value) => value.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Pages through the object protection summary report and publishes local
/// and archive capacity per protected object.
pub struct CapacityReports {
    client: Arc<dyn CdmClient>,
    metrics: Arc<ExporterMetrics>,
    object_types: Vec<String>,
}

impl CapacityReports {
    pub fn new(client: Arc<dyn CdmClient>, metrics: Arc<ExporterMetrics>) -> Self {
        Self {
            client,
            metrics,
            object_types: CAPACITY_OBJECT_TYPES.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    pub fn with_object_types(mut self, object_types: Vec<String>) -> Self {
        self.object_types = object_types;
        self
    }

    async fn report_id(&self) -> Result<String, CollectorError> {
        let payload = self
            .client
            .get(ApiVersion::Internal, REPORT_LOOKUP_ENDPOINT)
            .await?;
        let reports: ReportList = decode(REPORT_LOOKUP_ENDPOINT, payload)?;
        reports
            .data
            .into_iter()
            .next()
            .map(|report| report.id)
            .ok_or(CollectorError::MissingReport(REPORT_TEMPLATE))
    }

    /// Reads every page of the report table for `object_type`.
    pub async fn fetch_rows(
        &self,
        report_id: &str,
        object_type: &str,
    ) -> Result<Vec<CapacityRow>, CollectorError> {
        let endpoint = format!("/report/{report_id}/table");
        let mut body = json!({
            "limit": FIRST_PAGE_LIMIT,
            "requestFilters": { "objectType": object_type },
        });

        let mut rows = Vec::new();
        loop {
            let payload = self
                .client
                .post(ApiVersion::Internal, &endpoint, &body)
                .await?;
            let table: ReportTable = decode(&endpoint, payload)?;

            rows.extend(
                table
                    .data_grid
                    .iter()
                    .map(|cells| CapacityRow::from_cells(&table.columns, cells)),
            );

            if !table.has_more {
                return Ok(rows);
            }
            let Some(cursor) = table.cursor else {
                warn!(object_type, "report claims more pages but returned no cursor");
                return Ok(rows);
            };

            debug!(object_type, fetched = rows.len(), "fetching next report page");
            body = json!({
                "limit": NEXT_PAGE_LIMIT,
                "cursor": cursor,
                "requestFilters": { "objectType": object_type },
            });
        }
    }

    pub async fn tick(&self) -> Result<usize, CollectorError> {
        let report_id = self.report_id().await?;

        let mut published = 0;
        for object_type in &self.object_types {
            let rows = self.fetch_rows(&report_id, object_type).await?;
            for row in &rows {
                self.metrics.set_capacity(
                    CapacitySample {
                        object_type,
                        object_name: &row.object_name,
                        object_id: &row.object_id,
                        location: &row.location,
                    },
                    row.local_bytes,
                    row.archive_bytes,
                )?;
            }
            published += rows.len();
        }

        Ok(published)
    }
}

#[async_trait::async_trait]
impl Poller for CapacityReports {
    fn name(&self) -> &'static str {
        "capacity_reports"
    }

    async fn poll(&mut self) -> Result<(), CollectorError> {
        let published = self.tick().await?;
        info!(objects = published, "capacity report cycle complete");
        Ok(())
    }
}
