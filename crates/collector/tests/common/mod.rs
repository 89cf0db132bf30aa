#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rubrik_client::{ApiVersion, CdmClient, ClientError};
use rubrik_collector::Clock;
use serde_json::{Value, json};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Unauthorized,
    Status(u16),
}

impl Reply {
    fn into_result(self) -> Result<Value, ClientError> {
        match self {
            Reply::Json(value) => Ok(value),
            Reply::Unauthorized => Err(ClientError::Unauthorized),
            Reply::Status(status) => Err(ClientError::Status {
                status,
                body: String::new(),
            }),
        }
    }
}

struct Route {
    api: ApiVersion,
    needle: String,
    reply: Reply,
}

/// Scripted cluster. The first route whose api matches and whose needle is a
/// substring of the requested endpoint answers; unrouted requests get a 404.
#[derive(Default)]
pub struct FakeCluster {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<(ApiVersion, String)>>,
    bodies: Mutex<Vec<Value>>,
}

impl FakeCluster {
    pub fn with_version(version: &str) -> Self {
        let cluster = FakeCluster::default();
        cluster.route(
            ApiVersion::V1,
            "/cluster/me",
            Reply::Json(json!({ "id": "cluster-1", "name": "lab", "version": version })),
        );
        cluster
    }

    pub fn route(&self, api: ApiVersion, needle: &str, reply: Reply) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(Route {
                api,
                needle: needle.to_owned(),
                reply,
            });
        }
    }

    /// Routes added later win over earlier ones for the same needle.
    pub fn replace(&self, api: ApiVersion, needle: &str, reply: Reply) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.retain(|route| !(route.api == api && route.needle == needle));
            routes.insert(
                0,
                Route {
                    api,
                    needle: needle.to_owned(),
                    reply,
                },
            );
        }
    }

    pub fn calls(&self) -> Vec<(ApiVersion, String)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn calls_to(&self, needle: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(_, endpoint)| endpoint)
            .filter(|endpoint| endpoint.contains(needle))
            .collect()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies
            .lock()
            .map(|bodies| bodies.clone())
            .unwrap_or_default()
    }

    fn answer(&self, api: ApiVersion, endpoint: &str) -> Result<Value, ClientError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((api, endpoint.to_owned()));
        }

        let reply = self.routes.lock().ok().and_then(|routes| {
            routes
                .iter()
                .find(|route| route.api == api && endpoint.contains(&route.needle))
                .map(|route| route.reply.clone())
        });
        reply.unwrap_or(Reply::Status(404)).into_result()
    }
}

#[async_trait::async_trait]
impl CdmClient for FakeCluster {
    async fn get(&self, api: ApiVersion, endpoint: &str) -> Result<Value, ClientError> {
        self.answer(api, endpoint)
    }

    async fn post(
        &self,
        api: ApiVersion,
        endpoint: &str,
        body: &Value,
    ) -> Result<Value, ClientError> {
        if let Ok(mut bodies) = self.bodies.lock() {
            bodies.push(body.clone());
        }
        self.answer(api, endpoint)
    }
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or_else(|_| Utc::now())
    }
}

pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn latest_event(series_id: &str, status: &str, name: &str, object_type: &str, object_name: &str) -> Value {
    json!({
        "latestEvent": {
            "eventSeriesId": series_id,
            "eventStatus": status,
            "eventName": name,
            "eventSeverity": "Critical",
            "objectId": format!("{object_type}:::{object_name}"),
            "objectType": object_type,
            "objectName": object_name,
            "time": "2024-03-01T10:00:00.000Z"
        }
    })
}

pub fn page(entries: Vec<Value>) -> Reply {
    Reply::Json(json!({ "hasMore": false, "data": entries }))
}

pub fn series(statuses: &[&str], location: &str) -> Reply {
    let details: Vec<Value> = statuses
        .iter()
        .map(|status| json!({ "eventStatus": status, "time": "2024-03-01T10:00:00.000Z" }))
        .collect();
    Reply::Json(json!({ "location": location, "eventDetailList": details }))
}
