//! A JSON HTTP web API for decoded asset-tracker uplinks.

#![deny(missing_docs, missing_debug_implementations, unsafe_code)]

extern crate actix_web;
extern crate chrono;
extern crate csv;
extern crate failure;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[cfg(test)]
extern crate serde_json;
extern crate toml;
extern crate tracker;
extern crate uplink;

mod config;
mod state;

use actix_web::error::{ErrorInternalServerError, ErrorNotFound};
use actix_web::{middleware::cors::Cors, App, HttpRequest, HttpResponse, Json, Result};
use chrono::NaiveDateTime;
pub use config::{Binding, Config};
pub use state::State;
use uplink::DecodedMessage;

const DEFAULT_PER_PAGE: usize = 50;
const MAX_PER_PAGE: usize = 500;

/// Creates the web application.
///
/// # Examples
///
/// ```
/// use web::State;
/// let state = State::from_path("fixtures/config.toml").unwrap();
/// let app = web::create_app(state);
/// ```
pub fn create_app(state: State) -> App<State> {
    App::with_state(state).configure(|app| {
        Cors::for_app(app)
            .send_wildcard()
            .resource("/devices", |resource| resource.h(devices))
            .resource("/devices/{id}", |resource| {
                resource.name("device");
                resource.h(device)
            })
            .resource("/devices/{id}/records", |resource| resource.h(records))
            .resource("/devices/{id}/records.csv", |resource| {
                resource.h(records_csv)
            })
            .resource("/devices/{id}/gaps", |resource| resource.h(gaps))
            .resource("/rejects", |resource| resource.h(rejects))
            .register()
    })
}

#[derive(Debug, Deserialize, Serialize)]
struct DeviceSummary {
    /// The device identity.
    pub id: String,

    /// When the device was last heard from.
    pub last_seen: Option<NaiveDateTime>,

    /// The number of decoded records held for the device.
    pub records: usize,

    /// The number of sequence gaps between those records.
    pub gaps: usize,

    /// The API URL of this device.
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct GapReport {
    /// The device identity.
    pub device: String,

    /// Inclusive ranges of sequence numbers that were never received.
    pub gaps: Vec<(u64, u64)>,
}

#[derive(Debug, Serialize)]
struct RecordsPage {
    /// The device identity.
    pub device: String,

    /// The 1-based page number.
    pub page: usize,

    /// The page size.
    pub per_page: usize,

    /// The total number of records for the device.
    pub total: usize,

    /// This page of records.
    pub records: Vec<DecodedMessage>,
}

impl DeviceSummary {
    fn new(device: &tracker::Device, request: &HttpRequest<State>) -> Result<DeviceSummary> {
        Ok(DeviceSummary {
            id: device.id().to_string(),
            last_seen: device.last_seen(),
            records: device.len(),
            gaps: device.gaps().len(),
            url: request
                .url_for("device", &[device.id()])?
                .as_str()
                .to_string(),
        })
    }
}

fn devices(request: &HttpRequest<State>) -> Result<Json<Vec<DeviceSummary>>> {
    let registry = registry(request)?;
    Ok(Json(
        registry
            .devices()
            .map(|device| DeviceSummary::new(device, request))
            .collect::<Result<Vec<_>>>()?,
    ))
}

fn device(request: &HttpRequest<State>) -> Result<Json<DeviceSummary>> {
    let id: String = request.match_info().query("id")?;
    let registry = registry(request)?;
    let device = registry
        .device(&id)
        .ok_or_else(|| ErrorNotFound("no device with that id"))?;
    Ok(Json(DeviceSummary::new(device, request)?))
}

fn records(request: &HttpRequest<State>) -> Result<Json<RecordsPage>> {
    let id: String = request.match_info().query("id")?;
    let (page, per_page) = paging(request);
    let registry = registry(request)?;
    let device = registry
        .device(&id)
        .ok_or_else(|| ErrorNotFound("no device with that id"))?;
    let all = device.records();
    let start = (page - 1) * per_page;
    let records = if start < all.len() {
        all[start..all.len().min(start + per_page)]
            .iter()
            .map(|&record| record.clone())
            .collect()
    } else {
        Vec::new()
    };
    Ok(Json(RecordsPage {
        device: id,
        page: page,
        per_page: per_page,
        total: all.len(),
        records: records,
    }))
}

fn records_csv(request: &HttpRequest<State>) -> Result<HttpResponse> {
    let id: String = request.match_info().query("id")?;
    let registry = registry(request)?;
    let device = registry
        .device(&id)
        .ok_or_else(|| ErrorNotFound("no device with that id"))?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    if let Some(first) = device.records().first() {
        writer
            .write_record(first.iter().map(|entry| entry.0))
            .map_err(|err| ErrorInternalServerError(err.to_string()))?;
    }
    for record in device.records() {
        writer
            .write_record(record.iter().map(|entry| entry.1.to_string()))
            .map_err(|err| ErrorInternalServerError(err.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ErrorInternalServerError(err.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .body(bytes))
}

fn gaps(request: &HttpRequest<State>) -> Result<Json<GapReport>> {
    let id: String = request.match_info().query("id")?;
    let registry = registry(request)?;
    let device = registry
        .device(&id)
        .ok_or_else(|| ErrorNotFound("no device with that id"))?;
    Ok(Json(GapReport {
        device: id,
        gaps: device.gaps(),
    }))
}

fn rejects(request: &HttpRequest<State>) -> Result<Json<Vec<tracker::Reject>>> {
    let registry = registry(request)?;
    Ok(Json(registry.rejects().to_vec()))
}

fn registry(request: &HttpRequest<State>) -> Result<tracker::Registry> {
    request
        .state()
        .registry()
        .map_err(|err| ErrorInternalServerError(err.to_string()))
}

fn paging(request: &HttpRequest<State>) -> (usize, usize) {
    let query = request.query();
    let page = query
        .get("page")
        .and_then(|page| page.parse().ok())
        .unwrap_or(1)
        .max(1);
    let per_page = query
        .get("per_page")
        .and_then(|per_page| per_page.parse().ok())
        .unwrap_or(DEFAULT_PER_PAGE)
        .min(MAX_PER_PAGE)
        .max(1);
    (page, per_page)
}
