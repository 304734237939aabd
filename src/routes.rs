use std::collections::HashMap;

use chrono::Utc;
use mud_report_metrics::{Template, build_report, comparison_csv};
use serde::Serialize;
use worker::{Context, Env, Request, Response, Result, RouteContext, Router};

use crate::error::ApiError;
use crate::models::{DEFAULT_TEMPLATE, ReportResponse, TemplateInfo, TemplatesResponse};
use crate::query::{content_disposition, parse_default_template, parse_view_request, require_group_by};
use crate::upload::read_uploaded_documents;

#[derive(Debug, Clone)]
pub struct AppState {
    pub default_template: Template,
}

pub async fn handle(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    let default_template = match env.var("DEFAULT_TEMPLATE") {
        Ok(value) => parse_default_template(&value.to_string()).unwrap_or_else(|error| {
            worker::console_error!("ignoring DEFAULT_TEMPLATE: {error}");
            DEFAULT_TEMPLATE
        }),
        Err(_) => DEFAULT_TEMPLATE,
    };

    let state = AppState { default_template };

    Router::with_data(state)
        .get("/api/v1/templates", templates_route)
        .post_async("/api/v1/reports", reports_route)
        .post_async("/api/v1/comparison", comparison_route)
        .run(req, env)
        .await
}

fn templates_route(_req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    json_response(&TemplatesResponse {
        default_template: ctx.data.default_template,
        items: Template::ALL
            .into_iter()
            .map(TemplateInfo::from_template)
            .collect(),
    })
}

async fn reports_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match reports_response(&mut req, ctx.data.default_template).await {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn comparison_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match comparison_response(&mut req, ctx.data.default_template).await {
        Ok(response) => Ok(response),
        Err(error) => error.into_response(),
    }
}

async fn reports_response(
    req: &mut Request,
    default_template: Template,
) -> Result<ReportResponse, ApiError> {
    let request = parse_view_request(&parse_query(req)?, default_template)?;
    let documents = read_uploaded_documents(req).await?;
    let report = build_report(&documents, &request);
    log_failures(&report.failures);
    Ok(ReportResponse::from_report(report, Utc::now()))
}

async fn comparison_response(
    req: &mut Request,
    default_template: Template,
) -> Result<Response, ApiError> {
    let request = parse_view_request(&parse_query(req)?, default_template)?;
    require_group_by(&request)?;
    let documents = read_uploaded_documents(req).await?;
    let report = build_report(&documents, &request);
    log_failures(&report.failures);
    if report.is_empty() {
        return Err(ApiError::Parse(
            "none of the uploaded documents could be read".to_string(),
        ));
    }

    let (file_name, csv) = comparison_csv(&report)?;
    let mut response = Response::from_bytes(csv)?;
    response
        .headers_mut()
        .set("Content-Type", "text/csv; charset=utf-8")?;
    response
        .headers_mut()
        .set("Content-Disposition", &content_disposition(&file_name))?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn log_failures(failures: &[mud_report_metrics::DocumentFailure]) {
    for failure in failures {
        worker::console_log!("skipped '{}': {}", failure.name, failure.message);
    }
}

fn json_response<T>(payload: &T) -> Result<Response>
where
    T: Serialize,
{
    let mut response = Response::from_json(payload)?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn parse_query(req: &Request) -> Result<HashMap<String, String>, ApiError> {
    let url = req.url()?;
    let query = url
        .query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    Ok(query)
}
