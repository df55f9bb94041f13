//! Charge Match - HTTP server
//!
//! Verifies charge filings against user-supplied attributes
//! Port: 9001 (PORT)

use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use charge_match::config::Settings;
use charge_match::{
    extract_document, verify_batch, verify_document, Candidate, CandidateOutcome, DateFormatError,
    ExtractedFields, MatchReport, NormalizedDate, Query, ScoreMode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct DateRequest {
    date: String,
}

#[derive(Deserialize)]
struct ExtractRequest {
    pages: Vec<String>,
}

#[derive(Deserialize)]
struct VerifyRequest {
    query: Query,
    pages: Vec<String>,
}

#[derive(Deserialize)]
struct BatchRequest {
    query: Query,
    candidates: Vec<Candidate>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct StatsResponse {
    status: &'static str,
    threads: usize,
    version: &'static str,
    score_mode: ScoreMode,
}

#[derive(Serialize)]
struct ExtractResponse {
    #[serde(flatten)]
    fields: ExtractedFields,
    processing_time_ms: u64,
}

#[derive(Serialize)]
struct VerifyResponse {
    #[serde(flatten)]
    report: MatchReport,
    processing_time_ms: u64,
}

#[derive(Serialize)]
struct BatchResponse {
    results: Vec<CandidateOutcome>,
    matched: Vec<usize>,
    processing_time_ms: u64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn rejected_date(err: DateFormatError) -> HttpResponse {
    warn!(input = %err.input, "rejected query date");
    HttpResponse::UnprocessableEntity().json(ErrorResponse { error: err.to_string() })
}

// Health check
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        service: "charge-match",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// Stats
async fn stats(settings: web::Data<Settings>) -> HttpResponse {
    HttpResponse::Ok().json(StatsResponse {
        status: "ready",
        threads: rayon::current_num_threads(),
        version: env!("CARGO_PKG_VERSION"),
        score_mode: settings.score_mode,
    })
}

// Date forms for a query date
async fn date(req: web::Json<DateRequest>) -> HttpResponse {
    match NormalizedDate::parse(&req.date) {
        Ok(date) => HttpResponse::Ok().json(date),
        Err(err) => rejected_date(err),
    }
}

// Fields of a single document
async fn extract(req: web::Json<ExtractRequest>) -> HttpResponse {
    let start = std::time::Instant::now();
    let fields = extract_document(&req.pages);
    HttpResponse::Ok().json(ExtractResponse {
        fields,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

// Verdict for a single document
async fn verify(req: web::Json<VerifyRequest>, settings: web::Data<Settings>) -> HttpResponse {
    let start = std::time::Instant::now();
    match verify_document(&req.pages, &req.query, settings.score_mode) {
        Ok(report) => HttpResponse::Ok().json(VerifyResponse {
            report,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }),
        Err(err) => rejected_date(err),
    }
}

// Verdicts for a filing history
async fn batch(req: web::Json<BatchRequest>, settings: web::Data<Settings>) -> HttpResponse {
    let start = std::time::Instant::now();
    let results = match verify_batch(&req.query, &req.candidates, settings.score_mode) {
        Ok(results) => results,
        Err(err) => return rejected_date(err),
    };
    let matched: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, outcome)| outcome.is_match())
        .map(|(idx, _)| idx)
        .collect();

    info!(candidates = results.len(), matched = matched.len(), "batch evaluated");
    HttpResponse::Ok().json(BatchResponse {
        results,
        matched,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/stats", web::get().to(stats))
        .route("/date", web::post().to(date))
        .route("/extract", web::post().to(extract))
        .route("/verify", web::post().to(verify))
        .route("/batch", web::post().to(batch));
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new()?;
    let addr = settings.bind_addr();

    info!(%addr, score_mode = ?settings.score_mode, threads = rayon::current_num_threads(), "starting charge-match");

    let data = web::Data::new(settings);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .app_data(data.clone())
            .configure(routes)
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};

    fn pages() -> Value {
        json!([
            "Company name: Acme Ltd\nCompany number: 01234567\nCharge code: 0123 4567 8901",
            "Date of creation: 15/03/2023\nPersons entitled: HSBC UK Bank PLC.\nCharge creation date: 15/03/2023\nBrief description: All assets of the company\nContains floating charge."
        ])
    }

    fn query() -> Value {
        json!({
            "company_name": "Acme Ltd",
            "persons_entitled": "HSBC UK Bank PLC",
            "brief_description": "All assets of the company",
            "creation_date": "15 March 2023"
        })
    }

    fn with_mode(mode: ScoreMode) -> web::Data<Settings> {
        web::Data::new(Settings { score_mode: mode, ..Settings::default() })
    }

    #[actix_web::test]
    async fn health_ok() {
        let app = test::init_service(App::new().configure(routes)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn date_forms() {
        let app = test::init_service(App::new().configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/date")
            .set_json(json!({"date": "05 January 2024"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["month_in_num"], "05/01/2024");
        assert_eq!(body["filename_date"], "20240105");
    }

    #[actix_web::test]
    async fn date_rejected() {
        let app = test::init_service(App::new().configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/date")
            .set_json(json!({"date": "2024-01-05"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn extract_fields() {
        let app = test::init_service(App::new().configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/extract")
            .set_json(json!({"pages": pages()}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["company_name"], "ACME LTD");
        assert_eq!(body["charge_code"], "012345678901");
        assert_eq!(body["month_in_num"], "15/03/2023");
    }

    #[actix_web::test]
    async fn verify_uses_configured_score_mode() {
        let app = test::init_service(
            App::new().app_data(with_mode(ScoreMode::Truncated)).configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/verify")
            .set_json(json!({"query": query(), "pages": pages()}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["matched"], false);
        assert_eq!(body["criteria"][1]["criterion"], "persons_entitled");
        assert_eq!(body["criteria"][1]["passed"], false);

        let app = test::init_service(
            App::new().app_data(with_mode(ScoreMode::Percent)).configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/verify")
            .set_json(json!({"query": query(), "pages": pages()}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["matched"], true);
        assert_eq!(body["readable"], true);
    }

    #[actix_web::test]
    async fn batch_reports_matching_indices() {
        let app = test::init_service(
            App::new().app_data(with_mode(ScoreMode::Percent)).configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/batch")
            .set_json(json!({
                "query": query(),
                "candidates": [
                    {"description": "Registration of charge created 4 June 2023", "pages": pages()},
                    {"pages": []},
                    {"description": "Registration of charge created 15 March 2023", "pages": pages()}
                ]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["matched"], json!([2]));
        assert_eq!(body["results"][0]["status"], "skipped");
        assert_eq!(body["results"][1]["status"], "evaluated");
        assert_eq!(body["results"][1]["readable"], false);
    }
}
