use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, get, middleware, web::Data};
use kube::Client;

pub use controller::{self, OperatorConfig, State, telemetry};

#[get("/metrics")]
async fn metrics(c: Data<State>, _req: HttpRequest) -> impl Responder {
    let metrics = c.metrics();
    HttpResponse::Ok()
        .content_type("application/openmetrics-text; version=1.0.0; charset=utf-8")
        .body(metrics)
}

#[get("/health")]
async fn health(_: HttpRequest) -> impl Responder {
    HttpResponse::Ok().json("healthy")
}

#[get("/")]
async fn index(c: Data<State>, _req: HttpRequest) -> impl Responder {
    let d = c.diagnostics().await;
    HttpResponse::Ok().json(&d)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init().await?;

    let config = OperatorConfig::from_env();
    let client = Client::try_default().await?;
    tracing::info!(
        api_url = %config.api_url,
        concurrency = config.max_concurrent_reconciles,
        "starting cloudflare provider"
    );

    // Initialize Kubernetes controller state
    let state = State::default();
    let controllers = controller::run(state.clone(), client, config);

    // Start web server
    let server = HttpServer::new(move || {
        App::new()
            .app_data(Data::new(state.clone()))
            .wrap(middleware::Logger::default().exclude("/health"))
            .service(index)
            .service(health)
            .service(metrics)
    })
    .bind("0.0.0.0:8080")?
    .shutdown_timeout(5);

    // Both runtimes implement graceful shutdown, so poll until both are done
    tokio::join!(controllers, server.run()).1?;
    Ok(())
}
