use actix_web::{web, App, HttpServer, HttpResponse, middleware};
use actix_cors::Cors;
use clap::Parser;
use dotenv::dotenv;
use log::info;

mod config;
mod error;
mod models;
mod handlers;
mod services;

use config::Config;
use handlers::dingtalk::{handle_sonar_webhook, AppState};
use services::dingtalk::DingTalkClient;
use services::sonar::SonarClient;

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "sonar-dingtalk-relay"
    }))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::parse();

    let sonar_client = SonarClient::new(config.request_timeout())?;
    let dingtalk_client = DingTalkClient::new(config.dingtalk_url.clone(), config.request_timeout())?;

    let app_state = web::Data::new(AppState {
        sonar_client,
        dingtalk_client,
        multi_branch: config.multi_branch,
    });

    let bind_addr = config.bind_addr();
    info!("Server started on {} (http)", bind_addr);
    info!("Support multiple-branch: {}", config.multi_branch);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .route("/health", web::get().to(health_check))
            .route("/dingtalk", web::post().to(handle_sonar_webhook))
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
