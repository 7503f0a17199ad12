use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use tokio::task::JoinError;
use tracing_actix_web::TracingLogger;

use crate::config::Settings;
use crate::routes::{
    handle_create_subscriber, handle_delete_subscriber, handle_get_subscriber,
    handle_list_subscribers, handle_update_subscriber, health_check, json_error_handler,
};
use crate::rpc::handle_rpc;
use crate::service::SubscriberService;
use crate::store::{get_connection_db_pool, StoreError, SubscriberStore};
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum StartupError {
    #[error("Failed to load the configuration.")]
    Configuration(#[from] config::ConfigError),
    #[error("Failed to prepare the subscriber store.")]
    Schema(#[from] StoreError),
    #[error("Server I/O failure.")]
    Io(#[from] std::io::Error),
    #[error("{0} task failed.")]
    Task(&'static str, #[source] JoinError),
}

impl std::fmt::Debug for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Both front-ends bound and ready to serve the same subscriber store.
pub struct Application {
    json_port: u16,
    rpc_port: u16,
    json_server: Server,
    rpc_server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, StartupError> {
        let db_pool = get_connection_db_pool(&config.database);
        let store = SubscriberStore::new(db_pool);

        // Nothing may be served before the table exists
        store.ensure_schema().await?;

        // A single service instance, shared by every worker of both servers
        let service = web::Data::new(SubscriberService::new(store));

        let json_listener = TcpListener::bind(config.get_json_address())?;
        let json_port = json_listener.local_addr()?.port();
        let rpc_listener = TcpListener::bind(config.get_rpc_address())?;
        let rpc_port = rpc_listener.local_addr()?.port();

        let json_server = run_json_api(json_listener, service.clone())?;
        let rpc_server = run_rpc_api(rpc_listener, service)?;

        tracing::info!(
            "JSON API listening on {}:{}",
            config.application.get_host(),
            json_port
        );
        tracing::info!(
            "RPC API listening on {}:{}",
            config.application.get_host(),
            rpc_port
        );

        Ok(Self {
            json_port,
            rpc_port,
            json_server,
            rpc_server,
        })
    }

    pub fn get_json_port(&self) -> u16 {
        self.json_port
    }

    pub fn get_rpc_port(&self) -> u16 {
        self.rpc_port
    }

    /// Runs both servers as independent tasks until the first of them stops; the other
    /// one is dropped with the process.
    pub async fn run_until_stopped(self) -> Result<(), StartupError> {
        let json_task = tokio::spawn(self.json_server);
        let rpc_task = tokio::spawn(self.rpc_server);

        tokio::select! {
            outcome = json_task => report_exit("JSON API", outcome),
            outcome = rpc_task => report_exit("RPC API", outcome),
        }
    }
}

pub fn run_json_api(
    listener: TcpListener,
    service: web::Data<SubscriberService>,
) -> Result<Server, std::io::Error> {
    let json_config = web::JsonConfig::default().error_handler(json_error_handler);

    let server = HttpServer::new(move || {
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/email/create", web::post().to(handle_create_subscriber))
            .route("/email/get", web::get().to(handle_get_subscriber))
            .route("/email/get", web::post().to(handle_get_subscriber))
            .route("/email/get_batch", web::get().to(handle_list_subscribers))
            .route("/email/get_batch", web::post().to(handle_list_subscribers))
            .route("/email/update", web::post().to(handle_update_subscriber))
            .route("/email/delete", web::post().to(handle_delete_subscriber))
            .app_data(json_config.clone())
            .app_data(service.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn run_rpc_api(
    listener: TcpListener,
    service: web::Data<SubscriberService>,
) -> Result<Server, std::io::Error> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/rpc", web::post().to(handle_rpc))
            .app_data(service.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

fn report_exit(
    api_name: &'static str,
    outcome: Result<Result<(), std::io::Error>, JoinError>,
) -> Result<(), StartupError> {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", api_name);
            Ok(())
        }
        Ok(Err(err)) => {
            tracing::error!(error.cause_chain = ?err, error.message = %err, "{} failed", api_name);
            Err(StartupError::Io(err))
        }
        Err(err) => {
            tracing::error!(error.cause_chain = ?err, error.message = %err, "{} task failed to complete", api_name);
            Err(StartupError::Task(api_name, err))
        }
    }
}
