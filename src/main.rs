use mailing_list::config::get_configuration;
use mailing_list::startup::{Application, StartupError};
use mailing_list::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let subscriber = get_subscriber(
        String::from("mailing_list"),
        String::from("info"),
        std::io::stdout,
    );

    init_subscriber(subscriber);

    let config = get_configuration()?;

    tracing::info!("Using database '{}'", config.get_db_path());

    let application = Application::build(config).await?;

    application.run_until_stopped().await
}
