mod telemetry;

use nudge_api::Application;
use nudge_infra::setup_context;
use telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();

    init_telemetry("info");

    let context = setup_context().await;

    let app = Application::new(context).await?;
    app.start().await
}
