//! `botvisor`: launches the bot, keeps it alive and serves its health.

use std::sync::Arc;

use anyhow::Context;
use envconfig::Envconfig;
use tracing::{error, info};

use botvisor::{
    telemetry, AlertWriter, Alerter, BackupSet, CommandWorker, Config, GitUpdater, HealthServer,
    HealthState, LogWriter, NoUpdates, Subscribe, Supervisor, Update,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::init_from_env().context("invalid configuration")?;
    let _log_guard = telemetry::init_logging(&config.log_dir, &config.log_file)?;

    info!(
        tag = "INFO",
        bot = %config.bot_command,
        repo = %config.repo_path.display(),
        log = %config.log_path().display(),
        "launcher starting"
    );

    let alerter = Arc::new(
        Alerter::new(config.webhook_url().map(String::from), config.alert_timeout.0)
            .context("building webhook client")?,
    );
    let worker = CommandWorker::new(config.bot_command.clone())
        .with_args(config.bot_args())
        .with_cwd(config.repo_path.clone());
    let updater: Arc<dyn Update> = if config.auto_update {
        Arc::new(
            GitUpdater::new(config.repo_path.clone())
                .with_git(config.git_binary.clone())
                .with_timeout(config.update_timeout.0)
                .with_detection(config.update_detection),
        )
    } else {
        Arc::new(NoUpdates)
    };
    let backup = BackupSet::new(config.repo_path.clone(), config.backup_files.0.clone());
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![
        Arc::new(LogWriter::new()),
        Arc::new(AlertWriter::new(alerter)),
    ];

    let sup = Supervisor::builder(config.supervisor(), Arc::new(worker))
        .with_updater(updater)
        .with_backup(backup)
        .with_subscribers(subscribers)
        .build();
    let token = sup.token();

    let health = Arc::new(HealthState {
        status: sup.status(),
        probe: sup.probe(),
        page: config.status_page(),
    });
    let server = HealthServer::bind(config.bind(), health).await?;
    let http = tokio::spawn(server.run(token.clone()));

    let res = sup.run().await;
    if res.is_ok() && !config.exit_on_stop && !token.is_cancelled() {
        info!(tag = "INFO", "bot stopped, health server keeps running until a signal");
        token.cancelled().await;
    }
    token.cancel();

    match http.await {
        Ok(Err(err)) => error!(tag = "ERROR", error = err.as_label(), "web server failed: {err}"),
        Err(err) => error!(tag = "ERROR", "web server task failed: {err}"),
        Ok(Ok(())) => {}
    }

    res?;
    info!(tag = "EXIT", "launcher stopped");
    Ok(())
}
