use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use engine_logging::{engine_info, engine_warn};
use shorts_core::{AppViewModel, BoundState, ChannelRef, JobOutcome, Msg, OrchestrationState};
use shorts_engine::{save_artifact, Engine, ReqwestBackend};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::render::render_line;

/// Runs one job from channel lookup to the saved archive.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(&cli.config)?;
    cli.apply_overrides(&mut config);

    if ChannelRef::parse(&cli.channel).is_none() {
        bail!("--channel must not be blank");
    }

    let backend = Arc::new(ReqwestBackend::new(config.backend_settings()?)?);
    let mut engine = Engine::new(
        OrchestrationState::with_policy(config.policy()),
        backend.clone(),
        config.engine_settings(),
    );
    let renderer = spawn_renderer(engine.subscribe());

    let outcome = drive(&mut engine, &cli).await;
    // Closing the snapshot channel lets the renderer print the last line and exit.
    drop(engine);
    if let Err(err) = renderer.await {
        engine_warn!("renderer task ended abnormally: {}", err);
    }
    let outcome = outcome?;

    let artifact_url = Url::parse(&outcome.artifact_link)
        .with_context(|| format!("backend returned unusable link {}", outcome.artifact_link))?;
    if cli.no_download {
        println!("{artifact_url}");
        return Ok(());
    }

    let bytes = backend.fetch_artifact(&artifact_url).await?;
    let saved = save_artifact(&config.output_dir, &artifact_url, &bytes)?;
    engine_info!(
        "saved {} ({} bytes, sha256 {})",
        saved.path.display(),
        saved.byte_len,
        saved.sha256
    );
    println!(
        "saved {} ({} bytes, sha256 {})",
        saved.path.display(),
        saved.byte_len,
        saved.sha256
    );
    Ok(())
}

async fn drive(engine: &mut Engine, cli: &Cli) -> Result<JobOutcome> {
    engine.dispatch(Msg::ChannelChanged(cli.channel.clone()));
    engine.run_until(|state| !state.bound().is_pending()).await;
    if let BoundState::Failed { message, .. } = engine.state().bound() {
        bail!("channel lookup failed: {message}");
    }

    engine.dispatch(Msg::StartChanged(cli.start));
    if let Some(end) = cli.end {
        engine.dispatch(Msg::EndChanged(end));
    }
    engine.dispatch(Msg::SubmitClicked);
    if let Some(err) = engine.state().last_error() {
        return Err(err.clone().into());
    }

    let cancel_tx = engine.sender();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(Msg::CancelClicked);
        }
    });
    engine.run_until(|state| !state.is_busy()).await;
    ctrl_c.abort();

    let state = engine.state();
    if let Some(outcome) = state.pipeline().outcome() {
        return Ok(outcome.clone());
    }
    match state.last_error() {
        Some(err) => Err(err.clone().into()),
        None => Err(anyhow!("job cancelled")),
    }
}

/// Prints a line whenever the rendered text changes.
fn spawn_renderer(mut snapshots: watch::Receiver<AppViewModel>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = String::new();
        while snapshots.changed().await.is_ok() {
            let line = render_line(&snapshots.borrow_and_update());
            if line != last {
                println!("{line}");
                last = line;
            }
        }
    })
}
