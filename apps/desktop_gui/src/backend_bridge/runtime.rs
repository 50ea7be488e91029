//! Backend worker: owns the tokio runtime and the slideshow context.

use std::thread;

use crossbeam_channel::{Receiver, Sender};
use scenes_core::{error_report, AppContext, Settings};
use storage::LocalStorage;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    settings: Settings,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut context = match start_context(&settings).await {
                Ok(context) => context,
                Err(err) => {
                    tracing::error!("backend worker startup failure: {err:#}");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_report(
                        UiErrorContext::BackendStartup,
                        error_report(&err),
                    )));
                    return;
                }
            };
            reply(&ui_tx, UiEvent::Ready(context.rendered()));

            // Commands are handled one at a time so every click runs to completion.
            while let Ok(cmd) = cmd_rx.recv() {
                let (outcome, error_context) = match cmd {
                    BackendCommand::Click { view_id } => (
                        context.click(view_id).await.map(|_| ()),
                        UiErrorContext::Advance,
                    ),
                    BackendCommand::Advance => {
                        (context.advance().await.map(|_| ()), UiErrorContext::Advance)
                    }
                    BackendCommand::Restart => {
                        (context.start().await.map(|_| ()), UiErrorContext::Restart)
                    }
                    BackendCommand::Shutdown => break,
                };

                let delivered = match outcome {
                    Ok(()) => reply(&ui_tx, UiEvent::Rendered(context.rendered())),
                    Err(err) => {
                        tracing::warn!("backend command failed: {err:#}");
                        reply(
                            &ui_tx,
                            UiEvent::Error(UiError::from_report(error_context, error_report(&err))),
                        ) && reply(&ui_tx, UiEvent::Rendered(context.rendered()))
                    }
                };
                if !delivered {
                    break;
                }
            }

            context.shutdown();
            tracing::info!("backend worker stopped");
        });
    })
}

/// Command replies block so the window always learns a command finished.
/// Returns `false` once the window is gone.
fn reply(ui_tx: &Sender<UiEvent>, event: UiEvent) -> bool {
    match ui_tx.send(event) {
        Ok(()) => true,
        Err(_) => {
            tracing::info!("ui event queue disconnected, stopping backend worker");
            false
        }
    }
}

async fn start_context(settings: &Settings) -> anyhow::Result<AppContext<LocalStorage>> {
    let mut context = AppContext::open(settings).await?;
    context.start().await?;
    Ok(context)
}
