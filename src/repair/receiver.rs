// ─── Repair Receiver ───
// Child side of the worker bridge. The hosting binary calls `run_receiver`
// with its single positional startup argument; commands arrive on stdin as
// JSON lines and replies leave on stdout the same way. All logging goes to
// stderr so the reply channel stays clean.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use super::message::{WorkerCommand, WorkerReply};
use super::FullRepair;
use crate::error::{CoreError, CoreResult};
use crate::paths::LauncherPaths;

/// Startup-argument key selecting the full repair handler.
pub const FULL_REPAIR_HANDLER: &str = "fullRepair";

/// Run the receiver loop. Returns the process exit code: 0 after a
/// disconnect signal, 1 on an unknown handler or an execution failure.
pub async fn run_receiver(handler_key: &str) -> i32 {
    // The worker owns its process: structured logging goes to stderr where
    // the transmitter picks it up line-by-line.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut handler = match handler_registry(handler_key) {
        Some(handler) => handler,
        None => {
            error!("Unknown receiver handler: {handler_key}");
            return 1;
        }
    };

    info!("Receiver ready ({handler_key})");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = match stdin.next_line().await {
            Ok(Some(line)) => line,
            // Parent went away without a disconnect: treat as torn down
            Ok(None) => return 0,
            Err(e) => {
                error!("Channel read failed: {e}");
                return 1;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let command: WorkerCommand = match serde_json::from_str(&line) {
            Ok(command) => command,
            Err(e) => {
                error!("Malformed command: {e}");
                let _ = emit(&mut stdout, &WorkerReply::Error { displayable: None }).await;
                return 1;
            }
        };

        if command == WorkerCommand::Disconnect {
            info!("Disconnect received");
            let _ = stdout.flush().await;
            return 0;
        }

        if let Err(e) = handler.execute(command, &mut stdout).await {
            error!("Handler failed: {e}");
            let displayable = handler.displayable_error(&e);
            let _ = emit(&mut stdout, &WorkerReply::Error { displayable }).await;
            let _ = stdout.flush().await;
            return 1;
        }
    }
}

async fn emit(stdout: &mut tokio::io::Stdout, reply: &WorkerReply) -> CoreResult<()> {
    let mut line = serde_json::to_string(reply)?;
    line.push('\n');
    stdout
        .write_all(line.as_bytes())
        .await
        .map_err(|e| CoreError::Worker(format!("reply write failed: {e}")))?;
    stdout
        .flush()
        .await
        .map_err(|e| CoreError::Worker(format!("reply flush failed: {e}")))?;
    Ok(())
}

/// Closed, compile-time handler registry keyed by the startup argument.
fn handler_registry(key: &str) -> Option<HandlerKind> {
    match key {
        FULL_REPAIR_HANDLER => Some(HandlerKind::FullRepair(FullRepairHandler::default())),
        _ => None,
    }
}

enum HandlerKind {
    FullRepair(FullRepairHandler),
}

impl HandlerKind {
    async fn execute(
        &mut self,
        command: WorkerCommand,
        stdout: &mut tokio::io::Stdout,
    ) -> CoreResult<()> {
        match self {
            HandlerKind::FullRepair(h) => h.execute(command, stdout).await,
        }
    }

    fn displayable_error(&self, error: &CoreError) -> Option<String> {
        match self {
            HandlerKind::FullRepair(h) => h.displayable_error(error),
        }
    }
}

// ── Full repair handler ─────────────────────────────────

#[derive(Default)]
struct FullRepairHandler {
    repair: Option<FullRepair>,
}

impl FullRepairHandler {
    async fn execute(
        &mut self,
        command: WorkerCommand,
        stdout: &mut tokio::io::Stdout,
    ) -> CoreResult<()> {
        match command {
            WorkerCommand::Validate {
                server_id,
                launcher_directory,
                common_directory,
                instance_directory,
                dev_mode,
            } => {
                let paths = LauncherPaths::new(
                    launcher_directory.clone(),
                    common_directory,
                    instance_directory,
                    launcher_directory,
                );
                let mut repair = FullRepair::new(paths, server_id, dev_mode);

                // Stream stage progress while validation runs
                let invalid_count = {
                    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
                    let verify = repair.verify(move |percent| {
                        let _ = tx.send(percent);
                    });
                    tokio::pin!(verify);

                    let count = loop {
                        tokio::select! {
                            result = &mut verify => break result?,
                            Some(percent) = rx.recv() => {
                                emit(stdout, &WorkerReply::ValidateProgress { percent }).await?;
                            }
                        }
                    };
                    while let Ok(percent) = rx.try_recv() {
                        emit(stdout, &WorkerReply::ValidateProgress { percent }).await?;
                    }
                    count
                };

                self.repair = Some(repair);
                emit(stdout, &WorkerReply::ValidateComplete { invalid_count }).await
            }
            WorkerCommand::Download => {
                let repair = self.repair.as_mut().ok_or(CoreError::ValidationPending)?;

                let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
                let download = repair.download(move |percent| {
                    let _ = tx.send(percent);
                });
                tokio::pin!(download);

                loop {
                    tokio::select! {
                        result = &mut download => {
                            result?;
                            break;
                        }
                        Some(percent) = rx.recv() => {
                            emit(stdout, &WorkerReply::DownloadProgress { percent }).await?;
                        }
                    }
                }
                while let Ok(percent) = rx.try_recv() {
                    emit(stdout, &WorkerReply::DownloadProgress { percent }).await?;
                }

                emit(stdout, &WorkerReply::DownloadComplete).await
            }
            WorkerCommand::Disconnect => Ok(()),
        }
    }

    /// User-facing classification for unhandled failures.
    fn displayable_error(&self, error: &CoreError) -> Option<String> {
        match error.kind() {
            "network" => Some(
                "No se pudieron descargar los archivos del juego. Verifica tu conexión a internet."
                    .into(),
            ),
            "integrity" => Some(
                "Un archivo descargado llegó corrupto. Vuelve a intentar la reparación.".into(),
            ),
            "distribution" => {
                Some("El manifiesto del servidor es inválido. Contacta al administrador.".into())
            }
            _ => None,
        }
    }
}
