//! `dpr serve` – answer browser download events over stdin/stdout.

use anyhow::{Context, Result};
use dpr_core::config::DprConfig;
use dpr_core::protocol::{encode_response, parse_event};
use dpr_core::router::DownloadRouter;
use dpr_core::store::SettingsStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub async fn run_serve<S: SettingsStore>(store: S, cfg: &DprConfig) -> Result<()> {
    let mut router = DownloadRouter::new(store, cfg);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    tracing::info!("serving host events on stdin");
    let answered = serve_lines(&mut router, stdin, &mut stdout).await?;
    tracing::info!(answered, "host closed stdin");
    Ok(())
}

/// Feed each input line to the router and write one response line per
/// filename decision. Malformed lines are logged and skipped. Returns the
/// number of responses written.
pub(crate) async fn serve_lines<S, R, W>(
    router: &mut DownloadRouter<S>,
    reader: R,
    writer: &mut W,
) -> Result<usize>
where
    S: SettingsStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0;
    while let Some(line) = lines.next_line().await.context("read host event")? {
        if line.trim().is_empty() {
            continue;
        }
        let event = match parse_event(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("skipping line: {:#}", e);
                continue;
            }
        };
        if let Some(response) = router.handle(event).await {
            let mut out = encode_response(&response)?;
            out.push('\n');
            writer
                .write_all(out.as_bytes())
                .await
                .context("write host response")?;
            writer.flush().await?;
            answered += 1;
        }
    }
    Ok(answered)
}
