//! The interactive download session: one magnet link, one file
//! selection, one run to completion.
//!
//! The session is the single owning scope for the engine handle: every
//! exit path, completion, fatal error and interrupt alike, releases it
//! exactly once before returning. Nothing is retried; a failed stage
//! fails the whole session.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::alert::{self, Alert};
use crate::conf::Conf;
use crate::engine::TransferEngine;
use crate::error::Result;
use crate::magnet::Magnet;
use crate::metainfo::Metainfo;
use crate::piece_picker;
use crate::progress::{self, Sampler};
use crate::selection::{self, SelectionSet};
use crate::storage_info;
use crate::ui;

/// An interactive selective-download session over a transfer engine.
pub struct Session<E> {
    engine: Arc<E>,
    conf: Conf,
}

impl<E> Session<E>
where
    E: TransferEngine + 'static,
{
    pub fn new(engine: Arc<E>, conf: Conf) -> Self {
        Self { engine, conf }
    }

    /// Runs the whole session over the given interactive streams.
    ///
    /// Prompts for a magnet link and a file selection, steers the engine
    /// to download exactly the selected files and renders progress until
    /// the selection completes, the engine fails or the user interrupts.
    ///
    /// An empty identifier ends the session successfully without ever
    /// touching the engine's transfer machinery, mirroring a user who
    /// changed their mind at the first prompt.
    pub async fn run<R, W>(&self, mut input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let result = self.run_inner(&mut input, &mut output).await;

        // single release point for every path out of the session.
        self.engine.release();

        if let Err(error) = &result {
            log::error!("Session failed: {}", error);
        }

        result
    }

    async fn run_inner<R, W>(&self, input: &mut R, output: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let identifier =
            prompt(input, output, "Paste your magnet link here: ").await?;
        if identifier.is_empty() {
            write_line(output, "No link provided. Exiting.").await?;
            return Ok(());
        }

        let magnet = Magnet::parse(&identifier)?.with_public_trackers();

        write_line(output, "Fetching metadata...").await?;
        let metainfo = self.engine.fetch_metainfo(&magnet).await?;
        let metainfo = Arc::new(metainfo);
        log::info!("Metadata loaded: {:?}", metainfo);

        write_str(output, &ui::render_listing(&metainfo)).await?;

        let selection_input = prompt(
            input,
            output,
            "\nEnter file numbers to download (comma-separated, e.g., 1,3-5, or \"all\"): ",
        )
        .await?;
        let selection =
            selection::parse_selection(&selection_input, metainfo.file_count())?;

        let picked: Vec<String> =
            selection.iter().map(|i| (i + 1).to_string()).collect();
        write_line(output, &format!("Selected files: {}", picked.join(", ")))
            .await?;

        let download_dir =
            storage_info::prepare_download_dir(&self.conf.download_dir, &metainfo.name)
                .await?;
        write_line(
            output,
            &format!("Saving to: {}", download_dir.display()),
        )
        .await?;

        self.engine.start(&magnet, &download_dir).await?;

        // all priority directives must be in before sampling is armed,
        // otherwise the first ticks would measure a half-configured
        // engine.
        piece_picker::apply_selection(self.engine.as_ref(), &metainfo, &selection);

        let selected_total = metainfo.selection_len(&selection);
        write_line(
            output,
            &format!("Selected total size: {}", ui::human_bytes(selected_total)),
        )
        .await?;

        self.drive_progress(&metainfo, selection, selected_total, output, &download_dir)
            .await
    }

    /// Arms the periodic sampler and drives the alert loop until a
    /// terminal alert or an interrupt arrives.
    async fn drive_progress<W>(
        &self,
        metainfo: &Arc<Metainfo>,
        selection: SelectionSet,
        selected_total: u64,
        output: &mut W,
        download_dir: &std::path::Path,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let sampler = Sampler::new(
            Arc::clone(&self.engine),
            selection,
            selected_total,
            self.conf.update_interval,
            self.conf.rate_window,
        );

        let (alert_tx, mut alert_rx) = alert::alert_channel();
        let sampler_handle = progress::spawn(sampler, alert_tx);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let outcome = loop {
            tokio::select! {
                maybe_alert = alert_rx.recv() => match maybe_alert {
                    Some(Alert::Stats(sample)) => {
                        write_str(output, &ui::render_frame(&sample)).await?;
                    }
                    Some(Alert::Complete) => {
                        write_line(output, "").await?;
                        write_line(
                            output,
                            &format!(
                                "\nDownload complete! Files saved to: {}",
                                download_dir.display()
                            ),
                        )
                        .await?;
                        log::info!("Selection of {:?} complete", metainfo.name);
                        break Ok(());
                    }
                    Some(Alert::Error(error)) => break Err(error.into()),
                    // the task is gone without a terminal alert; nothing
                    // more will arrive.
                    None => break Ok(()),
                },
                _ = &mut ctrl_c => {
                    write_line(output, "\nShutting down...").await?;
                    break Ok(());
                }
            }
        };

        // the task halts itself on every terminal alert; aborting here
        // only matters on the interrupt path and is a no-op otherwise.
        sampler_handle.abort();

        outcome
    }
}

/// Writes the question and reads one trimmed line of input.
async fn prompt<R, W>(input: &mut R, output: &mut W, question: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(question.as_bytes()).await?;
    output.flush().await?;

    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

async fn write_str<W>(output: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

async fn write_line<W>(output: &mut W, line: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::engine::EngineError;
    use crate::error::Error;
    use crate::testing::{metainfo_with_files, Directive, FakeEngine};

    const MAGNET: &str =
        "magnet:?xt=urn:btih:c12fe1c06bba254a9dc9f519b335aa7c1367a88a";

    fn conf(base: &std::path::Path) -> Conf {
        Conf {
            download_dir: base.to_path_buf(),
            ..Conf::default()
        }
    }

    fn output_of(buffer: &Cursor<Vec<u8>>) -> String {
        String::from_utf8(buffer.get_ref().clone()).unwrap()
    }

    #[tokio::test]
    async fn empty_identifier_ends_the_session_cleanly() {
        let engine = Arc::new(FakeEngine::default());
        let session = Session::new(Arc::clone(&engine), Conf::default());

        let mut output = Cursor::new(Vec::new());
        session.run(b"\n".as_slice(), &mut output).await.unwrap();

        assert!(output_of(&output).contains("No link provided. Exiting."));
        // the engine is still released on the early-out path.
        assert_eq!(engine.release_count(), 1);
        assert!(engine.directives().is_empty());
    }

    #[tokio::test]
    async fn invalid_identifier_is_fatal() {
        let engine = Arc::new(FakeEngine::default());
        let session = Session::new(Arc::clone(&engine), Conf::default());

        let mut output = Cursor::new(Vec::new());
        let result = session
            .run(b"http://not-a-magnet\n".as_slice(), &mut output)
            .await;

        assert!(matches!(result, Err(Error::Magnet(_))));
        assert_eq!(engine.release_count(), 1);
    }

    #[tokio::test]
    async fn invalid_selection_is_session_fatal() {
        let base = tempfile::tempdir().unwrap();
        let metainfo = metainfo_with_files(1024, &[4096, 4096]);
        let engine = Arc::new(FakeEngine::with_metainfo(metainfo));
        let session = Session::new(Arc::clone(&engine), conf(base.path()));

        let input = format!("{}\n0,99\n", MAGNET);
        let mut output = Cursor::new(Vec::new());
        let result = session.run(input.as_bytes(), &mut output).await;

        assert!(matches!(result, Err(Error::Selection(_))));
        assert_eq!(engine.release_count(), 1);
        // the selection never made it to the engine.
        assert!(engine.directives().is_empty());
    }

    #[tokio::test]
    async fn metadata_failure_is_fatal() {
        let engine = Arc::new(FakeEngine::default().with_fetch_error(
            EngineError::MetadataTimeout,
        ));
        let session = Session::new(Arc::clone(&engine), Conf::default());

        let input = format!("{}\n", MAGNET);
        let mut output = Cursor::new(Vec::new());
        let result = session.run(input.as_bytes(), &mut output).await;

        assert!(matches!(
            result,
            Err(Error::Engine(EngineError::MetadataTimeout))
        ));
        assert_eq!(engine.release_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn session_runs_to_completion() {
        let base = tempfile::tempdir().unwrap();
        // two files of 4 pieces each; only the second is selected.
        let metainfo = metainfo_with_files(1024, &[4096, 4096]);
        let engine = Arc::new(FakeEngine::with_metainfo(metainfo));
        engine.set_downloaded(&[0, 4096]);
        let session = Session::new(Arc::clone(&engine), conf(base.path()));

        let input = format!("{}\n2\n", MAGNET);
        let mut output = Cursor::new(Vec::new());
        session.run(input.as_bytes(), &mut output).await.unwrap();

        let printed = output_of(&output);
        assert!(printed.contains("Fetching metadata..."));
        assert!(printed.contains("Selected files: 2"));
        assert!(printed.contains("Selected total size: 4.00 KB"));
        assert!(printed.contains("Download complete!"));

        // the engine was steered before sampling: blanket deselect, one
        // range, file-level deselect of the unselected file.
        let directives = engine.directives();
        assert_eq!(
            directives[0],
            Directive::DeselectPieces(crate::piece_picker::PieceRange::new(0, 7))
        );
        assert!(directives.contains(&Directive::DeselectFile(0)));
        assert!(!directives.contains(&Directive::DeselectFile(1)));

        // started inside the prepared per-bundle folder.
        let started = engine.started_dir().unwrap();
        assert!(started.starts_with(base.path()));
        assert!(started.is_dir());

        assert_eq!(engine.release_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn engine_runtime_failure_stops_the_session() {
        let base = tempfile::tempdir().unwrap();
        let metainfo = metainfo_with_files(1024, &[4096]);
        let engine = Arc::new(FakeEngine::with_metainfo(metainfo));
        engine.set_downloaded(&[128]);
        engine.set_failure(EngineError::Transfer("peer flood".into()));
        let session = Session::new(Arc::clone(&engine), conf(base.path()));

        let input = format!("{}\nall\n", MAGNET);
        let mut output = Cursor::new(Vec::new());
        let result = session.run(input.as_bytes(), &mut output).await;

        assert!(matches!(
            result,
            Err(Error::Engine(EngineError::Transfer(_)))
        ));
        assert_eq!(engine.release_count(), 1);
    }
}
