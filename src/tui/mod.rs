//! # TUI Adapter
//!
//! The ratatui-specific layer. Owns the terminal, renders the response log and
//! the input line, and turns keystrokes into `core::action::Key` values.
//!
//! ## Redraw Strategy
//!
//! There is no timer. The loop redraws once per iteration and then sleeps in
//! `wait_any` until a keystroke, a resize, or a wake signal from the network
//! worker arrives. Several completions that land while the UI is busy
//! coalesce into one wake, so they cost one redraw.

mod event;
pub mod ui;

use std::fmt;
use std::io;
use std::sync::Arc;

use crossterm::event::{Event, EventStream};
use futures::Stream;
use log::{debug, info, warn};
use ratatui::Terminal;
use ratatui::backend::Backend;

use crate::core::action::{Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::error::AppError;
use crate::core::shutdown::ShutdownReport;
use crate::core::state::Session;
use crate::network::{HttpTransport, Pipeline, Transport};
use crate::tui::event::{Ready, TuiEvent, map_event, wait_any};

/// Run the UI until Ctrl+C, end of input, or loss of the worker.
///
/// Returning `Ok` does not mean the worker is healthy; `Pipeline::shutdown`
/// reports its fatal error, if any.
pub async fn control_loop<B, S>(
    terminal: &mut Terminal<B>,
    events: &mut S,
    session: &mut Session,
    pipeline: &mut Pipeline,
) -> Result<(), AppError>
where
    B: Backend,
    B::Error: fmt::Display,
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    loop {
        let view: &Session = session;
        terminal
            .draw(|f| ui::draw_ui(f, &pipeline.log, view))
            .map_err(|e| AppError::Terminal(e.to_string()))?;

        match wait_any(events, &mut pipeline.wake).await {
            Ready::Terminal(event) => match map_event(&event) {
                TuiEvent::Key(key) => match update(session, key) {
                    Effect::Submit(request) => {
                        info!("Submitting fetch for {:?}", request.url);
                        pipeline.commands.submit(request)?;
                    }
                    Effect::Quit => {
                        info!("Interrupt received, leaving control loop");
                        return Ok(());
                    }
                    Effect::None => {}
                },
                TuiEvent::Resize => debug!("Terminal resized"),
                TuiEvent::Ignored => {}
            },
            Ready::Wake => {
                let extra = pipeline.wake.drain();
                debug!(
                    "Wake received ({} coalesced), {} responses published",
                    extra,
                    pipeline.log.published()
                );
            }
            Ready::WorkerGone => {
                warn!(
                    "Network worker is gone (thread finished: {}), leaving control loop",
                    pipeline.worker_finished()
                );
                return Ok(());
            }
            Ready::InputClosed(None) => {
                info!("Terminal input ended");
                return Ok(());
            }
            Ready::InputClosed(Some(e)) => return Err(AppError::Io(e)),
        }
    }
}

/// Start the worker, take over the terminal, and run until the user quits.
///
/// The terminal is restored before the worker is shut down, so shutdown
/// errors land on a normal screen.
pub async fn run(config: ResolvedConfig) -> Result<ShutdownReport, AppError> {
    let transport = HttpTransport::new(&config)?;
    info!(
        "Starting with {} transport, log capacity {}, poll timeout {:?}",
        transport.name(),
        config.log_capacity,
        config.poll_timeout
    );
    let mut pipeline = Pipeline::start(
        Arc::new(transport),
        config.log_capacity,
        config.poll_timeout,
    )?;
    let mut session = Session::new(config.input_capacity);

    let outcome = match ratatui::try_init() {
        Ok(mut terminal) => {
            let mut events = EventStream::new();
            let result =
                control_loop(&mut terminal, &mut events, &mut session, &mut pipeline).await;
            ratatui::restore();
            result
        }
        Err(e) => Err(AppError::Io(e)),
    };

    let report = pipeline.shutdown();
    outcome?;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::response_log::{LogError, LogReader};
    use crate::network::WorkerError;
    use crate::test_support::{PendingTransport, StubTransport};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use futures::channel::mpsc;
    use ratatui::backend::TestBackend;
    use std::time::Duration;

    const SHORT_POLL: Duration = Duration::from_millis(50);

    type Events = mpsc::UnboundedSender<io::Result<Event>>;

    fn send_key(tx: &Events, code: KeyCode, modifiers: KeyModifiers) {
        tx.unbounded_send(Ok(Event::Key(KeyEvent::new(code, modifiers))))
            .unwrap();
    }

    fn type_line(tx: &Events, text: &str) {
        for c in text.chars() {
            send_key(tx, KeyCode::Char(c), KeyModifiers::NONE);
        }
        send_key(tx, KeyCode::Enter, KeyModifiers::NONE);
    }

    fn interrupt(tx: &Events) {
        send_key(tx, KeyCode::Char('c'), KeyModifiers::CONTROL);
    }

    async fn wait_published(log: &LogReader, count: usize) {
        for _ in 0..2500 {
            if log.published() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("log never reached {count} responses");
    }

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    /// Type `url`, wait for its response to be drawn, then send `after` and Ctrl+C.
    async fn fetch_then(
        url: &str,
        body: &str,
        after: &[KeyCode],
    ) -> (Terminal<TestBackend>, Session, Pipeline) {
        let stub = StubTransport::new().respond(url, body);
        let mut pipeline = Pipeline::start(Arc::new(stub), 8, SHORT_POLL).unwrap();
        let log = pipeline.log.clone();
        let mut terminal = Terminal::new(TestBackend::new(20, 4)).unwrap();
        let mut session = Session::default();
        let (tx, mut events) = mpsc::unbounded();

        type_line(&tx, url);
        let driver = async {
            wait_published(&log, 1).await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            for code in after {
                send_key(&tx, *code, KeyModifiers::NONE);
            }
            interrupt(&tx);
        };
        let (result, ()) = tokio::join!(
            control_loop(&mut terminal, &mut events, &mut session, &mut pipeline),
            driver
        );
        result.unwrap();
        (terminal, session, pipeline)
    }

    #[tokio::test]
    async fn test_typed_url_is_fetched_and_drawn() {
        let (terminal, session, pipeline) =
            fetch_then("http://a", "first line\nsecond line\n", &[]).await;

        assert_eq!(row_text(&terminal, 0), "");
        assert_eq!(row_text(&terminal, 1), "first line");
        assert_eq!(row_text(&terminal, 2), "second line");
        assert_eq!(row_text(&terminal, 3), "");
        assert!(session.input_line.is_empty());

        let report = pipeline.shutdown().unwrap();
        assert_eq!(report.completed, 1);
        assert_eq!(report.published, 1);
    }

    #[tokio::test]
    async fn test_scroll_key_reveals_older_line() {
        let (terminal, session, pipeline) =
            fetch_then("http://a", "one\ntwo\nthree\nfour", &[KeyCode::Char('\'')]).await;

        assert_eq!(session.scroll_offset, 1);
        assert_eq!(row_text(&terminal, 0), "one");
        assert_eq!(row_text(&terminal, 1), "two");
        assert_eq!(row_text(&terminal, 2), "three");
        pipeline.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_interrupt_leaves_queued_requests_for_reclaim() {
        let mut pipeline = Pipeline::start(
            Arc::new(PendingTransport::default()),
            8,
            Duration::from_secs(10),
        )
        .unwrap();
        let mut terminal = Terminal::new(TestBackend::new(20, 4)).unwrap();
        let mut session = Session::default();
        let (tx, mut events) = mpsc::unbounded();

        for host in ["a", "b", "c"] {
            type_line(&tx, host);
        }
        interrupt(&tx);

        control_loop(&mut terminal, &mut events, &mut session, &mut pipeline)
            .await
            .unwrap();

        let report = pipeline.shutdown().unwrap();
        assert!(report.started <= 1);
        assert_eq!(report.started + report.reclaimed, 3);
        assert_eq!(report.published, 0);
    }

    #[tokio::test]
    async fn test_end_of_input_stops_loop() {
        let mut pipeline =
            Pipeline::start(Arc::new(StubTransport::new()), 4, SHORT_POLL).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(10, 3)).unwrap();
        let mut session = Session::default();
        let (tx, mut events) = mpsc::unbounded();
        send_key(&tx, KeyCode::Char('x'), KeyModifiers::NONE);
        drop(tx);

        control_loop(&mut terminal, &mut events, &mut session, &mut pipeline)
            .await
            .unwrap();
        assert_eq!(session.input_line, "x");
        pipeline.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_input_error_is_fatal() {
        let mut pipeline =
            Pipeline::start(Arc::new(StubTransport::new()), 4, SHORT_POLL).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(10, 3)).unwrap();
        let mut session = Session::default();
        let (tx, mut events) = mpsc::unbounded();
        tx.unbounded_send(Err(io::Error::other("tty lost"))).unwrap();

        let err = control_loop(&mut terminal, &mut events, &mut session, &mut pipeline)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        pipeline.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_worker_failure_ends_loop_and_surfaces_on_shutdown() {
        let stub = StubTransport::new().respond("http://a", "a");
        let mut pipeline = Pipeline::start(Arc::new(stub), 1, SHORT_POLL).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(10, 3)).unwrap();
        let mut session = Session::default();
        let (tx, mut events) = mpsc::unbounded();

        type_line(&tx, "http://a");
        type_line(&tx, "http://a");

        control_loop(&mut terminal, &mut events, &mut session, &mut pipeline)
            .await
            .unwrap();
        assert_eq!(pipeline.log.published(), 1);

        let err = pipeline.shutdown().unwrap_err();
        assert!(matches!(
            err,
            AppError::Worker(WorkerError::Log(LogError::CapacityExceeded { capacity: 1 }))
        ));
        drop(tx);
    }
}
