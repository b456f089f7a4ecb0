use anyhow::Result;
use clinchat::api::ApiClient;
use clinchat::config::Config;
use clinchat::logging;
use clinchat::state::{ConversationController, SendOutcome, StoreUpdate};
use clinchat::terminal::TerminalSession;
use clinchat::ui::command::{cycle_thread, parse_command, resolve_thread, Command, HELP_TEXT};
use clinchat::ui::editor::{InputAction, InputEditor, ScrollAction};
use clinchat::ui::layout::split_chat_layout;
use clinchat::ui::render::{
    input_visual_rows, render_header, render_input, render_thread_list, render_transcript,
    status_text, transcript_lines,
};
use crossterm::event;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(16);
const PAGE_ROWS: usize = 10;
const MAX_INPUT_ROWS: usize = 6;

type Controller = ConversationController<ApiClient>;

struct ChatFrontend {
    session: TerminalSession,
    editor: InputEditor,
    /// Rows above the newest transcript line; 0 follows the stream.
    scroll_from_bottom: usize,
    max_scroll: usize,
    notice: Option<String>,
    notice_tx: mpsc::UnboundedSender<String>,
    notice_rx: mpsc::UnboundedReceiver<String>,
    quit: bool,
}

impl ChatFrontend {
    fn new() -> Result<Self> {
        let session = TerminalSession::start()?;
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        Ok(Self {
            session,
            editor: InputEditor::new(),
            scroll_from_bottom: 0,
            max_scroll: 0,
            notice: None,
            notice_tx,
            notice_rx,
            quit: false,
        })
    }

    async fn run(
        &mut self,
        controller: &Controller,
        mut updates: mpsc::UnboundedReceiver<StoreUpdate>,
    ) -> Result<()> {
        let mut dirty = true;
        while !self.quit {
            while let Ok(update) = updates.try_recv() {
                if matches!(
                    update,
                    StoreUpdate::ActiveThreadChanged(_) | StoreUpdate::MessagesReplaced
                ) {
                    self.scroll_from_bottom = 0;
                }
                dirty = true;
            }
            while let Ok(notice) = self.notice_rx.try_recv() {
                self.notice = Some(notice);
                dirty = true;
            }
            if dirty {
                self.draw(controller)?;
                dirty = false;
            }

            if !event::poll(EVENT_POLL_INTERVAL)? {
                tokio::task::yield_now().await;
                continue;
            }
            let action = self.editor.apply_event(event::read()?);
            self.handle_action(action, controller);
            dirty = true;
        }
        Ok(())
    }

    fn draw(&mut self, controller: &Controller) -> Result<()> {
        let snapshot = controller.snapshot();
        let status = status_text(&snapshot, self.notice.as_deref());
        let input = self.editor.buffer();
        let cursor = self.editor.cursor();
        let from_bottom = self.scroll_from_bottom;
        let mut max_scroll = 0;

        self.session.terminal().draw(|frame| {
            let area = frame.area();
            let input_width = area.width.saturating_sub(2).max(1) as usize;
            let input_rows = input_visual_rows(input, input_width).min(MAX_INPUT_ROWS) as u16;
            let panes = split_chat_layout(area, input_rows);

            render_header(frame, panes.header, &status);
            render_thread_list(
                frame,
                panes.sidebar,
                &snapshot.threads,
                snapshot.active_thread_id.as_deref(),
            );
            let lines = transcript_lines(&snapshot, panes.transcript.width.max(1) as usize);
            max_scroll = render_transcript(frame, panes.transcript, lines, from_bottom);
            render_input(frame, panes.input, input, cursor);
        })?;

        self.max_scroll = max_scroll;
        self.scroll_from_bottom = from_bottom.min(max_scroll);
        Ok(())
    }

    fn handle_action(&mut self, action: InputAction, controller: &Controller) {
        match action {
            InputAction::None => {}
            InputAction::Quit => self.quit = true,
            InputAction::Submit(text) => {
                self.notice = None;
                self.run_command(parse_command(&text), controller);
            }
            InputAction::Scroll(scroll) => self.scroll(scroll),
            InputAction::NextThread => self.switch_thread(controller, 1),
            InputAction::PreviousThread => self.switch_thread(controller, -1),
        }
    }

    fn scroll(&mut self, action: ScrollAction) {
        let offset = match action {
            ScrollAction::LineUp => self.scroll_from_bottom.saturating_add(1),
            ScrollAction::LineDown => self.scroll_from_bottom.saturating_sub(1),
            ScrollAction::PageUp => self.scroll_from_bottom.saturating_add(PAGE_ROWS),
            ScrollAction::PageDown => self.scroll_from_bottom.saturating_sub(PAGE_ROWS),
            ScrollAction::Bottom => 0,
        };
        self.scroll_from_bottom = offset.min(self.max_scroll);
    }

    fn switch_thread(&mut self, controller: &Controller, step: isize) {
        let threads = controller.threads();
        let active = controller.active_thread_id();
        let Some(next) = cycle_thread(&threads, active.as_deref(), step) else {
            return;
        };
        if active.as_deref() == Some(next.id.as_str()) {
            return;
        }
        let (controller, thread_id) = (controller.clone(), next.id.clone());
        self.spawn_intent(async move {
            controller.select_thread(&thread_id).await;
            None
        });
    }

    fn run_command(&mut self, command: Command, controller: &Controller) {
        match command {
            Command::Send(text) => {
                if controller.active_thread_id().is_none() {
                    self.notice = Some("select or create a chat first (/new)".to_string());
                    return;
                }
                if controller.is_busy() {
                    self.notice = Some("still waiting for the previous reply".to_string());
                    return;
                }
                self.scroll_from_bottom = 0;
                let controller = controller.clone();
                self.spawn_intent(async move {
                    match controller.send_message(text).await {
                        SendOutcome::Failed => Some("reply failed; see the log".to_string()),
                        SendOutcome::Skipped | SendOutcome::Completed => None,
                    }
                });
            }
            Command::New => {
                let controller = controller.clone();
                self.spawn_intent(async move {
                    match controller.create_thread().await {
                        Some(_) => None,
                        None => Some("could not create a chat".to_string()),
                    }
                });
            }
            Command::Refresh => {
                let controller = controller.clone();
                self.spawn_intent(async move {
                    controller.list_threads().await;
                    None
                });
            }
            Command::Open(reference) => {
                let Some(thread) = resolve_thread(&controller.threads(), &reference).cloned()
                else {
                    self.notice = Some(format!("no chat matches '{reference}'"));
                    return;
                };
                let controller = controller.clone();
                self.spawn_intent(async move {
                    controller.select_thread(&thread.id).await;
                    None
                });
            }
            Command::Delete(reference) => {
                let Some(thread) = resolve_thread(&controller.threads(), &reference).cloned()
                else {
                    self.notice = Some(format!("no chat matches '{reference}'"));
                    return;
                };
                let controller = controller.clone();
                self.spawn_intent(async move {
                    if controller.delete_thread(&thread.id).await {
                        Some(format!("deleted '{}'", thread.title))
                    } else {
                        Some(format!("could not delete '{}'", thread.title))
                    }
                });
            }
            Command::Rename(title) => {
                let Some(thread_id) = controller.active_thread_id() else {
                    self.notice = Some("no chat selected".to_string());
                    return;
                };
                let controller = controller.clone();
                self.spawn_intent(async move {
                    match controller.rename_thread(&thread_id, &title).await {
                        Some(_) => None,
                        None => Some("could not rename the chat".to_string()),
                    }
                });
            }
            Command::Help => self.notice = Some(HELP_TEXT.to_string()),
            Command::Quit => self.quit = true,
            Command::Usage(usage) => self.notice = Some(format!("usage: {usage}")),
            Command::Unknown(name) => {
                self.notice = Some(format!("unknown command /{name}; /help lists commands"));
            }
        }
    }

    /// Runs an intent off the UI loop; a returned string becomes the header notice.
    fn spawn_intent<F>(&self, intent: F)
    where
        F: Future<Output = Option<String>> + Send + 'static,
    {
        let notice_tx = self.notice_tx.clone();
        tokio::spawn(async move {
            if let Some(notice) = intent.await {
                let _ = notice_tx.send(notice);
            }
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;
    let config = Config::load()?;
    config.validate()?;

    let client = ApiClient::new(&config)?;
    tracing::info!(
        api_url = %config.api_url,
        local = client.is_local_endpoint(),
        "starting clinchat"
    );
    let controller = ConversationController::new(client, &config);
    let updates = controller.subscribe();

    let loader = controller.clone();
    tokio::spawn(async move { loader.list_threads().await });

    let mut frontend = ChatFrontend::new()?;
    let result = frontend.run(&controller, updates).await;
    drop(frontend);
    if let Err(error) = &result {
        tracing::error!(error = %error, "front end stopped");
    }
    result
}
