use crate::cli::ChatArgs;
use crate::client::api::HttpGatewayApi;
use crate::client::session::ChatSession;
use crate::client::view::{ BannerId, ChatView };
use crate::models::chat::Message;
use log::debug;
use std::error::Error;
use std::io::Write;
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::{ Arc, Mutex };
use tokio::io::{ AsyncBufReadExt, BufReader };

const HELP: &str = "Commands: /new  /report  /history  /end  /quit  (anything else is sent)";

/// Line-oriented rendering of a chat session. Printed text cannot be
/// un-printed, so banners simply expire.
pub struct TerminalView {
    out: Mutex<Box<dyn Write + Send>>,
    next_banner: AtomicU64,
}

impl TerminalView {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out: Mutex::new(out), next_banner: AtomicU64::new(0) }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn print(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", text);
            let _ = out.flush();
        }
    }
}

impl ChatView for TerminalView {
    fn clear_transcript(&self) {
        self.print("\n==================== new conversation ====================");
    }

    fn clear_report(&self) {}

    fn clear_input(&self) {}

    fn append_message(&self, message: &Message) {
        self.print(&format!("{}: {}", message.author_name, message.content));
    }

    fn show_report(&self, text: &str) {
        self.print(&format!("---------------------- report ----------------------\n{}\n----------------------------------------------------", text));
    }

    fn show_error(&self, text: &str) -> BannerId {
        self.print(&format!("! {}", text));
        BannerId(self.next_banner.fetch_add(1, Ordering::Relaxed))
    }

    fn remove_banner(&self, id: BannerId) {
        debug!("Banner {:?} expired", id);
    }
}

/// Interactive chat over stdin/stdout against a running gateway.
pub async fn run(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let api = HttpGatewayApi::new(&args.gateway_url)?;
    let view = Arc::new(TerminalView::stdout());
    let mut session = ChatSession::with_name(api, Arc::clone(&view), &args.name);

    view.print(HELP);
    // Failures are already on screen as banners; the loop keeps going.
    let _ = session.start_session().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/new" => {
                let _ = session.start_session().await;
            }
            "/report" => {
                let _ = session.generate_report().await;
            }
            "/history" => {
                let _ = session.reload_transcript().await;
            }
            "/end" => {
                let _ = session.end_session().await;
            }
            _ => {
                let _ = session.send_message(&line).await;
            }
        }
    }
    Ok(())
}
