use crate::models::chat::Message;

/// Handle to an error banner so it can be taken down later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BannerId(pub u64);

/// Rendering surface of a chat session: a transcript pane, a report pane and
/// the message input. Methods take `&self`; implementations own their
/// interior mutability, the way a DOM root does.
pub trait ChatView: Send + Sync + 'static {
    fn clear_transcript(&self);

    fn clear_report(&self);

    fn clear_input(&self);

    fn append_message(&self, message: &Message);

    /// Shows `text` verbatim; it is never interpreted as markup.
    fn show_report(&self, text: &str);

    fn show_error(&self, text: &str) -> BannerId;

    fn remove_banner(&self, id: BannerId);
}
