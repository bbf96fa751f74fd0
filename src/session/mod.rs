//! Chat session: turn gating, message composition, streaming and persistence hand-off.

mod api;
mod compose;
mod history;
mod message;
mod reconciler;

pub use api::{
    AccountApi, ApiClient, ChatTransport, SessionStore, TextStream, UsageMeter, text_stream,
};
pub use compose::{
    AttachmentFile, compose_user_message, is_supported_attachment, read_attachment,
    read_attachments, validate_attachments,
};
pub use history::{DEFAULT_ROUTE, HistoryLoad, load_history};
pub use message::{
    Attachment, ChatMessage, Role, SessionRecord, UsageReport, User, UserPlan, UserProfile,
};
pub use reconciler::{
    ChatSession, Collaborators, LogNotifier, Notice, Notifier, SendOutcome, TurnReport,
    TurnState, derive_session_id,
};
