/// A notification-center entry as stored.
#[derive(Debug, Clone)]
pub(crate) struct NotificationRecord {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub priority: String,
    pub is_read: bool,
    pub created_at: String,
}

/// An email request waiting in the spool for an external mailer.
#[derive(Debug, Clone)]
pub(crate) struct SpooledEmail {
    pub id: i64,
    pub template: String,
    pub recipient: String,
    pub payload: String,
    pub created_at: String,
}
