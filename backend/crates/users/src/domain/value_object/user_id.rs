use kernel::id::{Id, markers};

/// Store-assigned user record key (SQLite rowid or epoch milliseconds)
pub type UserId = Id<markers::User>;
