/// mysql服务器status flag, 握手时获得，ok包/eof包更新

/// A multi-statement transaction has been started, explicitly or implicitly.
pub const SERVER_STATUS_IN_TRANS: u16 = 0x0001;

/// Server in auto_commit mode.
pub const SERVER_STATUS_AUTOCOMMIT: u16 = 0x0002;

/// Multi query - next query exists.
pub const SERVER_MORE_RESULTS_EXISTS: u16 = 0x0008;

pub const SERVER_STATUS_NO_GOOD_INDEX_USED: u16 = 0x0010;

pub const SERVER_STATUS_NO_INDEX_USED: u16 = 0x0020;

/// A read-only non-scrollable cursor was opened, rows come with COM_STMT_FETCH.
pub const SERVER_STATUS_CURSOR_EXISTS: u16 = 0x0040;

/// A read-only cursor is exhausted.
pub const SERVER_STATUS_LAST_ROW_SENT: u16 = 0x0080;

/// A database was dropped.
pub const SERVER_STATUS_DB_DROPPED: u16 = 0x0100;

pub const SERVER_STATUS_NO_BACKSLASH_ESCAPES: u16 = 0x0200;

/// A re-prepared statement returns a different number of columns.
pub const SERVER_STATUS_METADATA_CHANGED: u16 = 0x0400;

pub const SERVER_QUERY_WAS_SLOW: u16 = 0x0800;

/// The resultset contains output parameter values.
pub const SERVER_PS_OUT_PARAMS: u16 = 0x1000;

/// Set together with SERVER_STATUS_IN_TRANS for a read-only transaction.
pub const SERVER_STATUS_IN_TRANS_READONLY: u16 = 0x2000;

/// Session state information changed, see CLIENT_SESSION_TRACK.
pub const SERVER_SESSION_STATE_CHANGED: u16 = 0x4000;

/// Names of every status bit, in bit order.
pub static STATUS_FLAG_NAMES: &[(u64, &str)] = &[
    (SERVER_STATUS_IN_TRANS as u64, "SERVER_STATUS_IN_TRANS"),
    (SERVER_STATUS_AUTOCOMMIT as u64, "SERVER_STATUS_AUTOCOMMIT"),
    (SERVER_MORE_RESULTS_EXISTS as u64, "SERVER_MORE_RESULTS_EXISTS"),
    (
        SERVER_STATUS_NO_GOOD_INDEX_USED as u64,
        "SERVER_STATUS_NO_GOOD_INDEX_USED",
    ),
    (SERVER_STATUS_NO_INDEX_USED as u64, "SERVER_STATUS_NO_INDEX_USED"),
    (SERVER_STATUS_CURSOR_EXISTS as u64, "SERVER_STATUS_CURSOR_EXISTS"),
    (SERVER_STATUS_LAST_ROW_SENT as u64, "SERVER_STATUS_LAST_ROW_SENT"),
    (SERVER_STATUS_DB_DROPPED as u64, "SERVER_STATUS_DB_DROPPED"),
    (
        SERVER_STATUS_NO_BACKSLASH_ESCAPES as u64,
        "SERVER_STATUS_NO_BACKSLASH_ESCAPES",
    ),
    (
        SERVER_STATUS_METADATA_CHANGED as u64,
        "SERVER_STATUS_METADATA_CHANGED",
    ),
    (SERVER_QUERY_WAS_SLOW as u64, "SERVER_QUERY_WAS_SLOW"),
    (SERVER_PS_OUT_PARAMS as u64, "SERVER_PS_OUT_PARAMS"),
    (
        SERVER_STATUS_IN_TRANS_READONLY as u64,
        "SERVER_STATUS_IN_TRANS_READONLY",
    ),
    (SERVER_SESSION_STATE_CHANGED as u64, "SERVER_SESSION_STATE_CHANGED"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    status_flags: u16,
}

impl StatusFlags {
    pub fn new(status_flags: u16) -> Self {
        StatusFlags { status_flags }
    }

    pub fn empty() -> Self {
        StatusFlags::new(0)
    }

    pub fn bits(&self) -> u16 {
        self.status_flags
    }

    pub fn contains(&self, status_flag: u16) -> bool {
        (self.status_flags & status_flag) != 0
    }

    pub fn more_results_exists(&self) -> bool {
        self.contains(SERVER_MORE_RESULTS_EXISTS)
    }

    pub fn in_transaction(&self) -> bool {
        self.contains(SERVER_STATUS_IN_TRANS)
    }

    pub fn autocommit(&self) -> bool {
        self.contains(SERVER_STATUS_AUTOCOMMIT)
    }
}

impl From<u16> for StatusFlags {
    fn from(status_flags: u16) -> Self {
        StatusFlags::new(status_flags)
    }
}
