use std::io::{self, Cursor, Write};

use byteorder::WriteBytesExt;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::NULL_TERMINATOR;

/// Command phase command bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CommandType {
    Sleep = 0x00,
    Quit = 0x01,
    InitDb = 0x02,
    Query = 0x03,
    FieldList = 0x04,
    CreateDb = 0x05,
    DropDb = 0x06,
    Refresh = 0x07,
    Shutdown = 0x08,
    Statistics = 0x09,
    ProcessInfo = 0x0a,
    Connect = 0x0b,
    ProcessKill = 0x0c,
    Debug = 0x0d,
    Ping = 0x0e,
    Time = 0x0f,
    DelayedInsert = 0x10,
    ChangeUser = 0x11,
    BinlogDump = 0x12,
    TableDump = 0x13,
    ConnectOut = 0x14,
    RegisterSlave = 0x15,
    StmtPrepare = 0x16,
    StmtExecute = 0x17,
    StmtSendLongData = 0x18,
    StmtClose = 0x19,
    StmtReset = 0x1a,
    SetOption = 0x1b,
    StmtFetch = 0x1c,
    Daemon = 0x1d,
    BinlogDumpGtid = 0x1e,
    ResetConnection = 0x1f,
}

/// A command packet payload: the command byte followed by its arguments.
#[derive(Debug, Clone)]
pub struct Command {
    pub command_type: CommandType,
    pub args: Vec<u8>,
}

impl Command {
    pub fn new(command_type: CommandType) -> Self {
        Command {
            command_type,
            args: Vec::new(),
        }
    }

    pub fn with_str(command_type: CommandType, arg: &str) -> Self {
        Command {
            command_type,
            args: arg.as_bytes().to_vec(),
        }
    }

    pub fn query(sql: &str) -> Self {
        Command::with_str(CommandType::Query, sql)
    }

    /// COM_FIELD_LIST: table name, NUL, wildcard.
    pub fn field_list(table: &str, wildcard: &str) -> Self {
        let mut args = Vec::with_capacity(table.len() + wildcard.len() + 1);
        args.extend_from_slice(table.as_bytes());
        args.push(NULL_TERMINATOR);
        args.extend_from_slice(wildcard.as_bytes());
        Command {
            command_type: CommandType::FieldList,
            args,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = Vec::with_capacity(self.args.len() + 1);
        let mut cursor = Cursor::new(&mut vec);

        cursor.write_u8(self.command_type.into())?;
        cursor.write_all(&self.args)?;

        Ok(vec)
    }
}
