use common::err::CResult;

use crate::conn::connection::Conn;
use crate::conn::query_result::QueryResult;
use crate::packet::result_set_row_packet::FieldValue;

/// Prepared statement produced by a [`StatementHandler`].
pub trait Statement {
    fn execute(&mut self, conn: &mut Conn, args: &[FieldValue]) -> CResult<QueryResult>;

    fn close(&mut self, conn: &mut Conn) -> CResult<()>;
}

/// Prepared statement support plugged into a session. `Conn::execute` uses it when arguments are given.
pub trait StatementHandler: Send {
    fn prepare(&mut self, conn: &mut Conn, query: &str) -> CResult<Box<dyn Statement>>;
}
