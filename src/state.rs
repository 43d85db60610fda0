use crate::db::Database;
use crate::erp::ErpApi;
use crate::mailer::MailSender;

/// Everything a request handler can reach.
pub struct AppState {
    pub db: Database,
    pub erp: Box<dyn ErpApi>,
    pub mailer: Box<dyn MailSender>,
}
