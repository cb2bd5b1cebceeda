//! relance-report: weekly digest rendering and dispatch.

pub mod dispatch;
pub mod email;
pub mod error;
pub mod resend;

pub use dispatch::{ReportConfig, ReportRequest, ReportResponse, send_weekly_report};
pub use email::render_weekly_email;
pub use error::{ErrorBody, ReportError};
pub use resend::{EmailClient, EmailSender};
