//! Participant notification: eligibility policy, batch runner, email seam.

pub mod batch;
pub mod email;
pub mod policy;

pub use batch::{run_notification_batch, BatchError, BatchOutcome};
pub use email::{compose_notification, EmailMessage, LogMailer, Mailer, SendError};
pub use policy::{
    evaluate, interaction_debounce, wait_time, Eligibility, ExclusionReason,
    TERMINAL_STRIKE_COUNT,
};
