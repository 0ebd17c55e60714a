//! Outbound confirmation mail hook.
//!
//! Delivery is not wired to a real transport: the hook logs the token so an
//! operator (or a future SMTP integration replacing this struct) can hand
//! it to the user. Keeping the seam here means the user lifecycle code
//! never grows transport details.

/// Confirmation-mail sender stub.
#[derive(Clone, Debug, Default)]
pub struct Mailer;

impl Mailer {
    /// Queue a confirmation mail for a freshly registered address.
    pub fn send_confirmation(&self, email: &str, token: &str) {
        tracing::info!(%email, %token, "confirmation mail queued");
    }
}
