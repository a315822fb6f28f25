//! Phone sign-in codes.

use std::time::Duration;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use async_trait::async_trait;
use futures::future;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};

/// Delivers a one-time code to a phone number (SMS gateway in production).
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()>;
}

/// Records issuance in the log instead of texting the code.
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()> {
        let tail = &phone[phone.len().saturating_sub(4)..];
        tracing::info!(phone_tail = %tail, code_len = code.len(), "OTP issued");
        Ok(())
    }
}

/// Strips the country code and separators; a valid number has 10 digits.
pub fn normalize_phone(raw: &str, country_code: &str) -> AppResult<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let national = compact.strip_prefix(country_code).unwrap_or(&compact);

    if national.len() == 10 && national.chars().all(|c| c.is_ascii_digit()) {
        Ok(national.to_string())
    } else {
        Err(AppError::validation(
            "Invalid Phone Number",
            "Enter a 10-digit mobile number.",
        ))
    }
}

fn generate_code() -> String {
    format!("{:06}", OsRng.next_u32() % 1_000_000)
}

#[derive(Clone)]
struct PendingCode {
    hash: String,
    attempts: u32,
}

/// Outstanding codes keyed by phone; entries expire with the cache TTL.
#[derive(Clone)]
pub struct OtpStore {
    codes: Cache<String, PendingCode>,
    max_attempts: u32,
}

impl OtpStore {
    pub fn new(ttl: Duration, max_attempts: u32) -> Self {
        Self {
            codes: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(ttl)
                .build(),
            max_attempts,
        }
    }

    /// Generates a fresh code for the phone, replacing any earlier one.
    pub async fn issue(&self, phone: &str) -> AppResult<String> {
        let code = generate_code();
        let hash = hash_password(&code).map_err(|e| {
            tracing::error!(error = %e, "Failed to hash OTP");
            AppError::Internal
        })?;
        self.codes
            .insert(phone.to_string(), PendingCode { hash, attempts: 0 })
            .await;
        Ok(code)
    }

    /// Counts the attempt before checking the code, so parallel guesses
    /// share one budget. A code is consumed by the first successful check.
    pub async fn verify(&self, phone: &str, code: &str) -> AppResult<()> {
        let max_attempts = self.max_attempts;
        let reserved = self
            .codes
            .entry_by_ref(phone)
            .and_compute_with(|entry| {
                let op = match entry.map(|e| e.into_value()) {
                    None => Op::Nop,
                    Some(pending) if pending.attempts >= max_attempts => Op::Remove,
                    Some(pending) => Op::Put(PendingCode {
                        attempts: pending.attempts + 1,
                        ..pending
                    }),
                };
                future::ready(op)
            })
            .await;

        let pending = match reserved {
            CompResult::ReplacedWith(entry) => entry.into_value(),
            CompResult::Removed(_) => {
                return Err(AppError::Unauthorized(
                    "Too many attempts. Request a new code.".into(),
                ));
            }
            _ => {
                return Err(AppError::Unauthorized(
                    "Code expired or was never requested".into(),
                ));
            }
        };

        if verify_password(code.trim(), &pending.hash).is_err() {
            return Err(AppError::Unauthorized("Invalid code".into()));
        }
        match self.codes.remove(phone).await {
            Some(current) if current.hash == pending.hash => Ok(()),
            _ => Err(AppError::Unauthorized(
                "Code expired or was never requested".into(),
            )),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::OtpSender;

    /// Keeps the last code per phone so tests can sign in.
    #[derive(Default)]
    pub struct CapturingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl CapturingSender {
        pub fn last_code(&self, phone: &str) -> Option<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(p, _)| p == phone)
                .map(|(_, c)| c.clone())
        }
    }

    #[async_trait]
    impl OtpSender for CapturingSender {
        async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((phone.to_string(), code.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_are_normalized() {
        assert_eq!(normalize_phone("+91 98765 43210", "+91").unwrap(), "9876543210");
        assert_eq!(normalize_phone("98765-43210", "+91").unwrap(), "9876543210");
        assert!(normalize_phone("+91 12345", "+91").is_err());
        assert!(normalize_phone("98765x3210", "+91").is_err());
    }

    #[test]
    fn codes_have_six_digits() {
        for _ in 0..20 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[actix_web::test]
    async fn codes_are_single_use_and_attempt_limited() {
        let store = OtpStore::new(Duration::from_secs(60), 2);

        let code = store.issue("9876543210").await.unwrap();
        assert!(store.verify("9876543210", &code).await.is_ok());
        assert!(store.verify("9876543210", &code).await.is_err());

        let code = store.issue("9876543210").await.unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert!(store.verify("9876543210", wrong).await.is_err());
        assert!(store.verify("9876543210", wrong).await.is_err());
        // locked out even with the right code
        assert!(store.verify("9876543210", &code).await.is_err());
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn issued_codes_never_reach_the_log() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            futures::executor::block_on(LogOtpSender.send("+919876543210", "482913")).unwrap();
        });

        let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("OTP issued"));
        assert!(logged.contains("3210"));
        assert!(!logged.contains("482913"));
    }

    #[test]
    fn parallel_wrong_guesses_share_the_attempt_budget() {
        let store = OtpStore::new(Duration::from_secs(60), 2);
        let code = futures::executor::block_on(store.issue("9876543210")).unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let checked = std::thread::scope(|scope| {
            let guesses: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        futures::executor::block_on(store.verify("9876543210", wrong))
                    })
                })
                .collect();
            guesses
                .into_iter()
                .map(|guess| guess.join().unwrap())
                .filter(|outcome| matches!(outcome, Err(AppError::Unauthorized(m)) if m == "Invalid code"))
                .count()
        });
        assert_eq!(checked, 2);
        assert!(futures::executor::block_on(store.verify("9876543210", &code)).is_err());
    }
}
