use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::otp::{LogOtpSender, OtpSender, OtpStore},
    clock::{Clock, LocalClock},
    config::Config,
    repo::{AttendanceRepo, LeaveRepo, SettingsRepo, TokenRepo, UserRepo, WfhRepo},
    storage::{LocalObjectStore, ObjectStore},
    utils::{phone_filter::PhoneFilter, settings_cache::SettingsCache},
};

/// Everything a handler needs besides the request itself.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub attendance: Arc<dyn AttendanceRepo>,
    pub leaves: Arc<dyn LeaveRepo>,
    pub wfh: Arc<dyn WfhRepo>,
    pub settings: Arc<dyn SettingsRepo>,
    pub tokens: Arc<dyn TokenRepo>,

    pub otp_sender: Arc<dyn OtpSender>,
    pub objects: Arc<dyn ObjectStore>,
    pub clock: Arc<dyn Clock>,

    pub otp: OtpStore,
    pub settings_cache: SettingsCache,
    pub phones: Arc<PhoneFilter>,
}

impl AppState {
    /// Wires every repository to one backing store.
    pub fn new<S>(store: Arc<S>, config: &Config) -> Self
    where
        S: UserRepo + AttendanceRepo + LeaveRepo + WfhRepo + SettingsRepo + TokenRepo + 'static,
    {
        Self {
            users: store.clone(),
            attendance: store.clone(),
            leaves: store.clone(),
            wfh: store.clone(),
            settings: store.clone(),
            tokens: store,
            otp_sender: Arc::new(LogOtpSender),
            objects: Arc::new(LocalObjectStore::new(&config.upload_dir, &config.public_base_url)),
            clock: Arc::new(LocalClock),
            otp: OtpStore::new(
                Duration::from_secs(config.otp_ttl_secs),
                config.otp_max_attempts,
            ),
            settings_cache: SettingsCache::new(),
            phones: Arc::new(PhoneFilter::new()),
        }
    }

    #[cfg(test)]
    pub fn with_otp_sender(mut self, sender: Arc<dyn OtpSender>) -> Self {
        self.otp_sender = sender;
        self
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
