use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use autoscale_cuckoo_filter::CuckooFilter;

use crate::repo::UserRepo;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Registered phone numbers, for turning away unknown numbers before a
/// storage lookup. Answers "maybe" for everything until warmed up.
pub struct PhoneFilter {
    filter: RwLock<CuckooFilter<String>>,
    ready: AtomicBool,
}

impl Default for PhoneFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneFilter {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// False only when the number is certainly not registered.
    pub fn might_exist(&self, phone: &str) -> bool {
        if !self.is_ready() {
            return true;
        }
        self.filter
            .read()
            .map(|f| f.contains(&phone.to_string()))
            .unwrap_or(true)
    }

    pub fn insert(&self, phone: &str) {
        if let Ok(mut f) = self.filter.write() {
            f.add(&phone.to_string());
        }
    }

    /// Loads every registered number in batches, then starts trusting negatives.
    pub async fn warmup(&self, users: &dyn UserRepo, batch_size: usize) -> Result<usize> {
        let phones = users.all_phones().await?;
        let total = phones.len();

        for batch in phones.chunks(batch_size.max(1)) {
            let mut f = self
                .filter
                .write()
                .map_err(|_| anyhow::anyhow!("phone filter lock poisoned"))?;
            for phone in batch {
                f.add(phone);
            }
        }

        self.ready.store(true, Ordering::Release);
        log::info!("Phone filter warmup complete: {} users", total);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{role::Role, user::NewUser};
    use crate::repo::MemoryStore;

    #[actix_web::test]
    async fn trusts_negatives_only_after_warmup() {
        let store = MemoryStore::new();
        UserRepo::create(
            &store,
            NewUser {
                name: "Asha".into(),
                phone: "9876543210".into(),
                email: None,
                password_hash: None,
                role: Role::Admin,
                admin_id: None,
                tracing_method: None,
                department: None,
                designation: None,
                join_date: None,
            },
        )
        .await
        .unwrap();

        let filter = PhoneFilter::new();
        assert!(filter.might_exist("1111111111"));

        assert_eq!(filter.warmup(&store, 100).await.unwrap(), 1);
        assert!(filter.might_exist("9876543210"));
        assert!(!filter.might_exist("1111111111"));

        filter.insert("1111111111");
        assert!(filter.might_exist("1111111111"));
    }
}
