//! Pledge board
//!
//! Lists every pledge with its owning account's name and currency. Account
//! lookups go through a cache keyed by account id so rows sharing an account
//! only cost one request.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::client::{Account, ApiClient, Pledge};
use crate::error::DashboardError;
use crate::format::{format_currency_amount, status_color, StatusBucket};

const DEFAULT_CURRENCY: &str = "USDC";

/// Account cache with last-write-wins semantics
///
/// Lookups for one refresh are merged in a single write, so readers see either
/// none or all of a batch. Every refresh starts from a generation stamp and
/// `clear` moves the generation on, so a batch fetched before an invalidation
/// is never merged after it.
#[derive(Clone, Default)]
pub struct AccountCache {
    inner: Arc<RwLock<CacheState>>,
}

#[derive(Default)]
struct CacheState {
    accounts: HashMap<String, Account>,
    generation: u64,
}

impl AccountCache {
    pub fn get(&self, account_id: &str) -> Option<Account> {
        self.read().accounts.get(account_id).cloned()
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.read().accounts.contains_key(account_id)
    }

    pub fn len(&self) -> usize {
        self.read().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stamp a new refresh, superseding any still in flight
    pub fn begin(&self) -> u64 {
        let mut state = self.write();
        state.generation += 1;
        state.generation
    }

    /// Merge `batch` if no refresh or invalidation started after `generation`
    pub fn merge(&self, generation: u64, batch: &[Account]) -> bool {
        let mut state = self.write();
        if state.generation != generation {
            log::debug!(
                "Dropping {} stale accounts (generation {} < {})",
                batch.len(),
                generation,
                state.generation
            );
            return false;
        }
        for account in batch {
            state.accounts.insert(account.id.clone(), account.clone());
        }
        true
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.accounts.clear();
        state.generation += 1;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// One rendered row of the pledge board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PledgeRow {
    pub id: String,
    pub account_id: String,
    pub account_name: String,
    pub amount: String,
    pub display_amount: String,
    pub currency: String,
    pub state: String,
    pub status: StatusBucket,
}

#[derive(Clone)]
pub struct PledgeBoard {
    client: ApiClient,
    cache: AccountCache,
}

impl PledgeBoard {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            cache: AccountCache::default(),
        }
    }

    pub fn cache(&self) -> &AccountCache {
        &self.cache
    }

    /// Drop every cached account; the next refresh looks them all up again
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// Fetch all pledges and resolve any accounts not cached yet
    pub async fn refresh(&self) -> Result<Vec<PledgeRow>, DashboardError> {
        let list = self.client.list_all_pledges().await?;
        if !list.success {
            return Err(DashboardError::domain(
                "Failed to fetch pledges",
                list.error,
                "Unknown error",
            ));
        }
        let pledges = list.into_pledges();
        let generation = self.cache.begin();

        let missing: HashSet<&str> = pledges
            .iter()
            .map(|pledge| pledge.account_id.as_str())
            .filter(|id| !id.is_empty() && !self.cache.contains(id))
            .collect();

        let lookups = missing.into_iter().map(|account_id| async move {
            match self.client.get_account(account_id).await {
                Ok(response) if response.success => response.account,
                Ok(response) => {
                    log::warn!(
                        "Account {} lookup rejected: {}",
                        account_id,
                        response.error.unwrap_or_default()
                    );
                    None
                }
                Err(e) => {
                    log::error!("Error fetching account {}: {}", account_id, e);
                    None
                }
            }
        });

        let batch: Vec<Account> = futures::future::join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .collect();
        log::debug!("Resolved {} accounts for {} pledges", batch.len(), pledges.len());
        self.cache.merge(generation, &batch);

        let fetched: HashMap<&str, &Account> =
            batch.iter().map(|account| (account.id.as_str(), account)).collect();
        Ok(pledges
            .iter()
            .map(|pledge| {
                let account = fetched
                    .get(pledge.account_id.as_str())
                    .map(|account| (*account).clone())
                    .or_else(|| self.cache.get(&pledge.account_id));
                row(pledge, account)
            })
            .collect())
    }
}

fn row(pledge: &Pledge, account: Option<Account>) -> PledgeRow {
    let currency = account
        .as_ref()
        .map(|a| a.currency.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    let account_name = account
        .as_ref()
        .map(|a| a.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Account {}", pledge.account_id));
    let state = if pledge.state.is_empty() {
        "Unknown".to_string()
    } else {
        pledge.state.clone()
    };

    PledgeRow {
        id: pledge.id.clone(),
        account_id: pledge.account_id.clone(),
        account_name,
        amount: pledge.amount.clone(),
        display_amount: format_currency_amount(&pledge.amount, &currency),
        currency,
        status: status_color(&pledge.state),
        state,
    }
}
