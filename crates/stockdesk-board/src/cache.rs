use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use stockdesk_core::StoreError;
use stockdesk_inventory::LedgerInput;
use stockdesk_sheets::LedgerClient;
use tokio::{sync::Mutex, time::Instant};
use tracing::{info, warn};

/// Row-sets handed to one render.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub input: Arc<LedgerInput>,
    pub stale: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct CacheState {
    last_good: Option<Arc<LedgerInput>>,
    fetched_at: Option<DateTime<Utc>>,
    fresh_until: Option<Instant>,
}

/// Reuses a successful fetch for `ttl`. A failed fetch falls back to the last
/// good row-sets, or to empty ones, and marks the result stale.
pub struct LedgerCache {
    client: LedgerClient,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl LedgerCache {
    pub fn new(client: LedgerClient, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub async fn load(&self) -> Loaded {
        let mut state = self.state.lock().await;

        if let (Some(input), Some(fresh_until)) = (&state.last_good, state.fresh_until) {
            if Instant::now() < fresh_until {
                return Loaded {
                    input: input.clone(),
                    stale: false,
                    fetched_at: state.fetched_at,
                };
            }
        }

        match self.fetch().await {
            Ok(input) => {
                let input = Arc::new(input);
                let now = Utc::now();
                state.last_good = Some(input.clone());
                state.fetched_at = Some(now);
                state.fresh_until = Some(Instant::now() + self.ttl);
                Loaded {
                    input,
                    stale: false,
                    fetched_at: Some(now),
                }
            }
            Err(err) => {
                warn!("ledger fetch failed, serving last good data: {err}");
                Loaded {
                    input: state.last_good.clone().unwrap_or_default(),
                    stale: true,
                    fetched_at: state.fetched_at,
                }
            }
        }
    }

    /// Forces the next [`LedgerCache::load`] to refetch.
    pub async fn invalidate(&self) {
        self.state.lock().await.fresh_until = None;
    }

    async fn fetch(&self) -> Result<LedgerInput, StoreError> {
        let (items, stock_in, stock_out) = tokio::try_join!(
            self.client.fetch_items(),
            self.client.fetch_stock_in(),
            self.client.fetch_stock_out(),
        )?;

        let input = LedgerInput {
            items,
            stock_in,
            stock_out,
        };
        info!(
            items = input.items.rows.len(),
            stock_in = input.stock_in.rows.len(),
            stock_out = input.stock_out.rows.len(),
            diverted = input.issues().count(),
            "ledger fetched"
        );
        Ok(input)
    }
}
