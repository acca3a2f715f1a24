use crate::domain::payment::{PaymentRecord, PaymentStatus, PaymentUpdate};
use crate::repo::payments_repo::PaymentStore;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Process-local store with the same upsert semantics as `PaymentsRepo`.
/// Counts writes so callers can assert that a rejected request changed nothing.
#[derive(Default)]
pub struct MemoryPaymentStore {
    rows: Mutex<HashMap<String, PaymentRecord>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every following write fail, to exercise store-outage paths.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("payment store unavailable"));
        }
        Ok(())
    }
}

fn apply(record: &mut PaymentRecord, update: &PaymentUpdate) {
    macro_rules! set {
        ($field:ident) => {
            if let Some(v) = &update.$field {
                record.$field = Some(v.clone());
            }
        };
    }
    set!(payment_id);
    set!(user_id);
    set!(payment_method);
    set!(customer_email);
    set!(refund_id);
    set!(refund_amount);
    set!(refund_status);
    set!(error_message);
    set!(metadata);

    if let Some(g) = update.gateway {
        record.gateway = g.as_str().to_string();
    }
    if let Some(a) = update.amount {
        record.amount = a;
    }
    if let Some(c) = &update.currency {
        record.currency = c.clone();
    }
    if let Some(s) = update.status {
        record.status = s;
    }
    record.updated_at = chrono::Utc::now();
}

#[async_trait::async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn upsert(&self, order_id: &str, update: &PaymentUpdate) -> Result<PaymentRecord> {
        self.check_writable()?;
        let mut rows = self.rows.lock().map_err(|_| anyhow!("payment store poisoned"))?;
        self.writes.fetch_add(1, Ordering::SeqCst);

        let now = chrono::Utc::now();
        let record = rows.entry(order_id.to_string()).or_insert_with(|| PaymentRecord {
            id: uuid::Uuid::new_v4(),
            order_id: order_id.to_string(),
            payment_id: None,
            user_id: None,
            gateway: "razorpay".to_string(),
            amount: 0,
            currency: "INR".to_string(),
            status: PaymentStatus::Pending,
            payment_method: None,
            customer_email: None,
            refund_id: None,
            refund_amount: None,
            refund_status: None,
            error_message: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        });
        apply(record, update);
        Ok(record.clone())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>> {
        let rows = self.rows.lock().map_err(|_| anyhow!("payment store poisoned"))?;
        Ok(rows.get(order_id).cloned())
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<PaymentRecord>> {
        let rows = self.rows.lock().map_err(|_| anyhow!("payment store poisoned"))?;
        Ok(rows
            .values()
            .filter(|r| r.payment_id.as_deref() == Some(payment_id))
            .max_by_key(|r| r.updated_at)
            .cloned())
    }

    async fn try_mark_refund_pending(&self, order_id: &str) -> Result<bool> {
        self.check_writable()?;
        let mut rows = self.rows.lock().map_err(|_| anyhow!("payment store poisoned"))?;
        let Some(record) = rows.get_mut(order_id) else {
            return Ok(false);
        };
        if matches!(
            record.status,
            PaymentStatus::RefundPending | PaymentStatus::Refunded | PaymentStatus::Cancelled
        ) {
            return Ok(false);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        record.status = PaymentStatus::RefundPending;
        record.error_message = None;
        record.updated_at = chrono::Utc::now();
        Ok(true)
    }
}
