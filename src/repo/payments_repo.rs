use crate::domain::payment::{PaymentRecord, PaymentStatus, PaymentUpdate};
use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait::async_trait]
pub trait PaymentStore: Send + Sync {
    async fn upsert(&self, order_id: &str, update: &PaymentUpdate) -> Result<PaymentRecord>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>>;

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<PaymentRecord>>;

    /// False when the row is missing, already refunding or refunded, or cancelled.
    async fn try_mark_refund_pending(&self, order_id: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct PaymentsRepo {
    pub pool: PgPool,
}

const COLUMNS: &str = "id, order_id, payment_id, user_id, gateway, amount, currency, status, \
    payment_method, customer_email, refund_id, refund_amount, refund_status, error_message, \
    metadata, created_at, updated_at";

fn map_row(r: PgRow) -> PaymentRecord {
    let status: String = r.get("status");
    PaymentRecord {
        id: r.get("id"),
        order_id: r.get("order_id"),
        payment_id: r.get("payment_id"),
        user_id: r.get("user_id"),
        gateway: r.get("gateway"),
        amount: r.get("amount"),
        currency: r.get("currency"),
        status: PaymentStatus::normalize(&status),
        payment_method: r.get("payment_method"),
        customer_email: r.get("customer_email"),
        refund_id: r.get("refund_id"),
        refund_amount: r.get("refund_amount"),
        refund_status: r.get("refund_status"),
        error_message: r.get("error_message"),
        metadata: r.get("metadata"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait::async_trait]
impl PaymentStore for PaymentsRepo {
    async fn upsert(&self, order_id: &str, update: &PaymentUpdate) -> Result<PaymentRecord> {
        let sql = format!(
            r#"
            INSERT INTO payments (
                id, order_id, payment_id, user_id, gateway, amount, currency, status,
                payment_method, customer_email, refund_id, refund_amount, refund_status,
                error_message, metadata, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, COALESCE($5, 'razorpay'), COALESCE($6, 0), COALESCE($7, 'INR'),
                COALESCE($8, 'PENDING'), $9, $10, $11, $12, $13, $14, $15, now(), now()
            )
            ON CONFLICT (order_id) DO UPDATE SET
                payment_id = COALESCE($3, payments.payment_id),
                user_id = COALESCE($4, payments.user_id),
                gateway = COALESCE($5, payments.gateway),
                amount = COALESCE($6, payments.amount),
                currency = COALESCE($7, payments.currency),
                status = COALESCE($8, payments.status),
                payment_method = COALESCE($9, payments.payment_method),
                customer_email = COALESCE($10, payments.customer_email),
                refund_id = COALESCE($11, payments.refund_id),
                refund_amount = COALESCE($12, payments.refund_amount),
                refund_status = COALESCE($13, payments.refund_status),
                error_message = COALESCE($14, payments.error_message),
                metadata = COALESCE($15, payments.metadata),
                updated_at = now()
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(uuid::Uuid::new_v4())
            .bind(order_id)
            .bind(update.payment_id.clone())
            .bind(update.user_id.clone())
            .bind(update.gateway.map(|g| g.as_str()))
            .bind(update.amount)
            .bind(update.currency.clone())
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.payment_method.clone())
            .bind(update.customer_email.clone())
            .bind(update.refund_id.clone())
            .bind(update.refund_amount)
            .bind(update.refund_status.clone())
            .bind(update.error_message.clone())
            .bind(update.metadata.clone())
            .fetch_one(&self.pool)
            .await?;

        Ok(map_row(row))
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM payments WHERE order_id = $1");
        let row = sqlx::query(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_row))
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<PaymentRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM payments WHERE payment_id = $1 ORDER BY updated_at DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_row))
    }

    async fn try_mark_refund_pending(&self, order_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'REFUND_PENDING', error_message = NULL, updated_at = now()
            WHERE order_id = $1 AND status NOT IN ('REFUND_PENDING', 'REFUNDED', 'CANCELLED')
            "#,
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
