//! Payment-to-credit and refunds
//!
//! A payment and its ledger credit are written in the same transaction, as are
//! a refund debit and the status change on the payment.

use shared::models::{Payment, PaymentCreate, PaymentReceipt, PaymentStatus, RefundRequest, RelatedDocument};
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode};

use crate::core::ServerState;
use crate::db::repository::payment::NewPayment;
use crate::db::repository::{RepoError, member, payment};
use crate::ledger::{self, LedgerEntry};

/// Record a completed payment and credit its tokens
///
/// A reused client `transactionId` is reported as `DuplicateReference`, so a
/// retried request never credits twice.
pub async fn record_payment(
    state: &ServerState,
    req: &PaymentCreate,
    actor: i64,
) -> AppResult<PaymentReceipt> {
    let db = &state.db;
    let details = &req.payment_details;

    let receipt = db
        .bounded(async {
            let mut tx = db.writer.begin().await.map_err(RepoError::from)?;

            let member = member::find_by_id(&mut *tx, req.member_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
            if !member.is_active {
                return Err(AppError::new(ErrorCode::MemberInactive));
            }

            let payment = payment::create(
                &mut tx,
                NewPayment {
                    member_id: member.id,
                    amount: details.amount,
                    tokens: req.tokens,
                    method: details.method,
                    transaction_id: details.transaction_id.as_deref(),
                    description: details.description.as_deref(),
                    created_by: Some(actor),
                },
            )
            .await
            .map_err(|e| match e {
                RepoError::Duplicate(msg) => {
                    AppError::with_message(ErrorCode::DuplicateReference, format!("Duplicate {msg}"))
                }
                other => other.into(),
            })?;

            let recorded = ledger::record(
                &mut tx,
                LedgerEntry::credit(
                    member.id,
                    req.tokens,
                    format!("Token purchase ({})", payment.transaction_id),
                )
                .reference(format!("PAYMENT-{}", payment.id))
                .related(RelatedDocument::Payment { id: payment.id })
                .created_by(actor),
            )
            .await?;

            tx.commit().await.map_err(RepoError::from)?;
            Ok(PaymentReceipt {
                payment,
                ledger_transaction_id: recorded.transaction.id,
                new_balance: recorded.balance,
            })
        })
        .await?;

    tracing::info!(
        payment_id = receipt.payment.id,
        member_id = receipt.payment.member_id,
        tokens = receipt.payment.tokens,
        transaction_id = %receipt.payment.transaction_id,
        "Payment recorded"
    );
    Ok(receipt)
}

/// Debit refunded tokens and mark the payment refunded
///
/// The refund defaults to every token the payment granted. Fails with
/// `InsufficientBalance`, leaving the payment untouched, when the member has
/// already spent the tokens.
pub async fn refund_payment(
    state: &ServerState,
    payment_id: i64,
    req: &RefundRequest,
    actor: i64,
) -> AppResult<PaymentReceipt> {
    let db = &state.db;

    let receipt = db
        .bounded(async {
            let mut tx = db.writer.begin().await.map_err(RepoError::from)?;

            let original = payment::find_by_id(&mut *tx, payment_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
            if original.status == PaymentStatus::Refunded {
                return Err(AppError::new(ErrorCode::PaymentAlreadyRefunded));
            }

            let tokens = req.refund_amount.unwrap_or(original.tokens);
            if tokens <= 0 {
                return Err(AppError::new(ErrorCode::InvalidTokenAmount));
            }
            if tokens > original.tokens {
                return Err(AppError::new(ErrorCode::PaymentRefundExceedsAmount)
                    .with_detail("tokens", original.tokens)
                    .with_detail("requested", tokens));
            }

            let recorded = ledger::record(
                &mut tx,
                LedgerEntry::debit(
                    original.member_id,
                    tokens,
                    format!("Refund: {}", req.reason.trim()),
                )
                .reference(format!("REFUND-{}", original.id))
                .related(RelatedDocument::Payment { id: original.id })
                .created_by(actor),
            )
            .await?;

            if !payment::mark_refunded(&mut *tx, original.id, tokens, req.reason.trim(), now_millis())
                .await?
            {
                return Err(AppError::new(ErrorCode::PaymentAlreadyRefunded));
            }

            let payment = payment::find_by_id(&mut *tx, original.id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
            tx.commit().await.map_err(RepoError::from)?;

            Ok(PaymentReceipt {
                payment,
                ledger_transaction_id: recorded.transaction.id,
                new_balance: recorded.balance,
            })
        })
        .await?;

    tracing::info!(
        payment_id,
        member_id = receipt.payment.member_id,
        refund_tokens = ?receipt.payment.refund_tokens,
        "Payment refunded"
    );
    Ok(receipt)
}

pub async fn get_payment(state: &ServerState, payment_id: i64) -> AppResult<Payment> {
    state
        .db
        .bounded(async {
            payment::find_by_id(&state.db.pool, payment_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;
    use shared::models::{PaymentDetails, PaymentMethod};

    fn purchase(member_id: i64, tokens: i64, transaction_id: Option<&str>) -> PaymentCreate {
        PaymentCreate {
            member_id,
            tokens,
            payment_details: PaymentDetails {
                amount: tokens as f64 * 2.5,
                method: PaymentMethod::Card,
                transaction_id: transaction_id.map(str::to_string),
                description: None,
            },
        }
    }

    fn refund(amount: Option<i64>) -> RefundRequest {
        RefundRequest {
            refund_amount: amount,
            reason: "changed mind".into(),
        }
    }

    #[tokio::test]
    async fn test_payment_credits_tokens() {
        let env = TestEnv::new().await;
        let member = env.member("pay@example.com").await;

        let receipt = record_payment(&env.state, &purchase(member.id, 20, None), 1)
            .await
            .unwrap();
        assert_eq!(receipt.new_balance, 30);
        assert_eq!(receipt.payment.status, PaymentStatus::Completed);
        assert!(receipt.payment.transaction_id.starts_with("PAY-"));
    }

    #[tokio::test]
    async fn test_client_transaction_id_is_idempotent() {
        let env = TestEnv::new().await;
        let member = env.member("idem@example.com").await;

        record_payment(&env.state, &purchase(member.id, 5, Some("ext-1")), 1)
            .await
            .unwrap();
        let err = record_payment(&env.state, &purchase(member.id, 5, Some("ext-1")), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateReference);

        let member = member::find_by_id(&env.state.db.pool, member.id).await.unwrap().unwrap();
        assert_eq!(member.token_balance, 15);
    }

    #[tokio::test]
    async fn test_refund_defaults_to_full_tokens() {
        let env = TestEnv::new().await;
        let member = env.member("full@example.com").await;
        let receipt = record_payment(&env.state, &purchase(member.id, 8, None), 1)
            .await
            .unwrap();

        let refunded = refund_payment(&env.state, receipt.payment.id, &refund(None), 1)
            .await
            .unwrap();
        assert_eq!(refunded.new_balance, 10);
        assert_eq!(refunded.payment.status, PaymentStatus::Refunded);
        assert_eq!(refunded.payment.refund_tokens, Some(8));

        let err = refund_payment(&env.state, receipt.payment.id, &refund(None), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentAlreadyRefunded);
    }

    #[tokio::test]
    async fn test_refund_exceeding_payment() {
        let env = TestEnv::new().await;
        let member = env.member("over@example.com").await;
        let receipt = record_payment(&env.state, &purchase(member.id, 5, None), 1)
            .await
            .unwrap();

        let err = refund_payment(&env.state, receipt.payment.id, &refund(Some(6)), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentRefundExceedsAmount);
    }

    #[tokio::test]
    async fn test_refund_not_covered_leaves_payment_completed() {
        let env = TestEnv::new().await;
        let member = env.member("spent@example.com").await;
        let receipt = record_payment(&env.state, &purchase(member.id, 15, None), 1)
            .await
            .unwrap();

        // spend down to 10
        ledger::record_transaction(
            &env.state.db,
            LedgerEntry::debit(member.id, 15, "spent"),
        )
        .await
        .unwrap();

        let err = refund_payment(&env.state, receipt.payment.id, &refund(Some(15)), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);

        let payment = get_payment(&env.state, receipt.payment.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        let member = member::find_by_id(&env.state.db.pool, member.id).await.unwrap().unwrap();
        assert_eq!(member.token_balance, 10);
    }

    #[tokio::test]
    async fn test_unknown_payment() {
        let env = TestEnv::new().await;
        let err = refund_payment(&env.state, 404, &refund(None), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentNotFound);
    }
}
