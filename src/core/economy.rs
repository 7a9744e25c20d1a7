//! Economy ledger - per-user integer credit balances.
//!
//! Accounts are created lazily on first touch. `credit` is the unguarded primitive (it accepts
//! negative deltas and enforces no floor); `transfer` is the guarded operation used by `give` and
//! runs the debit and the credit in one database transaction, with the debit conditioned on the
//! sender still holding enough credits at write time.

use crate::{
    core::db_id,
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use sea_orm::{
    Condition, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use std::{ops::RangeInclusive, time::Duration};

/// One side of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    /// Discord user id
    pub user_id: u64,
    /// Whether the account belongs to a bot
    pub is_bot: bool,
}

impl Participant {
    /// A human participant
    #[must_use]
    pub const fn user(user_id: u64) -> Self {
        Self {
            user_id,
            is_bot: false,
        }
    }
}

/// Balances after a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Amount moved
    pub amount: i64,
    /// Sender balance after the debit
    pub sender_balance: i64,
    /// Receiver balance after the credit
    pub receiver_balance: i64,
}

/// Returns the account for `user_id`, creating an empty one if it does not exist.
pub async fn get_or_create_account<C>(db: &C, user_id: u64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let id = db_id(user_id)?;

    let account = user::ActiveModel {
        user_id: Set(id),
        credits: Set(0),
        xp: Set(0),
        level: Set(0),
        last_daily: Set(None),
        rep: Set(0),
    };

    // Concurrent first touches race to insert; the loser's insert is a no-op
    User::insert(account)
        .on_conflict(
            OnConflict::column(user::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    User::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")).into())
}

/// Current balance of `user_id` (zero for a fresh account).
pub async fn balance<C>(db: &C, user_id: u64) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(get_or_create_account(db, user_id).await?.credits)
}

/// Adds `amount` to the balance of `user_id` with a single atomic `UPDATE`.
///
/// `amount` may be negative. No floor is enforced here; callers that must keep balances
/// non-negative use [`transfer`].
pub async fn credit<C>(db: &C, user_id: u64, amount: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let id = db_id(user_id)?;
    get_or_create_account(db, user_id).await?;

    User::update_many()
        .col_expr(
            user::Column::Credits,
            Expr::col(user::Column::Credits).add(amount),
        )
        .filter(user::Column::UserId.eq(id))
        .exec(db)
        .await?;

    User::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")).into())
}

/// Validates a transfer without touching the store.
pub const fn validate_transfer(from: Participant, to: Participant, amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    if from.user_id == to.user_id {
        return Err(Error::SelfTransfer);
    }
    if from.is_bot || to.is_bot {
        return Err(Error::BotAccount);
    }
    Ok(())
}

/// Moves `amount` credits from `from` to `to`.
///
/// Rejected without any write when the amount is not positive, the parties are the same
/// account, either party is a bot, or the sender cannot cover the amount.
pub async fn transfer(
    db: &DatabaseConnection,
    from: Participant,
    to: Participant,
    amount: i64,
) -> Result<TransferReceipt> {
    validate_transfer(from, to, amount)?;

    let sender_id = db_id(from.user_id)?;
    let txn = db.begin().await?;

    let sender = get_or_create_account(&txn, from.user_id).await?;
    get_or_create_account(&txn, to.user_id).await?;

    // Guarded debit: only succeeds if the balance still covers the amount
    let debit = User::update_many()
        .col_expr(
            user::Column::Credits,
            Expr::col(user::Column::Credits).sub(amount),
        )
        .filter(user::Column::UserId.eq(sender_id))
        .filter(user::Column::Credits.gte(amount))
        .exec(&txn)
        .await?;

    if debit.rows_affected == 0 {
        // Dropping `txn` rolls back the account inserts
        return Err(Error::InsufficientFunds {
            current: sender.credits,
            required: amount,
        });
    }

    let receiver = credit(&txn, to.user_id, amount).await?;
    let sender_balance = balance(&txn, from.user_id).await?;

    txn.commit().await?;

    Ok(TransferReceipt {
        amount,
        sender_balance,
        receiver_balance: receiver.credits,
    })
}

/// Picks a daily reward amount uniformly from `range`.
pub fn roll_daily_amount<R: Rng + ?Sized>(rng: &mut R, range: RangeInclusive<i64>) -> i64 {
    rng.random_range(range)
}

/// Time left before a member may claim the daily reward again, or `None` if they may claim now.
#[must_use]
pub fn daily_cooldown_remaining(
    last_daily: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Option<Duration> {
    let elapsed = (now - last_daily?).to_std().unwrap_or_default();
    cooldown.checked_sub(elapsed).filter(|left| !left.is_zero())
}

/// Outcome of a daily reward claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyClaim {
    /// Reward paid; the account after the credit
    Granted(user::Model),
    /// Already claimed within the cooldown; time left until the next claim
    Cooldown(Duration),
}

/// Grants a daily reward of `amount` unless one was claimed less than `cooldown` ago.
///
/// The credit and the `last_daily` stamp are a single `UPDATE` conditioned on the previous
/// stamp being old enough, so two claims racing for the same account pay out once.
pub async fn claim_daily(
    db: &DatabaseConnection,
    user_id: u64,
    amount: i64,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Result<DailyClaim> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    let id = db_id(user_id)?;
    let cutoff = TimeDelta::from_std(cooldown)
        .ok()
        .and_then(|cooldown| now.checked_sub_signed(cooldown))
        .ok_or_else(|| Error::Config {
            message: format!("Daily cooldown of {}s is out of range", cooldown.as_secs()),
        })?;

    let txn = db.begin().await?;
    get_or_create_account(&txn, user_id).await?;

    let paid = User::update_many()
        .col_expr(
            user::Column::Credits,
            Expr::col(user::Column::Credits).add(amount),
        )
        .col_expr(user::Column::LastDaily, Expr::value(now))
        .filter(user::Column::UserId.eq(id))
        .filter(
            Condition::any()
                .add(user::Column::LastDaily.is_null())
                .add(user::Column::LastDaily.lte(cutoff)),
        )
        .exec(&txn)
        .await?;

    let account = User::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))?;
    txn.commit().await?;

    if paid.rows_affected == 0 {
        let remaining =
            daily_cooldown_remaining(account.last_daily, now, cooldown).unwrap_or(cooldown);
        return Ok(DailyClaim::Cooldown(remaining));
    }
    Ok(DailyClaim::Granted(account))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    const ALICE: u64 = 111_111_111_111_111_111;
    const BOB: u64 = 222_222_222_222_222_222;
    const DAY: Duration = Duration::from_secs(86_400);

    #[tokio::test]
    async fn test_account_created_lazily() -> Result<()> {
        let db = setup_test_db().await?;

        let account = get_or_create_account(&db, ALICE).await?;
        assert_eq!(account.credits, 0);
        assert_eq!(account.level, 0);
        assert!(account.last_daily.is_none());

        // Second call returns the same row rather than failing on the primary key
        let again = get_or_create_account(&db, ALICE).await?;
        assert_eq!(account, again);
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_accepts_negative_delta() -> Result<()> {
        let db = setup_test_db().await?;

        credit(&db, ALICE, 100).await?;
        let account = credit(&db, ALICE, -250).await?;
        assert_eq!(account.credits, -150, "credit has no floor");
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let alice = Participant::user(ALICE);
        let bob = Participant::user(BOB);

        let result = transfer(&db, alice, bob, 0).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 0 })));

        let result = transfer(&db, alice, bob, -5).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -5 })));

        let result = transfer(&db, alice, alice, 10).await;
        assert!(matches!(result, Err(Error::SelfTransfer)));

        let bot = Participant {
            user_id: BOB,
            is_bot: true,
        };
        let result = transfer(&db, alice, bot, 10).await;
        assert!(matches!(result, Err(Error::BotAccount)));

        let result = transfer(&db, bot, alice, 10).await;
        assert!(matches!(result, Err(Error::BotAccount)));
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_moves_exact_amount() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_account(&db, ALICE, 500).await?;
        create_funded_account(&db, BOB, 20).await?;

        let receipt = transfer(&db, Participant::user(ALICE), Participant::user(BOB), 120).await?;

        assert_eq!(receipt.amount, 120);
        assert_eq!(receipt.sender_balance, 380);
        assert_eq!(receipt.receiver_balance, 140);
        assert_eq!(balance(&db, ALICE).await?, 380);
        assert_eq!(balance(&db, BOB).await?, 140);
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_of_whole_balance() -> Result<()> {
        let db = setup_test_db().await?;
        credit(&db, ALICE, 75).await?;

        transfer(&db, Participant::user(ALICE), Participant::user(BOB), 75).await?;
        assert_eq!(balance(&db, ALICE).await?, 0);
        assert_eq!(balance(&db, BOB).await?, 75);
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_insufficient_funds_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_account(&db, ALICE, 50).await?;
        create_funded_account(&db, BOB, 10).await?;

        let result = transfer(&db, Participant::user(ALICE), Participant::user(BOB), 51).await;
        match result {
            Err(Error::InsufficientFunds { current, required }) => {
                assert_eq!(current, 50);
                assert_eq!(required, 51);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }

        assert_eq!(balance(&db, ALICE).await?, 50, "sender untouched");
        assert_eq!(balance(&db, BOB).await?, 10, "receiver untouched");
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_rejections_leave_balances() -> Result<()> {
        let db = setup_test_db().await?;
        credit(&db, ALICE, 100).await?;

        let alice = Participant::user(ALICE);
        let bob_bot = Participant {
            user_id: BOB,
            is_bot: true,
        };

        assert!(transfer(&db, alice, alice, 10).await.is_err());
        assert!(transfer(&db, alice, bob_bot, 10).await.is_err());
        assert!(transfer(&db, alice, Participant::user(BOB), 0).await.is_err());

        assert_eq!(balance(&db, ALICE).await?, 100);
        assert_eq!(balance(&db, BOB).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_claim_daily_records_time() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let DailyClaim::Granted(account) = claim_daily(&db, ALICE, 300, now, DAY).await? else {
            panic!("first claim must be paid");
        };
        assert_eq!(account.credits, 300);
        assert_eq!(
            account.last_daily.map(|t| t.timestamp()),
            Some(now.timestamp())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_claim_daily_respects_cooldown() -> Result<()> {
        let db = setup_test_db().await?;
        let start = DateTime::from_timestamp(1_760_000_000, 0).unwrap();

        claim_daily(&db, ALICE, 300, start, DAY).await?;

        let early = claim_daily(&db, ALICE, 300, start + chrono::TimeDelta::hours(23), DAY).await?;
        assert_eq!(early, DailyClaim::Cooldown(Duration::from_secs(3600)));
        assert_eq!(balance(&db, ALICE).await?, 300, "early claim pays nothing");

        let next = claim_daily(&db, ALICE, 200, start + chrono::TimeDelta::hours(24), DAY).await?;
        assert!(matches!(next, DailyClaim::Granted(ref account) if account.credits == 500));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_daily_claims_pay_once() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let (first, second) = tokio::join!(
            claim_daily(&db, ALICE, 500, now, DAY),
            claim_daily(&db, ALICE, 500, now, DAY)
        );
        let granted = [first?, second?]
            .iter()
            .filter(|claim| matches!(claim, DailyClaim::Granted(_)))
            .count();

        assert_eq!(granted, 1);
        assert_eq!(balance(&db, ALICE).await?, 500);
        Ok(())
    }

    #[tokio::test]
    async fn test_claim_daily_rejects_non_positive_amount() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = claim_daily(&db, ALICE, 0, Utc::now(), DAY).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 0 })));
        Ok(())
    }

    #[test]
    fn test_daily_cooldown_remaining() {
        let day = Duration::from_secs(86_400);
        let now = Utc::now();

        assert_eq!(daily_cooldown_remaining(None, now, day), None);
        assert_eq!(
            daily_cooldown_remaining(Some(now - chrono::TimeDelta::hours(23)), now, day),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(
            daily_cooldown_remaining(Some(now - chrono::TimeDelta::hours(24)), now, day),
            None
        );
        // A clock that went backwards must not grant an endless cooldown
        assert_eq!(
            daily_cooldown_remaining(Some(now + chrono::TimeDelta::hours(1)), now, day),
            Some(day)
        );
    }

    #[test]
    fn test_roll_daily_amount_in_range() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let amount = roll_daily_amount(&mut rng, 200..=1000);
            assert!((200..=1000).contains(&amount));
        }
    }
}
