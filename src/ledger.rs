use bigdecimal::BigDecimal;
use diesel::prelude::*;

use crate::{
	errors::ApiError,
	models::{Transaction, TxType},
	schema::{shop_users, transactions},
};

/// Computes the signed balance delta for a ledger entry.
pub fn signed_delta(tx_type: TxType, amount: &BigDecimal) -> BigDecimal {
	if tx_type.is_credit() {
		amount.clone()
	} else {
		-amount.clone()
	}
}

/// Applies one ledger entry to a shop wallet.
///
/// The shop row is locked `FOR UPDATE` and the balance update and the
/// transaction insert commit together, so concurrent calls on the same
/// wallet serialize and a crash can never leave the balance and the
/// ledger disagreeing. The ledger is append-only: rows written here are
/// never updated or deleted.
pub fn apply_transaction(
	conn: &mut PgConnection,
	shop_id: i32,
	tx_type: TxType,
	amount: &BigDecimal,
	reference: &str,
) -> Result<Transaction, ApiError> {
	if *amount <= BigDecimal::from(0) {
		return Err(ApiError::validation("Amount must be positive"));
	}

	let delta = signed_delta(tx_type, amount);

	conn.transaction::<Transaction, ApiError, _>(|conn| {
		let before = shop_users::table
			.filter(shop_users::id.eq(shop_id))
			.select(shop_users::wallet_balance)
			.for_update()
			.first::<BigDecimal>(conn)
			.optional()?
			.ok_or(ApiError::NotFound("Shop"))?;

		let after = &before + &delta;
		if after < BigDecimal::from(0) {
			return Err(ApiError::InsufficientFunds);
		}

		diesel::update(shop_users::table.filter(shop_users::id.eq(shop_id)))
			.set(shop_users::wallet_balance.eq(&after))
			.execute(conn)?;

		let tx = Transaction {
			id: uuid::Uuid::new_v4(),
			shop_id,
			tx_type: tx_type.as_str().to_string(),
			amount: amount.clone(),
			balance_before: before,
			balance_after: after,
			reference: reference.to_string(),
			created_at: chrono::Utc::now(),
		};
		let tx = diesel::insert_into(transactions::table)
			.values(&tx)
			.get_result::<Transaction>(conn)?;
		log::info!(
			"Applied {} of {} for shop {} (balance {} -> {})",
			tx.tx_type,
			tx.amount,
			shop_id,
			tx.balance_before,
			tx.balance_after
		);
		Ok(tx)
	})
}

/// Most recent transactions for a shop, newest first.
pub fn history(
	conn: &mut PgConnection,
	shop_id: i32,
	limit: i64,
) -> Result<Vec<Transaction>, ApiError> {
	let txs = transactions::table
		.filter(transactions::shop_id.eq(shop_id))
		.order(transactions::created_at.desc())
		.limit(limit)
		.select(Transaction::as_select())
		.load::<Transaction>(conn)?;
	Ok(txs)
}
