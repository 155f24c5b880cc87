//! Accounts repository.

use std::future::Future;

use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::model::{Account, NewAccount};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for account database operations.
pub trait AccountRepository {
    /// Registers an account, updating the user name if the id is already known.
    fn upsert_account(
        &mut self,
        new_account: NewAccount,
    ) -> impl Future<Output = PgResult<Account>> + Send;
}

impl AccountRepository for PgConnection {
    async fn upsert_account(&mut self, new_account: NewAccount) -> PgResult<Account> {
        use schema::accounts::{self, dsl};

        let account = diesel::insert_into(accounts::table)
            .values(&new_account)
            .on_conflict(dsl::id)
            .do_update()
            .set(dsl::user_name.eq(excluded(dsl::user_name)))
            .returning(Account::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(account)
    }
}
