//! Keystore operations: persistence and activation of custodied keys.

use crate::{Pg, StoreError};
use alloy_primitives::Address;
use custodia_primitives::KeyPair;
use sqlx::postgres::PgConnection;

#[derive(sqlx::FromRow)]
struct KeyRow {
    public_address: String,
    private_key: String,
    active: bool,
}

impl KeyRow {
    fn into_keypair(self) -> Result<KeyPair, StoreError> {
        let public_address = self
            .public_address
            .parse::<Address>()
            .map_err(|e| StoreError::Corrupt(format!("keystore address: {e}")))?;
        Ok(KeyPair { public_address, private_key: self.private_key, active: self.active })
    }
}

impl Pg {
    /// Persists a freshly generated keypair in the inactive state.
    pub async fn insert_keypair(
        &self,
        conn: &mut PgConnection,
        keypair: &KeyPair,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO keystore (public_address, private_key) VALUES ($1, $2)")
            .bind(keypair.public_address.to_checksum(None))
            .bind(&keypair.private_key)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Loads the keypair custodied for `address`.
    pub async fn load_keypair(
        &self,
        conn: &mut PgConnection,
        address: Address,
    ) -> Result<KeyPair, StoreError> {
        sqlx::query_as::<_, KeyRow>(
            "SELECT public_address, private_key, active FROM keystore WHERE public_address = $1",
        )
        .bind(address.to_checksum(None))
        .fetch_optional(conn)
        .await?
        .ok_or(StoreError::NotFound)?
        .into_keypair()
    }

    /// Returns whether a keypair exists and, if so, whether it is active.
    pub async fn check_keypair(
        &self,
        conn: &mut PgConnection,
        address: Address,
    ) -> Result<Option<bool>, StoreError> {
        let active: Option<(bool,)> =
            sqlx::query_as("SELECT active FROM keystore WHERE public_address = $1")
                .bind(address.to_checksum(None))
                .fetch_optional(conn)
                .await?;
        Ok(active.map(|(a,)| a))
    }

    /// Flips a keypair active once its registration confirmed on chain.
    pub async fn activate_keypair(
        &self,
        conn: &mut PgConnection,
        address: Address,
    ) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE keystore SET active = true WHERE public_address = $1")
            .bind(address.to_checksum(None))
            .execute(conn)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Loads the master signer key.
    pub async fn load_master_keypair(
        &self,
        conn: &mut PgConnection,
    ) -> Result<KeyPair, StoreError> {
        sqlx::query_as::<_, KeyRow>(
            "SELECT public_address, private_key, active FROM keystore WHERE master",
        )
        .fetch_optional(conn)
        .await?
        .ok_or(StoreError::NotFound)?
        .into_keypair()
    }

    /// Generates and persists the master signer if it does not exist yet.
    pub async fn bootstrap_master(&self, conn: &mut PgConnection) -> Result<(), StoreError> {
        match self.load_master_keypair(&mut *conn).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound) => {
                let master = KeyPair::generate();
                sqlx::query(
                    "INSERT INTO keystore (public_address, private_key, master, active)
                     VALUES ($1, $2, true, true)",
                )
                .bind(master.public_address.to_checksum(None))
                .bind(&master.private_key)
                .execute(conn)
                .await?;
                tracing::info!(
                    target: "store",
                    master = %master.public_address,
                    "bootstrapped master signer"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
