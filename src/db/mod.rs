// Database module - per-user holdings store backed by SQLite

pub mod models;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::TrackfolioError;
pub use models::{normalize_symbol, Category, Holding};

/// Get the default database path (~/.trackfolio/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let trackfolio_dir = PathBuf::from(home).join(".trackfolio");

    std::fs::create_dir_all(&trackfolio_dir).context("Failed to create .trackfolio directory")?;

    Ok(trackfolio_dir.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;
    Ok(conn)
}

/// Initialize the database with schema
///
/// Creates the database file if needed and applies the (idempotent)
/// schema SQL.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let conn = open_db(db_path)?;
    apply_schema(&conn)
}

/// Apply the schema on an already open connection (used for in-memory stores)
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(include_str!("schema.sql"))
        .context("Failed to execute schema")?;
    debug!("Holdings schema applied");
    Ok(())
}

/// Insert a holding for a user, returns the new holding id
pub fn insert_holding(conn: &Connection, user_id: &str, holding: &Holding) -> Result<i64> {
    holding.validate()?;
    let now = Utc::now();

    conn.execute(
        "INSERT INTO holdings (
            user_id, symbol, name, category, quantity, average_cost,
            purchase_date, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user_id,
            normalize_symbol(&holding.symbol),
            holding.name,
            holding.category.as_str(),
            holding.quantity,
            holding.average_cost,
            holding.purchase_date,
            now,
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    info!("Added holding {} ({}) for user {}", holding.symbol, id, user_id);
    Ok(id)
}

/// Replace an existing holding. The holding must carry its id.
pub fn update_holding(conn: &Connection, user_id: &str, holding: &Holding) -> Result<()> {
    let id = holding
        .id
        .ok_or_else(|| TrackfolioError::Validation("holding id is required for update".into()))?;
    holding.validate()?;

    let changed = conn.execute(
        "UPDATE holdings
         SET symbol = ?1, name = ?2, category = ?3, quantity = ?4,
             average_cost = ?5, purchase_date = ?6, updated_at = ?7
         WHERE id = ?8 AND user_id = ?9",
        params![
            normalize_symbol(&holding.symbol),
            holding.name,
            holding.category.as_str(),
            holding.quantity,
            holding.average_cost,
            holding.purchase_date,
            Utc::now(),
            id,
            user_id,
        ],
    )?;

    if changed == 0 {
        return Err(TrackfolioError::HoldingNotFound(id).into());
    }
    info!("Updated holding {} for user {}", id, user_id);
    Ok(())
}

/// Delete a holding owned by the user
pub fn delete_holding(conn: &Connection, user_id: &str, id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM holdings WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    if changed == 0 {
        return Err(TrackfolioError::HoldingNotFound(id).into());
    }
    info!("Deleted holding {} for user {}", id, user_id);
    Ok(())
}

/// Get one holding owned by the user
pub fn get_holding(conn: &Connection, user_id: &str, id: i64) -> Result<Option<Holding>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, name, category, quantity, average_cost, purchase_date
         FROM holdings
         WHERE id = ?1 AND user_id = ?2",
    )?;

    let holding = stmt
        .query_row(params![id, user_id], row_to_holding)
        .optional()?;
    Ok(holding)
}

/// List all holdings of a user in insertion order
pub fn list_holdings(conn: &Connection, user_id: &str) -> Result<Vec<Holding>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, name, category, quantity, average_cost, purchase_date
         FROM holdings
         WHERE user_id = ?1
         ORDER BY id ASC",
    )?;

    let holdings = stmt
        .query_map([user_id], row_to_holding)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(holdings)
}

fn row_to_holding(row: &Row) -> Result<Holding, rusqlite::Error> {
    let category_str: String = row.get(3)?;
    let category = category_str.parse::<Category>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Holding {
        id: Some(row.get(0)?),
        symbol: row.get(1)?,
        name: row.get(2)?,
        category,
        quantity: row.get(4)?,
        average_cost: row.get(5)?,
        purchase_date: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn memory_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_list_preserves_order() {
        let conn = memory_store();
        let aapl = Holding::new("aapl", "Apple", Category::Stock, 10.0, 150.0)
            .with_purchase_date(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        let btc = Holding::new("BTC", "Bitcoin", Category::Crypto, 0.5, 30000.0);

        let first = insert_holding(&conn, "alice", &aapl).unwrap();
        let second = insert_holding(&conn, "alice", &btc).unwrap();
        assert!(second > first);

        let holdings = list_holdings(&conn, "alice").unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].symbol, "AAPL");
        assert_eq!(holdings[0].purchase_date, NaiveDate::from_ymd_opt(2023, 1, 15));
        assert_eq!(holdings[1].category, Category::Crypto);
    }

    #[test]
    fn test_holdings_are_scoped_per_user() {
        let conn = memory_store();
        let id = insert_holding(
            &conn,
            "alice",
            &Holding::new("ETH", "Ether", Category::Crypto, 2.0, 1500.0),
        )
        .unwrap();

        assert!(list_holdings(&conn, "bob").unwrap().is_empty());
        assert!(get_holding(&conn, "bob", id).unwrap().is_none());
        assert!(delete_holding(&conn, "bob", id).is_err());
        assert!(get_holding(&conn, "alice", id).unwrap().is_some());
    }

    #[test]
    fn test_update_and_delete() {
        let conn = memory_store();
        let id = insert_holding(
            &conn,
            "alice",
            &Holding::new("GLD", "Gold", Category::Commodity, 3.0, 180.0),
        )
        .unwrap();

        let mut holding = get_holding(&conn, "alice", id).unwrap().unwrap();
        holding.quantity = 5.0;
        update_holding(&conn, "alice", &holding).unwrap();
        assert_eq!(get_holding(&conn, "alice", id).unwrap().unwrap().quantity, 5.0);

        delete_holding(&conn, "alice", id).unwrap();
        assert!(list_holdings(&conn, "alice").unwrap().is_empty());

        let err = update_holding(&conn, "alice", &holding).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackfolioError>(),
            Some(TrackfolioError::HoldingNotFound(_))
        ));
    }

    #[test]
    fn test_insert_rejects_invalid_holding() {
        let conn = memory_store();
        let bad = Holding::new("SPY", "S&P 500", Category::Etf, -2.0, 400.0);
        assert!(insert_holding(&conn, "alice", &bad).is_err());
        assert!(list_holdings(&conn, "alice").unwrap().is_empty());
    }
}
