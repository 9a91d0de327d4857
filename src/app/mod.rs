pub mod render;
pub mod terminal;

use std::sync::Arc;

use crate::core::bootstrap::default_library;
use crate::core::lending::LendingEngine;
use crate::core::{Clock, LoanTerm, PersistenceGateway};
use crate::utils::error::Result;

pub use terminal::Terminal;

/// 載入快照；沒有快照時以預設資料建立並立即存檔
pub async fn open_library<G>(
    gateway: &G,
    loan_term: LoanTerm,
    clock: Arc<dyn Clock>,
) -> Result<LendingEngine>
where
    G: PersistenceGateway + ?Sized,
{
    match gateway.load().await? {
        Some(snapshot) => LendingEngine::from_snapshot(snapshot, loan_term, clock),
        None => {
            tracing::info!("📭 No snapshot found, creating default library data");
            let (catalog, registry) = default_library()?;
            let engine = LendingEngine::new(catalog, registry, loan_term, clock);
            gateway.save(&engine.snapshot()).await?;
            Ok(engine)
        }
    }
}
