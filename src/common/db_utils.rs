// src/common/db_utils.rs

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::common::error::AppError;

// ---
// Helper RLS: a "chave" para o banco de dados
// ---
/// Abre uma transação com as variáveis de RLS já definidas.
/// `set_config(..., true)` vale só até o fim da transação, então a conexão
/// volta limpa para a pool no commit/rollback.
pub async fn begin_tenant_tx(
    pool: &PgPool,
    tenant_id: Uuid,
    user_id: Uuid,
) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_id.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
